//! The peer accessor seam.
//!
//! [`Node::sync_with`](crate::node::Node::sync_with) only ever reads a peer
//! through this trait. A local [`Node`](crate::node::Node) implements it
//! directly; a transport implements it for a remote peer, or hands the
//! records it received to a [`RecordBatch`].

use std::collections::BTreeMap;
use tsync_core::{IntelligenceReport, RecordId};

/// Read-only view of a peer's records.
///
/// Every returned report must be an independent copy.
pub trait RecordSource {
    /// Identifier of the peer node.
    fn source_id(&self) -> &str;

    /// Identifiers of every record the peer holds.
    fn record_ids(&self) -> Vec<RecordId>;

    /// A copy of one record, if the peer holds it.
    fn fetch_record(&self, id: &RecordId) -> Option<IntelligenceReport>;
}

/// Records received from a peer, held as a snapshot.
#[derive(Clone, Debug, Default)]
pub struct RecordBatch {
    source: String,
    records: BTreeMap<RecordId, IntelligenceReport>,
}

impl RecordBatch {
    pub fn new(
        source: impl Into<String>,
        records: impl IntoIterator<Item = IntelligenceReport>,
    ) -> Self {
        Self {
            source: source.into(),
            records: records.into_iter().map(|r| (r.id.clone(), r)).collect(),
        }
    }
}

impl RecordSource for RecordBatch {
    fn source_id(&self) -> &str {
        &self.source
    }

    fn record_ids(&self) -> Vec<RecordId> {
        self.records.keys().cloned().collect()
    }

    fn fetch_record(&self, id: &RecordId) -> Option<IntelligenceReport> {
        self.records.get(id).cloned()
    }
}
