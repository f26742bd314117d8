//! Interchange shapes for a transport.
//!
//! A transport marshals these with any serde format; field names are
//! camelCase. The handlers on [`Node`] answer requests the way a sync
//! endpoint would, against the node passed in explicitly.

use crate::error::Result;
use crate::node::{Node, SyncResult};
use crate::source::RecordBatch;
use serde::{Deserialize, Serialize};
use tracing::warn;
use tsync_core::{IntelligenceReport, RecordId};

/// Push of a client's reports to a peer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    pub node_id: String,
    pub reports: Vec<IntelligenceReport>,
}

impl SyncRequest {
    /// Everything `node` currently holds.
    pub fn from_node(node: &Node) -> Self {
        Self {
            node_id: node.id().to_string(),
            reports: node.get_all_records(),
        }
    }

    /// The pushed reports as a source the receiver can sync from.
    pub fn into_batch(self) -> RecordBatch {
        RecordBatch::new(self.node_id, self.reports)
    }
}

/// Request for reports the client does not hold yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    pub node_id: String,
    pub known_report_ids: Vec<RecordId>,
}

impl PullRequest {
    pub fn for_node(node: &Node) -> Self {
        Self {
            node_id: node.id().to_string(),
            known_report_ids: node.record_ids(),
        }
    }
}

/// Answer to a push, pull or full sync.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub success: bool,
    pub server_reports: Vec<IntelligenceReport>,
    pub reports_received: usize,
    pub reports_updated: usize,
    pub conflicts_resolved: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl SyncResponse {
    /// A successful response carrying the counts of `result`.
    pub fn from_result(result: SyncResult, server_reports: Vec<IntelligenceReport>) -> Self {
        Self {
            success: true,
            server_reports,
            reports_received: result.received,
            reports_updated: result.updated,
            conflicts_resolved: result.conflicts_resolved,
            error_message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_message: Some(message.into()),
            ..Default::default()
        }
    }

    /// Counts carried by the response.
    pub fn result(&self) -> SyncResult {
        SyncResult {
            received: self.reports_received,
            updated: self.reports_updated,
            conflicts_resolved: self.conflicts_resolved,
        }
    }

    /// The server's reports as a source the client can sync from.
    pub fn into_batch(self, server_id: impl Into<String>) -> RecordBatch {
        RecordBatch::new(server_id, self.server_reports)
    }
}

impl Node {
    /// Merge a pushed batch; the response carries counts only.
    pub fn handle_push(&self, request: SyncRequest) -> SyncResponse {
        let from = request.node_id.clone();
        match self.sync_with(&request.into_batch()) {
            Ok(result) => SyncResponse::from_result(result, Vec::new()),
            Err(err) => {
                warn!(node = %self.id(), peer = %from, %err, "push rejected");
                SyncResponse::failure(err.to_string())
            }
        }
    }

    /// Reports the requester does not hold. Nothing is merged.
    pub fn handle_pull(&self, request: &PullRequest) -> SyncResponse {
        let reports = self.records_unknown_to(&request.known_report_ids);
        SyncResponse::from_result(SyncResult::default(), reports)
    }

    /// Merge a pushed batch and answer with everything this node holds.
    pub fn handle_sync(&self, request: SyncRequest) -> SyncResponse {
        let mut response = self.handle_push(request);
        if response.success {
            response.server_reports = self.get_all_records();
        }
        response
    }

    /// Apply a server's response to this node.
    pub fn apply_response(&self, server_id: &str, response: SyncResponse) -> Result<SyncResult> {
        self.sync_with(&response.into_batch(server_id))
    }
}
