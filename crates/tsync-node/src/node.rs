//! Field node: local store, node clock, audit trail and sync engine.
//!
//! All state sits behind one `parking_lot::Mutex`, the node's exclusive
//! critical section. Every mutating or state-exposing method takes it for
//! the duration of the call and hands out copies only, so nothing returned
//! to a caller or peer aliases the stored records.
//!
//! Sync is a one-directional pull-merge:
//!
//! ```text
//! peer ids ─┬─ not held locally ──► store as-is, merge node clock, audit SYNC/SUCCESS
//!           └─ held on both sides ─► identical? skip
//!                                    otherwise resolve, store, merge node clock,
//!                                    audit SYNC/CONFLICT_RESOLVED (no causal order)
//!                                             or SYNC/SUCCESS (causal catch-up)
//! ```
//!
//! The peer is read before this node's section is taken, so the two nodes'
//! sections are never held at the same time. A refactor that needs both at
//! once must lock them in a fixed order (for example by node id).

use crate::config::NodeConfig;
use crate::error::Result;
use crate::source::RecordSource;
use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::ops::{Add, AddAssign};
use tracing::{debug, info, warn};
use tsync_audit::{AuditAction, AuditEntry, AuditOutcome, AuditTrail, ChainError};
use tsync_core::{
    CausalOrder, ConflictResolver, IntelligenceReport, RecordId, ReportEditor, ReportFields,
    ReportPatch, VectorClock,
};

/// Counts produced by one sync pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    /// Records the receiving node did not hold before.
    pub received: usize,
    /// Shared records caught up along causal order.
    pub updated: usize,
    /// Shared records with no causal order, settled by tie-break.
    pub conflicts_resolved: usize,
}

impl SyncResult {
    pub fn total(&self) -> usize {
        self.received + self.updated + self.conflicts_resolved
    }

    /// True when the pass changed nothing.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl Add for SyncResult {
    type Output = SyncResult;

    fn add(self, other: SyncResult) -> SyncResult {
        SyncResult {
            received: self.received + other.received,
            updated: self.updated + other.updated,
            conflicts_resolved: self.conflicts_resolved + other.conflicts_resolved,
        }
    }
}

impl AddAssign for SyncResult {
    fn add_assign(&mut self, other: SyncResult) {
        *self = *self + other;
    }
}

/// Point-in-time overview of a node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSummary {
    pub node_id: String,
    pub record_count: usize,
    pub clock: VectorClock,
    pub audit_entries: usize,
    pub audit_chain_valid: bool,
}

#[derive(Debug, Default)]
struct NodeState {
    records: BTreeMap<RecordId, IntelligenceReport>,
    clock: VectorClock,
    audit: AuditTrail,
}

/// A field node holding its own copy of the shared reports.
#[derive(Debug)]
pub struct Node {
    config: NodeConfig,
    actor_id: String,
    state: Mutex<NodeState>,
}

impl Node {
    /// Create a node with default configuration.
    ///
    /// Node ids must be unique across the fleet; they break LWW ties.
    pub fn new(node_id: impl Into<String>) -> Self {
        Self::from_valid_config(NodeConfig::new(node_id))
    }

    /// Create a node from a validated configuration.
    pub fn with_config(config: NodeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: NodeConfig) -> Self {
        Self {
            actor_id: config.actor_id(),
            config,
            state: Mutex::new(NodeState::default()),
        }
    }

    pub fn id(&self) -> &str {
        &self.config.node_id
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Create a report owned by this node.
    ///
    /// The report's clock starts as a copy of the node clock; both are then
    /// bumped for this node.
    pub fn create_record(&self, mut fields: ReportFields) -> IntelligenceReport {
        fields
            .classification
            .get_or_insert(self.config.default_classification);

        let mut guard = self.state.lock();
        let state = &mut *guard;

        let mut report = IntelligenceReport::new(fields, self.id(), Utc::now());
        report.clock = state.clock.clone();
        state.clock.increment(self.id());
        report.clock.increment(self.id());

        let entry = state.audit.append(
            self.actor_id.as_str(),
            AuditAction::Create,
            report.id.as_str(),
            AuditOutcome::Success,
            report.classification,
            format!("Created report: {}", report.activity),
        );
        report.audit_hash = Some(entry.current_hash.to_hex());
        state.records.insert(report.id.clone(), report.clone());

        info!(
            node = %self.id(),
            record = %report.id.short(),
            activity = %report.activity,
            "created report"
        );
        report
    }

    /// Apply a caller-supplied edit to a stored report.
    ///
    /// The edit runs inside this node's critical section and must not call
    /// back into the node. Returns `false` if the id is unknown.
    pub fn update_record<F>(&self, id: &RecordId, edit: F) -> bool
    where
        F: FnOnce(&mut ReportEditor<'_>),
    {
        self.mutate_record(id, AuditAction::Update, "Updated report".to_string(), |report| {
            edit(&mut ReportEditor::new(report))
        })
    }

    /// Apply an explicit partial update. Returns `false` if the id is unknown.
    pub fn apply_patch(&self, id: &RecordId, patch: &ReportPatch) -> bool {
        let details = format!("Patched report: {}", patch.changed_fields().join(", "));
        self.mutate_record(id, AuditAction::Update, details, |report| {
            patch.apply(&mut ReportEditor::new(report))
        })
    }

    /// Mark a report deleted. The record stays in the store as a tombstone.
    pub fn delete_record(&self, id: &RecordId) -> bool {
        self.mutate_record(id, AuditAction::Delete, "Soft-deleted report".to_string(), |report| {
            report.deleted = true
        })
    }

    fn mutate_record<F>(&self, id: &RecordId, action: AuditAction, details: String, edit: F) -> bool
    where
        F: FnOnce(&mut IntelligenceReport),
    {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let Some(report) = state.records.get_mut(id) else {
            debug!(node = %self.id(), record = %id, "report not found");
            return false;
        };

        edit(report);
        report.last_modified = Utc::now();
        report.last_modified_by = self.config.node_id.clone();
        state.clock.increment(&self.config.node_id);
        report.clock.increment(&self.config.node_id);

        let entry = state.audit.append(
            self.actor_id.as_str(),
            action,
            id.as_str(),
            AuditOutcome::Success,
            report.classification,
            details,
        );
        report.audit_hash = Some(entry.current_hash.to_hex());

        info!(node = %self.id(), record = %id.short(), %action, "modified report");
        true
    }

    pub fn get_record(&self, id: &RecordId) -> Option<IntelligenceReport> {
        self.state.lock().records.get(id).cloned()
    }

    pub fn get_all_records(&self) -> Vec<IntelligenceReport> {
        self.state.lock().records.values().cloned().collect()
    }

    pub fn record_ids(&self) -> Vec<RecordId> {
        self.state.lock().records.keys().cloned().collect()
    }

    pub fn record_count(&self) -> usize {
        self.state.lock().records.len()
    }

    /// Copies of every record whose id is not in `known`.
    pub fn records_unknown_to(&self, known: &[RecordId]) -> Vec<IntelligenceReport> {
        let known: HashSet<&RecordId> = known.iter().collect();
        self.state
            .lock()
            .records
            .values()
            .filter(|r| !known.contains(&r.id))
            .cloned()
            .collect()
    }

    /// A copy of the node-level clock.
    pub fn node_clock(&self) -> VectorClock {
        self.state.lock().clock.clone()
    }

    /// Pull and merge everything `peer` holds.
    ///
    /// The peer is read through its accessors first (each takes and releases
    /// the peer's own section); this node's section is taken afterwards.
    pub fn sync_with<S>(&self, peer: &S) -> Result<SyncResult>
    where
        S: RecordSource + ?Sized,
    {
        if peer.source_id() == self.id() {
            debug!(node = %self.id(), "skipping sync with self");
            return Ok(SyncResult::default());
        }

        let incoming: Vec<IntelligenceReport> = peer
            .record_ids()
            .iter()
            .filter_map(|id| peer.fetch_record(id))
            .collect();

        self.merge_incoming(peer.source_id(), incoming)
    }

    /// Merge a batch of records received from `from`.
    pub fn merge_incoming(
        &self,
        from: &str,
        records: impl IntoIterator<Item = IntelligenceReport>,
    ) -> Result<SyncResult> {
        let mut result = SyncResult::default();

        let mut guard = self.state.lock();
        let state = &mut *guard;

        let (to_receive, mut to_merge): (Vec<_>, Vec<_>) = records
            .into_iter()
            .partition(|r| !state.records.contains_key(&r.id));

        for remote in to_receive {
            // A batch may repeat an id; later copies are merged, not received.
            if state.records.contains_key(&remote.id) {
                to_merge.push(remote);
                continue;
            }

            state.clock.merge(&remote.clock);
            state.audit.append(
                self.actor_id.as_str(),
                AuditAction::Sync,
                remote.id.as_str(),
                AuditOutcome::Success,
                remote.classification,
                format!("Received new report from {}", from),
            );
            debug!(node = %self.id(), peer = %from, record = %remote.id.short(), "received report");
            state.records.insert(remote.id.clone(), remote);
            result.received += 1;
        }

        for remote in to_merge {
            let Some(local) = state.records.get(&remote.id) else {
                continue;
            };

            let order = local.clock.compare(&remote.clock);
            if order == CausalOrder::Equal && local.last_modified == remote.last_modified {
                continue;
            }

            let resolution = ConflictResolver::resolve_pair(local, &remote)?;
            let (outcome, details) = if resolution.was_conflict() {
                result.conflicts_resolved += 1;
                (AuditOutcome::ConflictResolved, format!("Resolved conflict with {}", from))
            } else {
                result.updated += 1;
                (AuditOutcome::Success, format!("Updated from {}", from))
            };

            state.clock.merge(&resolution.report.clock);
            state.audit.append(
                self.actor_id.as_str(),
                AuditAction::Sync,
                remote.id.as_str(),
                outcome,
                resolution.report.classification,
                details,
            );
            debug!(
                node = %self.id(),
                peer = %from,
                record = %remote.id.short(),
                ?order,
                %outcome,
                "merged report"
            );
            state.records.insert(remote.id, resolution.report);
        }

        info!(
            node = %self.id(),
            peer = %from,
            received = result.received,
            updated = result.updated,
            conflicts = result.conflicts_resolved,
            "sync complete"
        );
        Ok(result)
    }

    /// A copy of the audit trail.
    pub fn audit_trail(&self) -> Vec<AuditEntry> {
        self.state.lock().audit.entries().to_vec()
    }

    /// Verify the audit chain; failures are logged, never repaired.
    pub fn verify_audit_chain(&self) -> bool {
        self.audit_chain_status().is_ok()
    }

    /// Verify the audit chain, reporting where it broke.
    pub fn audit_chain_status(&self) -> std::result::Result<(), ChainError> {
        let status = self.state.lock().audit.verify_chain();
        if let Err(err) = &status {
            warn!(node = %self.id(), %err, "audit chain verification failed");
        }
        status
    }

    /// Compliance export of the audit trail as JSON.
    pub fn export_audit_json(&self) -> Result<String> {
        Ok(self.state.lock().audit.export_json()?)
    }

    pub fn summary(&self) -> NodeSummary {
        let state = self.state.lock();
        NodeSummary {
            node_id: self.id().to_string(),
            record_count: state.records.len(),
            clock: state.clock.clone(),
            audit_entries: state.audit.len(),
            audit_chain_valid: state.audit.is_valid(),
        }
    }
}

impl RecordSource for Node {
    fn source_id(&self) -> &str {
        self.id()
    }

    fn record_ids(&self) -> Vec<RecordId> {
        Node::record_ids(self)
    }

    fn fetch_record(&self, id: &RecordId) -> Option<IntelligenceReport> {
        self.get_record(id)
    }
}
