//! # Tactical Sync
//!
//! Offline-first replication of intelligence reports between field nodes.
//!
//! - [`tsync_core`]: vector clocks, the report model and the conflict resolver
//! - [`tsync_audit`]: the SHA-256 hash-chained audit trail
//! - [`tsync_node`]: the node store, delta sync and connectivity gate
//!
//! [`stress_test`] drives many nodes concurrently under partial connectivity
//! and checks that they converge.


pub use tsync_audit::{AuditEntry, AuditTrail};
pub use tsync_core::{
    CausalOrder, Classification, ConflictResolver, IntelligenceReport, RecordId, ReportFields,
    ReportPatch, VectorClock,
};
pub use tsync_node::{NetworkController, Node, NodeConfig, SyncResult};
