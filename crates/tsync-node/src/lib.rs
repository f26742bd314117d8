//! # tsync-node
//!
//! A field node: an exclusively owned store of intelligence reports, a
//! node-level vector clock and a hash-chained audit trail, plus the delta
//! sync protocol that drives two nodes toward agreement.
//!
//! ```rust
//! use tsync_node::{NetworkController, Node};
//! use tsync_core::ReportFields;
//!
//! let alpha = Node::new("alpha");
//! let bravo = Node::new("bravo");
//!
//! let report = alpha.create_record(ReportFields::new("Patrol", 6, "35.1,44.2", "Recon team"));
//!
//! let network = NetworkController::new();
//! let result = network.try_sync(&alpha, &bravo).unwrap().unwrap();
//! assert_eq!(result.received, 1);
//! assert_eq!(bravo.get_record(&report.id).unwrap(), report);
//! ```
//!
//! # Modules
//!
//! - [`node`] - store, mutation and sync engine
//! - [`source`] - the peer accessor seam a transport implements
//! - [`network`] - connectivity gate between node pairs
//! - [`wire`] - interchange shapes for a transport
//! - [`config`] - node configuration
//! - [`error`] - error types

pub mod config;
pub mod error;
pub mod network;
pub mod node;
pub mod source;
pub mod wire;

pub use config::{NodeConfig, NodeConfigBuilder};
pub use error::{NodeError, Result};
pub use network::NetworkController;
pub use node::{Node, NodeSummary, SyncResult};
pub use source::{RecordBatch, RecordSource};
pub use wire::{PullRequest, SyncRequest, SyncResponse};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::network::NetworkController;
    pub use crate::node::{Node, SyncResult};
    pub use crate::source::RecordSource;
    pub use tsync_core::{IntelligenceReport, RecordId, ReportFields, ReportPatch};
}
