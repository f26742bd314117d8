//! # tsync-core
//!
//! Causality model and per-record CRDT state for Tactical Sync.
//!
//! - [`clock`]: vector clocks and the four-valued [`CausalOrder`]
//! - [`gset`]: grow-only set used for observed equipment
//! - [`record`]: the intelligence report and its edit/patch types
//! - [`resolver`]: causal-first, deterministic LWW conflict resolution
//!
//! Merge results form a join-semilattice (see [`lattice`]), so replicas that
//! exchange state pairwise in any order and direction converge.

pub mod clock;
pub mod error;
pub mod gset;
pub mod lattice;
pub mod record;
pub mod resolver;

pub use clock::{CausalOrder, VectorClock};
pub use error::{CoreError, Result};
pub use gset::GSet;
pub use lattice::Lattice;
pub use record::{
    Classification, IntelligenceReport, RecordId, ReportEditor, ReportFields, ReportPatch,
};
pub use resolver::{ConflictResolver, Resolution};
