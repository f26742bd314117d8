//! # tsync-audit
//!
//! Append-only audit trail with a SHA-256 hash chain.
//!
//! Every entry embeds the hash of its predecessor and a hash over all of its
//! own fields, so a retroactive edit to any field of any entry is detectable:
//!
//! ```rust
//! use tsync_audit::{AuditAction, AuditOutcome, AuditTrail};
//! use tsync_core::Classification;
//!
//! let mut trail = AuditTrail::new();
//! trail.append(
//!     "node_alpha",
//!     AuditAction::Create,
//!     "01HZX",
//!     AuditOutcome::Success,
//!     Classification::Secret,
//!     "Created report",
//! );
//! assert!(trail.verify_chain().is_ok());
//! ```
//!
//! Verification reports failures; it never repairs them. A broken chain is
//! evidence.

mod entry;
mod export;
mod hash;
mod trail;

pub use entry::{AuditAction, AuditEntry, AuditOutcome};
pub use export::{AuditError, ComplianceRecord};
pub use hash::{Hash, Hasher};
pub use trail::{AuditTrail, ChainError};
