//! Error types for node operations.

use thiserror::Error;
use tsync_audit::AuditError;
use tsync_core::CoreError;

/// Errors that can occur in node operations.
#[derive(Error, Debug)]
pub enum NodeError {
    #[error("resolve failed: {0}")]
    Resolve(#[from] CoreError),

    #[error("audit export failed: {0}")]
    Audit(#[from] AuditError),

    #[error("invalid node configuration: {0}")]
    Config(String),
}

/// Result type for node operations.
pub type Result<T> = std::result::Result<T, NodeError>;
