//! Error types for the core CRDT layer.

use crate::record::RecordId;
use thiserror::Error;

/// Errors raised by the conflict resolver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Two versions of different records were handed to the resolver.
    #[error("cannot resolve reports with different ids: local {local}, remote {remote}")]
    MismatchedIdentifiers { local: RecordId, remote: RecordId },
}

pub type Result<T> = std::result::Result<T, CoreError>;
