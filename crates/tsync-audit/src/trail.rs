//! The append-only audit chain.

use crate::entry::{AuditAction, AuditEntry, AuditOutcome};
use crate::hash::Hash;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use tsync_core::Classification;

/// Why a chain failed verification.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainError {
    /// The entry's fields no longer match its self hash.
    #[error("audit chain broken at index {index}: hash mismatch")]
    HashMismatch { index: usize },

    /// The entry does not point at its predecessor's hash.
    #[error("audit chain broken at index {index}: chain link mismatch")]
    LinkBroken { index: usize },
}

impl ChainError {
    pub fn index(&self) -> usize {
        match self {
            ChainError::HashMismatch { index } | ChainError::LinkBroken { index } => *index,
        }
    }
}

/// Append-only sequence of hash-linked audit entries.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditTrail {
    entries: Vec<AuditEntry>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt entries loaded from elsewhere without checking them.
    ///
    /// Call [`AuditTrail::verify_chain`] before trusting the result.
    pub fn from_entries(entries: Vec<AuditEntry>) -> Self {
        Self { entries }
    }

    /// Hash the next entry must link to.
    pub fn tail_hash(&self) -> Hash {
        self.entries
            .last()
            .map(|e| e.current_hash)
            .unwrap_or_else(Hash::genesis)
    }

    /// Seal a new entry onto the end of the chain.
    pub fn append(
        &mut self,
        actor_id: impl Into<String>,
        action: AuditAction,
        resource_id: impl Into<String>,
        outcome: AuditOutcome,
        classification: Classification,
        details: impl Into<String>,
    ) -> &AuditEntry {
        let entry = AuditEntry::seal(
            actor_id,
            action,
            resource_id,
            outcome,
            classification,
            details,
            self.tail_hash(),
            Utc::now(),
        );
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    /// Check a single entry's self hash.
    pub fn verify_entry(entry: &AuditEntry) -> bool {
        entry.verify()
    }

    /// Check every self hash and every link, stopping at the first failure.
    pub fn verify_chain(&self) -> Result<(), ChainError> {
        for (index, entry) in self.entries.iter().enumerate() {
            if !entry.verify() {
                warn!(index, event = %entry.event_id, "audit entry hash mismatch");
                return Err(ChainError::HashMismatch { index });
            }

            let expected = if index == 0 {
                Hash::genesis()
            } else {
                self.entries[index - 1].current_hash
            };
            if entry.previous_hash != expected {
                warn!(index, event = %entry.event_id, "audit chain link mismatch");
                return Err(ChainError::LinkBroken { index });
            }
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.verify_chain().is_ok()
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&AuditEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries concerning one resource, in chain order.
    pub fn entries_for<'a>(&'a self, resource_id: &'a str) -> impl Iterator<Item = &'a AuditEntry> {
        self.entries
            .iter()
            .filter(move |e| e.resource_id == resource_id)
    }
}
