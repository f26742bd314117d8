//! Audit entry definition.
//!
//! Entries record what happened, when, where (the actor node), to which
//! resource, and with what outcome. The self hash covers every other field,
//! including the predecessor's hash, in a fixed order.

use crate::hash::{Hash, Hasher};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tsync_core::Classification;
use ulid::Ulid;

/// Kind of mutation being audited.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Sync,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
            AuditAction::Sync => "SYNC",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of the audited mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditOutcome {
    Success,
    /// A concurrent edit was settled by the tie-break rule.
    ConflictResolved,
}

impl AuditOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOutcome::Success => "SUCCESS",
            AuditOutcome::ConflictResolved => "CONFLICT_RESOLVED",
        }
    }
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One link in the audit chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub actor_id: String,
    pub action: AuditAction,
    pub resource_id: String,
    pub outcome: AuditOutcome,
    pub classification: Classification,
    pub previous_hash: Hash,
    pub current_hash: Hash,
    pub details: String,
}

impl AuditEntry {
    /// Build and hash a new entry linked to `previous_hash`.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn seal(
        actor_id: impl Into<String>,
        action: AuditAction,
        resource_id: impl Into<String>,
        outcome: AuditOutcome,
        classification: Classification,
        details: impl Into<String>,
        previous_hash: Hash,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let mut entry = AuditEntry {
            event_id: Ulid::new().to_string(),
            timestamp,
            actor_id: actor_id.into(),
            action,
            resource_id: resource_id.into(),
            outcome,
            classification,
            previous_hash,
            current_hash: Hash::genesis(),
            details: details.into(),
        };
        entry.current_hash = entry.compute_hash();
        entry
    }

    /// Hash the entry's current field values.
    pub fn compute_hash(&self) -> Hash {
        let mut hasher = Hasher::new();
        hasher.update_field(self.event_id.as_bytes());
        hasher.update_field(
            self.timestamp
                .to_rfc3339_opts(SecondsFormat::Nanos, true)
                .as_bytes(),
        );
        hasher.update_field(self.actor_id.as_bytes());
        hasher.update_field(self.action.as_str().as_bytes());
        hasher.update_field(self.resource_id.as_bytes());
        hasher.update_field(self.outcome.as_str().as_bytes());
        hasher.update_field(self.classification.as_str().as_bytes());
        hasher.update_field(self.previous_hash.as_bytes());
        hasher.update_field(self.details.as_bytes());
        hasher.finalize()
    }

    /// True if the stored self hash matches the current fields.
    pub fn verify(&self) -> bool {
        self.compute_hash() == self.current_hash
    }
}
