//! Exportable compliance records.
//!
//! An export lists, per event: what happened, when, which node did it, to
//! which resource, with what outcome, under which classification, and the
//! hashes that place it in the chain. Each record also states whether its
//! own hash verified at export time.

use crate::entry::AuditEntry;
use crate::trail::AuditTrail;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from exporting or importing a trail.
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Flat, string-valued view of one audit entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceRecord {
    pub event_id: String,
    pub timestamp: String,
    pub actor: String,
    pub action: String,
    pub resource_id: String,
    pub outcome: String,
    pub classification: String,
    pub previous_hash: String,
    pub current_hash: String,
    pub details: String,
    pub verified: bool,
}

impl From<&AuditEntry> for ComplianceRecord {
    fn from(entry: &AuditEntry) -> Self {
        Self {
            event_id: entry.event_id.clone(),
            timestamp: entry.timestamp.to_rfc3339(),
            actor: entry.actor_id.clone(),
            action: entry.action.to_string(),
            resource_id: entry.resource_id.clone(),
            outcome: entry.outcome.to_string(),
            classification: entry.classification.to_string(),
            previous_hash: entry.previous_hash.to_hex(),
            current_hash: entry.current_hash.to_hex(),
            details: entry.details.clone(),
            verified: entry.verify(),
        }
    }
}

impl AuditTrail {
    /// One compliance record per entry, in chain order.
    pub fn compliance_records(&self) -> Vec<ComplianceRecord> {
        self.entries().iter().map(ComplianceRecord::from).collect()
    }

    /// Compliance records as pretty-printed JSON.
    pub fn export_json(&self) -> Result<String, AuditError> {
        Ok(serde_json::to_string_pretty(&self.compliance_records())?)
    }

    /// Full entries as JSON, suitable for [`AuditTrail::import_json`].
    pub fn to_json(&self) -> Result<String, AuditError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Load entries written by [`AuditTrail::to_json`]; not verified.
    pub fn import_json(json: &str) -> Result<Self, AuditError> {
        Ok(serde_json::from_str(json)?)
    }
}
