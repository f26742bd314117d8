//! Intelligence reports: the replicated record type.
//!
//! A report carries three merge disciplines:
//! - LWW fields (`activity`, `size`, `location`, `unit`) resolved as a single
//!   unit, never recombined field by field;
//! - the grow-only `equipment` set, unioned on every merge;
//! - the immutable `observed_at` time, set once at creation.
//!
//! The remaining fields are metadata: the report's own vector clock, the
//! wall-clock time and node of the last modification (the tie-break), a
//! classification marker, a soft-delete tombstone and a pointer to the audit
//! entry that produced this version.

use crate::clock::VectorClock;
use crate::gset::GSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Unique identifier for a report.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn new() -> Self {
        Self(Ulid::new().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, for log lines.
    pub fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handling marker carried by reports and audit entries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    #[default]
    Unclassified,
    Confidential,
    Secret,
    TopSecret,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Unclassified => "UNCLASSIFIED",
            Classification::Confidential => "CONFIDENTIAL",
            Classification::Secret => "SECRET",
            Classification::TopSecret => "TOP_SECRET",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A versioned intelligence report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntelligenceReport {
    pub id: RecordId,
    /// Causal history of this report.
    #[serde(rename = "vectorClock")]
    pub clock: VectorClock,
    /// Estimated number of personnel observed.
    pub size: i64,
    pub activity: String,
    /// Free-form position, typically `"lat,lon"`.
    pub location: String,
    pub unit: String,
    #[serde(rename = "time")]
    pub observed_at: DateTime<Utc>,
    pub equipment: GSet<String>,
    pub classification: Classification,
    #[serde(rename = "isDeleted")]
    pub deleted: bool,
    pub last_modified: DateTime<Utc>,
    pub last_modified_by: String,
    /// Hex hash of the audit entry that produced this version.
    pub audit_hash: Option<String>,
}

impl IntelligenceReport {
    /// Build a fresh report authored by `author` at `now`.
    ///
    /// The clock starts empty; the owning node stamps it.
    pub fn new(fields: ReportFields, author: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: RecordId::new(),
            clock: VectorClock::new(),
            size: fields.size,
            activity: fields.activity,
            location: fields.location,
            unit: fields.unit,
            observed_at: fields.observed_at.unwrap_or(now),
            equipment: fields.equipment.into_iter().collect(),
            classification: fields.classification.unwrap_or_default(),
            deleted: false,
            last_modified: now,
            last_modified_by: author.into(),
            audit_hash: None,
        }
    }
}

/// Field values supplied when creating a report.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFields {
    pub activity: String,
    pub size: i64,
    pub location: String,
    pub unit: String,
    pub equipment: Vec<String>,
    pub observed_at: Option<DateTime<Utc>>,
    pub classification: Option<Classification>,
}

impl ReportFields {
    pub fn new(
        activity: impl Into<String>,
        size: i64,
        location: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            activity: activity.into(),
            size,
            location: location.into(),
            unit: unit.into(),
            ..Default::default()
        }
    }

    pub fn with_equipment<S: Into<String>>(
        mut self,
        equipment: impl IntoIterator<Item = S>,
    ) -> Self {
        self.equipment = equipment.into_iter().map(Into::into).collect();
        self
    }

    pub fn observed_at(mut self, at: DateTime<Utc>) -> Self {
        self.observed_at = Some(at);
        self
    }

    pub fn classification(mut self, classification: Classification) -> Self {
        self.classification = Some(classification);
        self
    }
}

/// Mutable view handed to update callbacks.
///
/// Only the LWW fields and the equipment set are reachable; identity,
/// clock, observation time and modification metadata stay with the store.
pub struct ReportEditor<'a> {
    report: &'a mut IntelligenceReport,
}

impl<'a> ReportEditor<'a> {
    pub fn new(report: &'a mut IntelligenceReport) -> Self {
        Self { report }
    }

    pub fn set_activity(&mut self, activity: impl Into<String>) -> &mut Self {
        self.report.activity = activity.into();
        self
    }

    pub fn set_size(&mut self, size: i64) -> &mut Self {
        self.report.size = size;
        self
    }

    pub fn set_location(&mut self, location: impl Into<String>) -> &mut Self {
        self.report.location = location.into();
        self
    }

    pub fn set_unit(&mut self, unit: impl Into<String>) -> &mut Self {
        self.report.unit = unit.into();
        self
    }

    pub fn add_equipment(&mut self, item: impl Into<String>) -> &mut Self {
        self.report.equipment.insert(item.into());
        self
    }

    pub fn set_classification(&mut self, classification: Classification) -> &mut Self {
        self.report.classification = classification;
        self
    }

    /// Read access to the report being edited.
    pub fn report(&self) -> &IntelligenceReport {
        &*self.report
    }
}

/// An explicit partial update: `None` leaves a field untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPatch {
    pub activity: Option<String>,
    pub size: Option<i64>,
    pub location: Option<String>,
    pub unit: Option<String>,
    /// Items to add; equipment is never removed.
    pub add_equipment: Vec<String>,
    pub classification: Option<Classification>,
}

impl ReportPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activity(mut self, activity: impl Into<String>) -> Self {
        self.activity = Some(activity.into());
        self
    }

    pub fn size(mut self, size: i64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn add_equipment(mut self, item: impl Into<String>) -> Self {
        self.add_equipment.push(item.into());
        self
    }

    pub fn classification(mut self, classification: Classification) -> Self {
        self.classification = Some(classification);
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Names of the fields this patch touches, for audit details.
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.activity.is_some() {
            fields.push("activity");
        }
        if self.size.is_some() {
            fields.push("size");
        }
        if self.location.is_some() {
            fields.push("location");
        }
        if self.unit.is_some() {
            fields.push("unit");
        }
        if !self.add_equipment.is_empty() {
            fields.push("equipment");
        }
        if self.classification.is_some() {
            fields.push("classification");
        }
        fields
    }

    /// Apply the named fields through an editor.
    pub fn apply(&self, editor: &mut ReportEditor<'_>) {
        if let Some(activity) = &self.activity {
            editor.set_activity(activity.clone());
        }
        if let Some(size) = self.size {
            editor.set_size(size);
        }
        if let Some(location) = &self.location {
            editor.set_location(location.clone());
        }
        if let Some(unit) = &self.unit {
            editor.set_unit(unit.clone());
        }
        for item in &self.add_equipment {
            editor.add_equipment(item.clone());
        }
        if let Some(classification) = self.classification {
            editor.set_classification(classification);
        }
    }
}
