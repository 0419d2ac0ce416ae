//! Audit observation records as exchanged with the audit front end.
//!
//! Field names are camelCase on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::analysis::{ComplianceStatus, Severity};

/// Auditor recorded when a new observation does not name one.
pub const DEFAULT_AUDITOR: &str = "Current User";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationMetadata {
    pub location: String,
    pub auditor: String,
    pub interviewed: String,
    pub image_description: String,
    pub audio_transcription: String,
    pub handwritten_transcription: String,
    pub timestamp: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

/// A stored observation.
///
/// `linked_requirement` mirrors the first entry of `linked_requirements` for
/// clients that only understand a single link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub id: String,
    pub linked_requirement: Option<Value>,
    pub linked_requirements: Vec<Value>,
    pub observation_text: String,
    pub compliance_status: ComplianceStatus,
    pub severity: Severity,
    pub category: String,
    pub evidence: Vec<Value>,
    pub metadata: ObservationMetadata,
    pub ai_analysis: Value,
    pub follow_up: Vec<Value>,
    pub tags: Vec<String>,
}

impl Observation {
    /// `id` of the primary linked requirement, if any.
    pub fn primary_requirement_id(&self) -> Option<&str> {
        self.linked_requirement
            .as_ref()
            .and_then(|r| r.get("id"))
            .and_then(Value::as_str)
    }
}

/// Request body for creating an observation. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewObservation {
    #[serde(deserialize_with = "null_as_empty")]
    pub linked_requirements: Vec<Value>,
    /// Legacy single link, used only when `linked_requirements` is empty.
    pub linked_requirement: Option<Value>,
    pub observation_text: Option<String>,
    pub compliance_status: Option<ComplianceStatus>,
    pub severity: Option<Severity>,
    pub category: Option<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub evidence: Vec<Value>,
    pub location: Option<String>,
    pub auditor: Option<String>,
    pub interviewed: Option<String>,
    pub image_description: Option<String>,
    pub audio_transcription: Option<String>,
    pub handwritten_transcription: Option<String>,
    pub ai_analysis: Option<Value>,
    #[serde(deserialize_with = "null_as_empty")]
    pub follow_up: Vec<Value>,
    #[serde(deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
}

/// An explicit `null` list reads the same as an absent one.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Partial update. `None` leaves the stored value unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ObservationUpdate {
    pub observation_text: Option<String>,
    pub compliance_status: Option<ComplianceStatus>,
    pub severity: Option<Severity>,
    pub evidence: Option<Vec<Value>>,
    pub follow_up: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub compliant: usize,
    pub gap: usize,
    pub non_compliant: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub critical: usize,
    pub major: usize,
    pub minor: usize,
}

/// Aggregate counts over all stored observations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationStats {
    pub total: usize,
    pub by_status: StatusCounts,
    pub by_severity: SeverityCounts,
    pub total_evidence: usize,
}
