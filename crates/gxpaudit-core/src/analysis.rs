//! Observation analysis records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Compliance verdict for an observation.
///
/// Values outside the known set are carried through in [`Other`](Self::Other)
/// rather than rejected; callers decide whether to accept them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ComplianceStatus {
    Compliant,
    #[default]
    Gap,
    NonCompliant,
    Other(String),
}

impl ComplianceStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Compliant => "compliant",
            Self::Gap => "gap",
            Self::NonCompliant => "non_compliant",
            Self::Other(s) => s,
        }
    }
}

impl From<&str> for ComplianceStatus {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "compliant" => Self::Compliant,
            "gap" => Self::Gap,
            "non_compliant" => Self::NonCompliant,
            _ => Self::Other(s.to_string()),
        }
    }
}

impl From<String> for ComplianceStatus {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<ComplianceStatus> for String {
    fn from(status: ComplianceStatus) -> Self {
        match status {
            ComplianceStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

/// Severity of a gap or non-compliance. Defaults to `medium`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    Critical,
    Major,
    Minor,
    #[default]
    Medium,
    Other(String),
}

impl Severity {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Critical => "critical",
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Medium => "medium",
            Self::Other(s) => s,
        }
    }
}

impl From<&str> for Severity {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" => Self::Critical,
            "major" => Self::Major,
            "minor" => Self::Minor,
            "medium" => Self::Medium,
            _ => Self::Other(s.to_string()),
        }
    }
}

impl From<String> for Severity {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<Severity> for String {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

/// A requirement the model linked to the observation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchedRequirement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirement_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Normalized model analysis of one audit observation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub matched_requirements: Vec<MatchedRequirement>,
    #[serde(default)]
    pub compliance_status: ComplianceStatus,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub additional_citations: Vec<String>,
    #[serde(default)]
    pub analysis: String,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub key_findings: Vec<String>,
    #[serde(default)]
    pub evidence_needed: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_findings: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_observation_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Top-level keys the model returned beyond the known fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnalysisResult {
    /// Default-populated result carrying `error`.
    pub fn degraded(error: impl Into<String>) -> Self {
        Self {
            analysis: "Unable to parse AI response".to_string(),
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_parses_known_values() {
        assert_eq!(ComplianceStatus::from("compliant"), ComplianceStatus::Compliant);
        assert_eq!(ComplianceStatus::from("GAP"), ComplianceStatus::Gap);
        assert_eq!(ComplianceStatus::from("non_compliant"), ComplianceStatus::NonCompliant);
        assert_eq!(ComplianceStatus::from("Non-Compliant"), ComplianceStatus::NonCompliant);
    }

    #[test]
    fn status_passes_unknown_through() {
        let status = ComplianceStatus::from("needs review");
        assert_eq!(status, ComplianceStatus::Other("needs review".into()));
        assert_eq!(serde_json::to_value(&status).unwrap(), json!("needs review"));
    }

    #[test]
    fn severity_defaults_to_medium() {
        assert_eq!(Severity::default(), Severity::Medium);
        assert_eq!(Severity::default().as_str(), "medium");
    }

    #[test]
    fn severity_serde_uses_lowercase_names() {
        let s: Severity = serde_json::from_value(json!("Critical")).unwrap();
        assert_eq!(s, Severity::Critical);
        assert_eq!(serde_json::to_value(Severity::Major).unwrap(), json!("major"));
    }

    #[test]
    fn degraded_analysis_has_defaults_and_error() {
        let result = AnalysisResult::degraded("Failed to parse AI response");
        let out = serde_json::to_value(&result).unwrap();
        assert_eq!(out["compliance_status"], "gap");
        assert_eq!(out["severity"], "medium");
        assert_eq!(out["matched_requirements"], json!([]));
        assert_eq!(out["recommendations"], json!([]));
        assert_eq!(out["error"], "Failed to parse AI response");
        assert!(out.get("visual_findings").is_none());
    }

    #[test]
    fn extra_keys_serialize_at_top_level() {
        let mut result = AnalysisResult::default();
        result.extra.insert("risk_rating".into(), json!("elevated"));
        let out = serde_json::to_value(&result).unwrap();
        assert_eq!(out["risk_rating"], "elevated");
        assert_eq!(out["severity"], "medium");
    }
}
