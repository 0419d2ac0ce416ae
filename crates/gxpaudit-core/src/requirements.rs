//! Regulatory requirement records and their category grouping.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::value::{opt_string, string_list};

/// Keys read into typed fields. Anything else on a generated record is kept
/// in [`RequirementRecord::extra`].
const KNOWN_KEYS: &[&str] = &[
    "id",
    "regulation_name",
    "category",
    "requirement_text",
    VERBATIM_TEXT_KEY,
    "risk_level",
    "compliance_evidence",
    "common_gaps",
    "suggested_audit_focus",
];

/// Key the requirements prompt asks the model to use for quoted text.
const VERBATIM_TEXT_KEY: &str = "requirement_text (verbatim)";

/// A single auditable requirement produced by the generator.
///
/// Scalars are optional because the generator may omit any of them; list
/// fields default to empty. Unrecognised keys (for example `citation`) are
/// preserved and serialized back at the top level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequirementRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regulation_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirement_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<String>,
    #[serde(default)]
    pub compliance_evidence: Vec<String>,
    #[serde(default)]
    pub common_gaps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_audit_focus: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RequirementRecord {
    /// Build a record from one element of a generated `requirements` array.
    ///
    /// Never fails: a non-object element yields an empty record.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };

        let requirement_text =
            opt_string(obj, "requirement_text").or_else(|| opt_string(obj, VERBATIM_TEXT_KEY));

        let extra = obj
            .iter()
            .filter(|(k, _)| !KNOWN_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Self {
            id: opt_string(obj, "id"),
            regulation_name: opt_string(obj, "regulation_name"),
            category: opt_string(obj, "category"),
            requirement_text,
            risk_level: opt_string(obj, "risk_level"),
            compliance_evidence: string_list(obj, "compliance_evidence"),
            common_gaps: string_list(obj, "common_gaps"),
            suggested_audit_focus: opt_string(obj, "suggested_audit_focus"),
            extra,
        }
    }
}

/// Requirements sharing one category, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub category_name: String,
    pub requirements: Vec<RequirementRecord>,
    /// Always equal to `requirements.len()`.
    pub requirement_count: usize,
}

impl CategoryGroup {
    pub fn new(category_name: impl Into<String>) -> Self {
        Self {
            category_name: category_name.into(),
            requirements: Vec::new(),
            requirement_count: 0,
        }
    }

    pub fn push(&mut self, record: RequirementRecord) {
        self.requirements.push(record);
        self.requirement_count = self.requirements.len();
    }
}

/// Grouped requirements returned to callers.
///
/// `total_requirements == raw_requirements.len()` and equals the sum of
/// every group's `requirement_count`. A degraded result has no requirements
/// and carries `error`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequirementsResult {
    pub total_requirements: usize,
    pub categories: Vec<CategoryGroup>,
    /// The generator's items exactly as parsed.
    #[serde(default)]
    pub raw_requirements: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RequirementsResult {
    /// An empty result annotated with `error`.
    pub fn degraded(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}
