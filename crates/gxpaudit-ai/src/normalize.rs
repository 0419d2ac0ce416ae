//! Reshape parsed payloads into the requirements and analysis records.
//!
//! Defaulting policy, declared once:
//!
//! | field                        | absent / blank          |
//! |------------------------------|-------------------------|
//! | `requirements`               | empty list              |
//! | requirement `category`       | `"Other"`               |
//! | any list field               | empty list              |
//! | `compliance_status`          | `gap`                   |
//! | `severity`                   | `medium`                |
//! | `analysis`                   | empty string            |
//! | optional text fields         | omitted                 |

use std::collections::HashMap;

use gxpaudit_core::value::{opt_string, scalar_string, string_list};
use gxpaudit_core::{
    AnalysisResult, CategoryGroup, ComplianceStatus, MatchedRequirement, RequirementRecord,
    RequirementsResult, Severity,
};
use serde_json::{Map, Value};
use tracing::warn;

/// Group name for requirements without a category.
pub const OTHER_CATEGORY: &str = "Other";

/// Group a `{"requirements": [...]}` payload by category.
///
/// Categories appear in order of first occurrence; items keep input order
/// within a category. Nothing is dropped or deduplicated.
pub fn normalize_requirements(payload: Value) -> RequirementsResult {
    let items = match payload {
        Value::Object(mut obj) => match obj.remove("requirements") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items,
            Some(other) => {
                warn!(found = json_kind(&other), "`requirements` is not an array, treating as empty");
                Vec::new()
            }
        },
        other => {
            warn!(found = json_kind(&other), "requirements payload is not an object, treating as empty");
            Vec::new()
        }
    };

    let mut categories: Vec<CategoryGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for item in &items {
        let record = RequirementRecord::from_value(item);
        let name = category_name(&record);
        let slot = match index.get(name) {
            Some(&slot) => slot,
            None => {
                categories.push(CategoryGroup::new(name));
                index.insert(name.to_string(), categories.len() - 1);
                categories.len() - 1
            }
        };
        categories[slot].push(record);
    }

    RequirementsResult {
        total_requirements: items.len(),
        categories,
        raw_requirements: items,
        error: None,
    }
}

fn category_name(record: &RequirementRecord) -> &str {
    record
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(OTHER_CATEGORY)
}

/// Keys read into typed [`AnalysisResult`] fields. Anything else is kept in
/// [`AnalysisResult::extra`].
const ANALYSIS_KEYS: &[&str] = &[
    "matched_requirements",
    "compliance_status",
    "severity",
    "additional_citations",
    "analysis",
    "recommendations",
    "key_findings",
    "evidence_needed",
    "visual_findings",
    "suggested_observation_text",
];

/// Apply analysis defaults without restructuring.
///
/// Unknown `compliance_status` / `severity` values pass through as-is, as do
/// unknown keys. A payload that is not a JSON object yields a degraded
/// result.
pub fn normalize_analysis(payload: Value) -> AnalysisResult {
    let obj = match payload {
        Value::Object(obj) => obj,
        other => {
            warn!(found = json_kind(&other), "analysis payload is not an object");
            return AnalysisResult::degraded("Failed to parse AI response: expected a JSON object");
        }
    };

    AnalysisResult {
        matched_requirements: matched_requirements(&obj),
        compliance_status: opt_string(&obj, "compliance_status")
            .map(ComplianceStatus::from)
            .unwrap_or_default(),
        severity: opt_string(&obj, "severity")
            .map(Severity::from)
            .unwrap_or_default(),
        additional_citations: string_list(&obj, "additional_citations"),
        analysis: opt_string(&obj, "analysis").unwrap_or_default(),
        recommendations: string_list(&obj, "recommendations"),
        key_findings: string_list(&obj, "key_findings"),
        evidence_needed: string_list(&obj, "evidence_needed"),
        visual_findings: opt_string(&obj, "visual_findings"),
        suggested_observation_text: opt_string(&obj, "suggested_observation_text"),
        error: None,
        extra: obj
            .iter()
            .filter(|(k, _)| !ANALYSIS_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    }
}

fn matched_requirements(obj: &Map<String, Value>) -> Vec<MatchedRequirement> {
    let items = match obj.get("matched_requirements") {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(items)) => items.as_slice(),
        // A lone entry counts as a one-element list.
        Some(single) => std::slice::from_ref(single),
    };

    items
        .iter()
        .filter(|v| !v.is_null())
        .map(|item| match item {
            Value::Object(m) => matched_requirement(m),
            // A bare id, e.g. `["req_001"]`.
            other => MatchedRequirement {
                requirement_id: scalar_string(other),
                ..MatchedRequirement::default()
            },
        })
        .collect()
}

/// A `confidence` that is not numeric stays in `extra` untouched.
fn matched_requirement(m: &Map<String, Value>) -> MatchedRequirement {
    let confidence = m.get("confidence").and_then(confidence);
    MatchedRequirement {
        requirement_id: opt_string(m, "requirement_id"),
        confidence,
        reasoning: opt_string(m, "reasoning"),
        extra: m
            .iter()
            .filter(|(k, _)| match k.as_str() {
                "requirement_id" | "reasoning" => false,
                "confidence" => confidence.is_none(),
                _ => true,
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    }
}

fn confidence(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn names(result: &RequirementsResult) -> Vec<&str> {
        result
            .categories
            .iter()
            .map(|c| c.category_name.as_str())
            .collect()
    }

    #[test]
    fn categories_in_first_seen_order() {
        let payload = json!({"requirements": [
            {"id": "r1", "category": "Training"},
            {"id": "r2", "category": "Documentation"},
            {"id": "r3", "category": "Training"},
        ]});
        let result = normalize_requirements(payload);
        assert_eq!(names(&result), vec!["Training", "Documentation"]);
        let training: Vec<_> = result.categories[0]
            .requirements
            .iter()
            .map(|r| r.id.as_deref().unwrap())
            .collect();
        assert_eq!(training, vec!["r1", "r3"]);
    }

    #[test]
    fn counts_are_consistent() {
        let cats = ["A", "B", "C", "A", "", "B", "A"];
        let items: Vec<Value> = cats
            .iter()
            .enumerate()
            .map(|(i, c)| json!({"id": format!("req_{i:03}"), "category": c}))
            .collect();
        let result = normalize_requirements(json!({ "requirements": items }));

        assert_eq!(result.total_requirements, cats.len());
        assert_eq!(result.raw_requirements.len(), cats.len());
        let sum: usize = result.categories.iter().map(|c| c.requirement_count).sum();
        assert_eq!(sum, cats.len());
        for group in &result.categories {
            assert_eq!(group.requirement_count, group.requirements.len());
        }
    }

    #[test]
    fn blank_or_missing_category_goes_to_other() {
        let payload = json!({"requirements": [
            {"id": "r1"},
            {"id": "r2", "category": "   "},
            {"id": "r3", "category": null},
            {"id": "r4", "category": "Training"},
        ]});
        let result = normalize_requirements(payload);
        assert_eq!(names(&result), vec!["Other", "Training"]);
        assert_eq!(result.categories[0].requirement_count, 3);
    }

    #[test]
    fn category_names_are_trimmed() {
        let payload = json!({"requirements": [
            {"category": "Training"},
            {"category": " Training "},
        ]});
        let result = normalize_requirements(payload);
        assert_eq!(names(&result), vec!["Training"]);
        assert_eq!(result.categories[0].requirement_count, 2);
    }

    #[test]
    fn raw_requirements_untouched() {
        let items = json!([
            {"id": "r1", "category": "Training", "citation": "21 CFR 211.25"},
            "stray string item",
        ]);
        let result = normalize_requirements(json!({ "requirements": items.clone() }));
        assert_eq!(Value::Array(result.raw_requirements.clone()), items);
        assert_eq!(result.total_requirements, 2);
        assert_eq!(names(&result), vec!["Training", "Other"]);
    }

    #[test]
    fn missing_requirements_field_is_empty() {
        let result = normalize_requirements(json!({"something_else": true}));
        assert_eq!(result, RequirementsResult::default());
    }

    #[test]
    fn non_array_requirements_is_empty() {
        let result = normalize_requirements(json!({"requirements": "none"}));
        assert_eq!(result.total_requirements, 0);
        assert!(result.categories.is_empty());
        assert!(result.error.is_none());
    }

    #[test]
    fn analysis_defaults_applied() {
        let result = normalize_analysis(json!({"analysis": "Door left open"}));
        assert_eq!(result.compliance_status, ComplianceStatus::Gap);
        assert_eq!(result.severity, Severity::Medium);
        assert!(result.matched_requirements.is_empty());
        assert!(result.recommendations.is_empty());
        assert!(result.key_findings.is_empty());
        assert!(result.evidence_needed.is_empty());
        assert!(result.additional_citations.is_empty());
        assert_eq!(result.analysis, "Door left open");
        assert!(result.visual_findings.is_none());
        assert!(result.error.is_none());
    }

    #[test]
    fn analysis_fields_pass_through() {
        let payload = json!({
            "matched_requirements": [
                {"requirement_id": "req_001", "confidence": 0.95, "reasoning": "EM timeliness"},
                "req_007"
            ],
            "compliance_status": "non_compliant",
            "severity": "critical",
            "additional_citations": ["21 CFR 211.22"],
            "recommendations": ["Initiate CAPA"],
            "key_findings": ["Investigation 5 days late"],
            "evidence_needed": ["Investigation report EX-24-0312"],
            "visual_findings": "Image 1 shows an open door",
            "suggested_observation_text": "During the walkthrough..."
        });
        let result = normalize_analysis(payload);
        assert_eq!(result.matched_requirements.len(), 2);
        assert_eq!(result.matched_requirements[0].requirement_id.as_deref(), Some("req_001"));
        assert_eq!(result.matched_requirements[0].confidence, Some(0.95));
        assert_eq!(result.matched_requirements[1].requirement_id.as_deref(), Some("req_007"));
        assert_eq!(result.compliance_status, ComplianceStatus::NonCompliant);
        assert_eq!(result.severity, Severity::Critical);
        assert_eq!(result.additional_citations, vec!["21 CFR 211.22"]);
        assert_eq!(result.visual_findings.as_deref(), Some("Image 1 shows an open door"));
    }

    #[test]
    fn analysis_unknown_enum_values_pass_through() {
        let result = normalize_analysis(json!({"compliance_status": "observation", "severity": "low"}));
        assert_eq!(result.compliance_status, ComplianceStatus::Other("observation".into()));
        assert_eq!(result.severity, Severity::Other("low".into()));
    }

    #[test]
    fn analysis_confidence_accepts_numeric_strings() {
        let result = normalize_analysis(json!({
            "matched_requirements": [{"requirement_id": "r", "confidence": "0.8", "note": "x"}]
        }));
        let m = &result.matched_requirements[0];
        assert_eq!(m.confidence, Some(0.8));
        assert_eq!(m.extra["note"], "x");
    }

    #[test]
    fn analysis_keeps_unparseable_confidence() {
        let result = normalize_analysis(json!({
            "matched_requirements": [{"requirement_id": "req_001", "confidence": "high", "reasoning": "r"}]
        }));
        let m = &result.matched_requirements[0];
        assert_eq!(m.confidence, None);
        assert_eq!(m.extra["confidence"], "high");

        let out = serde_json::to_value(m).unwrap();
        assert_eq!(out, json!({"requirement_id": "req_001", "confidence": "high", "reasoning": "r"}));
    }

    #[test]
    fn analysis_unknown_top_level_keys_pass_through() {
        let result = normalize_analysis(json!({"severity": "major", "risk_rating": "elevated"}));
        assert_eq!(result.extra["risk_rating"], "elevated");
        assert!(!result.extra.contains_key("severity"));

        let out = serde_json::to_value(&result).unwrap();
        assert_eq!(out["risk_rating"], "elevated");
    }

    #[test]
    fn lone_matched_requirement_becomes_list() {
        let result = normalize_analysis(json!({
            "matched_requirements": {"requirement_id": "req_001", "confidence": 0.9}
        }));
        assert_eq!(result.matched_requirements.len(), 1);
        assert_eq!(result.matched_requirements[0].requirement_id.as_deref(), Some("req_001"));
        assert_eq!(result.matched_requirements[0].confidence, Some(0.9));

        let result = normalize_analysis(json!({"matched_requirements": "req_004"}));
        assert_eq!(result.matched_requirements[0].requirement_id.as_deref(), Some("req_004"));

        let result = normalize_analysis(json!({"matched_requirements": null}));
        assert!(result.matched_requirements.is_empty());
    }

    #[test]
    fn analysis_non_object_is_degraded() {
        let result = normalize_analysis(json!(["not", "an", "object"]));
        assert!(result.is_degraded());
        assert_eq!(result.compliance_status, ComplianceStatus::Gap);
    }
}
