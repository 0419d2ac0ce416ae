//! Text cards for requirements, analyses, and observations.
//!
//! Each renderer writes to any `io::Write` so the CLI can target stdout and
//! tests can capture output.

use std::io::{self, Write};

use gxpaudit_core::{AnalysisResult, Observation, ObservationStats, RequirementsResult};

const MAX_LIST_ITEMS: usize = 10;
const MAX_TEXT_CHARS: usize = 100;

// ── Requirements ──

pub fn write_requirements_card(out: &mut impl Write, result: &RequirementsResult) -> io::Result<()> {
    writeln!(
        out,
        "=== Requirements ({} in {} categories) ===",
        result.total_requirements,
        result.categories.len()
    )?;
    if let Some(error) = &result.error {
        writeln!(out, "  error: {error}")?;
    }
    writeln!(out)?;

    for group in &result.categories {
        writeln!(out, "{} ({}):", group.category_name, group.requirement_count)?;
        for req in group.requirements.iter().take(MAX_LIST_ITEMS) {
            let id = req.id.as_deref().unwrap_or("-");
            write!(out, "    {id:<12}")?;
            if let Some(risk) = &req.risk_level {
                write!(out, "  [{risk}]")?;
            }
            if let Some(regulation) = &req.regulation_name {
                write!(out, "  {regulation}")?;
            }
            writeln!(out)?;
            if let Some(text) = &req.requirement_text {
                writeln!(out, "      {}", truncate(text, MAX_TEXT_CHARS))?;
            }
        }
        more(out, group.requirements.len())?;
        writeln!(out)?;
    }
    Ok(())
}

// ── Analysis ──

pub fn write_analysis_card(out: &mut impl Write, result: &AnalysisResult) -> io::Result<()> {
    writeln!(out, "=== Observation Analysis ===")?;
    if let Some(error) = &result.error {
        writeln!(out, "  error: {error}")?;
    }
    writeln!(out)?;

    writeln!(out, "Assessment")?;
    field(out, "compliance_status", result.compliance_status.as_str())?;
    field(out, "severity", result.severity.as_str())?;
    if !result.analysis.is_empty() {
        field(out, "analysis", &result.analysis)?;
    }
    if let Some(visual) = &result.visual_findings {
        field(out, "visual_findings", visual)?;
    }
    if let Some(text) = &result.suggested_observation_text {
        field(out, "suggested_text", text)?;
    }
    writeln!(out)?;

    if !result.matched_requirements.is_empty() {
        writeln!(out, "Matched Requirements ({}):", result.matched_requirements.len())?;
        for m in result.matched_requirements.iter().take(MAX_LIST_ITEMS) {
            write!(out, "    {:<12}", m.requirement_id.as_deref().unwrap_or("-"))?;
            if let Some(c) = m.confidence {
                write!(out, "  {:.0}%", c * 100.0)?;
            }
            writeln!(out)?;
            if let Some(reasoning) = &m.reasoning {
                writeln!(out, "      {}", truncate(reasoning, MAX_TEXT_CHARS))?;
            }
        }
        more(out, result.matched_requirements.len())?;
        writeln!(out)?;
    }

    list_section(out, "Key Findings", &result.key_findings)?;
    list_section(out, "Recommendations", &result.recommendations)?;
    list_section(out, "Evidence Needed", &result.evidence_needed)?;
    list_section(out, "Additional Citations", &result.additional_citations)?;
    Ok(())
}

// ── Observations ──

pub fn write_observation_list(out: &mut impl Write, observations: &[&Observation]) -> io::Result<()> {
    writeln!(out, "=== Observations ({}) ===", observations.len())?;
    writeln!(out)?;
    for obs in observations {
        writeln!(
            out,
            "  {:<10} {:<14} {:<9} {}",
            obs.id,
            obs.compliance_status.as_str(),
            obs.severity.as_str(),
            obs.primary_requirement_id().unwrap_or("-"),
        )?;
        if !obs.observation_text.is_empty() {
            writeln!(out, "      {}", truncate(&obs.observation_text, MAX_TEXT_CHARS))?;
        }
    }
    Ok(())
}

pub fn write_stats(out: &mut impl Write, stats: &ObservationStats) -> io::Result<()> {
    writeln!(out, "=== Observation Statistics ===")?;
    writeln!(out)?;
    field(out, "total", &stats.total.to_string())?;
    field(out, "total_evidence", &stats.total_evidence.to_string())?;
    writeln!(out)?;
    writeln!(out, "By Status")?;
    field(out, "compliant", &stats.by_status.compliant.to_string())?;
    field(out, "gap", &stats.by_status.gap.to_string())?;
    field(out, "non_compliant", &stats.by_status.non_compliant.to_string())?;
    writeln!(out)?;
    writeln!(out, "By Severity")?;
    field(out, "critical", &stats.by_severity.critical.to_string())?;
    field(out, "major", &stats.by_severity.major.to_string())?;
    field(out, "minor", &stats.by_severity.minor.to_string())?;
    Ok(())
}

// ── Helpers ──

fn field(out: &mut impl Write, name: &str, value: &str) -> io::Result<()> {
    writeln!(out, "  {name:<26} {value}")
}

fn list_section(out: &mut impl Write, header: &str, items: &[String]) -> io::Result<()> {
    if items.is_empty() {
        return Ok(());
    }
    writeln!(out, "{header} ({}):", items.len())?;
    for item in items.iter().take(MAX_LIST_ITEMS) {
        writeln!(out, "    - {}", truncate(item, MAX_TEXT_CHARS))?;
    }
    more(out, items.len())?;
    writeln!(out)
}

fn more(out: &mut impl Write, len: usize) -> io::Result<()> {
    if len > MAX_LIST_ITEMS {
        writeln!(out, "    ... and {} more", len - MAX_LIST_ITEMS)?;
    }
    Ok(())
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let head: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{head}...")
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gxpaudit_core::{CategoryGroup, RequirementRecord};

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> io::Result<()>,
    {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn requirements_card_caps_long_groups() {
        let mut group = CategoryGroup::new("Training");
        for i in 0..13 {
            group.push(RequirementRecord {
                id: Some(format!("req_{i:03}")),
                ..RequirementRecord::default()
            });
        }
        let result = RequirementsResult {
            total_requirements: 13,
            categories: vec![group],
            ..RequirementsResult::default()
        };

        let text = render(|out| write_requirements_card(out, &result));
        assert!(text.contains("=== Requirements (13 in 1 categories) ==="));
        assert!(text.contains("Training (13):"));
        assert!(text.contains("req_009"));
        assert!(!text.contains("req_010"));
        assert!(text.contains("... and 3 more"));
    }

    #[test]
    fn degraded_analysis_shows_error_and_defaults() {
        let result = AnalysisResult::degraded("Failed to parse AI response: no JSON found");
        let text = render(|out| write_analysis_card(out, &result));
        assert!(text.contains("error: Failed to parse AI response: no JSON found"));
        assert!(text.contains("compliance_status"));
        assert!(text.contains("gap"));
        assert!(text.contains("medium"));
        assert!(!text.contains("Key Findings"));
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("overflow", 2), "...");
        assert_eq!(truncate("ééééééééééé", 6), "ééé...");
    }
}
