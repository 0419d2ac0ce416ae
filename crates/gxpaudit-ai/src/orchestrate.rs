//! Strict parse with a single heuristic repair retry.

use std::fmt;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::extract::{ExtractionMethod, extract};
use crate::sanitize::{escape_control_chars_in_strings, sanitize};

/// Characters of the raw response kept for diagnostics on failure.
pub const DEFAULT_PREVIEW_CHARS: usize = 500;

/// Tunables shared by the parsing pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Upper bound on the failure preview, in characters.
    pub preview_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            preview_chars: DEFAULT_PREVIEW_CHARS,
        }
    }
}

/// Which parse attempt produced the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseAttempt {
    /// First parse of the sanitized candidate.
    Strict,
    /// The strict parse failed; the repair pass succeeded.
    Repaired,
}

/// A successfully recovered payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    pub value: T,
    pub method: ExtractionMethod,
    pub attempt: ParseAttempt,
}

/// Terminal failure kinds.
///
/// A failed strict parse is not listed: it only triggers the repair pass and
/// is visible afterwards as [`ParseAttempt::Repaired`] or as a
/// [`RepairParseFailed`](Self::RepairParseFailed) cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NoCandidateFound,
    RepairParseFailed,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCandidateFound => f.write_str("no JSON found in model response"),
            Self::RepairParseFailed => f.write_str("model response is not valid JSON after repair"),
        }
    }
}

/// Why a raw response could not be turned into JSON.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}{}", .cause.as_deref().map(|c| format!(": {c}")).unwrap_or_default())]
pub struct ParseFailure {
    pub kind: FailureKind,
    /// Prefix of the raw response, at most `preview_chars` characters.
    pub preview: String,
    /// Parser error from the last attempt, when one was made.
    pub cause: Option<String>,
}

pub type PipelineResult<T> = Result<Parsed<T>, ParseFailure>;

/// Recover a JSON value from raw model output.
///
/// Extract, sanitize, and parse strictly. If that fails, escape control
/// characters inside strings and parse exactly once more.
pub fn orchestrate(raw: &str, config: &PipelineConfig) -> PipelineResult<Value> {
    let Some(candidate) = extract(raw) else {
        return Err(ParseFailure {
            kind: FailureKind::NoCandidateFound,
            preview: preview(raw, config.preview_chars),
            cause: None,
        });
    };

    let cleaned = sanitize(candidate.text);
    let strict_err = match serde_json::from_str::<Value>(&cleaned) {
        Ok(value) => {
            return Ok(Parsed {
                value,
                method: candidate.method,
                attempt: ParseAttempt::Strict,
            });
        }
        Err(e) => e,
    };

    warn!(
        error = %strict_err,
        method = ?candidate.method,
        "strict JSON parse failed, retrying with repair pass"
    );

    let repaired = escape_control_chars_in_strings(&cleaned);
    match serde_json::from_str::<Value>(&repaired) {
        Ok(value) => {
            debug!("repair pass recovered JSON");
            Ok(Parsed {
                value,
                method: candidate.method,
                attempt: ParseAttempt::Repaired,
            })
        }
        Err(e) => Err(ParseFailure {
            kind: FailureKind::RepairParseFailed,
            preview: preview(raw, config.preview_chars),
            cause: Some(e.to_string()),
        }),
    }
}

/// First `max_chars` characters of `raw`.
pub fn preview(raw: &str, max_chars: usize) -> String {
    raw.chars().take(max_chars).collect()
}
