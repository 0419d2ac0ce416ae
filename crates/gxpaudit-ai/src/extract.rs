//! Locate the JSON document inside free-form model output.
//!
//! Strategies, first match wins:
//! 1. A fence labelled `json` (```` ```json ... ``` ````), case-insensitive
//! 2. Any fence (```` ``` ... ``` ````), skipping a bare language tag
//! 3. Greedy span from the first `{` to the last `}`
//!
//! This is not a tokenizer. Strategy 3 over-captures when the commentary
//! around the payload itself contains braces.

use tracing::debug;

const FENCE: &str = "```";
const JSON_FENCE: &str = "```json";

/// Which strategy located the candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMethod {
    /// Inside a fence labelled `json`.
    JsonFence,
    /// Inside the first unlabelled (or otherwise labelled) fence.
    Fence,
    /// First `{` through last `}`.
    BraceSpan,
}

/// Substring of the raw response believed to hold the JSON payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate<'a> {
    pub text: &'a str,
    pub method: ExtractionMethod,
}

/// Find the JSON candidate in `raw`.
///
/// Returns `None` when no strategy applies or the located text is blank.
/// The returned text is trimmed and borrows from `raw`.
pub fn extract(raw: &str) -> Option<Candidate<'_>> {
    let (text, method) = json_fence(raw)
        .map(|t| (t, ExtractionMethod::JsonFence))
        .or_else(|| any_fence(raw).map(|t| (t, ExtractionMethod::Fence)))
        .or_else(|| brace_span(raw).map(|t| (t, ExtractionMethod::BraceSpan)))?;

    let text = text.trim();
    if text.is_empty() {
        debug!(?method, "located JSON region is empty");
        return None;
    }

    debug!(?method, len = text.len(), "extracted JSON candidate");
    Some(Candidate { text, method })
}

/// Text after the first ```` ```json ```` label up to the next fence, or to
/// the end of input when the fence is never closed.
///
/// The label must end at whitespace or end of input, so ```` ```jsonc ````
/// is left to the generic fence rule.
fn json_fence(raw: &str) -> Option<&str> {
    // ASCII lowercasing keeps byte offsets aligned with `raw`.
    let lower = raw.to_ascii_lowercase();
    let mut from = 0;
    while let Some(i) = lower[from..].find(JSON_FENCE) {
        let start = from + i + JSON_FENCE.len();
        match raw[start..].chars().next() {
            None => return Some(until_fence(raw, start)),
            Some(c) if c.is_whitespace() => return Some(until_fence(raw, start)),
            Some(_) => from = start,
        }
    }
    None
}

fn any_fence(raw: &str) -> Option<&str> {
    let mut start = raw.find(FENCE)? + FENCE.len();

    let rest = &raw[start..];
    if let Some(nl) = rest.find('\n')
        && is_language_tag(rest[..nl].trim())
    {
        start += nl + 1;
    }

    Some(until_fence(raw, start))
}

fn until_fence(raw: &str, start: usize) -> &str {
    let end = raw[start..]
        .find(FENCE)
        .map(|i| start + i)
        .unwrap_or(raw.len());
    &raw[start..end]
}

fn is_language_tag(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '.'))
}

fn brace_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_json_is_returned_unchanged() {
        let raw = "  {\"requirements\": []}\n";
        let c = extract(raw).unwrap();
        assert_eq!(c.text, "{\"requirements\": []}");
        assert_eq!(c.method, ExtractionMethod::BraceSpan);
    }

    #[test]
    fn json_fence_returns_inner_content() {
        let raw = "Here are the requirements:\n\n```json\n{\"a\": 1}\n```\n\nLet me know!";
        let c = extract(raw).unwrap();
        assert_eq!(c.text, "{\"a\": 1}");
        assert_eq!(c.method, ExtractionMethod::JsonFence);
    }

    #[test]
    fn json_fence_label_is_case_insensitive() {
        let raw = "```JSON\n{\"a\": 1}\n```";
        let c = extract(raw).unwrap();
        assert_eq!(c.text, "{\"a\": 1}");
        assert_eq!(c.method, ExtractionMethod::JsonFence);
    }

    #[test]
    fn json_fence_preferred_over_earlier_plain_fence() {
        let raw = "```\nnot this\n```\nbut this:\n```json\n{\"b\": 2}\n```";
        assert_eq!(extract(raw).unwrap().text, "{\"b\": 2}");
    }

    #[test]
    fn unclosed_json_fence_runs_to_end() {
        let raw = "```json\n{\"a\": 1}\n";
        assert_eq!(extract(raw).unwrap().text, "{\"a\": 1}");
    }

    #[test]
    fn json_prefixed_labels_are_not_json_fences() {
        let raw = "```jsonc\n{\"a\": 1}\n```";
        let c = extract(raw).unwrap();
        assert_eq!(c.text, "{\"a\": 1}");
        assert_eq!(c.method, ExtractionMethod::Fence);

        let raw = "```json5\n{\"b\": 2}\n```\n```json\n{\"c\": 3}\n```";
        let c = extract(raw).unwrap();
        assert_eq!(c.text, "{\"c\": 3}");
        assert_eq!(c.method, ExtractionMethod::JsonFence);
    }

    #[test]
    fn json_label_on_same_line_as_payload() {
        let raw = "```json {\"a\": 1}```";
        assert_eq!(extract(raw).unwrap().text, "{\"a\": 1}");
    }

    #[test]
    fn plain_fence_used_when_no_json_label() {
        let raw = "Result:\n```\n{\"a\": 1}\n```";
        let c = extract(raw).unwrap();
        assert_eq!(c.text, "{\"a\": 1}");
        assert_eq!(c.method, ExtractionMethod::Fence);
    }

    #[test]
    fn plain_fence_skips_language_tag() {
        let raw = "```javascript\n{\"a\": 1}\n```";
        assert_eq!(extract(raw).unwrap().text, "{\"a\": 1}");
    }

    #[test]
    fn greedy_brace_span_with_commentary() {
        let raw = "Sure! Here is the analysis you asked for: {\"x\": {\"y\": 1}} Hope it helps.";
        let c = extract(raw).unwrap();
        assert_eq!(c.text, "{\"x\": {\"y\": 1}}");
        assert_eq!(c.method, ExtractionMethod::BraceSpan);
    }

    #[test]
    fn greedy_span_over_captures_braces_in_commentary() {
        // Known limitation: trailing prose with a brace is swallowed.
        let raw = "{\"a\": 1} and a stray } here";
        assert_eq!(extract(raw).unwrap().text, "{\"a\": 1} and a stray }");
    }

    #[test]
    fn no_braces_or_fences_is_not_found() {
        assert!(extract("I'm sorry, I can't produce that list right now.").is_none());
    }

    #[test]
    fn reversed_braces_are_not_found() {
        assert!(extract("} nothing here {").is_none());
    }

    #[test]
    fn empty_fence_is_not_found() {
        assert!(extract("```json\n   \n```").is_none());
    }
}
