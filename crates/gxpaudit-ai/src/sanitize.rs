//! Textual repairs for JSON candidates.
//!
//! [`sanitize`] runs before every parse attempt. [`escape_control_chars_in_strings`]
//! runs only in the repair pass, after a strict parse has already failed.
//! Every function here is pure, total, and idempotent.

/// Byte-order mark, plus the UTF-8 BOM bytes decoded as Latin-1.
const ENCODING_MARKERS: &[char] = &['\u{feff}', '\u{ef}', '\u{bb}', '\u{bf}'];

/// Strip leading encoding markers, then drop trailing commas before `}`/`]`.
///
/// `sanitize(sanitize(x)) == sanitize(x)` for every `x`.
pub fn sanitize(candidate: &str) -> String {
    strip_trailing_commas(strip_encoding_markers(candidate))
}

/// Remove leading BOM / encoding-marker characters.
pub fn strip_encoding_markers(s: &str) -> &str {
    s.trim_start_matches(ENCODING_MARKERS)
}

/// Remove commas (and the whitespace after them) that immediately precede a
/// closing `}` or `]` outside string literals.
///
/// Whitespace before the removed comma is kept, matching `,\s*}` → `}`.
pub fn strip_trailing_commas(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_string = false;
    let mut escaped = false;

    for ch in s.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            out.push(ch);
            continue;
        }

        match ch {
            '"' => in_string = true,
            '}' | ']' => loop {
                let kept = out.trim_end().len();
                if !out[..kept].ends_with(',') {
                    break;
                }
                out.truncate(kept - 1);
            },
            _ => {}
        }
        out.push(ch);
    }

    out
}

/// Escape raw control characters (U+0000 to U+001F) that sit inside string
/// literals. `\n`, `\r` and `\t` get their short forms, the rest `\u00XX`.
///
/// Best-effort: string boundaries come from a quote-parity scan, so an
/// unescaped `"` inside a value flips the parity and the remainder of the
/// document is classified the wrong way round.
pub fn escape_control_chars_in_strings(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 16);
    let mut in_string = false;
    let mut escaped = false;

    for ch in s.chars() {
        if !in_string {
            if ch == '"' {
                in_string = true;
            }
            out.push(ch);
            continue;
        }

        if escaped {
            escaped = false;
            out.push(ch);
            continue;
        }

        match ch {
            '\\' => {
                escaped = true;
                out.push(ch);
            }
            '"' => {
                in_string = false;
                out.push(ch);
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c < '\u{20}' => out.push_str(&format!("\\u{:04x}", c as u32)),
            _ => out.push(ch),
        }
    }

    out
}

/// Full repair pass: [`sanitize`] then [`escape_control_chars_in_strings`].
pub fn repair(candidate: &str) -> String {
    escape_control_chars_in_strings(&sanitize(candidate))
}
