//! Format-aware tool-result truncation.
//!
//! Tool output is always truncated before it becomes a tool-role message so
//! a single chatty tool cannot flood the context window. JSON payloads are
//! pretty-printed and prefix-truncated so the visible portion still looks
//! like JSON; plain text is head-truncated. Both carry a sentinel telling
//! the model not to re-run the tool just to see the tail.

use std::sync::LazyLock;

use regex::Regex;

use crate::text::truncate_str;

/// Default cap for tool output included in model context.
pub const DEFAULT_TOOL_RESULT_MAX_CHARS: usize = 3000;

static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*[a-zA-Z]").expect("static pattern"));

/// Truncate a tool result to keep model context lean.
///
/// Strips ANSI escape codes, then applies format-aware truncation:
/// - JSON is pretty-printed and prefix-truncated so visible output stays
///   a valid-looking prefix.
/// - Plain text uses head truncation with an explicit sentinel.
#[must_use]
pub fn truncate_tool_result(result: &str, max_chars: usize) -> String {
    let clean = ANSI_ESCAPE.replace_all(result, "");
    if clean.len() <= max_chars {
        return clean.into_owned();
    }

    let stripped = clean.trim_start();
    if stripped.starts_with('{') || stripped.starts_with('[') {
        if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(&clean) {
            // Pretty form can be shorter than the raw input when the raw
            // carried heavy indentation.
            let pretty =
                serde_json::to_string_pretty(&parsed).unwrap_or_else(|_| clean.to_string());
            if pretty.len() <= max_chars {
                return pretty;
            }
            let budget = max_chars.saturating_sub(120);
            return format!(
                "{}\n\n... [JSON truncated - showed {budget} of {} chars. \
                 Do NOT re-run this tool to see more.]",
                truncate_str(&pretty, budget),
                pretty.len(),
            );
        }
    }

    let budget = max_chars.saturating_sub(100);
    format!(
        "{}\n\n... [truncated - showed {budget} of {} chars. \
         Do NOT re-run this tool to see more.]",
        truncate_str(&clean, budget),
        clean.len(),
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_output_unchanged() {
        assert_eq!(truncate_tool_result("hello", 3000), "hello");
    }

    #[test]
    fn strips_ansi_codes() {
        let colored = "\x1b[31merror\x1b[0m: boom";
        assert_eq!(truncate_tool_result(colored, 3000), "error: boom");
    }

    #[test]
    fn output_never_exceeds_budget_plus_sentinel() {
        let big = "z".repeat(50_000);
        let out = truncate_tool_result(&big, 3000);
        // Head budget is max - 100 and the sentinel fits in that reserve.
        assert!(out.len() <= 3000);
        assert!(out.contains("Do NOT re-run this tool"));
    }

    #[test]
    fn plain_text_head_truncated() {
        let big = format!("first line\n{}", "x".repeat(10_000));
        let out = truncate_tool_result(&big, 500);
        assert!(out.starts_with("first line"));
        assert!(out.contains("showed 400 of"));
    }

    #[test]
    fn json_within_budget_returned_as_is() {
        let raw = r#"{"a":1,"b":[1,2,3]}"#;
        assert_eq!(truncate_tool_result(raw, 3000), raw);
    }

    #[test]
    fn oversized_json_pretty_prefix() {
        let raw = serde_json::json!({
            "items": (0..500).map(|i| format!("item-{i}")).collect::<Vec<_>>()
        })
        .to_string();
        let out = truncate_tool_result(&raw, 1000);
        assert!(out.starts_with("{\n  \"items\""));
        assert!(out.contains("[JSON truncated"));
        assert!(out.len() <= 1000);
    }

    #[test]
    fn heavily_indented_json_collapses_to_exact_pretty() {
        // Raw form is over budget purely from whitespace; its pretty form
        // fits, so the output is exactly the pretty-printed input.
        let raw = format!("{{\n{}\"a\": 1\n}}", " ".repeat(500));
        let out = truncate_tool_result(&raw, 100);
        assert_eq!(out, "{\n  \"a\": 1\n}");
    }

    #[test]
    fn invalid_json_falls_back_to_text_truncation() {
        let raw = format!("{{ not json {}", "x".repeat(5000));
        let out = truncate_tool_result(&raw, 300);
        assert!(out.contains("[truncated"));
        assert!(!out.contains("[JSON truncated"));
    }

    #[test]
    fn multibyte_output_truncates_safely() {
        let big = "é".repeat(5000);
        let out = truncate_tool_result(&big, 401);
        assert!(out.contains("[truncated"));
    }
}
