//! Tool-call extraction from free-form model output.
//!
//! A directive is a JSON object of the shape
//! `{"tool_call": {"name": "...", "arguments": {...}}}`, optionally inside a
//! ```` ```json ```` fence. Extraction runs two passes:
//!
//! 1. every fenced JSON block, in order;
//! 2. only if pass 1 produced nothing, every balanced `{...}` object in the
//!    raw text.
//!
//! Nothing here fails: unusable fragments are reported as [`ParseFailure`]s
//! next to the calls that did parse.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Matches a fenced block labelled `json`; group 1 is the body.
const FENCED_JSON_PATTERN: &str = r"(?is)```json[ \t]*\r?\n?(.*?)```";

// ─────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────

/// One directive recovered from model output.
///
/// `result` is `None` until the executor has run the call.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub name: String,
    pub arguments: Map<String, Value>,
    pub result: Option<Value>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            arguments,
            result: None,
            timestamp: None,
        }
    }
}

/// Why a JSON fragment did not yield a tool call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseFailure {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("object has no tool_call field")]
    MissingToolCall,

    #[error("tool_call has no name")]
    MissingName,

    #[error("tool_call arguments must be an object: {0}")]
    InvalidArguments(String),
}

/// Outcome of one extraction: calls in source order plus diagnostics.
#[derive(Debug, Default)]
pub struct Extraction {
    pub calls: Vec<ToolCall>,
    pub failures: Vec<ParseFailure>,
}

// ─────────────────────────────────────────────
// ResponseParser
// ─────────────────────────────────────────────

/// Extracts tool-call directives from raw completion text.
#[derive(Debug)]
pub struct ResponseParser {
    /// Compiled once at construction.
    fence_re: Option<Regex>,
}

impl ResponseParser {
    pub fn new() -> Self {
        Self {
            fence_re: Regex::new(FENCED_JSON_PATTERN).ok(),
        }
    }

    /// Run both passes over `raw` and collect every directive found.
    pub fn extract(&self, raw: &str) -> Extraction {
        let mut extraction = self.fenced_pass(raw);
        if extraction.calls.is_empty() {
            let fallback = raw_object_pass(raw);
            extraction.calls = fallback.calls;
            extraction.failures.extend(fallback.failures);
        }

        let now = Utc::now();
        for call in &mut extraction.calls {
            call.timestamp = Some(now);
        }
        extraction
    }

    fn fenced_pass(&self, raw: &str) -> Extraction {
        let mut extraction = Extraction::default();
        let Some(re) = &self.fence_re else {
            return extraction;
        };

        for caps in re.captures_iter(raw) {
            let body = caps.get(1).map_or("", |m| m.as_str()).trim();
            match parse_directive(body) {
                Ok(call) => extraction.calls.push(call),
                Err(failure) => extraction.failures.push(failure),
            }
        }
        extraction
    }
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience wrapper: the calls found in `raw`, diagnostics dropped.
pub fn extract_tool_calls(raw: &str) -> Vec<ToolCall> {
    ResponseParser::new().extract(raw).calls
}

// ─────────────────────────────────────────────
// Raw-object fallback
// ─────────────────────────────────────────────

fn raw_object_pass(raw: &str) -> Extraction {
    let mut extraction = Extraction::default();
    let bytes = raw.as_bytes();
    let mut pos = 0;

    while let Some(offset) = raw[pos..].find('{') {
        let start = pos + offset;
        let Some(end) = find_object_end(bytes, start) else {
            pos = start + 1;
            continue;
        };

        let candidate = &raw[start..=end];
        match parse_directive(candidate) {
            Ok(call) => {
                extraction.calls.push(call);
                pos = end + 1;
            }
            Err(ParseFailure::InvalidJson(reason)) => {
                if candidate.contains("tool_call") {
                    extraction.failures.push(ParseFailure::InvalidJson(reason));
                }
                // A valid object may still start further in.
                pos = start + 1;
            }
            // A wrapper object may still hold a directive further in.
            Err(ParseFailure::MissingToolCall) => pos = start + 1,
            Err(failure) => {
                if candidate.contains("tool_call") {
                    extraction.failures.push(failure);
                }
                pos = end + 1;
            }
        }
    }
    extraction
}

/// Index of the `}` closing the object opened at `start`, honouring strings.
fn find_object_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

// ─────────────────────────────────────────────
// Directive shape check
// ─────────────────────────────────────────────

fn parse_directive(fragment: &str) -> Result<ToolCall, ParseFailure> {
    let value: Value =
        serde_json::from_str(fragment).map_err(|e| ParseFailure::InvalidJson(e.to_string()))?;

    let directive = value
        .get("tool_call")
        .and_then(Value::as_object)
        .ok_or(ParseFailure::MissingToolCall)?;

    let name = directive
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or(ParseFailure::MissingName)?;

    let arguments = match directive.get("arguments") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map.clone(),
        // Some models double-encode the arguments object.
        Some(Value::String(encoded)) => match serde_json::from_str::<Value>(encoded) {
            Ok(Value::Object(map)) => map,
            _ => return Err(ParseFailure::InvalidArguments(encoded.clone())),
        },
        Some(other) => return Err(ParseFailure::InvalidArguments(other.to_string())),
    };

    Ok(ToolCall::new(name, arguments))
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fenced(body: &str) -> String {
        format!("```json\n{body}\n```")
    }

    #[test]
    fn test_single_fenced_directive() {
        let text = format!(
            "Let me look at the entry point.\n{}\n",
            fenced(r#"{"tool_call": {"name": "read_file", "arguments": {"filePath": "src/main.js"}}}"#)
        );
        let calls = extract_tool_calls(&text);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "read_file");
        assert_eq!(calls[0].arguments["filePath"], "src/main.js");
        assert!(calls[0].result.is_none());
        assert!(calls[0].timestamp.is_some());
    }

    #[test]
    fn test_fence_label_case_insensitive() {
        let text = "```JSON\n{\"tool_call\": {\"name\": \"find_all_files\"}}\n```";
        let calls = extract_tool_calls(text);
        assert_eq!(calls.len(), 1);
        assert!(calls[0].arguments.is_empty());
    }

    #[test]
    fn test_multiple_fenced_in_source_order() {
        let text = format!(
            "First:\n{}\nThen:\n{}\nAnd finally:\n{}",
            fenced(r#"{"tool_call": {"name": "list_directory", "arguments": {"path": "."}}}"#),
            fenced(r#"{"tool_call": {"name": "read_file", "arguments": {"filePath": "a.js"}}}"#),
            fenced(r#"{"tool_call": {"name": "finish_analyze", "arguments": {"reason": "done"}}}"#),
        );
        let names: Vec<String> = extract_tool_calls(&text).into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["list_directory", "read_file", "finish_analyze"]);
    }

    #[test]
    fn test_malformed_fence_skipped_others_kept() {
        let parser = ResponseParser::new();
        let text = format!(
            "{}\n{}",
            fenced(r#"{"tool_call": {"name": "read_file", "#),
            fenced(r#"{"tool_call": {"name": "list_directory", "arguments": {"path": "src"}}}"#),
        );
        let extraction = parser.extract(&text);
        assert_eq!(extraction.calls.len(), 1);
        assert_eq!(extraction.calls[0].name, "list_directory");
        assert!(matches!(extraction.failures[0], ParseFailure::InvalidJson(_)));
    }

    #[test]
    fn test_fallback_when_fence_malformed() {
        // The broken fence yields nothing, so the raw pass finds the bare object.
        let text = format!(
            "{}\nRetrying: {{\"tool_call\": {{\"name\": \"get_workspace_structure\"}}}}",
            fenced("{ not json at all")
        );
        let calls = extract_tool_calls(&text);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "get_workspace_structure");
    }

    #[test]
    fn test_malformed_fence_and_no_raw_object_is_empty() {
        let text = fenced(r#"{"tool_call": {"name": "read_file""#);
        let extraction = ResponseParser::new().extract(&text);
        assert!(extraction.calls.is_empty());
        assert!(!extraction.failures.is_empty());
    }

    #[test]
    fn test_raw_pass_not_run_when_fenced_found() {
        let text = format!(
            "{}\nAlso {{\"tool_call\": {{\"name\": \"read_file\"}}}}",
            fenced(r#"{"tool_call": {"name": "list_directory", "arguments": {"path": "."}}}"#)
        );
        let calls = extract_tool_calls(&text);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "list_directory");
    }

    #[test]
    fn test_raw_multiple_objects() {
        let text = r#"I will call {"tool_call": {"name": "a"}} and then {"tool_call": {"name": "b", "arguments": {"x": 1}}}."#;
        let calls = extract_tool_calls(text);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].name, "a");
        assert_eq!(calls[1].arguments["x"], 1);
    }

    #[test]
    fn test_raw_braces_inside_strings() {
        let text = r#"{"tool_call": {"name": "save_document", "arguments": {"filename": "r.md", "content": "fn main() { } }"}}}"#;
        let calls = extract_tool_calls(text);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].arguments["content"], "fn main() { } }");
    }

    #[test]
    fn test_raw_prose_braces_then_directive() {
        let text = r#"The code uses {curly} blocks. {"tool_call": {"name": "find_all_files"}}"#;
        let calls = extract_tool_calls(text);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "find_all_files");
    }

    #[test]
    fn test_raw_directive_nested_in_wrapper() {
        let text = r#"Plan: {"thought": "inspect", "next": {"tool_call": {"name": "list_directory", "arguments": {"path": "."}}}}"#;
        let extraction = ResponseParser::new().extract(text);
        assert_eq!(extraction.calls.len(), 1);
        assert_eq!(extraction.calls[0].name, "list_directory");
        assert_eq!(extraction.calls[0].arguments["path"], ".");
        assert!(extraction.failures.is_empty());
    }

    #[test]
    fn test_raw_wrapped_directives_keep_source_order() {
        let text = r#"{"steps": [{"tool_call": {"name": "a"}}, {"tool_call": {"name": "b"}}]} then {"tool_call": {"name": "c"}}"#;
        let names: Vec<String> = extract_tool_calls(text).into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_missing_name_discarded() {
        let extraction = ResponseParser::new().extract(&fenced(r#"{"tool_call": {"arguments": {}}}"#));
        assert!(extraction.calls.is_empty());
        assert!(!extraction.failures.is_empty());
        assert!(extraction.failures.iter().all(|f| *f == ParseFailure::MissingName));
    }

    #[test]
    fn test_non_directive_json_ignored() {
        let text = fenced(r#"{"summary": "looks fine"}"#);
        assert!(extract_tool_calls(&text).is_empty());
    }

    #[test]
    fn test_plain_prose_is_empty() {
        let extraction = ResponseParser::new().extract("The project is a small React app. Nothing else to do.");
        assert!(extraction.calls.is_empty());
        assert!(extraction.failures.is_empty());
    }

    #[test]
    fn test_string_encoded_arguments() {
        let text = fenced(r#"{"tool_call": {"name": "read_file", "arguments": "{\"filePath\": \"x.js\"}"}}"#);
        let calls = extract_tool_calls(&text);
        assert_eq!(calls[0].arguments["filePath"], "x.js");
    }

    #[test]
    fn test_scalar_arguments_rejected() {
        let extraction = ResponseParser::new().extract(&fenced(r#"{"tool_call": {"name": "read_file", "arguments": 7}}"#));
        assert!(extraction.calls.is_empty());
        assert!(matches!(extraction.failures[0], ParseFailure::InvalidArguments(_)));
    }

    #[test]
    fn test_null_arguments_default_to_empty() {
        let calls = extract_tool_calls(&fenced(r#"{"tool_call": {"name": "find_all_files", "arguments": null}}"#));
        assert_eq!(calls[0].arguments, Map::new());
    }

    #[test]
    fn test_unterminated_object_does_not_hang() {
        let calls = extract_tool_calls("{{{{ \"tool_call\": {\"name\": \"a\"");
        assert!(calls.is_empty());
    }

    #[test]
    fn test_tool_call_serializes_open_payloads() {
        let mut call = ToolCall::new("list_directory", json!({"path": "."}).as_object().cloned().unwrap());
        call.result = Some(json!({"entries": ["a"], "count": 1}));
        let value = serde_json::to_value(&call).unwrap();
        assert_eq!(value["arguments"]["path"], ".");
        assert_eq!(value["result"]["count"], 1);
    }
}
