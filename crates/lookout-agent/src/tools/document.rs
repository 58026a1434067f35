//! Document tool: lets the model persist reports into the output directory.
//!
//! The only tool that writes. It never touches the workspace: files land in
//! a dedicated output directory under a sanitized, timestamped name.

use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};
use tracing::debug;

use super::base::{first_string, optional_string, Tool, ToolArgs};

/// Extensions `save_document` accepts.
pub const ALLOWED_EXTENSIONS: &[&str] = &[".md", ".json", ".txt"];

/// Characters replaced with `_` in document names.
const UNSAFE_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*', '&'];

/// Matches the datetime suffix this tool appends.
const DATETIME_PATTERN: &str = r"(?i)\d{4}-\d{2}-\d{2}T\d{2}-\d{2}-\d{2}";

// ─────────────────────────────────────────────
// SaveDocumentTool
// ─────────────────────────────────────────────

/// Writes markdown, JSON, or text documents into `output_dir`.
pub struct SaveDocumentTool {
    output_dir: PathBuf,
    /// Compiled once at construction.
    datetime_re: Option<Regex>,
}

impl SaveDocumentTool {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            datetime_re: Regex::new(DATETIME_PATTERN).ok(),
        }
    }

    /// Append `_<datetime>` before the extension unless a datetime is present.
    fn stamp(&self, filename: &str) -> String {
        let path = Path::new(filename);
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        let already_stamped = self
            .datetime_re
            .as_ref()
            .is_some_and(|re| re.is_match(&stem));
        if already_stamped {
            return filename.to_string();
        }

        let ext = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let datetime = chrono::Utc::now().format("%Y-%m-%dT%H-%M-%S-%3fZ");
        format!("{stem}_{datetime}{ext}")
    }
}

#[async_trait]
impl Tool for SaveDocumentTool {
    fn name(&self) -> &str {
        "save_document"
    }

    fn description(&self) -> &str {
        "Save markdown, JSON, or text documents to the output folder. \
         Useful for creating analysis reports, summaries, or structured data files."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "filename": {
                    "type": "string",
                    "description": "Name of the file to save (including extension: .md, .json, .txt)"
                },
                "filePath": {
                    "type": "string",
                    "description": "Alternative parameter name for filename (including extension: .md, .json, .txt)"
                },
                "content": {
                    "type": "string",
                    "description": "Content to write to the file"
                },
                "description": {
                    "type": "string",
                    "description": "Optional description of what the document contains"
                }
            },
            "required": ["content"]
        })
    }

    async fn execute(&self, args: &ToolArgs) -> anyhow::Result<Value> {
        let requested = first_string(args, &["filename", "filePath"])
            .ok_or_else(|| anyhow::anyhow!("filename or filePath is required and must be a string"))?;
        let content = optional_string(args, "content")
            .filter(|c| !c.is_empty())
            .ok_or_else(|| anyhow::anyhow!("content is required and must be a string"))?;

        let filename = sanitize_filename(&self.stamp(&requested));
        let extension = Path::new(&filename)
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
            .unwrap_or_default();

        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            anyhow::bail!(
                "Invalid file extension. Allowed extensions: {}",
                ALLOWED_EXTENSIONS.join(", ")
            );
        }
        if extension == ".json" && serde_json::from_str::<Value>(&content).is_err() {
            anyhow::bail!("Invalid JSON content");
        }

        std::fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("Failed to save document: cannot create {}", self.output_dir.display())
        })?;
        let path = self.output_dir.join(&filename);
        std::fs::write(&path, &content)
            .with_context(|| format!("Failed to save document: {}", path.display()))?;

        debug!(path = %path.display(), bytes = content.len(), "document saved");

        Ok(json!({
            "success": true,
            "filename": filename,
            "path": path.display().to_string(),
            "description": optional_string(args, "description").unwrap_or_default(),
            "timestamp": lookout_core::utils::timestamp(),
            "message": format!("Document saved successfully to {}", path.display()),
        }))
    }
}

/// Replace unsafe characters and whitespace with `_`, collapse runs, lowercase.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let c = if UNSAFE_FILENAME_CHARS.contains(&c) || c.is_whitespace() {
            '_'
        } else {
            c
        };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    out.to_lowercase()
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn args(value: Value) -> ToolArgs {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("My Report: v2?.MD"), "my_report_v2_.md");
        assert_eq!(sanitize_filename("a//b&&c.txt"), "a_b_c.txt");
        assert_eq!(sanitize_filename("tabs\tand   spaces.md"), "tabs_and_spaces.md");
    }

    #[test]
    fn test_stamp_adds_datetime() {
        let tool = SaveDocumentTool::new("out");
        let stamped = tool.stamp("report.md");
        assert!(stamped.starts_with("report_"));
        assert!(stamped.ends_with(".md"));
        assert!(Regex::new(DATETIME_PATTERN).unwrap().is_match(&stamped));
    }

    #[test]
    fn test_stamp_keeps_existing_datetime() {
        let tool = SaveDocumentTool::new("out");
        let name = "report_2024-05-01T12-30-45-000Z.md";
        assert_eq!(tool.stamp(name), name);
    }

    #[tokio::test]
    async fn test_save_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let tool = SaveDocumentTool::new(dir.path().join("output"));

        let result = tool
            .execute(&args(json!({
                "filename": "Test Report.md",
                "content": "# Findings\n\nAll good.",
                "description": "summary"
            })))
            .await
            .unwrap();

        assert_eq!(result["success"], true);
        assert_eq!(result["description"], "summary");
        let filename = result["filename"].as_str().unwrap();
        assert!(filename.starts_with("test_report_"));
        assert!(filename.ends_with(".md"));

        let written = std::fs::read_to_string(dir.path().join("output").join(filename)).unwrap();
        assert_eq!(written, "# Findings\n\nAll good.");
    }

    #[test]
    fn test_stamp_keeps_lowercased_datetime() {
        let tool = SaveDocumentTool::new("out");
        let name = "report_2024-05-01t12-30-45-000z.md";
        assert_eq!(tool.stamp(name), name);
    }

    #[tokio::test]
    async fn test_resave_under_returned_name_is_not_restamped() {
        let dir = tempfile::tempdir().unwrap();
        let tool = SaveDocumentTool::new(dir.path());

        let first = tool
            .execute(&args(json!({ "filename": "notes.md", "content": "v1" })))
            .await
            .unwrap();
        let saved_as = first["filename"].as_str().unwrap().to_string();

        let second = tool
            .execute(&args(json!({ "filename": saved_as, "content": "v2" })))
            .await
            .unwrap();

        assert_eq!(second["filename"], first["filename"]);
        assert_eq!(std::fs::read_to_string(dir.path().join(&saved_as)).unwrap(), "v2");
    }

    #[tokio::test]
    async fn test_save_json_via_file_path_alias() {
        let dir = tempfile::tempdir().unwrap();
        let tool = SaveDocumentTool::new(dir.path());

        let result = tool
            .execute(&args(json!({
                "filePath": "data.json",
                "content": "{\"issues\": 3}"
            })))
            .await
            .unwrap();
        assert!(result["filename"].as_str().unwrap().ends_with(".json"));
    }

    #[tokio::test]
    async fn test_rejects_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let tool = SaveDocumentTool::new(dir.path());
        let err = tool
            .execute(&args(json!({ "filename": "data.json", "content": "{not json" })))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid JSON content");
    }

    #[tokio::test]
    async fn test_rejects_extension() {
        let dir = tempfile::tempdir().unwrap();
        let tool = SaveDocumentTool::new(dir.path());
        let err = tool
            .execute(&args(json!({ "filename": "run.exe", "content": "MZ" })))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid file extension"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_requires_filename_and_content() {
        let dir = tempfile::tempdir().unwrap();
        let tool = SaveDocumentTool::new(dir.path());

        let err = tool
            .execute(&args(json!({ "content": "text" })))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("filename or filePath is required"));

        let err = tool
            .execute(&args(json!({ "filename": "a.txt", "content": "" })))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("content is required"));
    }

    #[tokio::test]
    async fn test_path_components_cannot_escape_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("output");
        let tool = SaveDocumentTool::new(&out);

        let result = tool
            .execute(&args(json!({ "filename": "../escape.txt", "content": "x" })))
            .await
            .unwrap();
        let path = PathBuf::from(result["path"].as_str().unwrap());
        assert!(path.starts_with(&out));
    }
}
