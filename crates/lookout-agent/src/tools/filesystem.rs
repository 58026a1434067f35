//! Workspace exploration tools.
//!
//! All of them go through the shared read-only `FileSystem`, so paths are
//! confined to the workspace root.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use lookout_core::utils::char_boundary;

use super::base::{first_string, require_string, Tool, ToolArgs};
use crate::workspace::{FileSystem, READ_ERROR_PREFIX, SKIPPED_ENTRIES, TRUNCATION_MARKER};

/// Characters of file content returned by `read_file`.
pub const READ_LIMIT_CHARS: usize = 5000;

/// Size budget of the tree returned by the structure tools.
pub const STRUCTURE_MAX_SIZE: usize = 2000;

/// Depth of the tree returned by the structure tools.
pub const STRUCTURE_MAX_DEPTH: usize = 10;

// ─────────────────────────────────────────────
// ReadFileTool
// ─────────────────────────────────────────────

/// Returns the head of a file plus its size.
pub struct ReadFileTool {
    fs: Arc<dyn FileSystem>,
}

impl ReadFileTool {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the contents of a file for analysis"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "filePath": {
                    "type": "string",
                    "description": "Path to the file to read"
                }
            },
            "required": ["filePath"]
        })
    }

    async fn execute(&self, args: &ToolArgs) -> anyhow::Result<Value> {
        let path = match first_string(args, &["filePath", "path"]) {
            Some(p) => p,
            None => require_string(args, "filePath")?,
        };
        let content = self.fs.read_file(&path)?;

        let size = content.chars().count();
        let head = &content[..char_boundary(&content, READ_LIMIT_CHARS)];
        Ok(json!({
            "content": head,
            "size": size,
            "truncated": size > READ_LIMIT_CHARS,
        }))
    }
}

// ─────────────────────────────────────────────
// ListDirectoryTool
// ─────────────────────────────────────────────

/// Lists entry names of a directory.
pub struct ListDirectoryTool {
    fs: Arc<dyn FileSystem>,
}

impl ListDirectoryTool {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }
}

#[async_trait]
impl Tool for ListDirectoryTool {
    fn name(&self) -> &str {
        "list_directory"
    }

    fn description(&self) -> &str {
        "List the contents of a directory"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path to the directory to list"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, args: &ToolArgs) -> anyhow::Result<Value> {
        let path = require_string(args, "path")?;
        let entries = self.fs.list_directory(&path)?;
        let count = entries.len();
        Ok(json!({ "entries": entries, "count": count }))
    }
}

// ─────────────────────────────────────────────
// WorkspaceStructureTool
// ─────────────────────────────────────────────

/// Returns the rendered workspace tree.
pub struct WorkspaceStructureTool {
    fs: Arc<dyn FileSystem>,
}

impl WorkspaceStructureTool {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }
}

#[async_trait]
impl Tool for WorkspaceStructureTool {
    fn name(&self) -> &str {
        "get_workspace_structure"
    }

    fn description(&self) -> &str {
        "Get the complete workspace file structure"
    }

    fn parameters(&self) -> Value {
        json!({ "type": "object", "properties": {}, "required": [] })
    }

    async fn execute(&self, _args: &ToolArgs) -> anyhow::Result<Value> {
        let structure = self.fs.describe_workspace(STRUCTURE_MAX_SIZE, STRUCTURE_MAX_DEPTH);
        Ok(json!({ "structure": structure }))
    }
}

// ─────────────────────────────────────────────
// FindAllFilesTool
// ─────────────────────────────────────────────

/// Enumerates workspace entries, minus build and dependency folders.
pub struct FindAllFilesTool {
    fs: Arc<dyn FileSystem>,
}

impl FindAllFilesTool {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }
}

#[async_trait]
impl Tool for FindAllFilesTool {
    fn name(&self) -> &str {
        "find_all_files"
    }

    fn description(&self) -> &str {
        "Find all files in the workspace"
    }

    fn parameters(&self) -> Value {
        json!({ "type": "object", "properties": {}, "required": [] })
    }

    async fn execute(&self, _args: &ToolArgs) -> anyhow::Result<Value> {
        let structure = self.fs.describe_workspace(STRUCTURE_MAX_SIZE, STRUCTURE_MAX_DEPTH);
        let code_files: Vec<&str> = structure
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter(|line| !line.starts_with(TRUNCATION_MARKER.trim()))
            .filter(|line| !line.starts_with(READ_ERROR_PREFIX))
            .filter(|line| !line.split('/').any(|part| SKIPPED_ENTRIES.contains(&part)))
            .collect();
        let count = code_files.len();
        Ok(json!({ "codeFiles": code_files, "count": count }))
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
