//! Tool Registry: name-keyed store the executor dispatches against.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use super::base::Tool;
use super::document::SaveDocumentTool;
use super::filesystem::{FindAllFilesTool, ListDirectoryTool, ReadFileTool, WorkspaceStructureTool};
use super::finish::FinishAnalyzeTool;
use crate::workspace::FileSystem;

// ─────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────

/// Stores tools keyed by name.
///
/// Registering a name twice replaces the earlier tool in place; listing
/// order is first-registration order.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Registry holding the built-in analysis tools.
    ///
    /// `output_dir` is where `save_document` writes.
    pub fn with_read_only_tools(fs: Arc<dyn FileSystem>, output_dir: impl Into<PathBuf>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ReadFileTool::new(fs.clone())));
        registry.register(Arc::new(ListDirectoryTool::new(fs.clone())));
        registry.register(Arc::new(WorkspaceStructureTool::new(fs.clone())));
        registry.register(Arc::new(FindAllFilesTool::new(fs)));
        registry.register(Arc::new(FinishAnalyzeTool));
        registry.register(Arc::new(SaveDocumentTool::new(output_dir)));
        registry
    }

    /// Register a tool. Overwrites any previous tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        debug!(tool = %name, "registered tool");
        if self.tools.insert(name.clone(), tool).is_none() {
            self.order.push(name);
        }
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Check if a tool is registered.
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// All tools in registration order.
    ///
    /// The returned `Vec` is the caller's; changing it leaves the registry untouched.
    pub fn get_all(&self) -> Vec<Arc<dyn Tool>> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name).cloned())
            .collect()
    }

    /// Names of all registered tools, sorted for determinism.
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::base::ToolArgs;
    use crate::workspace::ReadOnlyFileSystem;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    /// Tool whose output identifies which instance answered.
    struct TaggedTool {
        name: &'static str,
        tag: &'static str,
    }

    #[async_trait]
    impl Tool for TaggedTool {
        fn name(&self) -> &str {
            self.name
        }
        fn description(&self) -> &str {
            self.tag
        }
        fn parameters(&self) -> Value {
            json!({"type": "object", "properties": {}, "required": []})
        }
        async fn execute(&self, _args: &ToolArgs) -> anyhow::Result<Value> {
            Ok(json!({ "tag": self.tag }))
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(TaggedTool { name: "echo", tag: "a" }));
        assert!(reg.has("echo"));
        assert!(!reg.has("nope"));
        assert!(reg.get("nope").is_none());
        assert_eq!(reg.len(), 1);
    }

    #[tokio::test]
    async fn test_same_name_last_wins() {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(TaggedTool { name: "dup", tag: "first" }));
        reg.register(Arc::new(TaggedTool { name: "dup", tag: "second" }));

        assert_eq!(reg.len(), 1);
        let tool = reg.get("dup").unwrap();
        assert_eq!(tool.description(), "second");
        assert_eq!(tool.execute(&ToolArgs::new()).await.unwrap()["tag"], "second");
    }

    #[test]
    fn test_get_all_registration_order() {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(TaggedTool { name: "zeta", tag: "z" }));
        reg.register(Arc::new(TaggedTool { name: "alpha", tag: "a" }));
        reg.register(Arc::new(TaggedTool { name: "zeta", tag: "z2" }));

        let names: Vec<String> = reg.get_all().iter().map(|t| t.name().to_string()).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
        assert_eq!(reg.tool_names(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_get_all_is_a_copy() {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(TaggedTool { name: "one", tag: "1" }));

        let mut all = reg.get_all();
        all.clear();
        all.push(Arc::new(TaggedTool { name: "intruder", tag: "x" }));

        assert_eq!(reg.len(), 1);
        assert!(!reg.has("intruder"));
    }

    #[test]
    fn test_with_read_only_tools() {
        let dir = tempfile::tempdir().unwrap();
        let fs: Arc<dyn FileSystem> = Arc::new(ReadOnlyFileSystem::new(dir.path()));
        let reg = ToolRegistry::with_read_only_tools(fs, dir.path().join("output"));

        assert_eq!(reg.len(), 6);
        for name in [
            "read_file",
            "list_directory",
            "get_workspace_structure",
            "find_all_files",
            "finish_analyze",
            "save_document",
        ] {
            assert!(reg.has(name), "missing {name}");
        }
    }

    #[test]
    fn test_default() {
        let reg = ToolRegistry::default();
        assert!(reg.is_empty());
        assert!(reg.get_all().is_empty());
    }
}
