//! Tool trait: the uniform contract every analysis capability implements.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

/// Arguments of one tool call, as recovered from model output.
pub type ToolArgs = Map<String, Value>;

// ─────────────────────────────────────────────
// Tool trait
// ─────────────────────────────────────────────

/// Every agent tool implements this trait.
///
/// The loop lists tools by `name()`/`description()` in the initial prompt and
/// dispatches directives through `execute()`.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name the model uses in a directive (e.g. `"read_file"`).
    fn name(&self) -> &str;

    /// Human-readable description shown to the model.
    fn description(&self) -> &str;

    /// JSON Schema describing the accepted arguments.
    fn parameters(&self) -> Value;

    /// Execute the tool with the given arguments.
    ///
    /// On failure, return an `Err`; the executor records it as
    /// `{"error": <message>}` on the call.
    async fn execute(&self, args: &ToolArgs) -> anyhow::Result<Value>;

    /// Serializable summary of this tool.
    fn to_descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

/// Name, description, and parameter schema of a registered tool.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

// ─────────────────────────────────────────────
// Param helpers
// ─────────────────────────────────────────────

/// Extract a required `String` param, returning a model-readable error.
pub fn require_string(args: &ToolArgs, key: &str) -> anyhow::Result<String> {
    args.get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow::anyhow!("Missing required parameter: {key}"))
}

/// Extract an optional `String` param.
pub fn optional_string(args: &ToolArgs, key: &str) -> Option<String> {
    args.get(key).and_then(|v| v.as_str()).map(|s| s.to_string())
}

/// First non-empty string among several accepted parameter names.
pub fn first_string(args: &ToolArgs, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| optional_string(args, key))
        .find(|s| !s.is_empty())
}
