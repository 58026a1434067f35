//! Tool executor: runs a batch of parsed calls against the registry.
//!
//! Calls run one at a time, in order. A missing tool or a failing tool only
//! affects its own call: the error is stored as that call's result and the
//! batch moves on.

use serde_json::json;
use tracing::{debug, info, warn};

use crate::parser::ToolCall;
use crate::tools::registry::ToolRegistry;

/// Result stored for a call naming an unregistered tool.
pub const TOOL_NOT_FOUND: &str = "Tool not found";

/// Dispatches tool calls; borrows the registry for one batch.
pub struct ToolExecutor<'a> {
    registry: &'a ToolRegistry,
    /// Log each result at `info` instead of `debug`.
    debug_mode: bool,
}

impl<'a> ToolExecutor<'a> {
    pub fn new(registry: &'a ToolRegistry, debug_mode: bool) -> Self {
        Self {
            registry,
            debug_mode,
        }
    }

    /// Execute `calls` sequentially, appending each (with result) to `history`.
    pub async fn execute_all(&self, calls: Vec<ToolCall>, history: &mut Vec<ToolCall>) {
        for mut call in calls {
            debug!(tool = %call.name, "executing tool");

            let result = match self.registry.get(&call.name) {
                None => {
                    warn!(tool = %call.name, "tool not found");
                    json!({ "error": TOOL_NOT_FOUND })
                }
                Some(tool) => match tool.execute(&call.arguments).await {
                    Ok(value) => value,
                    Err(e) => {
                        warn!(tool = %call.name, error = %e, "tool execution failed");
                        json!({ "error": e.to_string() })
                    }
                },
            };

            if self.debug_mode {
                info!(tool = %call.name, result = %result, "tool result");
            } else {
                debug!(tool = %call.name, result = %result, "tool result");
            }

            call.result = Some(result);
            call.timestamp = Some(chrono::Utc::now());
            history.push(call);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::base::{Tool, ToolArgs};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::Arc;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echoes back the input"
        }
        fn parameters(&self) -> Value {
            json!({
                "type": "object",
                "properties": { "text": { "type": "string" } },
                "required": ["text"]
            })
        }
        async fn execute(&self, args: &ToolArgs) -> anyhow::Result<Value> {
            let text = args.get("text").and_then(|v| v.as_str()).unwrap_or("(empty)");
            Ok(json!({ "echo": text }))
        }
    }

    struct FailTool;

    #[async_trait]
    impl Tool for FailTool {
        fn name(&self) -> &str {
            "fail"
        }
        fn description(&self) -> &str {
            "Always fails"
        }
        fn parameters(&self) -> Value {
            json!({"type": "object", "properties": {}, "required": []})
        }
        async fn execute(&self, _args: &ToolArgs) -> anyhow::Result<Value> {
            anyhow::bail!("intentional failure")
        }
    }

    fn registry() -> ToolRegistry {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(EchoTool));
        reg.register(Arc::new(FailTool));
        reg
    }

    fn call(name: &str, args: Value) -> ToolCall {
        ToolCall::new(name, args.as_object().cloned().unwrap_or_default())
    }

    #[tokio::test]
    async fn test_execute_success() {
        let reg = registry();
        let mut history = Vec::new();
        ToolExecutor::new(&reg, false)
            .execute_all(vec![call("echo", json!({ "text": "hi" }))], &mut history)
            .await;

        assert_eq!(history.len(), 1);
        assert_eq!(history[0].result, Some(json!({ "echo": "hi" })));
        assert!(history[0].timestamp.is_some());
    }

    #[tokio::test]
    async fn test_missing_tool_recorded_not_raised() {
        let reg = registry();
        let mut history = Vec::new();
        ToolExecutor::new(&reg, false)
            .execute_all(vec![call("nonexistent", json!({}))], &mut history)
            .await;

        assert_eq!(history.len(), 1);
        assert_eq!(history[0].result, Some(json!({ "error": "Tool not found" })));
        assert!(history[0].timestamp.is_some());
    }

    #[tokio::test]
    async fn test_failure_isolated_from_siblings() {
        let reg = registry();
        let mut history = Vec::new();
        let batch = vec![
            call("echo", json!({ "text": "one" })),
            call("fail", json!({})),
            call("missing", json!({})),
            call("echo", json!({ "text": "two" })),
        ];
        ToolExecutor::new(&reg, true).execute_all(batch, &mut history).await;

        let names: Vec<&str> = history.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["echo", "fail", "missing", "echo"]);
        assert_eq!(history[1].result, Some(json!({ "error": "intentional failure" })));
        assert_eq!(history[2].result, Some(json!({ "error": "Tool not found" })));
        assert_eq!(history[3].result, Some(json!({ "echo": "two" })));
    }

    #[tokio::test]
    async fn test_appends_after_existing_history() {
        let reg = registry();
        let mut history = vec![call("earlier", json!({}))];
        ToolExecutor::new(&reg, false)
            .execute_all(vec![call("echo", json!({}))], &mut history)
            .await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].result, Some(json!({ "echo": "(empty)" })));
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        let reg = registry();
        let mut history = Vec::new();
        ToolExecutor::new(&reg, false).execute_all(vec![], &mut history).await;
        assert!(history.is_empty());
    }
}
