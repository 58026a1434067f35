//! Finish tool: the model's way to end an analysis run early.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::base::{optional_string, Tool, ToolArgs};

/// Name of the tool whose invocation terminates the loop.
pub const FINISH_TOOL: &str = "finish_analyze";

/// Acknowledges completion; the loop stops after the batch containing it.
pub struct FinishAnalyzeTool;

#[async_trait]
impl Tool for FinishAnalyzeTool {
    fn name(&self) -> &str {
        FINISH_TOOL
    }

    fn description(&self) -> &str {
        "Signal that the analysis is complete and iterations should stop. \
         Use this tool when you have gathered enough information or completed the task."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "reason": {
                    "type": "string",
                    "description": "Brief explanation of why the analysis is being finished"
                },
                "summary": {
                    "type": "string",
                    "description": "Optional summary of findings or conclusions"
                }
            },
            "required": ["reason"]
        })
    }

    async fn execute(&self, args: &ToolArgs) -> anyhow::Result<Value> {
        Ok(json!({
            "status": "analysis_complete",
            "reason": optional_string(args, "reason").unwrap_or_default(),
            "summary": optional_string(args, "summary").unwrap_or_default(),
            "timestamp": lookout_core::utils::timestamp(),
            "message": "Analysis finished successfully. Iteration loop should be stopped.",
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_finish_with_summary() {
        let args = json!({ "reason": "done", "summary": "3 issues" })
            .as_object()
            .cloned()
            .unwrap();
        let result = FinishAnalyzeTool.execute(&args).await.unwrap();
        assert_eq!(result["status"], "analysis_complete");
        assert_eq!(result["reason"], "done");
        assert_eq!(result["summary"], "3 issues");
        assert!(result["timestamp"].as_str().unwrap().contains('T'));
    }

    #[tokio::test]
    async fn test_finish_without_arguments() {
        let result = FinishAnalyzeTool.execute(&ToolArgs::new()).await.unwrap();
        assert_eq!(result["status"], "analysis_complete");
        assert_eq!(result["summary"], "");
    }

    #[test]
    fn test_name_matches_constant() {
        assert_eq!(FinishAnalyzeTool.name(), FINISH_TOOL);
    }
}
