//! Prompt rendering: the initial analysis request and the tool-results
//! follow-up.
//!
//! Both are plain `{{placeholder}}` substitutions. Placeholders are resolved
//! in a single pass, so substituted text is never re-scanned.

use crate::agent_loop::AgentConfig;
use crate::parser::ToolCall;
use crate::tools::registry::ToolRegistry;

const INITIAL_TEMPLATE: &str = "ANALYSIS REQUEST: {{request}}
AVAILABLE TOOLS:
{{toolDescriptions}}
WORKSPACE CONTEXT:
Working Directory: {{workspacePath}}
Workspace Structure: {{workspaceStructure}}";

const FOLLOWUP_TEMPLATE: &str = "Tool execution results:
{{results}}
Continue your analysis based on these results.
If you have enough information, provide a comprehensive summary of your findings.";

/// Renders outbound prompts. Stateless.
#[derive(Clone, Copy, Debug, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    /// First message of a run.
    pub fn build_initial_prompt(
        config: &AgentConfig,
        workspace_description: &str,
        tool_descriptions: &str,
        request: &str,
    ) -> String {
        let workspace_path = config.workspace_root.display().to_string();
        render(
            INITIAL_TEMPLATE,
            &[
                ("request", request),
                ("toolDescriptions", tool_descriptions),
                ("workspacePath", &workspace_path),
                ("workspaceStructure", workspace_description),
            ],
        )
    }

    /// Message reporting one batch of executed calls, in order.
    pub fn build_followup_prompt(executed: &[ToolCall]) -> String {
        let results = executed
            .iter()
            .map(|call| {
                let arguments = serde_json::to_string(&call.arguments).unwrap_or_else(|_| "{}".into());
                let result = serde_json::to_string(&call.result).unwrap_or_else(|_| "null".into());
                format!("Tool: {}\nArguments: {}\nResult: {}", call.name, arguments, result)
            })
            .collect::<Vec<_>>()
            .join("\n\n");
        render(FOLLOWUP_TEMPLATE, &[("results", &results)])
    }

    /// One `name: description` line per registered tool.
    pub fn tool_descriptions(registry: &ToolRegistry) -> String {
        registry
            .get_all()
            .iter()
            .map(|tool| format!("{}: {}", tool.name(), tool.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Substitute `{{key}}` placeholders; unknown placeholders are left as-is.
fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let Some(close) = after.find("}}") else {
            out.push_str(&rest[open..]);
            return out;
        };
        let key = &after[..close];
        match vars.iter().find(|(k, _)| *k == key) {
            Some((_, value)) => out.push_str(value),
            None => {
                out.push_str("{{");
                out.push_str(key);
                out.push_str("}}");
            }
        }
        rest = &after[close + 2..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::finish::FinishAnalyzeTool;
    use serde_json::json;
    use std::sync::Arc;

    fn config() -> AgentConfig {
        AgentConfig {
            workspace_root: "/srv/app".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_initial_prompt_layout() {
        let prompt = PromptBuilder::build_initial_prompt(
            &config(),
            "src/\nREADME.md\n",
            "read_file: Read a file",
            "find bugs",
        );
        assert_eq!(
            prompt,
            "ANALYSIS REQUEST: find bugs\n\
             AVAILABLE TOOLS:\n\
             read_file: Read a file\n\
             WORKSPACE CONTEXT:\n\
             Working Directory: /srv/app\n\
             Workspace Structure: src/\nREADME.md\n"
        );
    }

    #[test]
    fn test_substituted_text_not_rescanned() {
        let prompt = PromptBuilder::build_initial_prompt(&config(), "{{request}}", "", "x");
        assert!(prompt.ends_with("Workspace Structure: {{request}}"));
        assert!(prompt.starts_with("ANALYSIS REQUEST: x\n"));
    }

    #[test]
    fn test_followup_blocks_in_order() {
        let mut first = ToolCall::new("list_directory", json!({"path": "."}).as_object().cloned().unwrap());
        first.result = Some(json!({"entries": ["src"]}));
        let mut second = ToolCall::new("read_file", serde_json::Map::new());
        second.result = Some(json!({"error": "Tool not found"}));

        let prompt = PromptBuilder::build_followup_prompt(&[first, second]);
        assert_eq!(
            prompt,
            "Tool execution results:\n\
             Tool: list_directory\nArguments: {\"path\":\".\"}\nResult: {\"entries\":[\"src\"]}\n\n\
             Tool: read_file\nArguments: {}\nResult: {\"error\":\"Tool not found\"}\n\
             Continue your analysis based on these results.\n\
             If you have enough information, provide a comprehensive summary of your findings."
        );
    }

    #[test]
    fn test_followup_with_no_calls() {
        let prompt = PromptBuilder::build_followup_prompt(&[]);
        assert!(prompt.starts_with("Tool execution results:\n\nContinue"));
    }

    #[test]
    fn test_tool_descriptions_one_per_line() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(FinishAnalyzeTool));
        let text = PromptBuilder::tool_descriptions(&registry);
        assert!(text.starts_with("finish_analyze: Signal that the analysis is complete"));
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn test_render_unknown_placeholder_kept() {
        assert_eq!(render("a {{x}} {{y}} {{", &[("x", "1")]), "a 1 {{y}} {{");
    }
}
