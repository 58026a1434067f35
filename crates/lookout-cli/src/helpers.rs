//! Shared CLI helpers: path expansion and result printing.

use std::path::PathBuf;

use colored::Colorize;

use lookout_agent::{AgentResult, FinishReason, ToolRegistry};

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs_next::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Print the outcome of one analysis run to stdout.
pub fn print_result(result: &AgentResult) {
    println!();
    if !result.success {
        println!("{}", "🔭 Analysis failed".red().bold());
        if let Some(error) = &result.error {
            println!("  {error}");
        }
        println!();
        return;
    }

    println!("{}", "🔭 Analysis complete".cyan().bold());
    println!(
        "{}",
        format!(
            "  {} iterations · {} tool calls · {} ms · {}",
            result.iteration_count,
            result.tool_call_count,
            result.duration_ms,
            finish_label(result.finish_reason),
        )
        .dimmed()
    );
    println!();

    if result.findings.is_empty() {
        println!("{}", "(no findings, last response follows)".dimmed());
        if result.final_response.is_empty() {
            println!("{}", "(no response)".dimmed());
        } else {
            println!("{}", result.final_response);
        }
        println!();
    }
    for (i, finding) in result.findings.iter().enumerate() {
        if result.findings.len() > 1 {
            println!("{}", format!("── Finding {} ──", i + 1).bold());
        }
        println!("{finding}");
        println!();
    }
}

fn finish_label(reason: Option<FinishReason>) -> &'static str {
    match reason {
        Some(FinishReason::FinishTool) => "finished by model",
        Some(FinishReason::MaxIterations) => "iteration limit reached",
        None => "unfinished",
    }
}

/// Print every registered tool with its parameter schema.
pub fn print_tools(registry: &ToolRegistry) {
    println!();
    println!("{}", "🔭 Available tools".cyan().bold());
    println!();
    for tool in registry.get_all() {
        println!("  {}", tool.name().bold());
        println!("    {}", tool.description());
        let schema = serde_json::to_string(&tool.parameters()).unwrap_or_default();
        println!("    {}", schema.dimmed());
    }
    println!();
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_tilde_home() {
        let result = expand_tilde("~/foo/bar");
        assert!(result.ends_with("foo/bar"));
        assert!(!result.starts_with("~"));
    }

    #[test]
    fn expand_tilde_no_tilde() {
        assert_eq!(expand_tilde("/absolute/path"), PathBuf::from("/absolute/path"));
    }

    #[test]
    fn expand_tilde_relative() {
        assert_eq!(expand_tilde("relative/path"), PathBuf::from("relative/path"));
    }

    #[test]
    fn finish_labels() {
        assert_eq!(finish_label(Some(FinishReason::FinishTool)), "finished by model");
        assert_eq!(finish_label(Some(FinishReason::MaxIterations)), "iteration limit reached");
        assert_eq!(finish_label(None), "unfinished");
    }
}
