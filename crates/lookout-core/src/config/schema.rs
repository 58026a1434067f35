//! Configuration schema.
//!
//! Hierarchy: `Config` → `AgentDefaults`, `ProviderConfig`, `LoggingConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration: loaded from `~/.lookout/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub agent: AgentDefaults,
    pub provider: ProviderConfig,
    pub logging: LoggingConfig,
}

// ─────────────────────────────────────────────
// Agent
// ─────────────────────────────────────────────

/// Settings for one analysis agent.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentDefaults {
    /// Workspace directory to analyze.
    pub workspace: String,
    /// Upper bound on request/response iterations per run.
    pub max_iterations: u32,
    /// Verbose tool-result logging.
    pub debug: bool,
    /// Directory holding `system.txt` and `prompt.txt`.
    pub prompt_dir: String,
    /// Inline system prompt; wins over `system.txt` when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// Directory that `save_document` writes into.
    pub output_dir: String,
    /// Character budget for the workspace summary in the initial prompt.
    pub structure_max_size: usize,
    /// Directory depth for the workspace summary in the initial prompt.
    pub structure_max_depth: usize,
}

impl Default for AgentDefaults {
    fn default() -> Self {
        Self {
            workspace: "./input".to_string(),
            max_iterations: 10,
            debug: false,
            prompt_dir: "prompt".to_string(),
            system_prompt: None,
            output_dir: "output".to_string(),
            structure_max_size: 2000,
            structure_max_depth: 1,
        }
    }
}

// ─────────────────────────────────────────────
// Provider
// ─────────────────────────────────────────────

/// Connection settings for the completion endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    /// Provider spec name (e.g. `"copilot"`, `"openai"`).
    pub name: String,
    /// Bearer token / API key.
    pub api_key: String,
    /// Custom API base URL (overrides the spec default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Model identifier sent with each request.
    pub model: String,
    /// Maximum tokens to generate per response.
    pub max_tokens: u32,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
    /// Conversation messages retained between calls.
    pub max_history: usize,
    /// Extra HTTP headers to send with each request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_headers: Option<HashMap<String, String>>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: "copilot".to_string(),
            api_key: String::new(),
            api_base: None,
            model: "gpt-4".to_string(),
            max_tokens: 4000,
            temperature: 0.7,
            max_history: 100,
            extra_headers: None,
        }
    }
}

impl ProviderConfig {
    /// Whether credentials are present.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

// ─────────────────────────────────────────────
// Logging
// ─────────────────────────────────────────────

/// JSON-lines run log settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingConfig {
    pub enabled: bool,
    pub dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: "logs".to_string(),
        }
    }
}
