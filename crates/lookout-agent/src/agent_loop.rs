//! Agent loop: the prompt → completion → parse → execute cycle.
//!
//! One `analyze_workspace` call is one run: build the initial prompt, then
//! for each completion parse directives, execute them, and either stop
//! (finish tool seen, or the iteration cap reached) or send the results back
//! as the next prompt. Absence of directives does not stop the loop.
//!
//! Fatal errors (prompt loading, completion failures) end the run with a
//! failed [`AgentResult`]; `analyze_workspace` itself never returns `Err`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use serde_json::json;
use tracing::{debug, error, info, warn};

use lookout_core::config::schema::AgentDefaults;
use lookout_core::utils::{expand_home, truncate_string};
use lookout_providers::traits::{CompletionError, CompletionProvider};

use crate::executor::ToolExecutor;
use crate::parser::{ResponseParser, ToolCall};
use crate::prompt::PromptBuilder;
use crate::telemetry::{RunObserver, RunSummary};
use crate::tools::base::Tool;
use crate::tools::finish::FINISH_TOOL;
use crate::tools::registry::ToolRegistry;
use crate::workspace::FileSystem;

/// System prompt used when neither config nor `system.txt` provides one.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an AI assistant.";

/// Request used when the caller gives none and `prompt.txt` is absent.
pub const DEFAULT_REQUEST: &str = "analyze code";

const SYSTEM_PROMPT_FILE: &str = "system.txt";
const REQUEST_PROMPT_FILE: &str = "prompt.txt";

// ─────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────

/// Settings for an agent; fixed for the lifetime of every run it performs.
///
/// Credentials live with the completion provider, not here.
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Directory under analysis; all tool paths are confined to it.
    pub workspace_root: PathBuf,
    /// Upper bound on completions per run. Must be positive.
    pub max_iterations: u32,
    /// Log tool results at `info`.
    pub debug_mode: bool,
    /// Directory holding `system.txt` and `prompt.txt`.
    pub prompt_dir: PathBuf,
    /// Inline system prompt; wins over `system.txt`.
    pub system_prompt: Option<String>,
    /// Where `save_document` writes.
    pub output_dir: PathBuf,
    /// Character budget of the workspace summary in the initial prompt.
    pub structure_max_size: usize,
    /// Depth of the workspace summary in the initial prompt.
    pub structure_max_depth: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::from_defaults(&AgentDefaults::default())
    }
}

impl AgentConfig {
    /// Build from the `agent` section of the config file.
    pub fn from_defaults(defaults: &AgentDefaults) -> Self {
        Self {
            workspace_root: expand_home(&defaults.workspace),
            max_iterations: defaults.max_iterations,
            debug_mode: defaults.debug,
            prompt_dir: expand_home(&defaults.prompt_dir),
            system_prompt: defaults.system_prompt.clone(),
            output_dir: expand_home(&defaults.output_dir),
            structure_max_size: defaults.structure_max_size,
            structure_max_depth: defaults.structure_max_depth,
        }
    }
}

// ─────────────────────────────────────────────
// Errors & results
// ─────────────────────────────────────────────

/// Run-level failures. Each one ends the run.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Workspace path does not exist: {}", .0.display())]
    WorkspaceNotFound(PathBuf),

    #[error("invalid agent configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to load prompt from {}: {source}", path.display())]
    PromptLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("completion failed: {0}")]
    Completion(#[from] CompletionError),

    #[error("agent not initialized; call initialize() first")]
    NotInitialized,
}

/// Why a successful run stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// The model invoked the finish tool.
    FinishTool,
    /// The iteration cap was reached.
    MaxIterations,
}

/// Outcome of one `analyze_workspace` call.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResult {
    pub success: bool,
    /// Text of the last completion received.
    pub final_response: String,
    /// Every response that carried no directive, in order.
    pub findings: Vec<String>,
    /// Completions received during the run.
    pub iteration_count: u32,
    /// Tool calls executed during the run.
    pub tool_call_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    pub duration_ms: u64,
}

/// Per-run accumulator, created fresh by each `analyze_workspace` call.
#[derive(Debug)]
pub struct AnalysisContext {
    pub start_time: Instant,
    pub iteration_count: u32,
    pub tool_call_history: Vec<ToolCall>,
    pub findings: Vec<String>,
}

impl AnalysisContext {
    fn new() -> Self {
        Self {
            start_time: Instant::now(),
            iteration_count: 0,
            tool_call_history: Vec::new(),
            findings: Vec::new(),
        }
    }

    fn elapsed_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }
}

// ─────────────────────────────────────────────
// AgentLoop
// ─────────────────────────────────────────────

/// Drives analysis runs over one workspace.
pub struct AgentLoop {
    config: AgentConfig,
    /// Completion capability.
    provider: Arc<dyn CompletionProvider>,
    /// Read-only workspace access.
    fs: Arc<dyn FileSystem>,
    /// Receives round-trip and run reports.
    observer: Arc<dyn RunObserver>,
    /// Tool registry.
    tools: ToolRegistry,
    parser: ResponseParser,
    initialized: bool,
}

impl AgentLoop {
    /// Create an agent. Call [`initialize`](Self::initialize) before running.
    pub fn new(
        config: AgentConfig,
        provider: Arc<dyn CompletionProvider>,
        fs: Arc<dyn FileSystem>,
        observer: Arc<dyn RunObserver>,
    ) -> Self {
        Self {
            config,
            provider,
            fs,
            observer,
            tools: ToolRegistry::new(),
            parser: ResponseParser::new(),
            initialized: false,
        }
    }

    /// Validate the configuration and workspace, then register the tools.
    ///
    /// Makes no completion calls.
    pub fn initialize(&mut self) -> Result<(), AgentError> {
        info!(
            workspace = %self.config.workspace_root.display(),
            provider = self.provider.display_name(),
            "initializing agent"
        );

        if self.config.max_iterations == 0 {
            return Err(AgentError::InvalidConfig(
                "maxIterations must be a positive integer".into(),
            ));
        }
        if !self.fs.exists(".") {
            return Err(AgentError::WorkspaceNotFound(self.config.workspace_root.clone()));
        }

        let builtins =
            ToolRegistry::with_read_only_tools(self.fs.clone(), self.config.output_dir.clone());
        for tool in builtins.get_all() {
            self.tools.register(tool);
        }
        info!(
            count = self.tools.len(),
            tools = %self.tools.tool_names().join(", "),
            "tools initialized"
        );

        self.initialized = true;
        Ok(())
    }

    /// Register an additional tool; a tool with the same name is replaced.
    pub fn register_tool(&mut self, tool: Arc<dyn Tool>) {
        self.tools.register(tool);
    }

    /// Tool registry.
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Run one analysis. `request` overrides `prompt.txt`.
    pub async fn analyze_workspace(&self, request: Option<&str>) -> AgentResult {
        let mut context = AnalysisContext::new();
        match self.run(request, &mut context).await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, iterations = context.iteration_count, "analysis failed");
                AgentResult {
                    success: false,
                    final_response: String::new(),
                    findings: Vec::new(),
                    iteration_count: context.iteration_count,
                    tool_call_count: context.tool_call_history.len(),
                    error: Some(e.to_string()),
                    finish_reason: None,
                    duration_ms: context.elapsed_ms(),
                }
            }
        }
    }

    async fn run(
        &self,
        request: Option<&str>,
        context: &mut AnalysisContext,
    ) -> Result<AgentResult, AgentError> {
        if !self.initialized {
            return Err(AgentError::NotInitialized);
        }

        // Each run starts a fresh conversation.
        self.provider.clear_context().await;

        let system_prompt = self.load_system_prompt().await?;
        let request = self.load_request(request).await?;
        info!(request = %truncate_string(&request, 50), "analyzing workspace");

        let workspace_description = self
            .fs
            .describe_workspace(self.config.structure_max_size, self.config.structure_max_depth);
        let tool_descriptions = PromptBuilder::tool_descriptions(&self.tools);
        let mut prompt = PromptBuilder::build_initial_prompt(
            &self.config,
            &workspace_description,
            &tool_descriptions,
            &request,
        );

        let executor = ToolExecutor::new(&self.tools, self.config.debug_mode);

        loop {
            debug!(
                iteration = context.iteration_count + 1,
                prompt_chars = prompt.len(),
                "requesting completion"
            );
            let response = self.provider.complete(&prompt, Some(&system_prompt)).await?;
            context.iteration_count += 1;
            info!(
                iteration = context.iteration_count,
                max = self.config.max_iterations,
                "iteration"
            );

            self.observer.on_completion(
                &prompt,
                &response,
                &json!({
                    "iteration": context.iteration_count,
                    "maxIterations": self.config.max_iterations,
                    "provider": self.provider.display_name(),
                }),
            );

            let extraction = self.parser.extract(&response);
            for failure in &extraction.failures {
                self.observer.on_parse_failure(failure);
            }
            if extraction.calls.is_empty() {
                debug!(iteration = context.iteration_count, "no tool calls in response");
                context.findings.push(response.clone());
            }

            let batch_start = context.tool_call_history.len();
            executor
                .execute_all(extraction.calls, &mut context.tool_call_history)
                .await;
            let executed = &context.tool_call_history[batch_start..];

            let finish_reason = if executed.iter().any(|call| call.name == FINISH_TOOL) {
                Some(FinishReason::FinishTool)
            } else if context.iteration_count >= self.config.max_iterations {
                Some(FinishReason::MaxIterations)
            } else {
                None
            };

            if let Some(reason) = finish_reason {
                return Ok(self.terminate(request, response, reason, context));
            }

            prompt = PromptBuilder::build_followup_prompt(executed);
        }
    }

    fn terminate(
        &self,
        request: String,
        final_response: String,
        reason: FinishReason,
        context: &mut AnalysisContext,
    ) -> AgentResult {
        let duration_ms = context.elapsed_ms();
        info!(
            iterations = context.iteration_count,
            reason = ?reason,
            duration_ms,
            "analysis completed"
        );

        let summary = RunSummary {
            request,
            findings: context.findings.clone(),
            tool_call_history: std::mem::take(&mut context.tool_call_history),
            iteration_count: context.iteration_count,
            duration_ms,
        };
        self.observer.on_run_complete(&summary);

        AgentResult {
            success: true,
            final_response,
            findings: summary.findings,
            iteration_count: context.iteration_count,
            tool_call_count: summary.tool_call_history.len(),
            error: None,
            finish_reason: Some(reason),
            duration_ms,
        }
    }

    async fn load_system_prompt(&self) -> Result<String, AgentError> {
        if let Some(inline) = self.config.system_prompt.as_deref() {
            if !inline.trim().is_empty() {
                return Ok(inline.trim().to_string());
            }
        }
        let path = self.config.prompt_dir.join(SYSTEM_PROMPT_FILE);
        read_prompt_file(&path, DEFAULT_SYSTEM_PROMPT).await
    }

    async fn load_request(&self, request: Option<&str>) -> Result<String, AgentError> {
        if let Some(request) = request {
            if !request.trim().is_empty() {
                return Ok(request.to_string());
            }
        }
        let path = self.config.prompt_dir.join(REQUEST_PROMPT_FILE);
        read_prompt_file(&path, DEFAULT_REQUEST).await
    }
}

/// Trimmed file content, or `fallback` when the file is missing or blank.
async fn read_prompt_file(path: &Path, fallback: &str) -> Result<String, AgentError> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) if !text.trim().is_empty() => {
            debug!(path = %path.display(), "loaded prompt file");
            Ok(text.trim().to_string())
        }
        Ok(_) => {
            warn!(path = %path.display(), "prompt file is empty, using fallback");
            Ok(fallback.to_string())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "prompt file not found, using fallback");
            Ok(fallback.to_string())
        }
        Err(source) => Err(AgentError::PromptLoad {
            path: path.to_path_buf(),
            source,
        }),
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
