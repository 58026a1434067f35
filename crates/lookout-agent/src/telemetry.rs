//! Run observer: where the loop reports what happened.
//!
//! The loop never writes files or prints; it hands round-trips and run
//! summaries to an injected [`RunObserver`]. The CLI persists them, tests
//! inspect them.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::parser::{ParseFailure, ToolCall};

/// Everything known about a finished run.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub request: String,
    pub findings: Vec<String>,
    pub tool_call_history: Vec<ToolCall>,
    pub iteration_count: u32,
    pub duration_ms: u64,
}

/// Sink for per-round-trip and per-run reports.
pub trait RunObserver: Send + Sync {
    /// Called after every completion received from the model.
    fn on_completion(&self, prompt: &str, response: &str, metadata: &Value);

    /// Called for each directive fragment that could not be used.
    fn on_parse_failure(&self, _failure: &ParseFailure) {}

    /// Called once when a run terminates normally.
    fn on_run_complete(&self, summary: &RunSummary);
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {
    fn on_completion(&self, _prompt: &str, _response: &str, _metadata: &Value) {}

    fn on_run_complete(&self, _summary: &RunSummary) {}
}

/// Reports through `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl RunObserver for TracingObserver {
    fn on_completion(&self, prompt: &str, response: &str, metadata: &Value) {
        debug!(
            prompt_chars = prompt.chars().count(),
            response_chars = response.chars().count(),
            metadata = %metadata,
            "completion received"
        );
    }

    fn on_parse_failure(&self, failure: &ParseFailure) {
        debug!(error = %failure, "skipped directive fragment");
    }

    fn on_run_complete(&self, summary: &RunSummary) {
        info!(
            iterations = summary.iteration_count,
            tool_calls = summary.tool_call_history.len(),
            findings = summary.findings.len(),
            duration_ms = summary.duration_ms,
            "analysis run complete"
        );
    }
}
