//! JSON-lines run logs.
//!
//! One file per kind per day in the logs directory:
//! - `llm_output_<date>.jsonl`: one line per completion round-trip
//! - `analysis_<date>.jsonl`: one line per finished run
//!
//! Write failures are logged and otherwise ignored; they never affect a run.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use tracing::warn;

use lookout_agent::telemetry::{RunObserver, RunSummary, TracingObserver};
use lookout_agent::ParseFailure;
use lookout_core::utils::{timestamp, today_date, truncate_string};

/// Prompt characters kept per `llm_output` entry.
const PROMPT_LOG_CHARS: usize = 1000;

/// Appends run reports to dated `.jsonl` files, and traces them too.
pub struct JsonlObserver {
    dir: PathBuf,
    tracing: TracingObserver,
}

impl JsonlObserver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            tracing: TracingObserver,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_for(&self, prefix: &str) -> PathBuf {
        self.dir.join(format!("{prefix}_{}.jsonl", today_date()))
    }

    fn append(&self, prefix: &str, entry: &Value) {
        let path = self.file_for(prefix);
        let written = std::fs::create_dir_all(&self.dir).and_then(|_| {
            let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
            writeln!(file, "{entry}")
        });
        if let Err(e) = written {
            warn!(path = %path.display(), error = %e, "failed to write run log");
        }
    }
}

impl RunObserver for JsonlObserver {
    fn on_completion(&self, prompt: &str, response: &str, metadata: &Value) {
        self.tracing.on_completion(prompt, response, metadata);
        self.append(
            "llm_output",
            &json!({
                "timestamp": timestamp(),
                "type": "llm_output",
                "prompt": truncate_string(prompt, PROMPT_LOG_CHARS),
                "response": response,
                "metadata": metadata,
            }),
        );
    }

    fn on_parse_failure(&self, failure: &ParseFailure) {
        self.tracing.on_parse_failure(failure);
    }

    fn on_run_complete(&self, summary: &RunSummary) {
        self.tracing.on_run_complete(summary);
        self.append(
            "analysis",
            &json!({
                "timestamp": timestamp(),
                "type": "code_analysis",
                "analysis": {
                    "request": summary.request,
                    "findings": summary.findings,
                    "toolCalls": summary.tool_call_history,
                    "iterations": summary.iteration_count,
                    "durationMs": summary.duration_ms,
                },
            }),
        );
    }
}
