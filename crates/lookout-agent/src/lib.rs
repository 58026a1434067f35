//! Lookout Agent: read-only analysis loop over a workspace.
//!
//! This crate contains:
//! - **workspace**: confined, read-only filesystem access and tree rendering
//! - **tools**: Tool trait, registry, and the built-in analysis tools
//! - **parser**: tool-call extraction from free-form model output
//! - **executor**: sequential, failure-isolated tool dispatch
//! - **prompt**: initial and follow-up prompt rendering
//! - **telemetry**: observer seam for round-trip and run reports
//! - **agent_loop**: the iteration/termination state machine

pub mod agent_loop;
pub mod executor;
pub mod parser;
pub mod prompt;
pub mod telemetry;
pub mod tools;
pub mod workspace;

pub use agent_loop::{AgentConfig, AgentError, AgentLoop, AgentResult, FinishReason};
pub use executor::ToolExecutor;
pub use parser::{extract_tool_calls, Extraction, ParseFailure, ResponseParser, ToolCall};
pub use prompt::PromptBuilder;
pub use telemetry::{NoopObserver, RunObserver, RunSummary, TracingObserver};
pub use tools::{Tool, ToolRegistry};
pub use workspace::{FileSystem, ReadOnlyFileSystem};
