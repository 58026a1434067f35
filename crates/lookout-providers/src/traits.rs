//! Completion provider trait: the only way the agent talks to a model.
//!
//! The agent sends a prompt (plus an optional system prompt) and receives the
//! model's raw text. Transport, auth, and conversation memory are the
//! provider's business.

use async_trait::async_trait;

/// Why a completion request produced no usable text.
///
/// Every variant is fatal for the analysis run that issued the request;
/// nothing in the agent retries.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("HTTP request failed: {0}")]
    Transport(String),

    #[error("not authenticated: {0}")]
    Unauthenticated(String),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("unrecognized response shape: {0}")]
    InvalidResponse(String),

    #[error("no usable content in completion response")]
    EmptyResponse,

    #[error("completion service unavailable: {0}")]
    Unavailable(String),
}

/// Text completion capability.
///
/// `complete` is the sole suspension point of an agent iteration; callers
/// never keep more than one request in flight per provider.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Send `prompt` (with an optional system prompt) and return the reply text.
    async fn complete(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
    ) -> Result<String, CompletionError>;

    /// Forget any conversation memory accumulated by previous calls.
    async fn clear_context(&self) {}

    /// Display name for logging.
    fn display_name(&self) -> &str;
}
