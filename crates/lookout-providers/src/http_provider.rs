//! HTTP completion provider for OpenAI-compatible APIs.
//!
//! Talks to any `/chat/completions` endpoint (Copilot, OpenAI, OpenRouter,
//! Ollama) and keeps a rolling conversation history so that follow-up
//! prompts are answered in the context of earlier turns.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use lookout_core::config::schema::ProviderConfig;
use lookout_core::types::{ChatCompletionRequest, ChatCompletionResponse, Message};

use crate::registry::{self, ProviderSpec};
use crate::traits::{CompletionError, CompletionProvider};

/// Request timeout for a single completion call.
const REQUEST_TIMEOUT_SECS: u64 = 120;

// ─────────────────────────────────────────────
// HttpProvider
// ─────────────────────────────────────────────

/// A completion provider that talks to an OpenAI-compatible HTTP API.
pub struct HttpProvider {
    /// HTTP client (shared, connection-pooled).
    client: reqwest::Client,
    /// API base URL (e.g. `"https://api.openai.com/v1"`).
    api_base: String,
    /// Bearer token; empty for keyless local endpoints.
    api_key: String,
    /// Model sent with every request.
    model: String,
    max_tokens: u32,
    temperature: f64,
    /// Spec defaults merged with user-configured headers.
    headers: HeaderMap,
    /// Prior user/assistant turns, oldest first.
    history: Mutex<Vec<Message>>,
    max_history: usize,
    spec: &'static ProviderSpec,
}

impl std::fmt::Debug for HttpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProvider")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("provider", &self.spec.display_name)
            .finish()
    }
}

impl HttpProvider {
    /// Create a provider from user config and a static spec.
    pub fn new(config: &ProviderConfig, spec: &'static ProviderSpec) -> Result<Self, CompletionError> {
        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| spec.default_api_base.to_string());

        let mut headers = HeaderMap::new();
        let defaults = spec.default_headers.iter().map(|(k, v)| (k.to_string(), v.to_string()));
        let extras = config
            .extra_headers
            .iter()
            .flatten()
            .map(|(k, v)| (k.clone(), v.clone()));
        for (key, value) in defaults.chain(extras) {
            match (
                HeaderName::from_bytes(key.as_bytes()),
                HeaderValue::from_str(&value),
            ) {
                (Ok(name), Ok(val)) => {
                    headers.insert(name, val);
                }
                _ => warn!("Invalid header: {}={}", key, value),
            }
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| CompletionError::Unavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(HttpProvider {
            client,
            api_base,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            headers,
            history: Mutex::new(Vec::new()),
            max_history: config.max_history,
            spec,
        })
    }

    /// Build the full chat completions URL.
    fn completions_url(&self) -> String {
        let base = self.api_base.trim_end_matches('/');
        format!("{}/chat/completions", base)
    }

    /// Number of messages currently remembered.
    pub async fn history_len(&self) -> usize {
        self.history.lock().await.len()
    }

    /// Model sent with each request.
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn remember(&self, prompt: &str, reply: &str) {
        let mut history = self.history.lock().await;
        history.push(Message::user(prompt));
        history.push(Message::assistant(reply));
        if history.len() > self.max_history {
            // Drop whole user/assistant pairs so the history never opens on a reply.
            let excess = history.len() - self.max_history;
            let len = history.len();
            history.drain(..(excess + excess % 2).min(len));
        }
    }
}

#[async_trait]
impl CompletionProvider for HttpProvider {
    async fn complete(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
    ) -> Result<String, CompletionError> {
        if self.spec.requires_key && self.api_key.is_empty() {
            return Err(CompletionError::Unauthenticated(format!(
                "{} requires an API key (set {})",
                self.spec.display_name, self.spec.env_key
            )));
        }

        let mut messages = Vec::new();
        if let Some(system) = system_prompt {
            messages.push(Message::system(system));
        }
        messages.extend(self.history.lock().await.iter().cloned());
        messages.push(Message::user(prompt));

        debug!(
            provider = self.spec.display_name,
            model = %self.model,
            messages = messages.len(),
            prompt_chars = prompt.len(),
            "Calling completion endpoint"
        );

        let request_body = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            max_tokens: Some(self.max_tokens),
            temperature: Some(self.temperature),
        };

        let mut request = self
            .client
            .post(self.completions_url())
            .headers(self.headers.clone())
            .json(&request_body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request.send().await.map_err(|e| {
            error!(provider = self.spec.display_name, error = %e, "HTTP request failed");
            CompletionError::Transport(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(
                provider = self.spec.display_name,
                status = %status,
                body = %body,
                "API error"
            );
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    CompletionError::Unauthenticated(format!("{status}: {body}"))
                }
                _ => CompletionError::Api {
                    status: status.as_u16(),
                    body,
                },
            });
        }

        let chat_resp: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::InvalidResponse(e.to_string()))?;

        let content = chat_resp
            .first_content()
            .ok_or(CompletionError::EmptyResponse)?
            .to_string();

        debug!(
            provider = self.spec.display_name,
            response_chars = content.len(),
            finish_reason = chat_resp.finish_reason().unwrap_or("?"),
            total_tokens = chat_resp.usage.as_ref().map_or(0, |u| u.total_tokens),
            "Completion received"
        );

        self.remember(prompt, &content).await;
        Ok(content)
    }

    async fn clear_context(&self) {
        self.history.lock().await.clear();
        debug!(provider = self.spec.display_name, "conversation context cleared");
    }

    fn display_name(&self) -> &str {
        self.spec.display_name
    }
}

// ─────────────────────────────────────────────
// Builder (convenience)
// ─────────────────────────────────────────────

/// Build an HttpProvider from the provider section of the config.
pub fn create_provider(config: &ProviderConfig) -> Result<HttpProvider, String> {
    let spec = if config.name.is_empty() {
        registry::default_spec()
    } else {
        registry::find_by_name(&config.name).ok_or_else(|| {
            let known: Vec<&str> = registry::PROVIDERS.iter().map(|s| s.name).collect();
            format!(
                "Unknown provider '{}'. Known providers: {}",
                config.name,
                known.join(", ")
            )
        })?
    };

    if spec.requires_key && !config.is_configured() {
        return Err(format!(
            "No API key configured for {}. Set {} or pass --token.",
            spec.display_name, spec.env_key
        ));
    }

    debug!(
        provider = spec.display_name,
        model = %config.model,
        api_base = config.api_base.as_deref().unwrap_or(spec.default_api_base),
        "Creating completion provider"
    );

    HttpProvider::new(config, spec).map_err(|e| e.to_string())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
