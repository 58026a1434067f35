//! Completion provider layer for Lookout.
//!
//! # Architecture
//!
//! - [`traits::CompletionProvider`]: the text-in/text-out capability the agent consumes
//! - [`registry`]: static specs for the supported endpoints
//! - [`http_provider::HttpProvider`]: OpenAI-compatible HTTP client with conversation memory
//! - [`http_provider::create_provider`]: convenience builder from config

pub mod http_provider;
pub mod registry;
pub mod traits;

pub use http_provider::{create_provider, HttpProvider};
pub use registry::{ProviderSpec, PROVIDERS};
pub use traits::{CompletionError, CompletionProvider};
