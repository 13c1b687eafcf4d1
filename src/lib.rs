//! Persona Gateway
//!
//! A gateway between a chat client and an OpenAI-compatible completion
//! provider that:
//! - enforces a fixed, non-overridable persona on every call,
//! - automatically continues length-truncated replies (bounded),
//! - aggregates token usage across all calls of one logical request,
//! - applies a post-hoc banned-phrase filter to the assembled answer.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use api::state::AppState;
use domain::ChatProvider;
use infrastructure::llm::{GroqProvider, HttpClient};

/// Create the application state from the loaded configuration.
pub fn create_app_state(config: &AppConfig) -> AppState {
    let client = HttpClient::with_timeout(Duration::from_secs(config.provider.timeout_secs));
    let api_key = config.gateway.api_key.clone().unwrap_or_default();

    let provider: Arc<dyn ChatProvider> = match &config.provider.base_url {
        Some(base_url) => Arc::new(GroqProvider::with_base_url(client, api_key, base_url)),
        None => Arc::new(GroqProvider::new(client, api_key)),
    };

    AppState::new(Arc::new(config.gateway.clone()), provider)
}
