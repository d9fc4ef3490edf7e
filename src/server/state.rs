//! Shared state of the relay.

use std::sync::Arc;

use crate::core::config::ServerSettings;
use crate::core::gemini::GeminiProvider;
use crate::core::provider::ChatProvider;

/// State shared by every handler. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn ChatProvider>,
}

impl AppState {
    pub fn new(provider: impl ChatProvider + 'static) -> Self {
        Self {
            provider: Arc::new(provider),
        }
    }

    /// State backed by the Gemini API.
    pub fn gemini(settings: &ServerSettings) -> Self {
        Self::new(GeminiProvider::new(
            reqwest::Client::new(),
            settings.api_base_url.clone(),
            settings.api_key.clone(),
            settings.model.clone(),
            settings.generation.clone(),
        ))
    }
}
