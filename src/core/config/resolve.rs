//! Layering of config file, environment, and command-line overrides.

use crate::client::frames::FrameMode;
use crate::core::config::data::Config;
use crate::core::config::io::ConfigError;
use crate::core::gemini::DEFAULT_API_BASE_URL;
use crate::core::generation::{GenerationSettings, DEFAULT_MODEL};

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";
pub const DEFAULT_CODE_LANGUAGE: &str = "cpp";

pub const ENV_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_MODEL: &str = "GEMINI_MODEL";
pub const ENV_API_BASE_URL: &str = "GEMINI_BASE_URL";
pub const ENV_PORT: &str = "PORT";
pub const ENV_BACKEND_URL: &str = "RELAYCHAT_BACKEND_URL";

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub port: Option<u16>,
    pub backend_url: Option<String>,
    pub model: Option<String>,
    pub frame_mode: Option<FrameMode>,
}

/// Everything the relay server and the Gemini provider need.
///
/// Built once at startup and shared read-only with every request.
#[derive(Clone)]
pub struct ServerSettings {
    pub port: u16,
    pub api_key: String,
    pub model: String,
    pub api_base_url: String,
    pub generation: GenerationSettings,
}

impl std::fmt::Debug for ServerSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerSettings")
            .field("port", &self.port)
            .field("api_key", &mask_secret(&self.api_key))
            .field("model", &self.model)
            .field("api_base_url", &self.api_base_url)
            .field("generation", &self.generation)
            .finish()
    }
}

/// Settings of the chat client.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub backend_url: String,
    pub frame_mode: FrameMode,
    pub code_language: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Resolve the relay server settings.
    ///
    /// `env` looks up environment variables; pass `|name| std::env::var(name).ok()`
    /// in production.
    pub fn server_settings<F>(
        &self,
        overrides: &Overrides,
        env: F,
    ) -> Result<ServerSettings, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = non_empty(env(ENV_API_KEY)).ok_or(ConfigError::MissingApiKey)?;
        let (model, api_base_url) = self.provider_target(overrides, &env);
        let port = self.listen_port(overrides, &env)?;

        Ok(ServerSettings {
            port,
            api_key: api_key.trim().to_string(),
            model,
            api_base_url,
            generation: self.generation.clone(),
        })
    }

    /// Port the relay listens on.
    pub fn listen_port<F>(&self, overrides: &Overrides, env: F) -> Result<u16, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match (overrides.port, non_empty(env(ENV_PORT))) {
            (Some(port), _) => Ok(port),
            (None, Some(raw)) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(raw)),
            (None, None) => Ok(self.port.unwrap_or(DEFAULT_PORT)),
        }
    }

    /// Resolve the chat client settings.
    pub fn client_settings<F>(&self, overrides: &Overrides, env: F) -> ClientSettings
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend_url = overrides
            .backend_url
            .clone()
            .or_else(|| non_empty(env(ENV_BACKEND_URL)))
            .or_else(|| self.backend_url.clone())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());

        ClientSettings {
            backend_url,
            frame_mode: overrides
                .frame_mode
                .or(self.frame_mode)
                .unwrap_or_default(),
            code_language: self
                .code_language
                .clone()
                .unwrap_or_else(|| DEFAULT_CODE_LANGUAGE.to_string()),
        }
    }

    fn provider_target<F>(&self, overrides: &Overrides, env: &F) -> (String, String)
    where
        F: Fn(&str) -> Option<String>,
    {
        let model = overrides
            .model
            .clone()
            .or_else(|| non_empty(env(ENV_MODEL)))
            .or_else(|| self.model.clone())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let api_base_url = non_empty(env(ENV_API_BASE_URL))
            .or_else(|| self.api_base_url.clone())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        (model, api_base_url)
    }
}

/// Show only the last four characters of a credential.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}
