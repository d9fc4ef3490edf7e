use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::client::frames::FrameMode;
use crate::core::generation::GenerationSettings;

/// Contents of `config.toml`.
///
/// Every field is optional; environment variables and command-line flags
/// take precedence over what is stored here. The provider credential is
/// never read from this file.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Gemini model name (e.g., "gemini-1.5-flash")
    pub model: Option<String>,
    /// Base URL of the generative-language API
    pub api_base_url: Option<String>,
    /// Port the relay server listens on
    pub port: Option<u16>,
    /// Relay server URL used by the chat client
    pub backend_url: Option<String>,
    /// How the chat client decodes relay frames ("events" or "legacy")
    pub frame_mode: Option<FrameMode>,
    /// Language used to highlight fenced code in bot replies
    pub code_language: Option<String>,
    #[serde(default)]
    pub generation: GenerationSettings,
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
