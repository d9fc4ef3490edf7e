//! `relaychat serve`

use std::error::Error;
use std::net::SocketAddr;
use std::time::Duration;

use crate::core::config::{Config, ConfigError, Overrides};
use crate::core::scripted::ScriptedProvider;
use crate::logging::init_stderr_logging;
use crate::server::{run_server, AppState};

const SCRIPTED_REPLY: [&str; 6] = [
    "This is a **scripted** reply.\n",
    "* It streams in small pieces\n",
    "* It never calls Gemini\n",
    "```",
    "int answer = 42;",
    "```\n",
];

/// Demo provider for `--scripted`.
fn scripted_provider() -> ScriptedProvider {
    ScriptedProvider::from_fragments(SCRIPTED_REPLY).with_delay(Duration::from_millis(120))
}

pub async fn run_serve<F>(
    config: &Config,
    overrides: &Overrides,
    scripted: bool,
    env: F,
) -> Result<(), Box<dyn Error>>
where
    F: Fn(&str) -> Option<String>,
{
    init_stderr_logging();

    let (state, port) = if scripted {
        let port = config.listen_port(overrides, &env)?;
        tracing::warn!("serving scripted replies; Gemini is not called");
        (AppState::new(scripted_provider()), port)
    } else {
        let settings = match config.server_settings(overrides, &env) {
            Ok(settings) => settings,
            Err(ConfigError::MissingApiKey) => {
                eprintln!("❌ Error: {}", ConfigError::MissingApiKey);
                eprintln!();
                eprintln!("Set your Gemini API key before starting the relay:");
                eprintln!("export GEMINI_API_KEY=\"your-api-key-here\"");
                std::process::exit(1);
            }
            Err(err) => return Err(err.into()),
        };
        tracing::debug!(?settings, "resolved server settings");
        tracing::info!(model = %settings.model, "relaying to Gemini");
        (AppState::gemini(&settings), settings.port)
    };

    run_server(state, SocketAddr::from(([0, 0, 0, 0], port))).await?;
    Ok(())
}
