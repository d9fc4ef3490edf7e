//! Command-line interface parsing and handling

pub mod say;
pub mod serve;

use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::cli::say::run_say;
use crate::cli::serve::run_serve;
use crate::client::FrameMode;
use crate::core::config::{Config, Overrides};
use crate::logging::init_file_logging;
use crate::ui::chat_loop::run_chat;

#[derive(Parser)]
#[command(name = "relaychat")]
#[command(about = "A streaming relay for the Gemini API and a terminal chat client")]
#[command(
    long_about = "relaychat runs a small HTTP relay in front of the Gemini API and a \
full-screen terminal client that streams replies from it.\n\n\
Environment Variables:\n\
  GEMINI_API_KEY          Gemini API key (required by `serve`)\n\
  GEMINI_MODEL            Model name (default gemini-1.5-flash)\n\
  GEMINI_BASE_URL         Gemini API base URL\n\
  PORT                    Relay listening port (default 5000)\n\
  RELAYCHAT_BACKEND_URL   Relay URL used by `chat` and `say` (default http://localhost:5000)\n\n\
Controls:\n\
  Enter             Send the message\n\
  Shift+Enter       Insert a newline\n\
  Esc               Stop the reply in progress\n\
  Up/Down/Mouse     Scroll through chat history\n\
  Ctrl+Y            Copy the latest code block\n\
  Ctrl+C            Quit the application"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Read configuration from this file instead of the platform default
    #[arg(short = 'c', long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write logs of the chat view to this file
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the relay server
    Serve {
        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
        /// Gemini model to relay to
        #[arg(short = 'm', long)]
        model: Option<String>,
        /// Answer every message with a canned reply instead of calling Gemini
        #[arg(long)]
        scripted: bool,
    },
    /// Start the terminal chat client (default)
    Chat {
        /// Base URL of the relay
        #[arg(short = 'b', long, value_name = "URL")]
        backend_url: Option<String>,
        /// How reply frames are decoded
        #[arg(long, value_enum)]
        frame_mode: Option<FrameMode>,
    },
    /// Send one message and print the reply
    Say {
        /// Message to send
        #[arg(trailing_var_arg = true)]
        prompt: Vec<String>,
        /// Base URL of the relay
        #[arg(short = 'b', long, value_name = "URL")]
        backend_url: Option<String>,
        /// How reply frames are decoded
        #[arg(long, value_enum)]
        frame_mode: Option<FrameMode>,
        /// Wait for the whole reply instead of streaming it
        #[arg(long)]
        no_stream: bool,
    },
    /// Print the effective configuration
    Config,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let runtime = tokio::runtime::Runtime::new()?;
    if let Err(err) = runtime.block_on(async_main()) {
        eprintln!("❌ Error: {err}");
        std::process::exit(1);
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn Error>> {
    Ok(match path {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    })
}

fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    match args.command.unwrap_or(Commands::Chat {
        backend_url: None,
        frame_mode: None,
    }) {
        Commands::Serve {
            port,
            model,
            scripted,
        } => {
            let overrides = Overrides {
                port,
                model,
                ..Default::default()
            };
            run_serve(&config, &overrides, scripted, process_env).await
        }
        Commands::Chat {
            backend_url,
            frame_mode,
        } => {
            if let Some(path) = &args.log {
                init_file_logging(path)?;
            }
            let overrides = Overrides {
                backend_url,
                frame_mode,
                ..Default::default()
            };
            run_chat(config.client_settings(&overrides, process_env)).await
        }
        Commands::Say {
            prompt,
            backend_url,
            frame_mode,
            no_stream,
        } => {
            let overrides = Overrides {
                backend_url,
                frame_mode,
                ..Default::default()
            };
            run_say(prompt, config.client_settings(&overrides, process_env), no_stream).await
        }
        Commands::Config => {
            config.print_all(&Overrides::default(), process_env);
            Ok(())
        }
    }
}
