//! TUI-less "say" command

use std::error::Error;
use std::io::{self, Write};

use crate::client::{ChatStreamService, RelayClient, StreamMessage};
use crate::core::config::ClientSettings;
use crate::logging::init_stderr_logging;
use crate::ui::input::can_submit;

pub async fn run_say(
    prompt: Vec<String>,
    settings: ClientSettings,
    no_stream: bool,
) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    if !can_submit(&prompt, false) {
        eprintln!("Usage: relaychat say <prompt>");
        std::process::exit(1);
    }

    init_stderr_logging();
    let client = RelayClient::from_settings(&settings);
    tracing::debug!(backend = %client.base_url(), mode = %client.frame_mode(), "sending prompt");

    if no_stream {
        let reply = client.send(&prompt).await?;
        println!("{reply}");
        return Ok(());
    }

    let (stream_service, mut rx) = ChatStreamService::new();
    stream_service.spawn_stream(client, prompt, 0);

    loop {
        match rx.recv().await {
            Some((StreamMessage::Chunk(content), _)) => {
                print!("{content}");
                io::stdout().flush()?;
            }
            Some((StreamMessage::Error(err), _)) => {
                eprintln!("\n\n❌ Error: {err}");
                std::process::exit(1);
            }
            Some((StreamMessage::End, _)) => {
                println!();
                break;
            }
            None => break,
        }
    }

    Ok(())
}
