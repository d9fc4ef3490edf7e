use std::io::Write;
use std::process::{Command, Stdio};

#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("no clipboard command found (install wl-copy, xclip, or xsel)")]
    Unavailable,

    #[error("clipboard command `{0}` failed")]
    Failed(&'static str),
}

/// Platform clipboard commands, tried in order.
fn candidates() -> &'static [(&'static str, &'static [&'static str])] {
    if cfg!(target_os = "macos") {
        &[("pbcopy", &[])]
    } else if cfg!(target_os = "windows") {
        &[("cmd", &["/C", "clip"])]
    } else {
        &[
            ("wl-copy", &[]),
            ("xclip", &["-selection", "clipboard"]),
            ("xsel", &["--clipboard", "--input"]),
        ]
    }
}

/// Copy `text` with the first clipboard command that runs.
pub fn copy_to_clipboard(text: &str) -> Result<(), ClipboardError> {
    let mut last_failure = None;
    for (cmd, args) in candidates() {
        match pipe_to(cmd, args, text) {
            Ok(true) => return Ok(()),
            Ok(false) => last_failure = Some(ClipboardError::Failed(cmd)),
            Err(_) => continue,
        }
    }
    Err(last_failure.unwrap_or(ClipboardError::Unavailable))
}

/// `Err` when the command cannot be spawned, otherwise whether it succeeded.
fn pipe_to(cmd: &str, args: &[&str], input: &str) -> std::io::Result<bool> {
    let mut child = Command::new(cmd)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        let _ = stdin.write_all(input.as_bytes());
    }
    Ok(child.wait()?.success())
}
