//! Interactive terminal chat view.

use std::error::Error;
use std::io;
use std::time::Duration;

use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::format::format_message_with_language;
use super::input::{can_submit, send_label};
use super::render::build_display_lines;
use crate::client::{ChatStreamService, RelayClient, StreamMessage};
use crate::core::config::ClientSettings;
use crate::core::conversation::Conversation;
use crate::utils::clipboard::copy_to_clipboard;
use crate::utils::scroll::{max_scroll_offset, prewrap_lines};

const INPUT_HEIGHT: u16 = 3;
const MOUSE_SCROLL_LINES: u16 = 3;

/// What the key handler wants the loop to do next.
#[derive(Debug, PartialEq, Eq)]
enum KeyOutcome {
    Continue,
    Quit,
}

pub struct ChatView {
    conversation: Conversation,
    input: String,
    client: RelayClient,
    stream_service: ChatStreamService,
    active_stream: Option<(u64, JoinHandle<()>)>,
    last_stream_id: u64,
    code_language: String,
    scroll_offset: u16,
    max_scroll: u16,
    auto_scroll: bool,
    status: Option<String>,
}

impl ChatView {
    pub fn new(
        client: RelayClient,
        code_language: impl Into<String>,
    ) -> (Self, mpsc::UnboundedReceiver<(StreamMessage, u64)>) {
        let (stream_service, rx) = ChatStreamService::new();
        let view = Self {
            conversation: Conversation::new(),
            input: String::new(),
            client,
            stream_service,
            active_stream: None,
            last_stream_id: 0,
            code_language: code_language.into(),
            scroll_offset: 0,
            max_scroll: 0,
            auto_scroll: true,
            status: None,
        };
        (view, rx)
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn input_mut(&mut self) -> &mut String {
        &mut self.input
    }

    /// Send the typed message and start streaming its reply.
    ///
    /// Returns the id of the new stream, or `None` when nothing was sent.
    pub fn submit(&mut self) -> Option<u64> {
        if !can_submit(&self.input, self.conversation.is_loading()) {
            return None;
        }
        let message = std::mem::take(&mut self.input);
        self.conversation.begin_turn(message.clone());
        self.status = None;
        self.auto_scroll = true;

        self.last_stream_id += 1;
        let stream_id = self.last_stream_id;
        let handle = self
            .stream_service
            .spawn_stream(self.client.clone(), message, stream_id);
        self.active_stream = Some((stream_id, handle));
        Some(stream_id)
    }

    /// Stop the reply in progress, keeping the text received so far.
    pub fn cancel_stream(&mut self) {
        if let Some((stream_id, handle)) = self.active_stream.take() {
            handle.abort();
            tracing::debug!(stream_id, "reply stream cancelled");
            self.conversation.finish();
            self.status = Some("Reply interrupted".to_string());
        }
    }

    /// Apply a message from the stream service. Messages of streams that
    /// are no longer active are dropped.
    pub fn handle_stream_message(&mut self, message: StreamMessage, stream_id: u64) {
        let active = matches!(self.active_stream, Some((id, _)) if id == stream_id);
        if !active {
            tracing::trace!(stream_id, "ignoring message from stale stream");
            return;
        }
        if message == StreamMessage::End {
            self.active_stream = None;
        }
        self.conversation.apply_stream_message(message);
    }

    /// Copy the last code block of the latest reply.
    pub fn copy_latest_code(&mut self) {
        let block = self.conversation.last_bot_entry().and_then(|entry| {
            format_message_with_language(&entry.content, &self.code_language)
                .last_code_block()
                .cloned()
        });
        self.status = Some(match block {
            None => "No code block to copy".to_string(),
            Some(block) => match copy_to_clipboard(&block.code) {
                Ok(()) => "Code copied to clipboard!".to_string(),
                Err(err) => format!("Copy failed: {err}"),
            },
        });
    }

    fn display_lines(&self) -> Vec<Line<'static>> {
        build_display_lines(
            self.conversation.entries(),
            self.conversation.is_loading(),
            &self.code_language,
        )
    }

    fn scroll_up(&mut self, lines: u16) {
        self.auto_scroll = false;
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    /// Scroll towards the bottom, clamped to the extent of the last frame.
    fn scroll_down(&mut self, lines: u16) {
        self.scroll_offset = self.scroll_offset.saturating_add(lines).min(self.max_scroll);
        if self.scroll_offset >= self.max_scroll {
            self.auto_scroll = true;
        }
    }

    fn handle_key(&mut self, key: KeyEvent, available_height: u16) -> KeyOutcome {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => return KeyOutcome::Quit,
            KeyCode::Char('y') if ctrl => self.copy_latest_code(),
            KeyCode::Esc => self.cancel_stream(),
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => self.input.push('\n'),
            KeyCode::Enter => {
                self.submit();
            }
            KeyCode::Char(c) => self.input.push(c),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Up => self.scroll_up(1),
            KeyCode::Down => self.scroll_down(1),
            KeyCode::PageUp => self.scroll_up(available_height),
            KeyCode::PageDown => self.scroll_down(available_height),
            _ => {}
        }
        KeyOutcome::Continue
    }

    fn draw(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(INPUT_HEIGHT)])
            .split(f.area());

        // One row of the pane is the title.
        let available_height = chunks[0].height.saturating_sub(1);
        let lines = prewrap_lines(&self.display_lines(), chunks[0].width);
        self.max_scroll = max_scroll_offset(lines.len(), available_height);
        if self.auto_scroll {
            self.scroll_offset = self.max_scroll;
        }
        self.scroll_offset = self.scroll_offset.min(self.max_scroll);

        let title = match &self.status {
            Some(status) => format!("Gemini AI Chat - {status}"),
            None => "Gemini AI Chat".to_string(),
        };
        let messages = Paragraph::new(lines)
            .block(Block::default().title(title))
            .scroll((self.scroll_offset, 0));
        f.render_widget(messages, chunks[0]);

        let loading = self.conversation.is_loading();
        let input_style = if can_submit(&self.input, loading) {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::DIM)
        };
        let input_title = format!(
            "Type your question... (Enter: {}, Esc: stop, Ctrl+Y: copy code, Ctrl+C: quit)",
            send_label(loading)
        );
        let input = Paragraph::new(self.input.as_str())
            .style(input_style)
            .block(Block::default().borders(Borders::ALL).title(input_title))
            .wrap(Wrap { trim: false });
        f.render_widget(input, chunks[1]);

        let last_line = self.input.rsplit('\n').next().unwrap_or_default();
        let cursor_x = u16::try_from(last_line.chars().count()).unwrap_or(u16::MAX);
        f.set_cursor_position((
            chunks[1].x.saturating_add(cursor_x).saturating_add(1),
            chunks[1].y + 1,
        ));
    }
}

/// Run the terminal chat view against the relay in `settings`.
pub async fn run_chat(settings: ClientSettings) -> Result<(), Box<dyn Error>> {
    let client = RelayClient::from_settings(&settings);
    let (mut view, mut rx) = ChatView::new(client, settings.code_language.clone());
    tracing::info!(
        backend = %settings.backend_url,
        mode = %settings.frame_mode,
        "starting chat view"
    );

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout)).inspect_err(|_| {
        let _ = disable_raw_mode();
    })?;

    let result = event_loop(&mut terminal, &mut view, &mut rx).await;

    view.cancel_stream();
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn event_loop<B>(
    terminal: &mut Terminal<B>,
    view: &mut ChatView,
    rx: &mut mpsc::UnboundedReceiver<(StreamMessage, u64)>,
) -> Result<(), Box<dyn Error>>
where
    B: Backend,
{
    loop {
        terminal.draw(|f| view.draw(f))?;

        let height = terminal.size()?.height;
        let available_height = height.saturating_sub(INPUT_HEIGHT).saturating_sub(1);

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if view.handle_key(key, available_height) == KeyOutcome::Quit {
                        return Ok(());
                    }
                }
                Event::Paste(text) => view.input.push_str(&text),
                Event::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::ScrollUp => view.scroll_up(MOUSE_SCROLL_LINES),
                    MouseEventKind::ScrollDown => view.scroll_down(MOUSE_SCROLL_LINES),
                    _ => {}
                },
                _ => {}
            }
        }

        // Drain everything that arrived since the last frame.
        while let Ok((message, stream_id)) = rx.try_recv() {
            view.handle_stream_message(message, stream_id);
        }
        tokio::task::yield_now().await;
    }
}
