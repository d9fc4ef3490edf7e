//! Conversation state and reply accumulation.

use std::fmt::Display;

use futures_util::{Stream, StreamExt};

use super::message::ConversationEntry;

/// Bot entry appended when a turn fails.
pub const ERROR_REPLY: &str = "Error: Could not get a response";

/// Where the next chunk of the current reply goes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ReplyState {
    /// No bot entry is being built; the next chunk starts one.
    #[default]
    Idle,
    /// Chunks extend the bot entry at `index`.
    Accumulating { index: usize, buffer: String },
}

/// Ordered entries of one chat session.
///
/// Entries are only appended, except that chunks of the reply in progress
/// rewrite the bot entry they started.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    entries: Vec<ConversationEntry>,
    reply: ReplyState,
    loading: bool,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn reply_state(&self) -> &ReplyState {
        &self.reply
    }

    pub fn last_bot_entry(&self) -> Option<&ConversationEntry> {
        self.entries.iter().rev().find(|entry| entry.is_bot())
    }

    /// Record the user's message and wait for a fresh reply.
    pub fn begin_turn(&mut self, message: impl Into<String>) {
        self.entries.push(ConversationEntry::user(message));
        self.reply = ReplyState::Idle;
        self.loading = true;
    }

    /// Extend the reply in progress with one decoded chunk.
    pub fn apply_chunk(&mut self, chunk: &str) {
        match &mut self.reply {
            ReplyState::Idle => {
                if chunk.is_empty() {
                    return;
                }
                self.entries.push(ConversationEntry::bot(chunk));
                self.reply = ReplyState::Accumulating {
                    index: self.entries.len() - 1,
                    buffer: chunk.to_string(),
                };
            }
            ReplyState::Accumulating { index, buffer } => {
                buffer.push_str(chunk);
                if let Some(entry) = self.entries.get_mut(*index) {
                    entry.content.clone_from(buffer);
                }
            }
        }
    }

    /// Close the turn after a clean end of stream.
    pub fn finish(&mut self) {
        self.reply = ReplyState::Idle;
        self.loading = false;
    }

    /// Close the turn after a failure.
    ///
    /// Text that already arrived stays visible; one error entry follows it.
    pub fn fail(&mut self, error: &dyn Display) {
        tracing::warn!("chat turn failed: {error}");
        self.entries.push(ConversationEntry::bot(ERROR_REPLY));
        self.reply = ReplyState::Idle;
        self.loading = false;
    }

    /// Drive a whole reply stream into the conversation.
    pub async fn consume<S, E>(&mut self, stream: S) -> Result<(), E>
    where
        S: Stream<Item = Result<String, E>>,
        E: Display,
    {
        let mut stream = std::pin::pin!(stream);
        while let Some(item) = stream.next().await {
            match item {
                Ok(chunk) => self.apply_chunk(&chunk),
                Err(err) => {
                    self.fail(&err);
                    return Err(err);
                }
            }
        }
        self.finish();
        Ok(())
    }
}
