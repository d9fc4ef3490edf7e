use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::RelayClient;
use crate::core::conversation::Conversation;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamMessage {
    Chunk(String),
    Error(String),
    End,
}

impl Conversation {
    /// Apply one message from the stream service.
    pub fn apply_stream_message(&mut self, message: StreamMessage) {
        match message {
            StreamMessage::Chunk(chunk) => self.apply_chunk(&chunk),
            StreamMessage::Error(error) => self.fail(&error),
            StreamMessage::End => {
                if self.is_loading() {
                    self.finish();
                }
            }
        }
    }
}

/// Runs reply streams on the runtime and forwards their progress to the UI
/// loop, tagged with the id of the turn that started them.
#[derive(Clone)]
pub struct ChatStreamService {
    tx: mpsc::UnboundedSender<(StreamMessage, u64)>,
}

impl ChatStreamService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(StreamMessage, u64)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn spawn_stream(
        &self,
        client: RelayClient,
        message: String,
        stream_id: u64,
    ) -> JoinHandle<()> {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            match client.send_and_stream(&message).await {
                Ok(mut stream) => {
                    while let Some(item) = stream.next().await {
                        match item {
                            Ok(chunk) => {
                                let _ = tx.send((StreamMessage::Chunk(chunk), stream_id));
                            }
                            Err(err) => {
                                tracing::debug!(stream_id, "reply stream failed: {err}");
                                let _ = tx.send((StreamMessage::Error(err.to_string()), stream_id));
                                let _ = tx.send((StreamMessage::End, stream_id));
                                return;
                            }
                        }
                    }
                    let _ = tx.send((StreamMessage::End, stream_id));
                }
                Err(err) => {
                    tracing::debug!(stream_id, "reply stream could not start: {err}");
                    let _ = tx.send((StreamMessage::Error(err.to_string()), stream_id));
                    let _ = tx.send((StreamMessage::End, stream_id));
                }
            }
        })
    }

    #[cfg(test)]
    pub fn send_for_test(&self, message: StreamMessage, stream_id: u64) {
        let _ = self.tx.send((message, stream_id));
    }
}
