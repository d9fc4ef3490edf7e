//! Client side of the relay: request, decode, and accumulate replies.

pub mod error;
pub mod frames;
pub mod stream;

use std::pin::Pin;

use futures_util::{Stream, StreamExt};

use crate::api::{ChatReply, ChatRequest};
use crate::core::config::ClientSettings;
use crate::core::conversation::Conversation;
use crate::utils::url::construct_api_url;

pub use error::ClientError;
pub use frames::{FrameDecoder, FrameMode};
pub use stream::{ChatStreamService, StreamMessage};

/// Cleaned text chunks of one reply, in arrival order.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String, ClientError>> + Send>>;

#[derive(Clone, Debug)]
pub struct RelayClient {
    http: reqwest::Client,
    base_url: String,
    frame_mode: FrameMode,
}

impl RelayClient {
    pub fn new(base_url: impl Into<String>, frame_mode: FrameMode) -> Self {
        Self::with_http_client(reqwest::Client::new(), base_url, frame_mode)
    }

    pub fn with_http_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        frame_mode: FrameMode,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            frame_mode,
        }
    }

    pub fn from_settings(settings: &ClientSettings) -> Self {
        Self::new(settings.backend_url.clone(), settings.frame_mode)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn frame_mode(&self) -> FrameMode {
        self.frame_mode
    }

    /// Post `message` to the streaming route and decode the reply lazily.
    ///
    /// The returned stream is finite and cannot be restarted. A body that
    /// ends without a clean close surfaces as a `Transport` error item.
    pub async fn send_and_stream(&self, message: &str) -> Result<ChunkStream, ClientError> {
        let response = self
            .http
            .post(construct_api_url(&self.base_url, "chat/stream"))
            .json(&ChatRequest::new(message))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ClientError::Status(response.status()));
        }

        let mut body = response.bytes_stream();
        let mut decoder = FrameDecoder::new(self.frame_mode);

        Ok(Box::pin(async_stream::stream! {
            while let Some(read) = body.next().await {
                let bytes = match read {
                    Ok(bytes) => bytes,
                    Err(err) => {
                        yield Err(ClientError::from(err));
                        return;
                    }
                };
                match decoder.push(&bytes) {
                    Ok(chunks) => {
                        for chunk in chunks {
                            yield Ok(chunk);
                        }
                    }
                    Err(err) => {
                        yield Err(err);
                        return;
                    }
                }
            }
            match decoder.finish() {
                Ok(chunks) => {
                    for chunk in chunks {
                        yield Ok(chunk);
                    }
                }
                Err(err) => {
                    yield Err(err);
                }
            }
        }))
    }

    /// Non-streaming variant: one request, one complete reply.
    pub async fn send(&self, message: &str) -> Result<String, ClientError> {
        let response = self
            .http
            .post(construct_api_url(&self.base_url, "chat"))
            .json(&ChatRequest::new(message))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ClientError::Status(response.status()));
        }
        let reply: ChatReply = response.json().await?;
        Ok(reply.response)
    }

    /// Run one full turn against `conversation`.
    ///
    /// The user entry is recorded before the request is sent. Any failure
    /// ends the turn with the error entry and is returned to the caller.
    pub async fn chat_turn(
        &self,
        conversation: &mut Conversation,
        message: &str,
    ) -> Result<(), ClientError> {
        conversation.begin_turn(message);
        match self.send_and_stream(message).await {
            Ok(stream) => conversation.consume(stream).await,
            Err(err) => {
                conversation.fail(&err);
                Err(err)
            }
        }
    }
}
