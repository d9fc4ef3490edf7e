//! Seam between the relay and the generative-language service.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("request to provider failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("prompt blocked by provider: {0}")]
    Blocked(String),

    #[error("could not decode provider payload: {0}")]
    Decode(String),
}

/// Fragments of one generation session, in arrival order.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, ProviderError>> + Send>>;

/// A generation backend.
///
/// Every call opens a fresh session with an empty history, so no state from
/// one request reaches the next.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Provider name used in diagnostics.
    fn name(&self) -> &str;

    /// Generate the whole reply in one response.
    async fn generate(&self, message: &str) -> Result<String, ProviderError>;

    /// Open a streaming session.
    ///
    /// Returns once the upstream session is established, so failures to
    /// open it are reported here rather than through the stream.
    async fn stream(&self, message: &str) -> Result<FragmentStream, ProviderError>;
}
