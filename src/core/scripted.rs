//! Deterministic provider driven by a fixed script.
//!
//! Used by the relay tests and by `relaychat serve --scripted` for offline
//! demos of the streaming path.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::provider::{ChatProvider, FragmentStream, ProviderError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    /// Emit one fragment.
    Fragment(String),
    /// Fail the session with a provider error.
    Fail(String),
}

impl ScriptStep {
    pub fn fragment(text: impl Into<String>) -> Self {
        Self::Fragment(text.into())
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::Fail(message.into())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedProvider {
    steps: Vec<ScriptStep>,
    open_error: Option<String>,
    delay: Duration,
    received: Arc<Mutex<Vec<String>>>,
}

impl ScriptedProvider {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps,
            ..Self::default()
        }
    }

    pub fn from_fragments<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(fragments.into_iter().map(ScriptStep::fragment).collect())
    }

    /// A provider whose sessions fail before producing anything.
    pub fn failing_open(message: impl Into<String>) -> Self {
        Self {
            open_error: Some(message.into()),
            ..Self::default()
        }
    }

    /// Pause before every step.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Messages received so far, one per session, in call order.
    pub fn received(&self) -> Vec<String> {
        self.received
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn record(&self, message: &str) {
        self.received
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(message.to_string());
    }

    fn open(&self, message: &str) -> Result<(), ProviderError> {
        self.record(message);
        match &self.open_error {
            Some(error) => Err(scripted_failure(error)),
            None => Ok(()),
        }
    }
}

fn scripted_failure(message: &str) -> ProviderError {
    ProviderError::Api {
        status: 500,
        message: message.to_string(),
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, message: &str) -> Result<String, ProviderError> {
        self.open(message)?;
        let mut reply = String::new();
        for step in &self.steps {
            match step {
                ScriptStep::Fragment(text) => reply.push_str(text),
                ScriptStep::Fail(error) => return Err(scripted_failure(error)),
            }
        }
        Ok(reply)
    }

    async fn stream(&self, message: &str) -> Result<FragmentStream, ProviderError> {
        self.open(message)?;
        let steps = self.steps.clone();
        let delay = self.delay;

        Ok(Box::pin(async_stream::stream! {
            for step in steps {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                match step {
                    ScriptStep::Fragment(text) => {
                        yield Ok(text);
                    }
                    ScriptStep::Fail(error) => {
                        yield Err(scripted_failure(&error));
                        return;
                    }
                }
            }
        }))
    }
}
