use async_trait::async_trait;
use futures_util::StreamExt;
use memchr::memchr;

use crate::api::gemini::{GenerateContentRequest, GenerateContentResponse};
use crate::core::generation::GenerationSettings;
use crate::core::provider::{ChatProvider, FragmentStream, ProviderError};
use crate::utils::url::construct_api_url;

pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Client for the Gemini `generateContent` family of endpoints.
#[derive(Clone)]
pub struct GeminiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    settings: GenerationSettings,
}

impl GeminiProvider {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            settings,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self, action: &str) -> String {
        construct_api_url(&self.base_url, &format!("models/{}:{}", self.model, action))
    }

    async fn post(&self, url: String, message: &str) -> Result<reqwest::Response, ProviderError> {
        let body = GenerateContentRequest::single_turn(message, &self.settings);
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;
        check_status(response).await
    }
}

#[async_trait]
impl ChatProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, message: &str) -> Result<String, ProviderError> {
        let response = self.post(self.endpoint("generateContent"), message).await?;
        let text = response.text().await?;
        let payload: GenerateContentResponse =
            serde_json::from_str(&text).map_err(|err| ProviderError::Decode(err.to_string()))?;
        if let Some(reason) = payload.block_reason() {
            return Err(ProviderError::Blocked(reason.to_string()));
        }
        Ok(payload.text().unwrap_or_default())
    }

    async fn stream(&self, message: &str) -> Result<FragmentStream, ProviderError> {
        let url = format!("{}?alt=sse", self.endpoint("streamGenerateContent"));
        let response = self.post(url, message).await?;
        let mut body = response.bytes_stream();

        Ok(Box::pin(async_stream::stream! {
            let mut buffer: Vec<u8> = Vec::new();

            while let Some(chunk) = body.next().await {
                match chunk {
                    Ok(bytes) => buffer.extend_from_slice(&bytes),
                    Err(err) => {
                        yield Err(ProviderError::from(err));
                        return;
                    }
                }

                while let Some(newline_pos) = memchr(b'\n', &buffer) {
                    let line: Vec<u8> = buffer.drain(..=newline_pos).collect();
                    match parse_sse_line(&line) {
                        Ok(Some(fragment)) => {
                            yield Ok(fragment);
                        }
                        Ok(None) => {}
                        Err(err) => {
                            yield Err(err);
                            return;
                        }
                    }
                }
            }

            match parse_sse_line(&buffer) {
                Ok(Some(fragment)) => {
                    yield Ok(fragment);
                }
                Ok(None) => {}
                Err(err) => {
                    yield Err(err);
                }
            }
        }))
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "<no body>".to_string());
    Err(ProviderError::Api {
        status: status.as_u16(),
        message: summarize_error(&error_text),
    })
}

/// Decode one line of the provider's event stream into a text fragment.
///
/// Lines that are not `data:` fields and payloads without text yield `None`.
fn parse_sse_line(line: &[u8]) -> Result<Option<String>, ProviderError> {
    let line = std::str::from_utf8(line)
        .map_err(|err| ProviderError::Decode(format!("invalid UTF-8 in stream: {err}")))?
        .trim();
    let Some(payload) = line.strip_prefix("data:").map(str::trim_start) else {
        return Ok(None);
    };
    if payload.is_empty() {
        return Ok(None);
    }

    let value: serde_json::Value = serde_json::from_str(payload)
        .map_err(|err| ProviderError::Decode(format!("{err}: {payload}")))?;
    if value.get("error").is_some() {
        let status = value
            .pointer("/error/code")
            .and_then(|code| code.as_u64())
            .and_then(|code| u16::try_from(code).ok())
            .unwrap_or(500);
        return Err(ProviderError::Api {
            status,
            message: summarize_error(payload),
        });
    }

    let response: GenerateContentResponse =
        serde_json::from_value(value).map_err(|err| ProviderError::Decode(err.to_string()))?;
    if let Some(reason) = response.block_reason() {
        return Err(ProviderError::Blocked(reason.to_string()));
    }
    Ok(response.text())
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value.get("error").and_then(|v| match v {
                serde_json::Value::String(s) => Some(s.to_string()),
                _ => None,
            })
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary.map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// One-line description of a provider error body.
fn summarize_error(error_text: &str) -> String {
    let trimmed = error_text.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    serde_json::from_str::<serde_json::Value>(trimmed)
        .ok()
        .and_then(|value| extract_error_summary(&value))
        .filter(|summary| !summary.is_empty())
        .unwrap_or_else(|| trimmed.split_whitespace().collect::<Vec<_>>().join(" "))
}
