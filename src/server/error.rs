//! HTTP error mapping for the relay routes.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::api::ErrorBody;
use crate::core::provider::ProviderError;

pub const GENERATE_FAILED: &str = "Error generating response from Gemini API";
pub const STREAM_FAILED: &str = "Error streaming response from Gemini API";

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("generation failed: {0}")]
    Generate(#[source] ProviderError),

    #[error("streaming failed: {0}")]
    Stream(#[source] ProviderError),
}

impl From<JsonRejection> for RelayError {
    fn from(rejection: JsonRejection) -> Self {
        RelayError::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            RelayError::InvalidRequest(reason) => {
                tracing::debug!("rejected request: {reason}");
                (StatusCode::BAD_REQUEST, reason.clone())
            }
            RelayError::Generate(err) => {
                tracing::error!("provider failed to generate a reply: {err}");
                (StatusCode::INTERNAL_SERVER_ERROR, GENERATE_FAILED.to_string())
            }
            RelayError::Stream(err) => {
                tracing::error!("provider failed to open a reply stream: {err}");
                (StatusCode::INTERNAL_SERVER_ERROR, STREAM_FAILED.to_string())
            }
        };

        (status, Json(ErrorBody::new(message))).into_response()
    }
}
