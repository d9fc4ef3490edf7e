//! Route handlers.

use std::io;

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use futures_util::{Stream, StreamExt};

use super::error::RelayError;
use super::framing::encode_frame;
use super::state::AppState;
use crate::api::{ChatReply, ChatRequest, HealthStatus};
use crate::core::provider::FragmentStream;

pub async fn handle_health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
    })
}

/// `POST /chat`: one request, one complete reply.
pub async fn handle_chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, RelayError> {
    let Json(request) = payload?;
    tracing::debug!(
        provider = state.provider.name(),
        chars = request.message.len(),
        "generating reply"
    );

    let response = state
        .provider
        .generate(&request.message)
        .await
        .map_err(RelayError::Generate)?;
    Ok(Json(ChatReply { response }))
}

/// `POST /chat/stream`: relay provider fragments as event-stream frames.
///
/// Headers are only committed once the first fragment (or a clean empty
/// end) has arrived, so a session that fails early still gets a JSON error.
pub async fn handle_chat_stream(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, RelayError> {
    let Json(request) = payload?;
    tracing::debug!(
        provider = state.provider.name(),
        chars = request.message.len(),
        "opening reply stream"
    );

    let mut fragments = state
        .provider
        .stream(&request.message)
        .await
        .map_err(RelayError::Stream)?;

    let first = match fragments.next().await {
        Some(Ok(fragment)) => Some(fragment),
        Some(Err(err)) => return Err(RelayError::Stream(err)),
        None => None,
    };

    Ok((
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        Body::from_stream(relay_frames(first, fragments)),
    )
        .into_response())
}

/// Frames for the rest of the session. A provider error ends the body with
/// an I/O error, which aborts the response instead of closing it cleanly.
fn relay_frames(
    first: Option<String>,
    mut rest: FragmentStream,
) -> impl Stream<Item = Result<String, io::Error>> + Send + 'static {
    async_stream::stream! {
        let Some(first) = first else {
            tracing::debug!(fragments = 0, "reply stream closed");
            return;
        };
        yield Ok(encode_frame(&first));

        let mut count = 1usize;
        while let Some(item) = rest.next().await {
            match item {
                Ok(fragment) => {
                    count += 1;
                    yield Ok(encode_frame(&fragment));
                }
                Err(err) => {
                    tracing::error!(fragments = count, "reply stream aborted: {err}");
                    // Frames yielded in the same poll are still buffered; let
                    // hyper flush them before the error drops the connection.
                    tokio::task::yield_now().await;
                    yield Err(io::Error::other(err.to_string()));
                    return;
                }
            }
        }
        tracing::debug!(fragments = count, "reply stream closed");
    }
}
