//! Relay server: accepts chat messages and relays provider replies.

pub mod error;
pub mod framing;
pub mod handlers;
pub mod state;

use std::future::Future;
use std::net::SocketAddr;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::RelayError;
pub use state::AppState;

/// Create the relay router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(handlers::handle_chat))
        .route("/chat/stream", post(handlers::handle_chat_stream))
        .route("/health", get(handlers::handle_health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

/// Bind `addr` and serve until Ctrl+C.
pub async fn run_server(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(
        "relay listening on {} (provider: {})",
        listener.local_addr()?,
        state.provider.name()
    );
    serve(listener, state, shutdown_signal()).await?;
    tracing::info!("relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("could not listen for Ctrl+C: {err}");
        std::future::pending::<()>().await;
    }
}
