//! relaychat relays chat messages to the Gemini API and streams the replies
//! back to a terminal client.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`server`] is the HTTP relay: one request in, one provider session out,
//!   each fragment re-framed as an event-stream frame.
//! - [`client`] posts messages to the relay and decodes the frames back into
//!   text chunks.
//! - [`core`] owns the provider seam, the Gemini provider, configuration, and
//!   the conversation state the chunks accumulate into.
//! - [`ui`] formats replies and runs the terminal chat view.
//! - [`api`] defines the wire payloads of the relay and the provider.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod client;
pub mod core;
pub mod logging;
pub mod server;
pub mod ui;
pub mod utils;
