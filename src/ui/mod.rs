//! Presentation: message formatting and the terminal chat view.

pub mod chat_loop;
pub mod format;
pub mod input;
pub mod render;
