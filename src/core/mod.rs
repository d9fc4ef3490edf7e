pub mod config;
pub mod conversation;
pub mod gemini;
pub mod generation;
pub mod message;
pub mod provider;
pub mod scripted;
