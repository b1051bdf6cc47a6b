//! Una Chat client library.
//!
//! A native client for the Una Chat backend: authenticated REST calls for
//! history and persistence, a realtime WebSocket channel for live delivery,
//! and a sanitizing render layer for HTML and terminal output.

pub mod app;
pub mod auth;
pub mod chat;
pub mod config;
pub mod net;
pub mod sanitize;
pub mod verify;
pub mod view;

#[cfg(test)]
pub mod test_helpers;

pub use app::{App, AppError, Route};
pub use chat::{ChatMessage, ChatState, ChatSync};
pub use config::ClientConfig;
