//! Authentication plumbing around an external identity provider.
//!
//! DESIGN
//! ======
//! This crate never issues or verifies credentials. A [`TokenProvider`]
//! hands out an opaque bearer string; the [`SessionStore`] mirrors it for
//! the lifetime of the process; [`inspect`] only reads claims to warn about
//! expired tokens early.

pub mod inspect;
pub mod session;
pub mod token;

pub use session::SessionStore;
pub use token::{StaticTokenProvider, TokenProvider};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("no access token available; pass --token or set UNA_CHAT_TOKEN")]
    MissingToken,
    #[error("identity provider is not configured: {0} is empty")]
    NotConfigured(&'static str),
    #[error("identity provider error: {0}")]
    Provider(String),
}
