//! Chat domain: message model, live sync, backend health and color choice.

pub mod color;
pub mod health;
pub mod message;
pub mod sync;

pub use health::{ConnectionStatus, HealthMonitor};
pub use message::{ChatMessage, ValidationError};
pub use sync::{ChatError, ChatState, ChatSync};
