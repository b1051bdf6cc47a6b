//! Network layer: HTTP envelope client and the realtime channel.
//!
//! `api` talks to the REST backend. `channel` owns the single live socket
//! connection and its listener registry; `ws` is the WebSocket transport
//! plugged into it.

pub mod api;
pub mod channel;
pub mod envelope;
pub mod ws;

pub use api::{ApiClient, ApiError};
pub use channel::{ConnectionManager, Connector, ListenerId};
pub use ws::WsConnector;
