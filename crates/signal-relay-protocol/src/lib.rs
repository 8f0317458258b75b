//! Shared protocol definitions for signal-relay.
//!
//! Every WebSocket frame is a JSON object of the form
//! `{"event": "<event-name>", "data": <payload>}`; `data` is omitted for
//! events that carry no payload.

mod error;
mod messages;
mod types;

pub use error::ProtocolError;
pub use messages::{ClientMessage, ServerMessage};
pub use types::{ConnectionId, PublisherId};
