//! Service layer: the dashboard session built on the connection manager.
//!
//! [`HubSession`] wires lifecycle handlers and a [`MessageLog`]
//! subscriber onto a [`crate::ws::ConnectionManager`] and turns loose
//! console input into addressed envelopes.

pub mod hub_session;
pub mod message_log;

pub use hub_session::HubSession;
pub use message_log::{Direction, LogEntry, MessageLog};
