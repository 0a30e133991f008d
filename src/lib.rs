//! # sensor-hub
//!
//! Communication core of a sensor hub dashboard.
//!
//! This crate owns the single WebSocket link to the hub, fans inbound
//! frames out to any number of subscribers, reconnects with a bounded
//! linear backoff, and turns loosely shaped user input into validated
//! sensor commands wrapped in addressed envelopes.
//!
//! ## Architecture
//!
//! ```text
//! Console / UI
//!     │
//!     ├── HubSession (service/)        connected flag, message log
//!     │
//!     ├── CommandCodec (codec/)        loose input ──► Command
//!     ├── CommandSchema (codec/)       per-kind rules
//!     ├── EnvelopeValidator (codec/)   inbound shape checks
//!     │
//!     ├── ConnectionManager (ws/)      one transport, many subscribers
//!     │       └── Transport            WsTransport (tokio-tungstenite)
//!     │
//!     └── HubLogin (login)             optional token fetch
//! ```

pub mod codec;
pub mod config;
pub mod domain;
pub mod error;
pub mod login;
pub mod service;
pub mod ws;
