//! WebSocket layer: the shared hub connection.
//!
//! A single [`ConnectionManager`] owns at most one transport at a time and
//! fans every inbound frame out to any number of subscribers. Reconnection
//! after a drop is bounded and linearly backed off.
//!
//! ```text
//! connect() ──► driver task ──► Transport::open(url)
//!                   │
//!                   ├── TransportEvent::Message ──► Inbound::classify ──► subscribers + on_message
//!                   ├── TransportEvent::Error   ──► on_error
//!                   └── TransportEvent::Closed  ──► on_close ──► reconnect after interval × attempt
//! ```

pub mod connection;
pub mod handlers;
pub mod options;
pub mod socket;
pub mod state;
pub mod subscription;
pub mod target;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use connection::ConnectionManager;
pub use handlers::Handlers;
pub use options::ConnectOptions;
pub use socket::WsTransport;
pub use state::ConnectionState;
pub use subscription::Subscription;
pub use target::HubTarget;
pub use transport::{Transport, TransportEvent, TransportLink};

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks `mutex`, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Runs a user callback; a panic is logged and swallowed so it cannot take
/// the connection driver down with it.
pub(crate) fn invoke_guarded(what: &str, callback: impl FnOnce()) {
    if catch_unwind(AssertUnwindSafe(callback)).is_err() {
        tracing::error!(callback = what, "hub callback panicked");
    }
}
