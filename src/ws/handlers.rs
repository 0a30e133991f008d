//! Connection-level lifecycle callbacks.
//!
//! Unlike subscribers, there is at most one handler per event. They exist
//! for UI state such as a "connected" indicator.

use std::fmt;
use std::sync::Arc;

use crate::domain::Inbound;
use crate::error::HubError;

type Notify = Arc<dyn Fn() + Send + Sync>;
type OnError = Arc<dyn Fn(&HubError) + Send + Sync>;
type OnMessage = Arc<dyn Fn(&Inbound) + Send + Sync>;

/// Lifecycle callbacks for [`super::ConnectionManager::set_handlers`].
///
/// Handlers are merged: only the ones set on the value passed to
/// `set_handlers` replace the previously installed ones.
#[derive(Clone, Default)]
pub struct Handlers {
    on_open: Option<Notify>,
    on_close: Option<Notify>,
    on_error: Option<OnError>,
    on_message: Option<OnMessage>,
}

impl Handlers {
    /// Empty set of handlers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Called once each time a transport opens.
    #[must_use]
    pub fn on_open(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_open = Some(Arc::new(f));
        self
    }

    /// Called once each time a transport closes or fails to open.
    #[must_use]
    pub fn on_close(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_close = Some(Arc::new(f));
        self
    }

    /// Called for every transport error.
    #[must_use]
    pub fn on_error(mut self, f: impl Fn(&HubError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    /// Called for every inbound message, after the subscribers.
    #[must_use]
    pub fn on_message(mut self, f: impl Fn(&Inbound) + Send + Sync + 'static) -> Self {
        self.on_message = Some(Arc::new(f));
        self
    }

    pub(crate) fn merge(&mut self, other: Self) {
        if other.on_open.is_some() {
            self.on_open = other.on_open;
        }
        if other.on_close.is_some() {
            self.on_close = other.on_close;
        }
        if other.on_error.is_some() {
            self.on_error = other.on_error;
        }
        if other.on_message.is_some() {
            self.on_message = other.on_message;
        }
    }

    pub(crate) fn open_handler(&self) -> Option<Notify> {
        self.on_open.as_ref().map(Arc::clone)
    }

    pub(crate) fn close_handler(&self) -> Option<Notify> {
        self.on_close.as_ref().map(Arc::clone)
    }

    pub(crate) fn error_handler(&self) -> Option<OnError> {
        self.on_error.as_ref().map(Arc::clone)
    }

    pub(crate) fn message_handler(&self) -> Option<OnMessage> {
        self.on_message.as_ref().map(Arc::clone)
    }
}

impl fmt::Debug for Handlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handlers")
            .field("on_open", &self.on_open.is_some())
            .field("on_close", &self.on_close.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_message", &self.on_message.is_some())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn merge_keeps_unset_handlers() {
        let opened = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&opened);
        let mut installed = Handlers::new().on_open(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        installed.merge(Handlers::new().on_close(|| {}));

        assert!(installed.close_handler().is_some());
        let Some(open) = installed.open_handler() else {
            panic!("on_open lost in merge");
        };
        open();
        assert_eq!(opened.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn merge_replaces_set_handlers() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let (a, b) = (Arc::clone(&first), Arc::clone(&second));
        let mut installed = Handlers::new().on_message(move |_| {
            a.fetch_add(1, Ordering::SeqCst);
        });
        installed.merge(Handlers::new().on_message(move |_| {
            b.fetch_add(1, Ordering::SeqCst);
        }));
        if let Some(handler) = installed.message_handler() {
            handler(&Inbound::Raw(String::new()));
        }
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn debug_lists_installed_handlers() {
        let h = Handlers::new().on_error(|_| {});
        let dbg = format!("{h:?}");
        assert!(dbg.contains("on_error: true"));
        assert!(dbg.contains("on_open: false"));
    }
}
