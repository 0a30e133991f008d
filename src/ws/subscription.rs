//! Subscriber registry for inbound fan-out.
//!
//! Delivery iterates over a snapshot of the registry, so callbacks may
//! subscribe or unsubscribe (themselves or others) while a message is
//! being delivered. A subscriber removed mid-pass is skipped for the rest
//! of that pass.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use super::{invoke_guarded, lock};
use crate::domain::Inbound;

/// Callback invoked for every inbound message.
pub type Subscriber = Arc<dyn Fn(&Inbound) + Send + Sync>;

/// Registered subscribers, keyed by registration id.
#[derive(Default)]
pub(crate) struct SubscriberRegistry {
    entries: Mutex<Vec<(u64, Subscriber)>>,
    next_id: AtomicU64,
}

impl SubscriberRegistry {
    pub(crate) fn add(&self, subscriber: Subscriber) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.entries).push((id, subscriber));
        id
    }

    pub(crate) fn remove(&self, id: u64) -> bool {
        let mut entries = lock(&self.entries);
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    pub(crate) fn contains(&self, id: u64) -> bool {
        lock(&self.entries).iter().any(|(entry_id, _)| *entry_id == id)
    }

    pub(crate) fn clear(&self) {
        lock(&self.entries).clear();
    }

    pub(crate) fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    /// Delivers `message` once to every subscriber that is still
    /// registered when its turn comes. No lock is held while callbacks run.
    /// Stops the pass as soon as `proceed` returns `false`.
    pub(crate) fn deliver_while(&self, message: &Inbound, proceed: impl Fn() -> bool) {
        let snapshot: Vec<(u64, Subscriber)> = lock(&self.entries).clone();
        for (id, subscriber) in snapshot {
            if !proceed() {
                return;
            }
            if !self.contains(id) {
                continue;
            }
            invoke_guarded("subscriber", || subscriber(message));
        }
    }
}

impl fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberRegistry")
            .field("subscribers", &self.len())
            .finish()
    }
}

/// Handle returned by `subscribe`.
///
/// Dropping the handle does **not** unsubscribe; call
/// [`Subscription::unsubscribe`].
#[derive(Debug, Clone)]
pub struct Subscription {
    id: u64,
    registry: Weak<SubscriberRegistry>,
}

impl Subscription {
    pub(crate) fn new(id: u64, registry: &Arc<SubscriberRegistry>) -> Self {
        Self {
            id,
            registry: Arc::downgrade(registry),
        }
    }

    /// Registration id.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Removes the subscriber. Returns `false` if it was already gone.
    pub fn unsubscribe(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.remove(self.id))
    }

    /// Returns `true` while the subscriber is registered.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.contains(self.id))
    }
}
