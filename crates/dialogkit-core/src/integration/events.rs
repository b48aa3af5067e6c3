//! In-process event bus.
//!
//! [`EventBus`] is a [`ListenerRegistrar`] that delivers [`HostEvent`]s to
//! every registered listener whose capabilities include the event's kind.
//! Listeners are called in registration order, outside the registry lock, so
//! a listener may unregister itself (or others) while handling an event.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::{Level, debug, error, span};

use crate::foundation::error::{ListenerError, ListenerResult};
use crate::integration::host::{BoxedListener, HostEvent, ListenerId, ListenerRegistrar};

struct Registration {
    id: ListenerId,
    owner: String,
    listener: BoxedListener,
}

/// Capability-filtered listener registry and publisher.
#[derive(Default)]
pub struct EventBus {
    next_id: AtomicU64,
    registrations: RwLock<Vec<Registration>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.registrations.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if the id is currently registered.
    pub fn is_registered(&self, id: ListenerId) -> bool {
        self.registrations.read().iter().any(|r| r.id == id)
    }

    /// Publishes an event, returning how many listeners received it.
    pub fn publish(&self, event: &HostEvent) -> usize {
        let kind = event.kind();
        let span = span!(Level::DEBUG, "publish", kind = ?kind);
        let _enter = span.enter();

        let targets: Vec<(ListenerId, BoxedListener)> = self
            .registrations
            .read()
            .iter()
            .filter(|r| r.listener.capabilities().contains(&kind))
            .map(|r| (r.id, r.listener.clone()))
            .collect();

        for (id, listener) in &targets {
            let result = catch_unwind(AssertUnwindSafe(|| listener.on_event(event)));
            if result.is_err() {
                error!(listener = %id, "Listener panicked while handling event");
            }
        }
        debug!(delivered = targets.len(), "Event published");
        targets.len()
    }

    /// Unregisters every listener owned by `owner`, returning how many were
    /// removed.
    pub fn unregister_owner(&self, owner: &str) -> usize {
        let mut registrations = self.registrations.write();
        let before = registrations.len();
        registrations.retain(|r| r.owner != owner);
        let removed = before - registrations.len();
        if removed > 0 {
            debug!(owner = %owner, removed, "Unregistered listeners for owner");
        }
        removed
    }
}

impl ListenerRegistrar for EventBus {
    fn register(&self, owner: &str, listener: BoxedListener) -> ListenerResult<ListenerId> {
        if listener.capabilities().is_empty() {
            return Err(ListenerError::NoCapabilities);
        }
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        debug!(listener = %id, owner = %owner, kinds = ?listener.capabilities(), "Registered listener");
        self.registrations.write().push(Registration {
            id,
            owner: owner.to_string(),
            listener,
        });
        Ok(id)
    }

    fn unregister(&self, id: ListenerId) -> ListenerResult<()> {
        let mut registrations = self.registrations.write();
        let index = registrations
            .iter()
            .position(|r| r.id == id)
            .ok_or(ListenerError::Unknown(id.0))?;
        registrations.remove(index);
        debug!(listener = %id, "Unregistered listener");
        Ok(())
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.len())
            .finish()
    }
}
