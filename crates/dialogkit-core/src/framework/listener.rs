//! Self-expiring listener registrations.
//!
//! An [`ExpiringListener`] wraps an optional host [`Listener`] and moves
//! through three states:
//!
//! ```text
//! Unstarted ──start──▶ Active ──stop / timeout──▶ Stopped
//!     └───────────────stop───────────────────────────▲
//! ```
//!
//! The state transition and the registration id are taken under one lock, so
//! an explicit `stop` racing a scheduled timeout unregisters exactly once.
//!
//! # Example
//!
//! ```rust,ignore
//! let expiring = ExpiringListener::new(host.clone());
//! expiring.attach(listener_fn([EventKind::PlayerDeath], |_| {}));
//! expiring.start()?;
//! expiring.stop_after(20);
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::foundation::error::ListenerResult;
use crate::integration::host::{BoxedListener, HostContext, ListenerId};

/// Lifecycle state of an [`ExpiringListener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Unstarted,
    Active,
    Stopped,
}

struct Inner {
    state: ListenerState,
    listener: Option<BoxedListener>,
    registration: Option<ListenerId>,
}

/// A listener registration with explicit start/stop and optional timeout.
pub struct ExpiringListener {
    host: HostContext,
    inner: Mutex<Inner>,
}

impl ExpiringListener {
    /// Creates an unstarted handle bound to `host`.
    pub fn new(host: HostContext) -> Arc<Self> {
        Arc::new(Self {
            host,
            inner: Mutex::new(Inner {
                state: ListenerState::Unstarted,
                listener: None,
                registration: None,
            }),
        })
    }

    pub fn state(&self) -> ListenerState {
        self.inner.lock().state
    }

    /// The host registration id while active.
    pub fn registration(&self) -> Option<ListenerId> {
        self.inner.lock().registration
    }

    /// Attaches the listener to register on start.
    ///
    /// Only possible before start; returns `false` otherwise.
    pub fn attach(&self, listener: BoxedListener) -> bool {
        let mut inner = self.inner.lock();
        if inner.state != ListenerState::Unstarted {
            return false;
        }
        inner.listener = Some(listener);
        true
    }

    /// Returns `true` if a listener is attached.
    pub fn has_listener(&self) -> bool {
        self.inner.lock().listener.is_some()
    }

    /// Registers the attached listener and becomes active.
    ///
    /// Starting an active or stopped handle is a no-op. If registration fails
    /// the handle stays unstarted.
    pub fn start(&self) -> ListenerResult<()> {
        let mut inner = self.inner.lock();
        if inner.state != ListenerState::Unstarted {
            debug!(state = ?inner.state, "Ignoring start of listener that already left the unstarted state");
            return Ok(());
        }
        if let Some(listener) = inner.listener.clone() {
            let id = self
                .host
                .registrar()
                .register(self.host.plugin_name(), listener)?;
            inner.registration = Some(id);
            debug!(listener = %id, "Expiring listener started");
        }
        inner.state = ListenerState::Active;
        Ok(())
    }

    /// Stops the handle, unregistering the listener if it was registered.
    ///
    /// Returns `true` if this call changed the state.
    pub fn stop(&self) -> bool {
        let registration = {
            let mut inner = self.inner.lock();
            if inner.state == ListenerState::Stopped {
                return false;
            }
            inner.state = ListenerState::Stopped;
            inner.listener = None;
            inner.registration.take()
        };
        if let Some(id) = registration {
            match self.host.registrar().unregister(id) {
                Ok(()) => debug!(listener = %id, "Expiring listener stopped"),
                Err(e) => warn!(listener = %id, error = %e, "Failed to unregister expiring listener"),
            }
        }
        true
    }

    /// Schedules [`stop`](Self::stop) after `ticks` main-thread ticks.
    pub fn stop_after(self: &Arc<Self>, ticks: u64) {
        let this = Arc::clone(self);
        self.host.scheduler().run_on_main_thread_after(
            ticks,
            Box::new(move || {
                if this.stop() {
                    debug!(ticks, "Expiring listener timed out");
                }
            }),
        );
    }

    /// Returns a guard that stops the listener when dropped.
    pub fn guard(self: &Arc<Self>) -> ListenerGuard {
        ListenerGuard {
            listener: Arc::clone(self),
        }
    }
}

impl std::fmt::Debug for ExpiringListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("ExpiringListener")
            .field("state", &inner.state)
            .field("registration", &inner.registration)
            .finish()
    }
}

/// Stops its [`ExpiringListener`] on drop, including during unwinding.
#[must_use = "the listener is stopped as soon as the guard is dropped"]
pub struct ListenerGuard {
    listener: Arc<ExpiringListener>,
}

impl ListenerGuard {
    pub fn listener(&self) -> &Arc<ExpiringListener> {
        &self.listener
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.listener.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::error::ListenerError;
    use crate::integration::events::EventBus;
    use crate::integration::host::{EventKind, ListenerRegistrar, listener_fn};
    use crate::integration::loopback::LoopbackNetwork;
    use crate::integration::scheduler::TickScheduler;
    use std::panic::{AssertUnwindSafe, catch_unwind};

    struct Fixture {
        scheduler: Arc<TickScheduler>,
        bus: Arc<EventBus>,
        host: HostContext,
    }

    fn fixture() -> Fixture {
        let scheduler = Arc::new(TickScheduler::new());
        let bus = Arc::new(EventBus::new());
        let host = HostContext::new(
            "test",
            scheduler.clone(),
            bus.clone(),
            Arc::new(LoopbackNetwork::new()),
        );
        Fixture {
            scheduler,
            bus,
            host,
        }
    }

    fn death_listener() -> BoxedListener {
        listener_fn([EventKind::PlayerDeath], |_| {})
    }

    #[test]
    fn test_start_registers_and_stop_unregisters() {
        let fx = fixture();
        let expiring = ExpiringListener::new(fx.host.clone());
        assert!(expiring.attach(death_listener()));
        assert_eq!(expiring.state(), ListenerState::Unstarted);
        assert!(fx.bus.is_empty());

        expiring.start().unwrap();
        assert_eq!(expiring.state(), ListenerState::Active);
        assert_eq!(fx.bus.len(), 1);

        assert!(expiring.stop());
        assert_eq!(expiring.state(), ListenerState::Stopped);
        assert!(fx.bus.is_empty());
        assert!(!expiring.stop());
    }

    #[test]
    fn test_stop_before_timeout_makes_timeout_noop() {
        let fx = fixture();
        let expiring = ExpiringListener::new(fx.host.clone());
        expiring.attach(death_listener());
        expiring.start().unwrap();
        let id = expiring.registration().unwrap();
        expiring.stop_after(20);

        assert!(expiring.stop());
        assert_eq!(fx.scheduler.advance(20), 1);
        assert_eq!(expiring.state(), ListenerState::Stopped);
        // A second unregister would have failed; the id is already gone.
        assert_eq!(fx.bus.unregister(id), Err(ListenerError::Unknown(id.0)));
    }

    #[test]
    fn test_timeout_stops_active_listener() {
        let fx = fixture();
        let expiring = ExpiringListener::new(fx.host.clone());
        expiring.attach(death_listener());
        expiring.start().unwrap();
        expiring.stop_after(3);

        fx.scheduler.advance(2);
        assert_eq!(expiring.state(), ListenerState::Active);
        fx.scheduler.tick();
        assert_eq!(expiring.state(), ListenerState::Stopped);
        assert!(fx.bus.is_empty());
    }

    #[test]
    fn test_never_started_stays_inert() {
        let fx = fixture();
        let expiring = ExpiringListener::new(fx.host.clone());
        expiring.attach(death_listener());
        fx.scheduler.advance(5);
        assert_eq!(expiring.state(), ListenerState::Unstarted);
        assert!(fx.bus.is_empty());

        assert!(expiring.stop());
        expiring.start().unwrap();
        assert_eq!(expiring.state(), ListenerState::Stopped);
        assert!(fx.bus.is_empty());
    }

    #[test]
    fn test_attach_after_start_is_rejected() {
        let fx = fixture();
        let expiring = ExpiringListener::new(fx.host.clone());
        expiring.start().unwrap();
        assert!(!expiring.attach(death_listener()));
        assert!(fx.bus.is_empty());
    }

    #[test]
    fn test_guard_stops_on_panic() {
        let fx = fixture();
        let expiring = ExpiringListener::new(fx.host.clone());
        expiring.attach(death_listener());

        let result = catch_unwind(AssertUnwindSafe(|| {
            let _guard = expiring.guard();
            expiring.start().unwrap();
            panic!("task failed");
        }));

        assert!(result.is_err());
        assert_eq!(expiring.state(), ListenerState::Stopped);
        assert!(fx.bus.is_empty());
    }
}
