//! Custom actions and input readers.
//!
//! A [`CustomAction`] runs when a player clicks a dialog button carrying its
//! identifier. [`execute`] prepares an [`ExpiringListener`] for the action,
//! then posts the action's [`task`](CustomAction::task) to the main thread and
//! returns at once. The task decides whether and for how long the listener is
//! active:
//!
//! ```rust,ignore
//! struct Greet;
//!
//! impl CustomAction for Greet {
//!     fn task(&self, player: &BoxedPlayer, ctx: &ActionContext) -> anyhow::Result<()> {
//!         player.send_message("hello");
//!         ctx.listener().start()?;
//!         ctx.listener().stop_after(20);
//!         Ok(())
//!     }
//!
//!     fn listener(&self, _player: &BoxedPlayer) -> Option<BoxedListener> {
//!         Some(listener_fn([EventKind::PlayerQuit], |_| {}))
//!     }
//! }
//! ```
//!
//! An [`InputReader`] receives the decoded payload of a submitted dialog.
//! Closures of the right shape implement it directly.

use std::sync::Arc;

use tracing::{debug, error};

use crate::foundation::player::BoxedPlayer;
use crate::foundation::tag::NamedValues;
use crate::framework::listener::ExpiringListener;
use crate::integration::host::{BoxedListener, HostContext};

// =============================================================================
// ActionContext
// =============================================================================

/// Per-invocation context handed to [`CustomAction::task`].
#[derive(Debug, Clone)]
pub struct ActionContext {
    host: HostContext,
    listener: Arc<ExpiringListener>,
}

impl ActionContext {
    pub fn host(&self) -> &HostContext {
        &self.host
    }

    /// The listener prepared for this invocation. Not started yet.
    pub fn listener(&self) -> &Arc<ExpiringListener> {
        &self.listener
    }
}

// =============================================================================
// CustomAction
// =============================================================================

/// Server-side behaviour bound to a dialog button.
pub trait CustomAction: Send + Sync {
    /// The work to do on the main thread.
    fn task(&self, player: &BoxedPlayer, ctx: &ActionContext) -> anyhow::Result<()>;

    /// An optional listener to attach to this invocation's
    /// [`ExpiringListener`].
    fn listener(&self, _player: &BoxedPlayer) -> Option<BoxedListener> {
        None
    }

    /// A name for logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// A shared action.
pub type BoxedAction = Arc<dyn CustomAction>;

/// Runs `action` for `player`.
///
/// Builds the invocation's listener, attaches the action's optional listener,
/// schedules the task on the main thread and returns the listener handle
/// without waiting.
pub fn execute(action: BoxedAction, player: BoxedPlayer, host: &HostContext) -> Arc<ExpiringListener> {
    let listener = ExpiringListener::new(host.clone());
    if let Some(l) = action.listener(&player) {
        listener.attach(l);
    }

    let ctx = ActionContext {
        host: host.clone(),
        listener: Arc::clone(&listener),
    };
    debug!(action = action.name(), player = %player.id(), "Scheduling action task");
    host.scheduler().run_on_main_thread(Box::new(move || {
        if let Err(e) = action.task(&player, &ctx) {
            error!(
                action = action.name(),
                player = %player.id(),
                error = %e,
                "Action task failed"
            );
        }
    }));
    listener
}

/// An action backed by a closure. See [`action_fn`].
pub struct FnAction<F> {
    name: String,
    f: F,
}

impl<F> CustomAction for FnAction<F>
where
    F: Fn(&BoxedPlayer, &ActionContext) -> anyhow::Result<()> + Send + Sync,
{
    fn task(&self, player: &BoxedPlayer, ctx: &ActionContext) -> anyhow::Result<()> {
        (self.f)(player, ctx)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Creates an action without a listener from a closure.
pub fn action_fn<F>(name: impl Into<String>, f: F) -> BoxedAction
where
    F: Fn(&BoxedPlayer, &ActionContext) -> anyhow::Result<()> + Send + Sync + 'static,
{
    Arc::new(FnAction {
        name: name.into(),
        f,
    })
}

// =============================================================================
// InputReader
// =============================================================================

/// Receives the values a player submitted through dialog inputs.
pub trait InputReader: Send + Sync {
    fn read(&self, player: &BoxedPlayer, values: &NamedValues) -> anyhow::Result<()>;
}

impl<F> InputReader for F
where
    F: Fn(&BoxedPlayer, &NamedValues) -> anyhow::Result<()> + Send + Sync,
{
    fn read(&self, player: &BoxedPlayer, values: &NamedValues) -> anyhow::Result<()> {
        self(player, values)
    }
}

/// A shared input reader.
pub type BoxedReader = Arc<dyn InputReader>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::listener::ListenerState;
    use crate::integration::events::EventBus;
    use crate::integration::host::{EventKind, listener_fn};
    use crate::integration::loopback::{LoopbackNetwork, LoopbackPlayer};
    use crate::integration::scheduler::TickScheduler;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        runs: Arc<AtomicUsize>,
        start_listener: bool,
    }

    impl CustomAction for Counting {
        fn task(&self, _player: &BoxedPlayer, ctx: &ActionContext) -> anyhow::Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if self.start_listener {
                ctx.listener().start()?;
                ctx.listener().stop_after(2);
            }
            Ok(())
        }

        fn listener(&self, _player: &BoxedPlayer) -> Option<BoxedListener> {
            Some(listener_fn([EventKind::PlayerDeath], |_| {}))
        }
    }

    fn host() -> (Arc<TickScheduler>, Arc<EventBus>, HostContext) {
        let scheduler = Arc::new(TickScheduler::new());
        let bus = Arc::new(EventBus::new());
        let host = HostContext::new(
            "test",
            scheduler.clone(),
            bus.clone(),
            Arc::new(LoopbackNetwork::new()),
        );
        (scheduler, bus, host)
    }

    fn player() -> BoxedPlayer {
        Arc::new(LoopbackPlayer::new("Steve"))
    }

    #[test]
    fn test_execute_defers_task_to_main_thread() {
        let (scheduler, bus, host) = host();
        let runs = Arc::new(AtomicUsize::new(0));
        let action = Arc::new(Counting {
            runs: runs.clone(),
            start_listener: true,
        });

        let listener = execute(action, player(), &host);
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.pending(), 1);
        assert!(listener.has_listener());
        assert_eq!(listener.state(), ListenerState::Unstarted);

        scheduler.tick();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(listener.state(), ListenerState::Active);
        assert_eq!(bus.len(), 1);

        scheduler.advance(2);
        assert_eq!(listener.state(), ListenerState::Stopped);
        assert!(bus.is_empty());
    }

    #[test]
    fn test_listener_not_started_stays_inert() {
        let (scheduler, bus, host) = host();
        let action = Arc::new(Counting {
            runs: Arc::new(AtomicUsize::new(0)),
            start_listener: false,
        });
        let listener = execute(action, player(), &host);
        scheduler.advance(5);
        assert_eq!(listener.state(), ListenerState::Unstarted);
        assert!(bus.is_empty());
    }

    #[test]
    fn test_failing_task_is_contained() {
        let (scheduler, _bus, host) = host();
        let action = action_fn("fails", |_, _| anyhow::bail!("nope"));
        execute(action.clone(), player(), &host);
        execute(action, player(), &host);
        assert_eq!(scheduler.tick(), 2);
    }

    #[test]
    fn test_closure_reader() {
        let seen = Arc::new(AtomicUsize::new(0));
        let seen2 = seen.clone();
        let reader: BoxedReader = Arc::new(move |_: &BoxedPlayer, values: &NamedValues| -> anyhow::Result<()> {
            seen2.fetch_add(values.len(), Ordering::SeqCst);
            Ok(())
        });
        let values = NamedValues::new().with("a", 1i32).with("b", 2i32);
        reader.read(&player(), &values).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }
}
