//! Dispatch of intercepted click packets.
//!
//! [`DispatchRouter`] is called on the connection's I/O thread. It only looks
//! up bindings, decodes payloads and posts work to the main thread; actions
//! and readers never run inline.
//!
//! For each packet:
//!
//! 1. [`peek_actions`](DispatchRouter::peek_actions) executes the bound action
//! 2. [`peek_inputs`](DispatchRouter::peek_inputs) decodes the payload and
//!    schedules the bound reader
//!
//! Both use the same identifier and may both fire for one packet.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing::{Level, debug, error, span, trace};

use crate::foundation::codec::decode_payload_counted;
use crate::foundation::player::BoxedPlayer;
use crate::framework::action::execute;
use crate::framework::registry::{Binding, CustomKeyRegistry};
use crate::integration::host::{CustomClickAction, HostContext};

/// What a single dispatch did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchOutcome {
    /// An action was executed.
    pub action: bool,
    /// An input reader was scheduled.
    pub input: bool,
}

impl DispatchOutcome {
    /// Returns `true` if nothing was bound.
    pub fn is_noop(&self) -> bool {
        !self.action && !self.input
    }
}

/// Counters kept by the router.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RouterStats {
    pub packets: u64,
    pub actions: u64,
    pub inputs: u64,
    pub decode_warnings: u64,
}

/// Routes click packets to their bindings.
pub struct DispatchRouter {
    registry: Arc<CustomKeyRegistry>,
    host: HostContext,
    packets: AtomicU64,
    actions: AtomicU64,
    inputs: AtomicU64,
    decode_warnings: AtomicU64,
}

impl DispatchRouter {
    pub fn new(registry: Arc<CustomKeyRegistry>, host: HostContext) -> Self {
        Self {
            registry,
            host,
            packets: AtomicU64::new(0),
            actions: AtomicU64::new(0),
            inputs: AtomicU64::new(0),
            decode_warnings: AtomicU64::new(0),
        }
    }

    pub fn registry(&self) -> &Arc<CustomKeyRegistry> {
        &self.registry
    }

    pub fn host(&self) -> &HostContext {
        &self.host
    }

    /// Executes the action bound to the packet's identifier, if any.
    pub fn peek_actions(&self, player: &BoxedPlayer, packet: &CustomClickAction) -> bool {
        self.registry
            .binding(&packet.id)
            .is_some_and(|binding| self.run_action(&binding, player))
    }

    /// Decodes the payload and schedules the bound reader, if any.
    ///
    /// The payload is left untouched when no reader is bound.
    pub fn peek_inputs(&self, player: &BoxedPlayer, packet: &CustomClickAction) -> bool {
        self.registry
            .binding(&packet.id)
            .is_some_and(|binding| self.run_reader(&binding, player, packet))
    }

    /// Runs both halves of the binding for one packet.
    ///
    /// The binding is looked up once, so a concurrent `register` never splits
    /// one packet across an old and a new binding.
    pub fn route(&self, player: &BoxedPlayer, packet: &CustomClickAction) -> DispatchOutcome {
        let span = span!(Level::DEBUG, "route", identifier = %packet.id, player = %player.id());
        let _enter = span.enter();

        self.packets.fetch_add(1, Ordering::Relaxed);
        let outcome = match self.registry.binding(&packet.id) {
            Some(binding) => DispatchOutcome {
                action: self.run_action(&binding, player),
                input: self.run_reader(&binding, player, packet),
            },
            None => DispatchOutcome::default(),
        };
        if outcome.is_noop() {
            trace!("No binding for identifier");
        } else {
            debug!(action = outcome.action, input = outcome.input, "Dispatched click");
        }
        outcome
    }

    fn run_action(&self, binding: &Binding, player: &BoxedPlayer) -> bool {
        let Some(action) = binding.action().cloned() else {
            return false;
        };
        execute(action, Arc::clone(player), &self.host);
        self.actions.fetch_add(1, Ordering::Relaxed);
        true
    }

    fn run_reader(&self, binding: &Binding, player: &BoxedPlayer, packet: &CustomClickAction) -> bool {
        let Some(reader) = binding.reader().cloned() else {
            return false;
        };

        let (values, warnings) = decode_payload_counted(packet.payload.as_deref());
        if warnings > 0 {
            self.decode_warnings
                .fetch_add(u64::from(warnings), Ordering::Relaxed);
        }
        trace!(identifier = %packet.id, fields = values.len(), "Decoded input payload");

        let player = Arc::clone(player);
        let identifier = packet.id.clone();
        self.host.scheduler().run_on_main_thread(Box::new(move || {
            if let Err(e) = reader.read(&player, &values) {
                error!(
                    identifier = %identifier,
                    player = %player.id(),
                    error = %e,
                    "Input reader failed"
                );
            }
        }));
        self.inputs.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Total decode warnings logged so far.
    pub fn decode_warnings(&self) -> u64 {
        self.decode_warnings.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> RouterStats {
        RouterStats {
            packets: self.packets.load(Ordering::Relaxed),
            actions: self.actions.load(Ordering::Relaxed),
            inputs: self.inputs.load(Ordering::Relaxed),
            decode_warnings: self.decode_warnings(),
        }
    }
}

impl std::fmt::Debug for DispatchRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchRouter")
            .field("bindings", &self.registry.len())
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::codec::encode_compound;
    use crate::foundation::tag::{NamedValues, TaggedValue};
    use crate::framework::action::{ActionContext, CustomAction};
    use crate::integration::events::EventBus;
    use crate::integration::host::BoxedListener;
    use crate::integration::loopback::{LoopbackNetwork, LoopbackPlayer};
    use crate::integration::scheduler::TickScheduler;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicUsize;

    struct CountingAction(Arc<AtomicUsize>);

    impl CustomAction for CountingAction {
        fn task(&self, _player: &BoxedPlayer, _ctx: &ActionContext) -> anyhow::Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Fixture {
        scheduler: Arc<TickScheduler>,
        registry: Arc<CustomKeyRegistry>,
        router: DispatchRouter,
        player: BoxedPlayer,
    }

    fn fixture() -> Fixture {
        let scheduler = Arc::new(TickScheduler::new());
        let host = HostContext::new(
            "test",
            scheduler.clone(),
            Arc::new(EventBus::new()),
            Arc::new(LoopbackNetwork::new()),
        );
        let registry = Arc::new(CustomKeyRegistry::new());
        Fixture {
            scheduler,
            registry: registry.clone(),
            router: DispatchRouter::new(registry, host),
            player: Arc::new(LoopbackPlayer::new("Steve")),
        }
    }

    type Captured = Arc<Mutex<Vec<NamedValues>>>;

    fn capturing_reader(captured: &Captured) -> Binding {
        let captured = captured.clone();
        Binding::new().with_reader(move |_: &BoxedPlayer, values: &NamedValues| -> anyhow::Result<()> {
            captured.lock().push(values.clone());
            Ok(())
        })
    }

    #[test]
    fn test_action_only_does_not_decode() {
        let fx = fixture();
        let runs = Arc::new(AtomicUsize::new(0));
        fx.registry
            .register("go", Binding::new().with_action(CountingAction(runs.clone())));

        // Garbage payload: decoding it would log a warning.
        let packet = CustomClickAction::new("go").with_payload(vec![10, 99, 0, 1, b'x']);
        let outcome = fx.router.route(&fx.player, &packet);

        assert_eq!(
            outcome,
            DispatchOutcome {
                action: true,
                input: false
            }
        );
        assert_eq!(fx.router.decode_warnings(), 0);
        fx.scheduler.tick();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reader_only_does_not_execute_action() {
        let fx = fixture();
        let captured: Captured = Default::default();
        fx.registry.register("set_amount", capturing_reader(&captured));

        let payload = encode_compound(&NamedValues::new().with("amount", 5i32));
        let packet = CustomClickAction::new("set_amount").with_payload(payload);
        let outcome = fx.router.route(&fx.player, &packet);

        assert_eq!(
            outcome,
            DispatchOutcome {
                action: false,
                input: true
            }
        );
        // Readers run on the main thread, not inline.
        assert!(captured.lock().is_empty());
        assert_eq!(fx.scheduler.tick(), 1);

        let captured = captured.lock();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].len(), 1);
        assert_eq!(captured[0].get("amount"), Some(&TaggedValue::Int(5)));
    }

    #[test]
    fn test_action_and_reader_both_fire() {
        let fx = fixture();
        let runs = Arc::new(AtomicUsize::new(0));
        let captured: Captured = Default::default();
        let binding = capturing_reader(&captured).with_action(CountingAction(runs.clone()));
        fx.registry.register("both", binding);

        let payload = encode_compound(&NamedValues::new().with("ok", true));
        let outcome = fx
            .router
            .route(&fx.player, &CustomClickAction::new("both").with_payload(payload));
        assert!(outcome.action && outcome.input);

        fx.scheduler.tick();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(captured.lock().len(), 1);
    }

    /// Replaces the binding while its own dispatch is in flight.
    struct Rebinding {
        registry: Arc<CustomKeyRegistry>,
        replacement: Binding,
    }

    impl CustomAction for Rebinding {
        fn task(&self, _player: &BoxedPlayer, _ctx: &ActionContext) -> anyhow::Result<()> {
            Ok(())
        }

        fn listener(&self, _player: &BoxedPlayer) -> Option<BoxedListener> {
            self.registry.register("swap", self.replacement.clone());
            None
        }
    }

    #[test]
    fn test_route_uses_one_binding_snapshot() {
        let fx = fixture();
        let old: Captured = Default::default();
        let new: Captured = Default::default();
        let binding = capturing_reader(&old).with_action(Rebinding {
            registry: fx.registry.clone(),
            replacement: capturing_reader(&new),
        });
        fx.registry.register("swap", binding);

        let outcome = fx.router.route(&fx.player, &CustomClickAction::new("swap"));
        assert!(outcome.action && outcome.input);

        fx.scheduler.tick();
        assert_eq!(old.lock().len(), 1);
        assert!(new.lock().is_empty());
        assert!(fx.registry.binding("swap").is_some_and(|b| b.action().is_none()));
    }

    #[test]
    fn test_missing_binding_is_noop() {
        let fx = fixture();
        let outcome = fx.router.route(&fx.player, &CustomClickAction::new("unknown"));
        assert!(outcome.is_noop());
        assert_eq!(fx.scheduler.pending(), 0);
        assert_eq!(fx.router.stats().packets, 1);
    }

    #[test]
    fn test_decode_warnings_are_counted() {
        let fx = fixture();
        let captured: Captured = Default::default();
        fx.registry.register("bad", capturing_reader(&captured));

        let packet = CustomClickAction::new("bad").with_payload(vec![10, 99, 0, 1, b'x']);
        fx.router.route(&fx.player, &packet);
        assert_eq!(fx.router.decode_warnings(), 1);

        fx.scheduler.tick();
        assert!(captured.lock()[0].is_empty());
    }
}
