//! The dialogkit runtime: wiring, lifecycle and the main-thread tick loop.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use dialogkit_runtime::DialogRuntime;
//!
//! let runtime = DialogRuntime::builder()
//!     .config_file("dialogkit.toml")
//!     .network(host_network)
//!     .build()?;
//!
//! runtime.register_binding("dialogkit:confirm", Binding::new().with_action(ConfirmAction));
//! runtime.run().await?;
//! ```
//!
//! # Lifecycle
//!
//! 1. [`initialize`](DialogRuntime::initialize) registers the connection and
//!    server status listeners on the runtime's [`EventBus`].
//! 2. The host publishes join, quit and plugin events to
//!    [`events`](DialogRuntime::events); sniffers follow them.
//! 3. [`run`](DialogRuntime::run) ticks the [`TickScheduler`] every
//!    `scheduler.tick_millis` until Ctrl+C, SIGTERM or
//!    [`shutdown_handle`](DialogRuntime::shutdown_handle) fires.
//! 4. [`shutdown`](DialogRuntime::shutdown) unregisters the listeners and
//!    removes every sniffer this plugin owns.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use dialogkit_core::{
    Binding, CustomKeyRegistry, DispatchRouter, EventBus, HostContext, ListenerId,
    ListenerRegistrar, LoopbackNetwork, PacketInterceptor, RouterStats, ServerNetwork,
    TickScheduler,
};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::signal;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{Level, debug, error, info, span, warn};

use crate::config::{ConfigLoader, DialogkitConfig, validate_config};
use crate::error::RuntimeResult;
use crate::listeners::{ConnectionStatusListener, ServerStatusListener};
use crate::logging;

/// Snapshot of runtime counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RuntimeStats {
    /// Players with a sniffer installed by this instance.
    pub tracked_players: usize,
    /// Registered bindings.
    pub bindings: usize,
    /// Main-thread tasks not yet run.
    pub pending_tasks: usize,
    /// Last tick that ran.
    pub current_tick: u64,
    /// Listeners on the event bus, lifecycle and action listeners alike.
    pub listeners: usize,
    pub router: RouterStats,
}

/// Owns every dialogkit component for one plugin instance.
pub struct DialogRuntime {
    config: DialogkitConfig,
    registry: Arc<CustomKeyRegistry>,
    router: Arc<DispatchRouter>,
    interceptor: Arc<PacketInterceptor>,
    events: Arc<EventBus>,
    scheduler: Arc<TickScheduler>,
    network: Arc<dyn ServerNetwork>,
    lifecycle_listeners: Mutex<Vec<ListenerId>>,
    initialized: AtomicBool,
    shutdown: CancellationToken,
}

impl DialogRuntime {
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime over an in-memory [`LoopbackNetwork`].
    pub fn from_config(config: DialogkitConfig) -> RuntimeResult<Self> {
        Self::with_network(config, Arc::new(LoopbackNetwork::new()))
    }

    /// Validates `config`, initializes logging from it and wires the
    /// components over `network`.
    pub fn with_network(
        config: DialogkitConfig,
        network: Arc<dyn ServerNetwork>,
    ) -> RuntimeResult<Self> {
        validate_config(&config)?;
        logging::init_from_config(&config.logging);

        let plugin = config.plugin.name.as_str();
        let scheduler = Arc::new(TickScheduler::new());
        let events = Arc::new(EventBus::new());
        let host = HostContext::new(plugin, scheduler.clone(), events.clone(), network.clone());
        let registry = Arc::new(CustomKeyRegistry::new());
        let router = Arc::new(DispatchRouter::new(registry.clone(), host));
        let interceptor = Arc::new(
            PacketInterceptor::new(plugin, router.clone(), network.clone())
                .with_anchor(config.interceptor.anchor.clone()),
        );

        info!(
            plugin = %plugin,
            handler = %interceptor.handler_name(),
            anchor = %interceptor.anchor(),
            tick_millis = config.scheduler.tick_millis,
            "Runtime created"
        );

        Ok(Self {
            config,
            registry,
            router,
            interceptor,
            events,
            scheduler,
            network,
            lifecycle_listeners: Mutex::new(Vec::new()),
            initialized: AtomicBool::new(false),
            shutdown: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &DialogkitConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<CustomKeyRegistry> {
        &self.registry
    }

    pub fn router(&self) -> &Arc<DispatchRouter> {
        &self.router
    }

    pub fn interceptor(&self) -> &Arc<PacketInterceptor> {
        &self.interceptor
    }

    /// The bus the host publishes its events to.
    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn scheduler(&self) -> &Arc<TickScheduler> {
        &self.scheduler
    }

    pub fn network(&self) -> &Arc<dyn ServerNetwork> {
        &self.network
    }

    pub fn host(&self) -> &HostContext {
        self.router.host()
    }

    /// Ticks after which action listeners should stop by default.
    pub fn default_timeout_ticks(&self) -> u64 {
        self.config.listeners.default_timeout_ticks
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Registers the lifecycle listeners.
    ///
    /// Returns `Ok(false)` if the runtime was already initialized.
    pub fn initialize(&self) -> RuntimeResult<bool> {
        if self.initialized.swap(true, Ordering::AcqRel) {
            debug!("Runtime already initialized");
            return Ok(false);
        }

        match self.register_lifecycle_listeners() {
            Ok(ids) => *self.lifecycle_listeners.lock() = ids,
            Err(e) => {
                self.initialized.store(false, Ordering::Release);
                return Err(e);
            }
        }

        info!(plugin = %self.config.plugin.name, "Runtime initialized");
        Ok(true)
    }

    fn register_lifecycle_listeners(&self) -> RuntimeResult<Vec<ListenerId>> {
        let plugin = self.config.plugin.name.as_str();
        let connection = self.events.register(
            plugin,
            Arc::new(ConnectionStatusListener::new(self.interceptor.clone())),
        )?;
        let server = match self.events.register(
            plugin,
            Arc::new(ServerStatusListener::new(plugin, self.interceptor.clone())),
        ) {
            Ok(id) => id,
            Err(e) => {
                self.roll_back_listener(connection);
                return Err(e.into());
            }
        };
        Ok(vec![connection, server])
    }

    /// Unregisters a listener from a half-finished initialization.
    ///
    /// Returns `false` (and logs) if it was already gone.
    fn roll_back_listener(&self, id: ListenerId) -> bool {
        match self.events.unregister(id) {
            Ok(()) => true,
            Err(e) => {
                warn!(listener = %id, error = %e, "Failed to roll back lifecycle listener");
                false
            }
        }
    }

    /// Binds `identifier` to `binding`, returning the binding it replaced.
    pub fn register_binding(&self, identifier: impl Into<String>, binding: Binding) -> Option<Binding> {
        self.registry.register(identifier, binding)
    }

    /// Runs one main-thread tick.
    pub fn tick(&self) -> usize {
        self.scheduler.tick()
    }

    /// A token that stops [`run`](Self::run) when cancelled.
    pub fn shutdown_handle(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Initializes and ticks until Ctrl+C, SIGTERM or the shutdown handle,
    /// then shuts down.
    pub async fn run(&self) -> RuntimeResult<()> {
        info!("dialogkit runtime is running. Press Ctrl+C to stop.");
        self.run_until(wait_for_signal()).await
    }

    /// Like [`run`](Self::run) with a custom shutdown future in place of
    /// process signals.
    pub async fn run_until<F>(&self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        self.initialize()?;

        let period = Duration::from_millis(self.config.scheduler.tick_millis);
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let span = span!(Level::TRACE, "tick", tick = self.scheduler.current_tick() + 1);
                    let _enter = span.enter();
                    self.scheduler.tick();
                }
                _ = &mut shutdown => break,
                _ = self.shutdown.cancelled() => {
                    info!("Shutdown requested");
                    break;
                }
            }
        }

        self.shutdown();
        Ok(())
    }

    /// Unregisters the lifecycle listeners and removes this plugin's
    /// sniffers from every connection. Safe to call more than once.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        if !self.initialized.swap(false, Ordering::AcqRel) {
            return;
        }

        for id in self.lifecycle_listeners.lock().drain(..) {
            if let Err(e) = self.events.unregister(id) {
                warn!(listener = %id, error = %e, "Lifecycle listener already gone");
            }
        }
        let ejected = self.interceptor.unregister_all();
        let swept = self.interceptor.clean_orphaned_pipelines();
        info!(ejected, swept, "Runtime stopped");
    }

    pub fn stats(&self) -> RuntimeStats {
        RuntimeStats {
            tracked_players: self.interceptor.injected_players().len(),
            bindings: self.registry.len(),
            pending_tasks: self.scheduler.pending(),
            current_tick: self.scheduler.current_tick(),
            listeners: self.events.len(),
            router: self.router.stats(),
        }
    }
}

impl std::fmt::Debug for DialogRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogRuntime")
            .field("plugin", &self.config.plugin.name)
            .field("initialized", &self.is_initialized())
            .field("stats", &self.stats())
            .finish()
    }
}

/// Waits for Ctrl+C or, on Unix, SIGTERM.
///
/// If no handler can be installed the future never completes and only the
/// shutdown handle stops the loop.
async fn wait_for_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                error!(error = %e, "Failed to register SIGTERM handler");
                ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = ctrl_c() => {}
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    ctrl_c().await;
}

async fn ctrl_c() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for a [`DialogRuntime`] with loaded configuration.
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
    config: Option<DialogkitConfig>,
    network: Option<Arc<dyn ServerNetwork>>,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
            config: None,
            network: None,
        }
    }

    /// Uses `config` as is, skipping every configuration source.
    pub fn config(mut self, config: DialogkitConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Overrides a single configuration value by its dotted path.
    pub fn set<T: Serialize>(mut self, key: &str, value: T) -> Self {
        self.config_loader = self.config_loader.set(key, value);
        self
    }

    /// Uses the host's network instead of an in-memory one.
    pub fn network(mut self, network: Arc<dyn ServerNetwork>) -> Self {
        self.network = Some(network);
        self
    }

    pub fn build(self) -> RuntimeResult<DialogRuntime> {
        let config = match self.config {
            Some(config) => config,
            None => self.config_loader.load()?,
        };
        let network = self
            .network
            .unwrap_or_else(|| Arc::new(LoopbackNetwork::new()));
        DialogRuntime::with_network(config, network)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuntimeError;
    use dialogkit_core::{
        BoxedPlayer, Connection, CustomClickAction, HostEvent, Player, Pipeline, Scheduler, action_fn,
    };
    use std::sync::atomic::AtomicUsize;

    const SNIFFER: &str = "dialogapi_dialog_sniffer";

    struct Fixture {
        network: Arc<LoopbackNetwork>,
        runtime: DialogRuntime,
    }

    fn fixture() -> Fixture {
        let network = Arc::new(LoopbackNetwork::new());
        let runtime = DialogRuntime::builder()
            .config(DialogkitConfig::default())
            .network(network.clone())
            .build()
            .unwrap();
        Fixture { network, runtime }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = DialogkitConfig::default();
        config.scheduler.tick_millis = 0;
        let result = DialogRuntime::from_config(config);
        assert!(matches!(result, Err(RuntimeError::Config(_))));
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let fx = fixture();
        assert!(fx.runtime.initialize().unwrap());
        assert!(!fx.runtime.initialize().unwrap());
        assert_eq!(fx.runtime.events().len(), 2);
    }

    #[test]
    fn test_roll_back_listener_reports_missing_id() {
        let fx = fixture();
        let id = fx
            .runtime
            .events()
            .register(
                "DialogAPI",
                Arc::new(ConnectionStatusListener::new(fx.runtime.interceptor().clone())),
            )
            .unwrap();

        assert!(fx.runtime.roll_back_listener(id));
        assert!(fx.runtime.events().is_empty());
        assert!(!fx.runtime.roll_back_listener(id));
    }

    #[test]
    fn test_join_quit_reload_scenario() {
        let fx = fixture();
        fx.runtime.initialize().unwrap();
        let confirms = Arc::new(AtomicUsize::new(0));
        let counter = confirms.clone();
        fx.runtime.register_binding(
            "dialogkit:confirm",
            Binding::new().with_boxed_action(action_fn("confirm", move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })),
        );

        let (steve, connection) = fx.network.connect("Steve");
        let steve: BoxedPlayer = steve;
        fx.runtime.events().publish(&HostEvent::PlayerJoin(steve.clone()));
        assert!(connection.pipeline().has_named(SNIFFER));

        fx.network
            .send_packet(steve.id(), CustomClickAction::new("dialogkit:confirm"));
        fx.runtime.tick();
        assert_eq!(confirms.load(Ordering::SeqCst), 1);

        // Reload: the old instance goes away without a clean shutdown and a
        // new one enables over the same connections.
        let reloaded = DialogRuntime::builder()
            .config(DialogkitConfig::default())
            .network(fx.network.clone())
            .build()
            .unwrap();
        reloaded.initialize().unwrap();
        reloaded.events().publish(&HostEvent::PluginEnable {
            plugin: "DialogAPI".to_string(),
        });
        let sniffers = connection
            .pipeline()
            .names()
            .into_iter()
            .filter(|n| n == SNIFFER)
            .count();
        assert_eq!(sniffers, 1);
        assert!(reloaded.interceptor().is_tracked(steve.id()));

        // Clicks now reach the new instance's registry, which has no binding.
        fx.network
            .send_packet(steve.id(), CustomClickAction::new("dialogkit:confirm"));
        assert_eq!(reloaded.router().stats().packets, 1);
        assert_eq!(fx.runtime.router().stats().packets, 1);

        reloaded.events().publish(&HostEvent::PlayerQuit(steve.clone()));
        assert!(!connection.pipeline().has_named(SNIFFER));
        assert_eq!(reloaded.stats().tracked_players, 0);
    }

    #[test]
    fn test_shutdown_removes_everything() {
        let fx = fixture();
        fx.runtime.initialize().unwrap();
        let (alex, connection) = fx.network.connect("Alex");
        fx.runtime
            .events()
            .publish(&HostEvent::PlayerJoin(alex.clone() as BoxedPlayer));
        assert_eq!(fx.runtime.stats().tracked_players, 1);

        fx.runtime.shutdown();
        assert!(!connection.pipeline().has_named(SNIFFER));
        assert!(fx.runtime.events().is_empty());
        assert!(!fx.runtime.is_initialized());
        assert!(fx.runtime.shutdown_handle().is_cancelled());

        // A second shutdown is a no-op.
        fx.runtime.shutdown();
    }

    #[tokio::test]
    async fn test_run_ticks_until_shutdown_future() {
        tokio::time::pause();
        let fx = fixture();
        let ran = Arc::new(AtomicUsize::new(0));
        let flag = ran.clone();
        fx.runtime.scheduler().run_on_main_thread_after(
            3,
            Box::new(move || {
                flag.fetch_add(1, Ordering::SeqCst);
            }),
        );

        let result = fx
            .runtime
            .run_until(tokio::time::sleep(Duration::from_millis(500)))
            .await;

        tokio_test::assert_ok!(result);
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert!(fx.runtime.stats().current_tick >= 3);
        assert!(!fx.runtime.is_initialized());
    }

    #[tokio::test]
    async fn test_shutdown_handle_stops_run() {
        tokio::time::pause();
        let fx = fixture();
        let handle = fx.runtime.shutdown_handle();

        let (result, ()) = tokio::join!(
            fx.runtime.run_until(std::future::pending()),
            async move {
                tokio::time::sleep(Duration::from_millis(200)).await;
                handle.cancel();
            }
        );

        tokio_test::assert_ok!(result);
        assert!(fx.runtime.stats().current_tick >= 1);
    }
}
