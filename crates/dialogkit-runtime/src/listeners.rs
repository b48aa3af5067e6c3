//! Host event listeners that keep sniffers in step with the server.
//!
//! | Listener | Events | Effect |
//! |---|---|---|
//! | [`ConnectionStatusListener`] | join, quit | inject, eject |
//! | [`ServerStatusListener`] | own plugin enable, disable | sweep orphans (and re-inject on enable) |

use std::sync::Arc;

use dialogkit_core::{EventKind, HostEvent, Listener, PacketInterceptor};
use tracing::{debug, info, warn};

/// Injects on join and ejects on quit.
pub struct ConnectionStatusListener {
    interceptor: Arc<PacketInterceptor>,
}

impl ConnectionStatusListener {
    pub fn new(interceptor: Arc<PacketInterceptor>) -> Self {
        Self { interceptor }
    }
}

impl Listener for ConnectionStatusListener {
    fn capabilities(&self) -> &[EventKind] {
        &[EventKind::PlayerJoin, EventKind::PlayerQuit]
    }

    fn on_event(&self, event: &HostEvent) {
        match event {
            HostEvent::PlayerJoin(player) => {
                if let Err(e) = self.interceptor.inject(player) {
                    warn!(player = %player.id(), error = %e, "Failed to inject sniffer on join");
                }
            }
            HostEvent::PlayerQuit(player) => {
                self.interceptor.eject(player.id());
            }
            _ => {}
        }
    }
}

/// Sweeps stages left by a previous instance of the same plugin.
///
/// Runs on both sides of a reload: when the plugin is about to disable and
/// when it has finished enabling. After the enable sweep, every online player
/// gets a fresh sniffer bound to this instance. Events for other plugins are
/// ignored.
pub struct ServerStatusListener {
    plugin: String,
    interceptor: Arc<PacketInterceptor>,
}

impl ServerStatusListener {
    pub fn new(plugin: impl Into<String>, interceptor: Arc<PacketInterceptor>) -> Self {
        Self {
            plugin: plugin.into(),
            interceptor,
        }
    }

    fn reinject_online(&self) -> usize {
        let network = self.interceptor.router().host().network();
        let mut injected = 0;
        for player in network.online_players() {
            match self.interceptor.inject(&player) {
                Ok(true) => injected += 1,
                Ok(false) => {}
                Err(e) => warn!(player = %player.id(), error = %e, "Failed to re-inject sniffer"),
            }
        }
        injected
    }
}

impl Listener for ServerStatusListener {
    fn capabilities(&self) -> &[EventKind] {
        &[EventKind::PluginEnable, EventKind::PluginDisable]
    }

    fn on_event(&self, event: &HostEvent) {
        match event {
            HostEvent::PluginDisable { plugin } if plugin.eq_ignore_ascii_case(&self.plugin) => {
                let removed = self.interceptor.clean_orphaned_pipelines();
                debug!(plugin = %plugin, removed, "Swept sniffers before disable");
            }
            HostEvent::PluginEnable { plugin } if plugin.eq_ignore_ascii_case(&self.plugin) => {
                let removed = self.interceptor.clean_orphaned_pipelines();
                let injected = self.reinject_online();
                info!(plugin = %plugin, removed, injected, "Refreshed sniffers after enable");
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dialogkit_core::{
        BoxedPlayer, Connection, CustomKeyRegistry, DispatchRouter, EventBus, HostContext, LoopbackNetwork,
        Pipeline, Player, TickScheduler,
    };

    struct Fixture {
        network: Arc<LoopbackNetwork>,
        interceptor: Arc<PacketInterceptor>,
    }

    fn fixture() -> Fixture {
        let network = Arc::new(LoopbackNetwork::new());
        let host = HostContext::new(
            "DialogAPI",
            Arc::new(TickScheduler::new()),
            Arc::new(EventBus::new()),
            network.clone(),
        );
        let router = Arc::new(DispatchRouter::new(Arc::new(CustomKeyRegistry::new()), host));
        let interceptor = Arc::new(PacketInterceptor::new("DialogAPI", router, network.clone()));
        Fixture {
            network,
            interceptor,
        }
    }

    #[test]
    fn test_join_and_quit() {
        let fx = fixture();
        let listener = ConnectionStatusListener::new(fx.interceptor.clone());
        let (player, connection) = fx.network.connect("Steve");
        let player: BoxedPlayer = player;

        listener.on_event(&HostEvent::PlayerJoin(player.clone()));
        assert!(connection.pipeline().has_named("dialogapi_dialog_sniffer"));

        listener.on_event(&HostEvent::PlayerQuit(player.clone()));
        assert!(!connection.pipeline().has_named("dialogapi_dialog_sniffer"));
        assert!(!fx.interceptor.is_tracked(player.id()));
    }

    #[test]
    fn test_enable_refreshes_stale_sniffers() {
        let old = fixture();
        let (steve, connection) = old.network.connect("Steve");
        let steve: BoxedPlayer = steve;
        old.interceptor.inject(&steve).unwrap();

        // A second instance over the same network, as after a reload.
        let host = old.interceptor.router().host().clone();
        let router = Arc::new(DispatchRouter::new(Arc::new(CustomKeyRegistry::new()), host));
        let fresh = Arc::new(PacketInterceptor::new("DialogAPI", router, old.network.clone()));
        let listener = ServerStatusListener::new("DialogAPI", fresh.clone());

        listener.on_event(&HostEvent::PluginEnable {
            plugin: "dialogapi".to_string(),
        });

        assert!(fresh.is_tracked(steve.id()));
        let names = connection.pipeline().names();
        assert_eq!(
            names.iter().filter(|n| *n == "dialogapi_dialog_sniffer").count(),
            1
        );
    }

    #[test]
    fn test_other_plugins_are_ignored() {
        let fx = fixture();
        let (steve, connection) = fx.network.connect("Steve");
        let steve: BoxedPlayer = steve;
        fx.interceptor.inject(&steve).unwrap();

        let listener = ServerStatusListener::new("DialogAPI", fx.interceptor.clone());
        listener.on_event(&HostEvent::PluginDisable {
            plugin: "WorldEdit".to_string(),
        });
        assert!(connection.pipeline().has_named("dialogapi_dialog_sniffer"));

        listener.on_event(&HostEvent::PluginDisable {
            plugin: "DialogAPI".to_string(),
        });
        assert!(!connection.pipeline().has_named("dialogapi_dialog_sniffer"));
    }
}
