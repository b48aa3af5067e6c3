//! Per-connection packet interception.
//!
//! [`PacketInterceptor`] installs a [`SnifferHandler`] into each player's
//! inbound pipeline, immediately before the host's terminal packet handler.
//! The handler forwards click packets to the [`DispatchRouter`] and lets
//! every packet continue down the pipeline.
//!
//! The handler name is derived from the plugin name (see [`handler_name`]).
//! Presence of that name in the pipeline is the source of truth: injection is
//! skipped when it is already there, and [`clean_orphaned_pipelines`] removes
//! it from every open connection regardless of which plugin instance put it
//! there. The set of injected players is kept only for diagnostics.
//!
//! [`clean_orphaned_pipelines`]: PacketInterceptor::clean_orphaned_pipelines
//!
//! # Example
//!
//! ```rust,ignore
//! let interceptor = PacketInterceptor::new("DialogAPI", router, network);
//! interceptor.inject(&player)?;
//! // ... later, on quit
//! interceptor.eject(player.id());
//! ```

use std::collections::HashSet;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::foundation::error::{InterceptError, InterceptResult, PipelineError};
use crate::foundation::player::{BoxedPlayer, PlayerId};
use crate::framework::router::DispatchRouter;
use crate::integration::host::{InboundHandler, InboundPacket, ServerNetwork};

/// Default name of the host's terminal inbound stage.
pub const DEFAULT_ANCHOR: &str = "packet_handler";

const HANDLER_SUFFIX: &str = "_dialog_sniffer";

/// Derives the pipeline stage name used by a plugin.
pub fn handler_name(plugin_name: &str) -> String {
    format!("{}{HANDLER_SUFFIX}", plugin_name.to_lowercase())
}

// =============================================================================
// SnifferHandler
// =============================================================================

/// The stage installed into each player's pipeline.
pub struct SnifferHandler {
    player: BoxedPlayer,
    router: Arc<DispatchRouter>,
}

impl InboundHandler for SnifferHandler {
    fn channel_read(&self, packet: &InboundPacket) {
        let Some(click) = packet.as_custom_click() else {
            return;
        };
        let result = catch_unwind(AssertUnwindSafe(|| self.router.route(&self.player, click)));
        if result.is_err() {
            error!(
                player = %self.player.id(),
                identifier = %click.id,
                "Dispatch panicked; packet still forwarded"
            );
        }
    }
}

// =============================================================================
// PacketInterceptor
// =============================================================================

/// Manages the sniffer stage across all connections.
pub struct PacketInterceptor {
    handler_name: String,
    anchor: String,
    router: Arc<DispatchRouter>,
    network: Arc<dyn ServerNetwork>,
    injected: Mutex<HashSet<PlayerId>>,
}

impl PacketInterceptor {
    pub fn new(
        plugin_name: &str,
        router: Arc<DispatchRouter>,
        network: Arc<dyn ServerNetwork>,
    ) -> Self {
        Self {
            handler_name: handler_name(plugin_name),
            anchor: DEFAULT_ANCHOR.to_string(),
            router,
            network,
            injected: Mutex::new(HashSet::new()),
        }
    }

    /// Uses a different anchor stage.
    pub fn with_anchor(mut self, anchor: impl Into<String>) -> Self {
        self.anchor = anchor.into();
        self
    }

    pub fn handler_name(&self) -> &str {
        &self.handler_name
    }

    pub fn anchor(&self) -> &str {
        &self.anchor
    }

    /// Installs the sniffer into the player's pipeline.
    ///
    /// Returns `Ok(false)` if a stage with the handler name is already
    /// present, including one installed by a concurrent call.
    pub fn inject(&self, player: &BoxedPlayer) -> InterceptResult<bool> {
        let id = player.id();
        let connection = self
            .network
            .connection_of(id)
            .ok_or_else(|| InterceptError::ConnectionNotFound(id.to_string()))?;
        let pipeline = connection.pipeline();

        if pipeline.has_named(&self.handler_name) {
            debug!(player = %id, handler = %self.handler_name, "Sniffer already present");
            self.injected.lock().insert(id);
            return Ok(false);
        }

        let handler = Arc::new(SnifferHandler {
            player: Arc::clone(player),
            router: Arc::clone(&self.router),
        });
        // A concurrent inject may land between the check and the insert.
        match pipeline.insert_before(&self.anchor, &self.handler_name, handler) {
            Ok(()) => {}
            Err(PipelineError::Duplicate(_)) => {
                debug!(player = %id, handler = %self.handler_name, "Sniffer installed concurrently");
                self.injected.lock().insert(id);
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        }
        self.injected.lock().insert(id);
        debug!(player = %id, handler = %self.handler_name, anchor = %self.anchor, "Injected sniffer");
        Ok(true)
    }

    /// Removes the sniffer from the player's pipeline.
    ///
    /// Returns `true` if a stage was removed. Absent players and absent
    /// stages are no-ops.
    pub fn eject(&self, player: PlayerId) -> bool {
        self.injected.lock().remove(&player);
        let Some(connection) = self.network.connection_of(player) else {
            return false;
        };
        let removed = connection.pipeline().remove(&self.handler_name).is_some();
        if removed {
            debug!(player = %player, handler = %self.handler_name, "Ejected sniffer");
        }
        removed
    }

    /// Ejects from every online player. Returns the number of stages removed.
    pub fn unregister_all(&self) -> usize {
        let removed = self
            .network
            .online_players()
            .iter()
            .filter(|player| self.eject(player.id()))
            .count();
        self.injected.lock().clear();
        info!(removed, "Ejected sniffers from all players");
        removed
    }

    /// Removes this plugin's stage from every open connection.
    ///
    /// Covers connections still logging in and stages left behind by a
    /// previous plugin instance. Returns the number of stages removed.
    pub fn clean_orphaned_pipelines(&self) -> usize {
        let mut removed = 0;
        for connection in self.network.connections() {
            if !connection.is_open() {
                continue;
            }
            let pipeline = connection.pipeline();
            if !pipeline.has_named(&self.handler_name) {
                continue;
            }
            if pipeline.remove(&self.handler_name).is_some() {
                removed += 1;
                if let Some(player) = connection.player() {
                    self.injected.lock().remove(&player);
                }
            } else {
                warn!(handler = %self.handler_name, "Sniffer vanished before it could be removed");
            }
        }
        if removed > 0 {
            info!(removed, handler = %self.handler_name, "Removed orphaned sniffers");
        } else {
            debug!(handler = %self.handler_name, "No orphaned sniffers found");
        }
        removed
    }

    /// Players injected by this instance, sorted.
    pub fn injected_players(&self) -> Vec<PlayerId> {
        let mut players: Vec<PlayerId> = self.injected.lock().iter().copied().collect();
        players.sort();
        players
    }

    pub fn is_tracked(&self, player: PlayerId) -> bool {
        self.injected.lock().contains(&player)
    }

    pub fn router(&self) -> &Arc<DispatchRouter> {
        &self.router
    }
}

impl std::fmt::Debug for PacketInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PacketInterceptor")
            .field("handler_name", &self.handler_name)
            .field("anchor", &self.anchor)
            .field("injected", &self.injected.lock().len())
            .finish()
    }
}
