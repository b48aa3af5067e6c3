//! Host-facing traits.
//!
//! The core never talks to a concrete server. Everything it needs from the
//! host is expressed here:
//!
//! - [`Pipeline`] / [`Connection`] / [`ServerNetwork`] for the network layer
//! - [`Scheduler`] for the single-threaded main loop
//! - [`ListenerRegistrar`] / [`Listener`] for the event framework
//!
//! [`HostContext`] bundles the handles so they can be passed around as one
//! value.
//!
//! # Threading
//!
//! Pipeline handlers are invoked on the connection's I/O thread. Anything that
//! touches game state must be posted through [`Scheduler`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::foundation::error::{ListenerResult, PipelineError};
use crate::foundation::player::{BoxedPlayer, PlayerId};
use crate::foundation::tag::NamedValues;

// =============================================================================
// Packets
// =============================================================================

/// The click packet a client sends when a dialog button with a custom action
/// is pressed, or when a dialog with inputs is submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomClickAction {
    /// Identifier of the interaction, used as the dispatch key.
    pub id: String,
    /// Optional tagged binary payload (a compound when present).
    pub payload: Option<Vec<u8>>,
}

impl CustomClickAction {
    /// Creates a click packet without a payload.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            payload: None,
        }
    }

    /// Attaches a payload.
    pub fn with_payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// An inbound packet as seen by pipeline handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundPacket {
    /// The packet the core intercepts.
    CustomClickAction(CustomClickAction),
    /// Any other packet, identified by its kind.
    Other(String),
}

impl InboundPacket {
    /// Returns the click packet if this is one.
    pub fn as_custom_click(&self) -> Option<&CustomClickAction> {
        match self {
            Self::CustomClickAction(packet) => Some(packet),
            Self::Other(_) => None,
        }
    }
}

impl From<CustomClickAction> for InboundPacket {
    fn from(packet: CustomClickAction) -> Self {
        Self::CustomClickAction(packet)
    }
}

// =============================================================================
// Network
// =============================================================================

/// A stage installed in a connection's inbound pipeline.
///
/// Implementations observe packets; propagation to the next stage is handled
/// by the pipeline and always continues.
pub trait InboundHandler: Send + Sync {
    fn channel_read(&self, packet: &InboundPacket);
}

/// A shared inbound handler.
pub type BoxedInboundHandler = Arc<dyn InboundHandler>;

/// The ordered chain of inbound stages of one connection.
pub trait Pipeline: Send + Sync {
    /// Returns `true` if a stage with this name is installed.
    fn has_named(&self, name: &str) -> bool;

    /// Inserts a stage immediately before `anchor`.
    fn insert_before(
        &self,
        anchor: &str,
        name: &str,
        handler: BoxedInboundHandler,
    ) -> Result<(), PipelineError>;

    /// Removes a stage by name, returning it if it was present.
    fn remove(&self, name: &str) -> Option<BoxedInboundHandler>;

    /// Returns stage names in pipeline order.
    fn names(&self) -> Vec<String>;

    /// Delivers a packet to every stage in order.
    fn fire_packet_received(&self, packet: &InboundPacket);
}

/// A live network connection.
pub trait Connection: Send + Sync {
    fn pipeline(&self) -> Arc<dyn Pipeline>;

    fn is_open(&self) -> bool;

    /// The player bound to this connection, or `None` while still logging in.
    fn player(&self) -> Option<PlayerId>;
}

/// A shared connection.
pub type BoxedConnection = Arc<dyn Connection>;

/// The server's network layer.
pub trait ServerNetwork: Send + Sync {
    /// Every live connection, including ones not yet bound to a player.
    fn connections(&self) -> Vec<BoxedConnection>;

    /// The connection of an online player.
    fn connection_of(&self, player: PlayerId) -> Option<BoxedConnection>;

    /// All players that finished logging in.
    fn online_players(&self) -> Vec<BoxedPlayer>;
}

// =============================================================================
// Scheduler
// =============================================================================

/// A unit of main-thread work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// The host's single-threaded main loop.
pub trait Scheduler: Send + Sync {
    /// Runs `task` on the main thread at the next opportunity.
    fn run_on_main_thread(&self, task: Task);

    /// Runs `task` on the main thread after `ticks` ticks.
    fn run_on_main_thread_after(&self, ticks: u64, task: Task);
}

// =============================================================================
// Events
// =============================================================================

/// The kinds of host events a listener can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    PlayerJoin,
    PlayerQuit,
    PlayerDeath,
    PluginEnable,
    PluginDisable,
    Custom,
}

/// An event raised by the host.
#[derive(Clone)]
pub enum HostEvent {
    PlayerJoin(BoxedPlayer),
    PlayerQuit(BoxedPlayer),
    PlayerDeath {
        player: BoxedPlayer,
        message: Option<String>,
    },
    PluginEnable {
        plugin: String,
    },
    PluginDisable {
        plugin: String,
    },
    Custom {
        name: String,
        data: NamedValues,
    },
}

impl HostEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::PlayerJoin(_) => EventKind::PlayerJoin,
            Self::PlayerQuit(_) => EventKind::PlayerQuit,
            Self::PlayerDeath { .. } => EventKind::PlayerDeath,
            Self::PluginEnable { .. } => EventKind::PluginEnable,
            Self::PluginDisable { .. } => EventKind::PluginDisable,
            Self::Custom { .. } => EventKind::Custom,
        }
    }

    /// The player the event is about, if any.
    pub fn player(&self) -> Option<&BoxedPlayer> {
        match self {
            Self::PlayerJoin(player) | Self::PlayerQuit(player) => Some(player),
            Self::PlayerDeath { player, .. } => Some(player),
            _ => None,
        }
    }
}

impl fmt::Debug for HostEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("HostEvent");
        s.field("kind", &self.kind());
        if let Some(player) = self.player() {
            s.field("player", &player.id());
        }
        match self {
            Self::PluginEnable { plugin } | Self::PluginDisable { plugin } => {
                s.field("plugin", plugin);
            }
            Self::Custom { name, .. } => {
                s.field("name", name);
            }
            _ => {}
        }
        s.finish()
    }
}

/// An event listener described by the set of event kinds it handles.
pub trait Listener: Send + Sync {
    /// The event kinds this listener wants to receive.
    fn capabilities(&self) -> &[EventKind];

    /// Called on the main thread for every matching event.
    fn on_event(&self, event: &HostEvent);
}

/// A shared listener.
pub type BoxedListener = Arc<dyn Listener>;

/// Identifier returned by [`ListenerRegistrar::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The host's listener registration interface.
pub trait ListenerRegistrar: Send + Sync {
    fn register(&self, owner: &str, listener: BoxedListener) -> ListenerResult<ListenerId>;

    /// Unregisters a listener. Unregistering twice is an error.
    fn unregister(&self, id: ListenerId) -> ListenerResult<()>;
}

/// A listener backed by a closure.
pub struct FnListener<F> {
    kinds: Vec<EventKind>,
    f: F,
}

impl<F> Listener for FnListener<F>
where
    F: Fn(&HostEvent) + Send + Sync,
{
    fn capabilities(&self) -> &[EventKind] {
        &self.kinds
    }

    fn on_event(&self, event: &HostEvent) {
        (self.f)(event)
    }
}

/// Creates a listener for `kinds` from a closure.
///
/// # Example
///
/// ```rust,ignore
/// let listener = listener_fn([EventKind::PlayerDeath], |event| {
///     if let Some(player) = event.player() {
///         player.send_message("you died during your dialog");
///     }
/// });
/// ```
pub fn listener_fn<F>(kinds: impl IntoIterator<Item = EventKind>, f: F) -> BoxedListener
where
    F: Fn(&HostEvent) + Send + Sync + 'static,
{
    Arc::new(FnListener {
        kinds: kinds.into_iter().collect(),
        f,
    })
}

// =============================================================================
// HostContext
// =============================================================================

/// The handles the core needs from the host, bundled.
#[derive(Clone)]
pub struct HostContext {
    plugin_name: String,
    scheduler: Arc<dyn Scheduler>,
    registrar: Arc<dyn ListenerRegistrar>,
    network: Arc<dyn ServerNetwork>,
}

impl HostContext {
    pub fn new(
        plugin_name: impl Into<String>,
        scheduler: Arc<dyn Scheduler>,
        registrar: Arc<dyn ListenerRegistrar>,
        network: Arc<dyn ServerNetwork>,
    ) -> Self {
        Self {
            plugin_name: plugin_name.into(),
            scheduler,
            registrar,
            network,
        }
    }

    /// Name of the owning plugin; also the owner of registered listeners.
    pub fn plugin_name(&self) -> &str {
        &self.plugin_name
    }

    pub fn scheduler(&self) -> &Arc<dyn Scheduler> {
        &self.scheduler
    }

    pub fn registrar(&self) -> &Arc<dyn ListenerRegistrar> {
        &self.registrar
    }

    pub fn network(&self) -> &Arc<dyn ServerNetwork> {
        &self.network
    }
}

impl fmt::Debug for HostContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostContext")
            .field("plugin_name", &self.plugin_name)
            .finish_non_exhaustive()
    }
}
