//! In-memory host network.
//!
//! A loopback implementation of [`ServerNetwork`], [`Connection`] and
//! [`Pipeline`] for tests, demos and running the runtime without a real
//! server. Packets are "received" by calling
//! [`LoopbackNetwork::send_click`] or [`Pipeline::fire_packet_received`].

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};

use crate::foundation::error::PipelineError;
use crate::foundation::player::{BoxedPlayer, Player, PlayerId};
use crate::integration::host::{
    BoxedConnection, BoxedInboundHandler, Connection, InboundHandler, InboundPacket, Pipeline,
    ServerNetwork,
};

/// Name of the terminal stage of a standard loopback pipeline.
pub const PACKET_HANDLER: &str = "packet_handler";

/// Stage names of a standard loopback pipeline, in order.
pub const STANDARD_STAGES: [&str; 4] = ["splitter", "decompress", "decoder", PACKET_HANDLER];

// =============================================================================
// MemoryPipeline
// =============================================================================

struct PassThrough;

impl InboundHandler for PassThrough {
    fn channel_read(&self, _packet: &InboundPacket) {}
}

/// An in-memory pipeline of named stages.
pub struct MemoryPipeline {
    stages: RwLock<Vec<(String, BoxedInboundHandler)>>,
    closed: AtomicBool,
    delivered: AtomicU64,
}

impl MemoryPipeline {
    /// Creates a pipeline with pass-through stages named `names`.
    pub fn with_stages<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let stages = names
            .into_iter()
            .map(|name| (name.to_string(), Arc::new(PassThrough) as BoxedInboundHandler))
            .collect();
        Self {
            stages: RwLock::new(stages),
            closed: AtomicBool::new(false),
            delivered: AtomicU64::new(0),
        }
    }

    /// Creates a pipeline with [`STANDARD_STAGES`].
    pub fn standard() -> Self {
        Self::with_stages(STANDARD_STAGES)
    }

    /// Number of packets that made it through every stage.
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Acquire)
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

impl Default for MemoryPipeline {
    fn default() -> Self {
        Self::standard()
    }
}

impl Pipeline for MemoryPipeline {
    fn has_named(&self, name: &str) -> bool {
        self.stages.read().iter().any(|(n, _)| n == name)
    }

    fn insert_before(
        &self,
        anchor: &str,
        name: &str,
        handler: BoxedInboundHandler,
    ) -> Result<(), PipelineError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(PipelineError::Closed);
        }
        let mut stages = self.stages.write();
        if stages.iter().any(|(n, _)| n == name) {
            return Err(PipelineError::Duplicate(name.to_string()));
        }
        let index = stages
            .iter()
            .position(|(n, _)| n == anchor)
            .ok_or_else(|| PipelineError::NoSuchStage(anchor.to_string()))?;
        stages.insert(index, (name.to_string(), handler));
        Ok(())
    }

    fn remove(&self, name: &str) -> Option<BoxedInboundHandler> {
        let mut stages = self.stages.write();
        let index = stages.iter().position(|(n, _)| n == name)?;
        Some(stages.remove(index).1)
    }

    fn names(&self) -> Vec<String> {
        self.stages.read().iter().map(|(n, _)| n.clone()).collect()
    }

    fn fire_packet_received(&self, packet: &InboundPacket) {
        // Handlers run without the lock so they may touch the pipeline.
        let handlers: Vec<BoxedInboundHandler> =
            self.stages.read().iter().map(|(_, h)| h.clone()).collect();
        for handler in handlers {
            handler.channel_read(packet);
        }
        self.delivered.fetch_add(1, Ordering::AcqRel);
    }
}

// =============================================================================
// LoopbackConnection
// =============================================================================

/// A connection backed by a [`MemoryPipeline`].
pub struct LoopbackConnection {
    pipeline: Arc<MemoryPipeline>,
    open: AtomicBool,
    player: RwLock<Option<PlayerId>>,
}

impl LoopbackConnection {
    /// Opens a connection that has not finished logging in.
    pub fn new() -> Self {
        Self {
            pipeline: Arc::new(MemoryPipeline::standard()),
            open: AtomicBool::new(true),
            player: RwLock::new(None),
        }
    }

    /// Binds the connection to a player once login completes.
    pub fn bind_player(&self, player: PlayerId) {
        *self.player.write() = Some(player);
    }

    /// Closes the connection.
    pub fn close(&self) {
        self.open.store(false, Ordering::Release);
        self.pipeline.close();
    }

    /// The concrete pipeline, for inspection.
    pub fn memory_pipeline(&self) -> &Arc<MemoryPipeline> {
        &self.pipeline
    }
}

impl Default for LoopbackConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl Connection for LoopbackConnection {
    fn pipeline(&self) -> Arc<dyn Pipeline> {
        self.pipeline.clone()
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    fn player(&self) -> Option<PlayerId> {
        *self.player.read()
    }
}

// =============================================================================
// LoopbackPlayer
// =============================================================================

/// Maximum health of a loopback player.
pub const MAX_HEALTH: f64 = 20.0;

/// A player with health and an inbox.
pub struct LoopbackPlayer {
    id: PlayerId,
    name: String,
    health: Mutex<f64>,
    inbox: Mutex<Vec<String>>,
}

impl LoopbackPlayer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: PlayerId::random(),
            name: name.into(),
            health: Mutex::new(MAX_HEALTH),
            inbox: Mutex::new(Vec::new()),
        }
    }

    pub fn health(&self) -> f64 {
        *self.health.lock()
    }

    pub fn set_health(&self, health: f64) {
        *self.health.lock() = health.clamp(0.0, MAX_HEALTH);
    }

    /// Applies damage. Returns `true` if this hit killed the player.
    pub fn damage(&self, amount: f64) -> bool {
        let mut health = self.health.lock();
        let was_alive = *health > 0.0;
        *health = (*health - amount).max(0.0);
        was_alive && *health <= 0.0
    }

    /// Messages sent to the player so far.
    pub fn messages(&self) -> Vec<String> {
        self.inbox.lock().clone()
    }
}

impl Player for LoopbackPlayer {
    fn id(&self) -> PlayerId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn send_message(&self, message: &str) {
        trace!(player = %self.name, message, "Message to player");
        self.inbox.lock().push(message.to_string());
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

// =============================================================================
// LoopbackNetwork
// =============================================================================

struct Session {
    player: Arc<LoopbackPlayer>,
    connection: Arc<LoopbackConnection>,
}

/// An in-memory [`ServerNetwork`].
#[derive(Default)]
pub struct LoopbackNetwork {
    connections: RwLock<Vec<Arc<LoopbackConnection>>>,
    sessions: RwLock<HashMap<PlayerId, Session>>,
}

impl LoopbackNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a connection that is still logging in.
    pub fn open_connection(&self) -> Arc<LoopbackConnection> {
        let connection = Arc::new(LoopbackConnection::new());
        self.connections.write().push(connection.clone());
        connection
    }

    /// Opens a connection and completes login for a new player.
    pub fn connect(&self, name: impl Into<String>) -> (Arc<LoopbackPlayer>, Arc<LoopbackConnection>) {
        let player = Arc::new(LoopbackPlayer::new(name));
        let connection = self.open_connection();
        connection.bind_player(player.id());
        self.sessions.write().insert(
            player.id(),
            Session {
                player: player.clone(),
                connection: connection.clone(),
            },
        );
        debug!(player = %player.name(), id = %player.id(), "Player connected");
        (player, connection)
    }

    /// Closes and forgets a player's connection.
    pub fn disconnect(&self, player: PlayerId) -> Option<Arc<LoopbackPlayer>> {
        let session = self.sessions.write().remove(&player)?;
        session.connection.close();
        self.connections
            .write()
            .retain(|c| !Arc::ptr_eq(c, &session.connection));
        debug!(player = %session.player.name(), id = %player, "Player disconnected");
        Some(session.player)
    }

    pub fn player(&self, id: PlayerId) -> Option<Arc<LoopbackPlayer>> {
        self.sessions.read().get(&id).map(|s| s.player.clone())
    }

    /// Delivers a packet through a player's pipeline.
    ///
    /// Returns `false` if the player is not connected.
    pub fn send_packet(&self, player: PlayerId, packet: impl Into<InboundPacket>) -> bool {
        let Some(connection) = self.sessions.read().get(&player).map(|s| s.connection.clone())
        else {
            return false;
        };
        connection.pipeline.fire_packet_received(&packet.into());
        true
    }
}

impl ServerNetwork for LoopbackNetwork {
    fn connections(&self) -> Vec<BoxedConnection> {
        self.connections
            .read()
            .iter()
            .map(|c| c.clone() as BoxedConnection)
            .collect()
    }

    fn connection_of(&self, player: PlayerId) -> Option<BoxedConnection> {
        self.sessions
            .read()
            .get(&player)
            .map(|s| s.connection.clone() as BoxedConnection)
    }

    fn online_players(&self) -> Vec<BoxedPlayer> {
        self.sessions
            .read()
            .values()
            .map(|s| s.player.clone() as BoxedPlayer)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integration::host::CustomClickAction;

    #[test]
    fn test_insert_before_anchor() {
        let pipeline = MemoryPipeline::standard();
        pipeline
            .insert_before(PACKET_HANDLER, "observer", Arc::new(PassThrough))
            .unwrap();
        let names = pipeline.names();
        assert_eq!(names[names.len() - 2], "observer");
        assert_eq!(names.last().map(String::as_str), Some(PACKET_HANDLER));
    }

    #[test]
    fn test_insert_errors() {
        let pipeline = MemoryPipeline::with_stages(["decoder"]);
        assert_eq!(
            pipeline.insert_before("missing", "x", Arc::new(PassThrough)),
            Err(PipelineError::NoSuchStage("missing".into()))
        );
        assert_eq!(
            pipeline.insert_before("decoder", "decoder", Arc::new(PassThrough)),
            Err(PipelineError::Duplicate("decoder".into()))
        );
        pipeline.close();
        assert_eq!(
            pipeline.insert_before("decoder", "x", Arc::new(PassThrough)),
            Err(PipelineError::Closed)
        );
    }

    #[test]
    fn test_connect_and_disconnect() {
        let network = LoopbackNetwork::new();
        let login = network.open_connection();
        let (player, connection) = network.connect("Steve");

        assert_eq!(network.connections().len(), 2);
        assert!(login.player().is_none());
        assert_eq!(connection.player(), Some(player.id()));
        assert_eq!(network.online_players().len(), 1);

        assert!(network.send_packet(player.id(), CustomClickAction::new("x")));
        assert_eq!(connection.memory_pipeline().delivered(), 1);

        network.disconnect(player.id()).unwrap();
        assert!(!connection.is_open());
        assert_eq!(network.connections().len(), 1);
        assert!(!network.send_packet(player.id(), CustomClickAction::new("x")));
    }

    #[test]
    fn test_damage_reports_death_once() {
        let player = LoopbackPlayer::new("Alex");
        player.set_health(4.0);
        assert!(player.damage(5.0));
        assert!(!player.damage(5.0));
        assert_eq!(player.health(), 0.0);
    }
}
