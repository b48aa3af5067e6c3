//! Player identity as seen by the core.
//!
//! The host owns player objects; the core only needs a stable id, a display
//! name and a way to tell the player something. Hosts that expose richer
//! player APIs can be reached through [`downcast_player`].

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identity of a connected player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// Creates a random id.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for PlayerId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A player handle provided by the host.
pub trait Player: Send + Sync {
    /// Returns the player's stable id.
    fn id(&self) -> PlayerId;

    /// Returns the player's display name.
    fn name(&self) -> &str;

    /// Sends a chat message to the player.
    fn send_message(&self, message: &str);

    /// Returns self as an `Arc<dyn Any>` for downcasting.
    ///
    /// Implementors should simply return `self`.
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// A shared player trait object.
pub type BoxedPlayer = Arc<dyn Player>;

/// Attempts to downcast a [`BoxedPlayer`] to a concrete host type.
///
/// # Example
///
/// ```rust,ignore
/// use dialogkit_core::{LoopbackPlayer, downcast_player};
///
/// if let Some(player) = downcast_player::<LoopbackPlayer>(boxed) {
///     player.damage(5.0);
/// }
/// ```
pub fn downcast_player<T: Player + 'static>(player: BoxedPlayer) -> Option<Arc<T>> {
    Arc::downcast::<T>(player.as_any()).ok()
}
