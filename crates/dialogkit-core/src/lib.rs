//! # dialogkit Core
//!
//! Packet interception and dispatch for server-driven dialogs.
//!
//! When a player presses a dialog button that carries a custom action, the
//! client sends a click packet with an identifier and an optional tagged
//! binary payload. This crate catches that packet on the connection's I/O
//! thread and turns it into main-thread callbacks.
//!
//! ## Architecture Layers
//!
//! ### Foundation Layer
//!
//! - **Tagged values**: [`TaggedValue`], [`NamedValues`] and the payload codec
//!   ([`decode_payload`], [`decode_compound`], [`encode_compound`])
//! - **Identifiers**: [`ResourceLocation`], [`PlayerId`]
//! - **Errors**: one `thiserror` enum per concern
//!
//! ### Framework Layer
//!
//! - **Bindings**: [`CustomKeyRegistry`] and [`Binding`]
//! - **Dispatch**: [`DispatchRouter`]
//! - **Callbacks**: [`CustomAction`], [`InputReader`], [`ExpiringListener`]
//!
//! ### Integration Layer
//!
//! - **Host traits**: [`Pipeline`], [`ServerNetwork`], [`Scheduler`],
//!   [`ListenerRegistrar`]
//! - **Interception**: [`PacketInterceptor`]
//! - **Reference host**: [`LoopbackNetwork`], [`TickScheduler`], [`EventBus`]
//!
//! ## Flow
//!
//! ```text
//! ┌──────────────┐   click    ┌────────────────┐  lookup  ┌──────────────────┐
//! │   Pipeline   │───────────▶│ DispatchRouter │─────────▶│ CustomKeyRegistry│
//! │ (I/O thread) │            └────────────────┘          └──────────────────┘
//! └──────────────┘                    │ post
//!                                     ▼
//!                          ┌─────────────────────┐
//!                          │ Scheduler (main)    │──▶ action task / reader
//!                          └─────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use dialogkit_core::*;
//! use std::sync::Arc;
//!
//! let network = Arc::new(LoopbackNetwork::new());
//! let scheduler = Arc::new(TickScheduler::new());
//! let host = HostContext::new("DialogAPI", scheduler.clone(), Arc::new(EventBus::new()), network.clone());
//!
//! let registry = Arc::new(CustomKeyRegistry::new());
//! registry.register("confirm", Binding::new().with_boxed_action(action_fn("confirm", |player, _| {
//!     player.send_message("confirmed");
//!     Ok(())
//! })));
//!
//! let router = Arc::new(DispatchRouter::new(registry, host));
//! let interceptor = PacketInterceptor::new("DialogAPI", router, network.clone());
//!
//! let (player, _) = network.connect("Steve");
//! interceptor.inject(&(player.clone() as BoxedPlayer))?;
//! network.send_packet(player.id(), CustomClickAction::new("confirm"));
//! scheduler.tick();
//! ```

// Architectural layers
pub mod foundation;
pub mod framework;
pub mod integration;

// Re-export foundation types
pub use foundation::{
    BoxedPlayer, DEFAULT_NAMESPACE, DecodeError, DecodeResult, InterceptError, InterceptResult,
    ListenerError, ListenerResult, LocationError, MAX_DEPTH, NamedValues, PipelineError, Player,
    PlayerId, ResourceLocation, TaggedValue, decode_compound, decode_payload,
    decode_payload_counted, downcast_player, encode_compound,
};

// Re-export framework types
pub use framework::{
    ActionContext, Binding, BoxedAction, BoxedReader, CustomAction, CustomKeyRegistry,
    DispatchOutcome, DispatchRouter, ExpiringListener, FnAction, InputReader, ListenerGuard,
    ListenerState, RouterStats, action_fn, execute,
};

// Re-export integration types
pub use integration::{
    BoxedConnection, BoxedInboundHandler, BoxedListener, Connection, CustomClickAction,
    DEFAULT_ANCHOR, EventBus, EventKind, FnListener, HostContext, HostEvent, InboundHandler,
    InboundPacket, Listener, ListenerId, ListenerRegistrar, LoopbackConnection, LoopbackNetwork,
    LoopbackPlayer, MAX_HEALTH, MemoryPipeline, PACKET_HANDLER, PacketInterceptor, Pipeline,
    STANDARD_STAGES, Scheduler, ServerNetwork, SnifferHandler, Task, TickScheduler, handler_name,
    listener_fn,
};

/// Prelude for common imports.
pub mod prelude {
    pub use super::foundation::{BoxedPlayer, NamedValues, Player, PlayerId, TaggedValue};
    pub use super::framework::{
        ActionContext, Binding, CustomAction, CustomKeyRegistry, InputReader, action_fn,
    };
    pub use super::integration::{BoxedListener, EventKind, HostEvent, listener_fn};
}
