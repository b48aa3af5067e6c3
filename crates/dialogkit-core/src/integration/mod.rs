//! Integration layer - the boundary with the host server.
//!
//! - Host traits for the network, scheduler and event framework
//! - [`PacketInterceptor`] for per-connection packet interception
//! - In-memory host implementations: [`TickScheduler`], [`EventBus`] and the
//!   loopback network

pub mod events;
pub mod host;
pub mod interceptor;
pub mod loopback;
pub mod scheduler;

pub use events::EventBus;
pub use host::{
    BoxedConnection, BoxedInboundHandler, BoxedListener, Connection, CustomClickAction,
    EventKind, FnListener, HostContext, HostEvent, InboundHandler, InboundPacket, Listener,
    ListenerId, ListenerRegistrar, Pipeline, Scheduler, ServerNetwork, Task, listener_fn,
};
pub use interceptor::{DEFAULT_ANCHOR, PacketInterceptor, SnifferHandler, handler_name};
pub use loopback::{
    LoopbackConnection, LoopbackNetwork, LoopbackPlayer, MAX_HEALTH, MemoryPipeline,
    PACKET_HANDLER, STANDARD_STAGES,
};
pub use scheduler::TickScheduler;
