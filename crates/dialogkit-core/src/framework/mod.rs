//! Framework layer - bindings and dispatch.
//!
//! - [`CustomKeyRegistry`] maps interaction identifiers to [`Binding`]s
//! - [`DispatchRouter`] resolves click packets to actions and readers
//! - [`CustomAction`] / [`InputReader`] are the user-facing callbacks
//! - [`ExpiringListener`] bounds the lifetime of an action's listener

pub mod action;
pub mod listener;
pub mod registry;
pub mod router;

pub use action::{
    ActionContext, BoxedAction, BoxedReader, CustomAction, FnAction, InputReader, action_fn,
    execute,
};
pub use listener::{ExpiringListener, ListenerGuard, ListenerState};
pub use registry::{Binding, CustomKeyRegistry};
pub use router::{DispatchOutcome, DispatchRouter, RouterStats};
