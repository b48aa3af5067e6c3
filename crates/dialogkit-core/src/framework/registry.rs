//! Identifier-keyed bindings.
//!
//! [`CustomKeyRegistry`] maps an interaction identifier (the `id` of a click
//! packet) to a [`Binding`]. It is an explicit, shareable object: construct one
//! per plugin instance and hand it to the router.
//!
//! # Example
//!
//! ```rust,ignore
//! let registry = Arc::new(CustomKeyRegistry::new());
//! registry.register("confirm", Binding::new().with_action(ConfirmAction));
//! registry.register("set_amount", Binding::new().with_reader(|player, values| Ok(())));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::framework::action::{BoxedAction, BoxedReader, CustomAction, InputReader};

// =============================================================================
// Binding
// =============================================================================

/// What to run for one interaction identifier.
///
/// Either half may be absent. An empty binding is accepted and does nothing
/// on dispatch.
#[derive(Clone, Default)]
pub struct Binding {
    action: Option<BoxedAction>,
    reader: Option<BoxedReader>,
}

impl Binding {
    /// Creates an empty binding.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the action.
    pub fn with_action(mut self, action: impl CustomAction + 'static) -> Self {
        self.action = Some(Arc::new(action));
        self
    }

    /// Sets an already shared action.
    pub fn with_boxed_action(mut self, action: BoxedAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Sets the input reader.
    pub fn with_reader(mut self, reader: impl InputReader + 'static) -> Self {
        self.reader = Some(Arc::new(reader));
        self
    }

    /// Sets an already shared input reader.
    pub fn with_boxed_reader(mut self, reader: BoxedReader) -> Self {
        self.reader = Some(reader);
        self
    }

    pub fn action(&self) -> Option<&BoxedAction> {
        self.action.as_ref()
    }

    pub fn reader(&self) -> Option<&BoxedReader> {
        self.reader.as_ref()
    }

    /// Returns `true` if neither an action nor a reader is bound.
    pub fn is_empty(&self) -> bool {
        self.action.is_none() && self.reader.is_none()
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("action", &self.action.as_ref().map(|a| a.name().to_string()))
            .field("reader", &self.reader.is_some())
            .finish()
    }
}

// =============================================================================
// CustomKeyRegistry
// =============================================================================

/// Thread-safe map from interaction identifier to [`Binding`].
#[derive(Default)]
pub struct CustomKeyRegistry {
    bindings: RwLock<HashMap<String, Binding>>,
}

impl CustomKeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a binding, replacing and returning any previous one.
    pub fn register(&self, identifier: impl Into<String>, binding: Binding) -> Option<Binding> {
        let identifier = identifier.into();
        let previous = self.bindings.write().insert(identifier.clone(), binding);
        if previous.is_some() {
            info!(identifier = %identifier, "Replaced existing binding");
        } else {
            debug!(identifier = %identifier, "Registered binding");
        }
        previous
    }

    /// Returns the current binding for `identifier`.
    pub fn binding(&self, identifier: &str) -> Option<Binding> {
        self.bindings.read().get(identifier).cloned()
    }

    /// Removes a binding.
    pub fn unregister(&self, identifier: &str) -> Option<Binding> {
        self.bindings.write().remove(identifier)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.bindings.read().contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.bindings.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.read().is_empty()
    }

    /// Registered identifiers, sorted.
    pub fn identifiers(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.bindings.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Removes every binding.
    pub fn clear(&self) {
        self.bindings.write().clear();
    }
}

impl fmt::Debug for CustomKeyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomKeyRegistry")
            .field("bindings", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::player::BoxedPlayer;
    use crate::foundation::tag::NamedValues;
    use crate::framework::action::action_fn;

    fn noop_reader(_: &BoxedPlayer, _: &NamedValues) -> anyhow::Result<()> {
        Ok(())
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = CustomKeyRegistry::new();
        assert!(registry.binding("confirm").is_none());

        let previous = registry.register(
            "confirm",
            Binding::new().with_boxed_action(action_fn("confirm", |_, _| Ok(()))),
        );
        assert!(previous.is_none());

        let binding = registry.binding("confirm").unwrap();
        assert!(binding.action().is_some());
        assert!(binding.reader().is_none());
        assert_eq!(binding.action().unwrap().name(), "confirm");
    }

    #[test]
    fn test_last_registration_wins() {
        let registry = CustomKeyRegistry::new();
        registry.register("k", Binding::new().with_reader(noop_reader));
        let previous = registry
            .register("k", Binding::new().with_boxed_action(action_fn("a", |_, _| Ok(()))))
            .unwrap();

        assert!(previous.reader().is_some());
        let current = registry.binding("k").unwrap();
        assert!(current.action().is_some());
        assert!(current.reader().is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_empty_binding_is_accepted() {
        let registry = CustomKeyRegistry::new();
        registry.register("nothing", Binding::new());
        assert!(registry.contains("nothing"));
        assert!(registry.binding("nothing").unwrap().is_empty());
    }

    #[test]
    fn test_identifiers_and_clear() {
        let registry = CustomKeyRegistry::new();
        registry.register("b", Binding::new());
        registry.register("a", Binding::new());
        assert_eq!(registry.identifiers(), vec!["a", "b"]);

        assert!(registry.unregister("a").is_some());
        assert!(registry.unregister("a").is_none());
        registry.clear();
        assert!(registry.is_empty());
    }
}
