//! Name → definition registry for discovering actions.

use std::collections::HashMap;
use std::sync::Arc;

use forge_schema::TypeHint;

use crate::Action;

/// One registered action: the handler plus its declared input type.
#[derive(Clone)]
pub struct ActionDefinition {
    /// The handler the engine invokes.
    pub handler: Arc<dyn Action>,
    /// Target type the schema `input` is evaluated under, if declared.
    pub input_type: Option<TypeHint>,
}

/// Registry resolving schema action names to concrete implementations.
///
/// The host populates this at session construction and the engine treats
/// it as authoritative: schema actions whose name is not registered are
/// skipped, not failed (schema validation is the loading layer's concern).
/// An empty registry is valid.
///
/// The base-capability requirement is enforced by the type system: only
/// [`Action`] implementations can be registered.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use async_trait::async_trait;
/// use forge_action::{Action, ActionContext, ActionError, ActionRegistry, ActionResponse};
///
/// struct Noop;
///
/// #[async_trait]
/// impl Action for Noop {
///     async fn run(&self, _ctx: ActionContext) -> Result<ActionResponse, ActionError> {
///         Ok(ActionResponse::with_status("Done"))
///     }
/// }
///
/// let mut registry = ActionRegistry::new();
/// registry.register("Noop", Arc::new(Noop));
///
/// assert!(registry.get("Noop").is_some());
/// assert!(registry.get("unknown").is_none());
/// assert_eq!(registry.len(), 1);
/// ```
#[derive(Default)]
pub struct ActionRegistry {
    entries: HashMap<String, ActionDefinition>,
}

impl ActionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action with no declared input type.
    ///
    /// Overwrites any existing action with the same name.
    pub fn register(&mut self, name: impl Into<String>, handler: Arc<dyn Action>) {
        self.entries.insert(
            name.into(),
            ActionDefinition {
                handler,
                input_type: None,
            },
        );
    }

    /// Register an action whose schema `input` should be evaluated under
    /// `input_type`.
    pub fn register_with_input_type(
        &mut self,
        name: impl Into<String>,
        handler: Arc<dyn Action>,
        input_type: TypeHint,
    ) {
        self.entries.insert(
            name.into(),
            ActionDefinition {
                handler,
                input_type: Some(input_type),
            },
        );
    }

    /// Look up an action definition by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ActionDefinition> {
        self.entries.get(name)
    }

    /// Check whether an action with the given name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of registered actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no actions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all registered `(name, definition)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ActionDefinition)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("count", &self.entries.len())
            .field("names", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}
