//! Runtime context handed to each action invocation.

use std::sync::Arc;

use forge_core::{SessionId, StateError, StateStore, UserContext, keys};
use tokio_util::sync::CancellationToken;

use crate::error::ActionError;

/// Everything one action invocation gets to see.
///
/// Constructed by the engine: identity fields name the invocation, `input`
/// and `properties` arrive fully evaluated (no embedded expressions left),
/// and the state handle is shared with the rest of the session.
///
/// Long-running actions **must** call [`check_cancelled`](Self::check_cancelled)
/// in loops and before expensive operations so cancellation is observable
/// in bounded time.
#[non_exhaustive]
pub struct ActionContext {
    /// Session this invocation belongs to.
    pub session_id: SessionId,
    /// Node the action is attached to.
    pub node_key: String,
    /// The action's key within its node.
    pub action_key: String,
    /// The action's registry name.
    pub action_name: String,
    /// Evaluated input, per the registered input type.
    pub input: serde_json::Value,
    /// Evaluated properties mapping.
    pub properties: serde_json::Value,
    /// Cancellation signal, checked cooperatively by actions.
    pub cancellation: CancellationToken,
    user_context: Option<UserContext>,
    state: Arc<dyn StateStore>,
}

impl ActionContext {
    /// Create a context with the given identity and state handle.
    pub fn new(
        session_id: SessionId,
        node_key: impl Into<String>,
        action_key: impl Into<String>,
        action_name: impl Into<String>,
        state: Arc<dyn StateStore>,
    ) -> Self {
        Self {
            session_id,
            node_key: node_key.into(),
            action_key: action_key.into(),
            action_name: action_name.into(),
            input: serde_json::Value::Null,
            properties: serde_json::Value::Null,
            cancellation: CancellationToken::new(),
            user_context: None,
            state,
        }
    }

    /// Attach the evaluated input value.
    #[must_use]
    pub fn with_input(mut self, input: serde_json::Value) -> Self {
        self.input = input;
        self
    }

    /// Attach the evaluated properties mapping.
    #[must_use]
    pub fn with_properties(mut self, properties: serde_json::Value) -> Self {
        self.properties = properties;
        self
    }

    /// Attach the host's opaque user context.
    #[must_use]
    pub fn with_user_context(mut self, user_context: UserContext) -> Self {
        self.user_context = Some(user_context);
        self
    }

    /// Attach a pre-existing cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// The host's opaque user context, if one was supplied at session
    /// construction. Hosts downcast it on their side.
    #[must_use]
    pub fn user_context(&self) -> Option<&UserContext> {
        self.user_context.as_ref()
    }

    /// Deserialize the evaluated input into a concrete type.
    pub fn input_as<T: serde::de::DeserializeOwned>(&self) -> Result<T, ActionError> {
        serde_json::from_value(self.input.clone())
            .map_err(|e| ActionError::failed(format!("invalid input: {e}")))
    }

    /// Check whether execution has been cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Cancelled`] if the token has been triggered.
    pub fn check_cancelled(&self) -> Result<(), ActionError> {
        if self.cancellation.is_cancelled() {
            Err(ActionError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Read this action's persisted intermediate slot.
    pub async fn get_intermediate(&self) -> Result<Option<serde_json::Value>, StateError> {
        self.state.get(&keys::intermediate_key(&self.action_key)).await
    }

    /// Persist a value into this action's intermediate slot.
    ///
    /// The slot survives crashes alongside the rest of the session state,
    /// so an action re-run after a partial failure can pick up where the
    /// previous attempt left off.
    pub async fn set_intermediate(&self, value: serde_json::Value) -> Result<(), StateError> {
        self.state
            .set(&keys::intermediate_key(&self.action_key), value)
            .await
    }

    /// The shared state capability, for actions with bespoke needs.
    #[must_use]
    pub fn state(&self) -> &Arc<dyn StateStore> {
        &self.state
    }
}

impl std::fmt::Debug for ActionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionContext")
            .field("session_id", &self.session_id)
            .field("node_key", &self.node_key)
            .field("action_key", &self.action_key)
            .field("action_name", &self.action_name)
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish_non_exhaustive()
    }
}
