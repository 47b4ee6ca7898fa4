//! The tree-walking session: construction, observable surface, driver entry.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use forge_action::{ActionRegistry, ActionResponse};
use forge_core::{SessionId, StateStore, UserContext, keys};
use forge_schema::{ForgeTree, TreeAction, TreeNode};
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::callbacks::{NoopCallbacks, WalkCallbacks};
use crate::error::WalkError;
use crate::expression::{ExpressionExecutor, SessionView};
use crate::external::ExternalExecutor;
use crate::status::WalkStatus;

/// Shared core of a session, `Arc`ed so action tasks can hold it.
pub(crate) struct SessionInner {
    pub(crate) session_id: SessionId,
    pub(crate) tree: ForgeTree,
    pub(crate) state: Arc<dyn StateStore>,
    pub(crate) registry: Arc<ActionRegistry>,
    pub(crate) expressions: Option<Arc<dyn ExpressionExecutor>>,
    pub(crate) externals: HashMap<String, Arc<dyn ExternalExecutor>>,
    pub(crate) callbacks: Arc<dyn WalkCallbacks>,
    pub(crate) user_context: Option<UserContext>,
    pub(crate) dependencies: Option<UserContext>,
    pub(crate) cancellation: CancellationToken,
    status: RwLock<WalkStatus>,
    walked: AtomicBool,
}

impl SessionInner {
    pub(crate) fn set_status(&self, status: WalkStatus) {
        *self.status.write() = status;
    }

    pub(crate) fn status(&self) -> WalkStatus {
        *self.status.read()
    }

    /// Read a state key, swallowing backend failures as absence.
    ///
    /// Read errors must not fail queries or rehydration probes; writes,
    /// by contrast, always propagate.
    pub(crate) async fn read_state_opt(&self, key: &str) -> Option<serde_json::Value> {
        match self.state.get(key).await {
            Ok(value) => value,
            Err(error) => {
                warn!(key, %error, "state read failed; treating as absent");
                None
            }
        }
    }

    pub(crate) async fn read_response(&self, action_key: &str) -> Option<ActionResponse> {
        let value = self.read_state_opt(&keys::response_key(action_key)).await?;
        match serde_json::from_value(value) {
            Ok(response) => Some(response),
            Err(error) => {
                warn!(action_key, %error, "stored response is malformed; treating as absent");
                None
            }
        }
    }
}

#[async_trait]
impl SessionView for SessionInner {
    fn session_id(&self) -> SessionId {
        self.session_id
    }

    async fn output(&self, action_key: &str) -> Option<ActionResponse> {
        self.read_response(action_key).await
    }

    async fn last_action_response(&self) -> Option<ActionResponse> {
        let last = self.read_state_opt(keys::LAST_ACTION).await?;
        self.read_response(last.as_str()?).await
    }

    fn dependencies(&self) -> Option<&UserContext> {
        self.dependencies.as_ref()
    }
}

/// Builder for a [`TreeSession`].
///
/// Only the schema and the state handle are mandatory; everything else
/// defaults to absent (no expressions, no externals, no-op callbacks, a
/// fresh cancellation token, a random session id).
pub struct SessionBuilder {
    tree: ForgeTree,
    state: Arc<dyn StateStore>,
    registry: Arc<ActionRegistry>,
    expressions: Option<Arc<dyn ExpressionExecutor>>,
    externals: HashMap<String, Arc<dyn ExternalExecutor>>,
    callbacks: Arc<dyn WalkCallbacks>,
    user_context: Option<UserContext>,
    dependencies: Option<UserContext>,
    cancellation: CancellationToken,
    session_id: Option<SessionId>,
}

impl SessionBuilder {
    /// Start building a session over `tree`, persisting through `state`.
    pub fn new(tree: ForgeTree, state: Arc<dyn StateStore>) -> Self {
        Self {
            tree,
            state,
            registry: Arc::new(ActionRegistry::new()),
            expressions: None,
            externals: HashMap::new(),
            callbacks: Arc::new(NoopCallbacks),
            user_context: None,
            dependencies: None,
            cancellation: CancellationToken::new(),
            session_id: None,
        }
    }

    /// Supply the action registry.
    #[must_use]
    pub fn with_registry(mut self, registry: ActionRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    /// Supply the expression executor.
    #[must_use]
    pub fn with_expression_executor(mut self, executor: Arc<dyn ExpressionExecutor>) -> Self {
        self.expressions = Some(executor);
        self
    }

    /// Register an external executor under a string prefix.
    #[must_use]
    pub fn with_external_executor(
        mut self,
        prefix: impl Into<String>,
        executor: Arc<dyn ExternalExecutor>,
    ) -> Self {
        self.externals.insert(prefix.into(), executor);
        self
    }

    /// Supply visit callbacks.
    #[must_use]
    pub fn with_callbacks(mut self, callbacks: Arc<dyn WalkCallbacks>) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// Supply the opaque user context threaded to callbacks and actions.
    #[must_use]
    pub fn with_user_context(mut self, user_context: UserContext) -> Self {
        self.user_context = Some(user_context);
        self
    }

    /// Supply the opaque dependencies value exposed to expressions.
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: UserContext) -> Self {
        self.dependencies = Some(dependencies);
        self
    }

    /// Bind the walk to an external cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Pin the session identity instead of generating one.
    #[must_use]
    pub fn with_session_id(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// Finish construction.
    pub fn build(self) -> TreeSession {
        TreeSession {
            inner: Arc::new(SessionInner {
                session_id: self.session_id.unwrap_or_else(SessionId::v4),
                tree: self.tree,
                state: self.state,
                registry: self.registry,
                expressions: self.expressions,
                externals: self.externals,
                callbacks: self.callbacks,
                user_context: self.user_context,
                dependencies: self.dependencies,
                cancellation: self.cancellation,
                status: RwLock::new(WalkStatus::Initialized),
                walked: AtomicBool::new(false),
            }),
        }
    }
}

/// One tree-walking session.
///
/// Bound at construction to a parsed schema, a state handle, and the
/// session's capabilities; single-use per walk. Cheap to clone, and clones
/// share the same session.
///
/// Queries against state ([`output`](Self::output),
/// [`last_action_response`](Self::last_action_response),
/// [`current_tree_node`](Self::current_tree_node)) remain valid after the
/// walk terminates.
#[derive(Clone)]
pub struct TreeSession {
    pub(crate) inner: Arc<SessionInner>,
}

impl TreeSession {
    /// Start building a session over `tree`, persisting through `state`.
    pub fn builder(tree: ForgeTree, state: Arc<dyn StateStore>) -> SessionBuilder {
        SessionBuilder::new(tree, state)
    }

    /// Walk the tree from `start_key` to a terminal status.
    ///
    /// Returns the terminal status on the successful outcomes (including
    /// the suppressed no-child-matched completion) and the walk error
    /// otherwise; either way [`status`](Self::status) reflects the outcome
    /// afterwards and is never `Running`.
    pub async fn walk_tree(&self, start_key: &str) -> Result<WalkStatus, WalkError> {
        if self.inner.walked.swap(true, Ordering::SeqCst) {
            return Err(WalkError::AlreadyWalked);
        }

        if self.inner.cancellation.is_cancelled() {
            self.inner.set_status(WalkStatus::CancelledBeforeExecution);
            return Err(WalkError::Cancelled);
        }

        self.inner.set_status(WalkStatus::Running);
        info!(session = %self.inner.session_id, start = start_key, "walk started");

        match Arc::clone(&self.inner).run_walk(start_key).await {
            Ok(()) => {
                self.inner.set_status(WalkStatus::RanToCompletion);
                info!(session = %self.inner.session_id, "walk ran to completion");
                Ok(WalkStatus::RanToCompletion)
            }
            Err(error) => {
                let status = error.status();
                self.inner.set_status(status);
                // Make sure any stragglers observe cancellation on the way out.
                self.inner.cancellation.cancel();

                if let WalkError::NoChildMatched { node_key } = &error {
                    // A selector matching nothing is a successful terminal
                    // outcome, not a failure.
                    info!(session = %self.inner.session_id, node = %node_key, "walk ended: no child matched");
                    Ok(status)
                } else {
                    warn!(session = %self.inner.session_id, %status, %error, "walk terminated");
                    Err(error)
                }
            }
        }
    }

    /// Ask the walk to stop.
    pub fn cancel_walk_tree(&self) {
        self.inner.cancellation.cancel();
    }

    /// The session's current status.
    #[must_use]
    pub fn status(&self) -> WalkStatus {
        self.inner.status()
    }

    /// The session's identity.
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.inner.session_id
    }

    /// The schema the session walks.
    #[must_use]
    pub fn tree(&self) -> &ForgeTree {
        &self.inner.tree
    }

    /// The committed response of an action, if any.
    ///
    /// State read failures surface as absence.
    pub async fn output(&self, action_key: &str) -> Option<ActionResponse> {
        self.inner.read_response(action_key).await
    }

    /// The response committed most recently, if any.
    pub async fn last_action_response(&self) -> Option<ActionResponse> {
        SessionView::last_action_response(self.inner.as_ref()).await
    }

    /// The node the walk is currently on (or stopped on), with its key.
    pub async fn current_tree_node(&self) -> Option<(String, TreeNode)> {
        let current = self.inner.read_state_opt(keys::CURRENT_NODE).await?;
        let node_key = current.as_str()?.to_owned();
        let node = self.inner.tree.get(&node_key)?.clone();
        Some((node_key, node))
    }

    /// The schema action whose response was committed most recently.
    ///
    /// Resolved against the current node first; action keys are only
    /// guaranteed unique within a node, so a global fallback scan picks
    /// the first match elsewhere.
    pub async fn last_tree_action(&self) -> Option<TreeAction> {
        let last = self.inner.read_state_opt(keys::LAST_ACTION).await?;
        let action_key = last.as_str()?.to_owned();

        if let Some((_, node)) = self.current_tree_node().await
            && let Some(action) = node.actions.get(&action_key)
        {
            return Some(action.clone());
        }
        self.inner
            .tree
            .iter()
            .find_map(|(_, node)| node.actions.get(&action_key).cloned())
    }
}

#[async_trait]
impl SessionView for TreeSession {
    fn session_id(&self) -> SessionId {
        self.inner.session_id
    }

    async fn output(&self, action_key: &str) -> Option<ActionResponse> {
        self.inner.read_response(action_key).await
    }

    async fn last_action_response(&self) -> Option<ActionResponse> {
        SessionView::last_action_response(self.inner.as_ref()).await
    }

    fn dependencies(&self) -> Option<&UserContext> {
        self.inner.dependencies.as_ref()
    }
}

impl std::fmt::Debug for TreeSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeSession")
            .field("session_id", &self.inner.session_id)
            .field("status", &self.inner.status())
            .field("nodes", &self.inner.tree.len())
            .field("cancelled", &self.inner.cancellation.is_cancelled())
            .finish_non_exhaustive()
    }
}
