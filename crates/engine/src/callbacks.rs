//! Host callbacks around node visits.

use async_trait::async_trait;
use forge_core::{SessionId, UserContext};
use tokio_util::sync::CancellationToken;

use crate::error::BoxError;

/// Everything a visit callback gets to see about the node being visited.
#[non_exhaustive]
pub struct NodeVisit<'a> {
    /// The session performing the walk.
    pub session_id: SessionId,
    /// Key of the node being visited.
    pub node_key: &'a str,
    /// The node's properties, fully evaluated.
    pub properties: &'a serde_json::Value,
    /// The host's opaque user context.
    pub user_context: Option<&'a UserContext>,
    /// The walker's cancellation token.
    pub cancellation: &'a CancellationToken,
}

impl std::fmt::Debug for NodeVisit<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeVisit")
            .field("session_id", &self.session_id)
            .field("node_key", &self.node_key)
            .field("properties", &self.properties)
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Host hooks invoked around every node visit.
///
/// `after_visit_node` runs on every path once `before_visit_node` ran for
/// that node, whether the visit succeeded or not. Errors from either hook
/// propagate and fail the walk.
#[async_trait]
pub trait WalkCallbacks: Send + Sync {
    /// Invoked after the current-node key is committed, before the visit.
    async fn before_visit_node(&self, _visit: &NodeVisit<'_>) -> Result<(), BoxError> {
        Ok(())
    }

    /// Invoked after the visit, success or failure.
    async fn after_visit_node(&self, _visit: &NodeVisit<'_>) -> Result<(), BoxError> {
        Ok(())
    }
}

/// The default callbacks: both hooks are no-ops.
#[derive(Debug, Default)]
pub struct NoopCallbacks;

#[async_trait]
impl WalkCallbacks for NoopCallbacks {}
