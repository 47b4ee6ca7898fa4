//! Walk error taxonomy and status mapping.

use forge_action::ActionError;
use forge_core::StateError;
use forge_schema::RetryKind;

use crate::status::WalkStatus;

/// Boxed error type for host-supplied ports (callbacks, executors).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A schema value that could not be evaluated.
///
/// Wraps every evaluator failure except cancellation, carrying the string
/// form of the offending value and the target type it was being resolved
/// under.
#[derive(Debug, thiserror::Error)]
#[error("evaluating `{value}` as {}: {source}", .target.as_deref().unwrap_or("inferred type"))]
pub struct EvaluateError {
    /// String form of the offending schema value.
    pub value: String,
    /// Name of the known target type, if one was supplied.
    pub target: Option<String>,
    /// The underlying failure.
    #[source]
    pub source: BoxError,
}

impl EvaluateError {
    /// Wrap a failure against the given value and optional target name.
    pub fn new(
        value: impl ToString,
        target: Option<&str>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self {
            value: value.to_string(),
            target: target.map(str::to_owned),
            source: source.into(),
        }
    }
}

/// Errors terminating a tree walk.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum WalkError {
    /// The walk observed its cancellation token.
    #[error("walk cancelled")]
    Cancelled,

    /// A node's action fan-out exceeded the node timeout.
    #[error("node timeout on `{node_key}`")]
    NodeTimeout {
        /// The node whose fan-out timed out.
        node_key: String,
    },

    /// An action exceeded its timeout or exhausted its retries.
    #[error(
        "action timeout on node `{node_key}`, action `{action_key}` ({action_name}): \
         {retries} retries under {policy:?} policy"
    )]
    ActionTimeout {
        /// Node the action belongs to.
        node_key: String,
        /// The action's key within its node.
        action_key: String,
        /// The action's registry name.
        action_name: String,
        /// Retries performed before giving up.
        retries: u32,
        /// The retry policy in effect.
        policy: RetryKind,
        /// The last action failure observed, if any.
        #[source]
        source: Option<ActionError>,
    },

    /// A selector matched no child. Mapped to a successful terminal status.
    #[error("no child matched on node `{node_key}`")]
    NoChildMatched {
        /// The node whose selectors all declined.
        node_key: String,
    },

    /// A schema value could not be evaluated.
    #[error(transparent)]
    Evaluate(#[from] EvaluateError),

    /// The walk reached a node key absent from the schema.
    #[error("node not found: `{node_key}`")]
    NodeNotFound {
        /// The missing key.
        node_key: String,
    },

    /// A state write failed.
    #[error(transparent)]
    State(#[from] StateError),

    /// A host visit callback failed.
    #[error("visit callback: {0}")]
    Callback(#[source] BoxError),

    /// An action failed outside the retriable path.
    #[error("action `{action_key}` on node `{node_key}` failed")]
    Action {
        /// Node the action belongs to.
        node_key: String,
        /// The failing action's key.
        action_key: String,
        /// The action's error.
        #[source]
        source: ActionError,
    },

    /// A committed value could not be serialized.
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An action task panicked.
    #[error("action task panicked: {0}")]
    Join(String),

    /// `walk_tree` was called twice on a single-use session.
    #[error("walk already started for this session")]
    AlreadyWalked,
}

impl WalkError {
    /// The terminal status this error maps the walk to.
    ///
    /// Cancellation raised before the loop started is handled separately
    /// by the driver (it maps to `CancelledBeforeExecution`).
    #[must_use]
    pub fn status(&self) -> WalkStatus {
        match self {
            Self::Cancelled => WalkStatus::Cancelled,
            Self::ActionTimeout { .. } => WalkStatus::TimeoutOnAction,
            Self::NodeTimeout { .. } => WalkStatus::TimeoutOnNode,
            Self::NoChildMatched { .. } => WalkStatus::RanToCompletionNoChildMatched,
            Self::Evaluate(_) => WalkStatus::FailedEvaluateDynamicProperty,
            Self::NodeNotFound { .. }
            | Self::State(_)
            | Self::Callback(_)
            | Self::Action { .. }
            | Self::Serialization(_)
            | Self::Join(_)
            | Self::AlreadyWalked => WalkStatus::Failed,
        }
    }
}
