//! Error type for action invocations.

/// Error returned by an action invocation.
///
/// From the engine's point of view every failure other than cancellation is
/// a candidate for the node's retry policy; actions that want structured
/// failure data attach it as `details`.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum ActionError {
    /// Execution observed the cancellation token. Not retried.
    #[error("cancelled")]
    Cancelled,

    /// The action failed.
    #[error("action failed: {message}")]
    Failed {
        /// Human-readable error message.
        message: String,
        /// Optional structured details about the failure.
        details: Option<serde_json::Value>,
    },
}

impl ActionError {
    /// Create a failure with no structured details.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
            details: None,
        }
    }

    /// Create a failure carrying structured details.
    pub fn failed_with_details(message: impl Into<String>, details: serde_json::Value) -> Self {
        Self::Failed {
            message: message.into(),
            details: Some(details),
        }
    }

    /// Returns `true` for the cancellation outcome.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
