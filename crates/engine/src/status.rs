//! Walker-level status tracking.

use serde::{Deserialize, Serialize};

/// The observable status of a tree-walking session.
///
/// Observable while the walk runs and after it terminates; once
/// `walk_tree` returns, the status is terminal, never `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WalkStatus {
    /// Session constructed; the walk has not started.
    Initialized,
    /// The walk is actively visiting nodes.
    Running,
    /// The walk reached a node with no successor.
    RanToCompletion,
    /// A selector matched no child; treated as successful completion.
    RanToCompletionNoChildMatched,
    /// Cancellation was observed after the walk started.
    Cancelled,
    /// Cancellation was already requested when the walk was asked to start.
    CancelledBeforeExecution,
    /// A node's action fan-out exceeded the node timeout.
    TimeoutOnNode,
    /// An action exceeded its timeout or exhausted its retries.
    TimeoutOnAction,
    /// A schema value could not be evaluated.
    FailedEvaluateDynamicProperty,
    /// Any other failure.
    Failed,
}

impl WalkStatus {
    /// Returns `true` if the walk has reached a final state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Initialized | Self::Running)
    }

    /// Returns `true` for the successful terminal outcomes.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Self::RanToCompletion | Self::RanToCompletionNoChildMatched
        )
    }

    /// Returns `true` for terminal outcomes caused by a failure or timeout.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::TimeoutOnNode
                | Self::TimeoutOnAction
                | Self::FailedEvaluateDynamicProperty
                | Self::Failed
        )
    }
}

impl std::fmt::Display for WalkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Initialized => "Initialized",
            Self::Running => "Running",
            Self::RanToCompletion => "RanToCompletion",
            Self::RanToCompletionNoChildMatched => "RanToCompletion_NoChildMatched",
            Self::Cancelled => "Cancelled",
            Self::CancelledBeforeExecution => "CancelledBeforeExecution",
            Self::TimeoutOnNode => "TimeoutOnNode",
            Self::TimeoutOnAction => "TimeoutOnAction",
            Self::FailedEvaluateDynamicProperty => "Failed_EvaluateDynamicProperty",
            Self::Failed => "Failed",
        };
        f.write_str(s)
    }
}
