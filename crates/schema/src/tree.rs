//! The decision-tree schema: nodes, actions, selectors, retry policy.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Reserved action name for leaf summaries.
///
/// Only legal on [`NodeType::Leaf`] nodes carrying exactly one action; the
/// action's `input` *is* the response the engine commits; no handler runs.
pub const LEAF_SUMMARY_ACTION: &str = "LeafNodeSummaryAction";

/// Per-node behavior discriminant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    /// Terminal node; may carry a single leaf-summary action.
    Leaf,
    /// Runs its actions concurrently, then selects a child.
    Action,
    /// Pure routing node; selects a child without running anything.
    #[default]
    Selection,
}

/// Retry policy discriminant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RetryKind {
    /// A single attempt; no retries.
    #[default]
    None,
    /// Wait `minBackoffMs` between attempts.
    FixedInterval,
    /// Double the wait each attempt, from `minBackoffMs` up to `maxBackoffMs`.
    ExponentialBackoff,
}

/// Retry policy for one action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    /// Which backoff schedule to apply.
    #[serde(rename = "type", default)]
    pub kind: RetryKind,
    /// Smallest (and initial) backoff, in milliseconds.
    #[serde(default)]
    pub min_backoff_ms: u64,
    /// Upper bound for exponential backoff, in milliseconds.
    #[serde(default)]
    pub max_backoff_ms: u64,
}

impl RetryPolicy {
    /// Fixed-interval policy waiting `min_backoff_ms` between attempts.
    #[must_use]
    pub fn fixed(min_backoff_ms: u64) -> Self {
        Self {
            kind: RetryKind::FixedInterval,
            min_backoff_ms,
            max_backoff_ms: 0,
        }
    }

    /// Exponential policy doubling from `min` up to `max` milliseconds.
    #[must_use]
    pub fn exponential(min_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        Self {
            kind: RetryKind::ExponentialBackoff,
            min_backoff_ms,
            max_backoff_ms,
        }
    }
}

/// One action attached to a node.
///
/// `input`, `properties`, and `timeout` are schema values: strings inside
/// them may embed expressions, resolved by the engine at invocation time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeAction {
    /// Action name, resolved against the registry.
    pub action: String,
    /// Schema value evaluated against the action's declared input type.
    #[serde(default)]
    pub input: Option<serde_json::Value>,
    /// Opaque mapping made available to the action via its context.
    #[serde(default)]
    pub properties: Option<serde_json::Value>,
    /// Timeout in milliseconds, an integer or an expression; `-1` = infinite.
    #[serde(default)]
    pub timeout: Option<serde_json::Value>,
    /// Backoff schedule for retries. Absent means a single attempt.
    #[serde(default)]
    pub retry_policy: Option<RetryPolicy>,
    /// On action timeout, record a synthetic response instead of failing.
    #[serde(default)]
    pub continuation_on_timeout: bool,
    /// On exhaustion with [`RetryKind::None`], record a synthetic response
    /// instead of failing.
    #[serde(default)]
    pub continuation_on_retry_exhaustion: bool,
}

impl TreeAction {
    /// A minimal action referencing `name` in the registry.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            action: name.into(),
            ..Self::default()
        }
    }

    /// The policy to drive retries with; defaults to [`RetryKind::None`].
    #[must_use]
    pub fn retry_policy_or_default(&self) -> RetryPolicy {
        self.retry_policy.unwrap_or_default()
    }
}

/// One entry of a node's ordered child-selection list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildSelector {
    /// Boolean guard expression. Empty or absent means "always".
    #[serde(default)]
    pub should_select: Option<String>,
    /// Successor node key when the guard holds.
    pub child: String,
}

impl ChildSelector {
    /// Returns `true` if the guard is absent or blank (an unconditional entry).
    #[must_use]
    pub fn is_unconditional(&self) -> bool {
        self.should_select
            .as_deref()
            .is_none_or(|s| s.trim().is_empty())
    }
}

/// One node of the tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    /// Per-node behavior.
    #[serde(rename = "type", default)]
    pub node_type: NodeType,
    /// Ordered actions, keyed by action key (unique within the node).
    #[serde(default)]
    pub actions: IndexMap<String, TreeAction>,
    /// Ordered child-selection entries. Empty means terminal.
    #[serde(default)]
    pub child_selector: Vec<ChildSelector>,
    /// Opaque mapping passed to callbacks after evaluation.
    #[serde(default)]
    pub properties: Option<serde_json::Value>,
    /// Node timeout in milliseconds, an integer or an expression; `-1` = infinite.
    #[serde(default)]
    pub timeout: Option<serde_json::Value>,
}

impl TreeNode {
    /// The node's leaf-summary action, when it is the node's *only* action
    /// and carries the reserved [`LEAF_SUMMARY_ACTION`] name.
    #[must_use]
    pub fn leaf_summary(&self) -> Option<(&str, &TreeAction)> {
        if self.actions.len() != 1 {
            return None;
        }
        let (key, action) = self.actions.first()?;
        (action.action == LEAF_SUMMARY_ACTION).then_some((key.as_str(), action))
    }
}

/// A parsed schema: node key → node definition.
///
/// Immutable for the duration of a session. Node keys are unique by
/// construction (map shape).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ForgeTree {
    nodes: HashMap<String, TreeNode>,
}

impl ForgeTree {
    /// An empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a node by key.
    #[must_use]
    pub fn get(&self, node_key: &str) -> Option<&TreeNode> {
        self.nodes.get(node_key)
    }

    /// Returns `true` if `node_key` exists in the tree.
    #[must_use]
    pub fn contains(&self, node_key: &str) -> bool {
        self.nodes.contains_key(node_key)
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the tree has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over all `(node key, node)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TreeNode)> {
        self.nodes.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, TreeNode)> for ForgeTree {
    fn from_iter<I: IntoIterator<Item = (String, TreeNode)>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}
