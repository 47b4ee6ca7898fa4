//! The walk driver: visit loop, node dispatch, child selection.

use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use forge_core::keys;
use forge_schema::{NodeType, TreeNode, TypeHint};

use crate::callbacks::NodeVisit;
use crate::error::{EvaluateError, WalkError};
use crate::session::SessionInner;

impl SessionInner {
    /// The visit loop. Status bookkeeping lives in the caller.
    pub(crate) async fn run_walk(self: Arc<Self>, start_key: &str) -> Result<(), WalkError> {
        let mut current = start_key.to_owned();

        while !current.is_empty() {
            // Progress is committed before the host hears about the node,
            // so a crash between the two resumes at this node.
            self.state
                .set(keys::CURRENT_NODE, Value::String(current.clone()))
                .await?;

            if self.cancellation.is_cancelled() {
                return Err(WalkError::Cancelled);
            }

            let node = self
                .tree
                .get(&current)
                .ok_or_else(|| WalkError::NodeNotFound {
                    node_key: current.clone(),
                })?
                .clone();

            let properties = self
                .evaluate(node.properties.clone().unwrap_or(Value::Null), None)
                .await?;

            let visit = NodeVisit {
                session_id: self.session_id,
                node_key: &current,
                properties: &properties,
                user_context: self.user_context.as_ref(),
                cancellation: &self.cancellation,
            };

            self.callbacks
                .before_visit_node(&visit)
                .await
                .map_err(WalkError::Callback)?;

            debug!(node = %current, node_type = ?node.node_type, "visiting node");
            let visited = Arc::clone(&self).visit_node(&current, &node).await;

            // The after hook runs whether the visit succeeded or not; its
            // failure takes precedence over the visit outcome.
            self.callbacks
                .after_visit_node(&visit)
                .await
                .map_err(WalkError::Callback)?;

            current = visited?;
        }

        Ok(())
    }

    /// Per-node behavior dispatch. Returns the successor key, empty for
    /// terminal nodes.
    async fn visit_node(
        self: Arc<Self>,
        node_key: &str,
        node: &TreeNode,
    ) -> Result<String, WalkError> {
        match node.node_type {
            NodeType::Leaf => {
                if let Some((action_key, action)) = node.leaf_summary() {
                    // The summary's input *is* the response; nothing runs.
                    let input = action.input.clone().unwrap_or(Value::Null);
                    let evaluated = self.evaluate(input, Some(TypeHint::Response)).await?;
                    let response = serde_json::from_value(evaluated.clone()).map_err(|e| {
                        WalkError::Evaluate(EvaluateError::new(
                            &evaluated,
                            Some(TypeHint::Response.name()),
                            e,
                        ))
                    })?;
                    self.commit_response(action_key, &response).await?;
                }
                Ok(String::new())
            }
            NodeType::Action => {
                Arc::clone(&self).run_actions(node_key, node).await?;
                self.select_child(node_key, node).await
            }
            NodeType::Selection => self.select_child(node_key, node).await,
        }
    }

    /// Pick the successor by walking the selectors in schema order.
    async fn select_child(&self, node_key: &str, node: &TreeNode) -> Result<String, WalkError> {
        if node.child_selector.is_empty() {
            return Ok(String::new());
        }

        for selector in &node.child_selector {
            if selector.is_unconditional() {
                if !selector.child.is_empty() {
                    return Ok(selector.child.clone());
                }
                continue;
            }

            let guard = selector.should_select.clone().unwrap_or_default();
            let decision = self
                .evaluate(Value::String(guard), Some(TypeHint::Bool))
                .await?;
            if decision == Value::Bool(true) {
                debug!(node = %node_key, child = %selector.child, "selector matched");
                return Ok(selector.child.clone());
            }
        }

        Err(WalkError::NoChildMatched {
            node_key: node_key.to_owned(),
        })
    }
}
