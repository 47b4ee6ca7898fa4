//! Action execution: per-node fan-out, retries, single invocations.
//!
//! Two independent timeout races compose here. The node-level race wraps
//! the whole fan-out of one node's action tasks; the action-level timer
//! starts when an action's retry controller begins and both bounds the
//! retry sleeps and races each individual invocation.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, warn};

use forge_action::{ActionContext, ActionDefinition, ActionError, ActionResponse};
use forge_core::keys;
use forge_schema::{RetryKind, TreeAction, TreeNode};

use crate::error::WalkError;
use crate::session::SessionInner;

async fn sleep_or_forever(timeout_ms: i64) {
    if timeout_ms < 0 {
        std::future::pending::<()>().await;
    } else {
        tokio::time::sleep(Duration::from_millis(timeout_ms as u64)).await;
    }
}

async fn sleep_until_or_forever(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

impl SessionInner {
    /// Run one Action node's fan-out to completion.
    ///
    /// Actions whose response is already committed are skipped without
    /// re-execution (repairing the last-action key if a crash left it
    /// behind); the rest run concurrently as sibling tasks, raced against
    /// the node timeout. Dropping the `JoinSet` on any exit path aborts
    /// stragglers along with the timer.
    pub(crate) async fn run_actions(
        self: Arc<Self>,
        node_key: &str,
        node: &TreeNode,
    ) -> Result<(), WalkError> {
        let mut tasks: JoinSet<Result<(), WalkError>> = JoinSet::new();

        for (action_key, action) in &node.actions {
            if self
                .read_state_opt(&keys::response_key(action_key))
                .await
                .is_some()
            {
                debug!(node = %node_key, action = %action_key, "response already committed; skipping");
                if self.read_state_opt(keys::LAST_ACTION).await.is_none() {
                    self.state
                        .set(keys::LAST_ACTION, Value::String(action_key.clone()))
                        .await?;
                }
                continue;
            }

            let Some(definition) = self.registry.get(&action.action) else {
                debug!(node = %node_key, action = %action.action, "action not registered; skipping");
                continue;
            };

            let definition = definition.clone();
            let session = Arc::clone(&self);
            let node_key = node_key.to_owned();
            let action_key = action_key.clone();
            let action = action.clone();
            tasks.spawn(async move {
                session
                    .run_action_with_retry(&node_key, &action_key, &action, &definition)
                    .await
            });
        }

        if tasks.is_empty() {
            return Ok(());
        }

        let node_timeout = self.evaluate_timeout(node.timeout.as_ref()).await?;
        let node_deadline = sleep_or_forever(node_timeout);
        tokio::pin!(node_deadline);

        loop {
            tokio::select! {
                () = &mut node_deadline => {
                    return Err(if self.cancellation.is_cancelled() {
                        WalkError::Cancelled
                    } else {
                        WalkError::NodeTimeout { node_key: node_key.to_owned() }
                    });
                }
                () = self.cancellation.cancelled() => return Err(WalkError::Cancelled),
                joined = tasks.join_next() => match joined {
                    None => return Ok(()),
                    Some(Ok(Ok(()))) => {
                        if self.cancellation.is_cancelled() {
                            return Err(WalkError::Cancelled);
                        }
                    }
                    Some(Ok(Err(error))) => return Err(error),
                    Some(Err(join_error)) => return Err(WalkError::Join(join_error.to_string())),
                }
            }
        }
    }

    /// Drive one action under its retry policy and timeout budget.
    async fn run_action_with_retry(
        &self,
        node_key: &str,
        action_key: &str,
        action: &TreeAction,
        definition: &ActionDefinition,
    ) -> Result<(), WalkError> {
        let timeout_ms = self.evaluate_timeout(action.timeout.as_ref()).await?;
        let deadline =
            (timeout_ms >= 0).then(|| Instant::now() + Duration::from_millis(timeout_ms as u64));
        let policy = action.retry_policy_or_default();
        let mut retries: u32 = 0;
        let mut previous_wait = Duration::from_millis(policy.min_backoff_ms);
        let mut last_failure: Option<ActionError> = None;

        loop {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                break;
            }
            if self.cancellation.is_cancelled() {
                return Err(WalkError::Cancelled);
            }

            match self
                .invoke_action(
                    node_key,
                    action_key,
                    action,
                    definition,
                    deadline,
                    retries,
                    policy.kind,
                )
                .await
            {
                Ok(()) => return Ok(()),
                Err(WalkError::Action { source, .. }) => {
                    last_failure = Some(source);

                    let wait = match policy.kind {
                        RetryKind::FixedInterval => Duration::from_millis(policy.min_backoff_ms),
                        RetryKind::ExponentialBackoff => {
                            let doubled = previous_wait.saturating_mul(2);
                            let capped = doubled.min(Duration::from_millis(policy.max_backoff_ms));
                            previous_wait = capped;
                            capped
                        }
                        RetryKind::None => {
                            if action.continuation_on_retry_exhaustion {
                                self.commit_response(action_key, &ActionResponse::retry_exhausted())
                                    .await?;
                                return Ok(());
                            }
                            break;
                        }
                    };

                    if let Some(d) = deadline
                        && Instant::now() + wait >= d
                    {
                        // The next retry would overrun the action budget.
                        if action.continuation_on_timeout {
                            self.commit_response(action_key, &ActionResponse::timeout())
                                .await?;
                            return Ok(());
                        }
                        break;
                    }

                    warn!(
                        node = %node_key,
                        action = %action_key,
                        retries,
                        wait_ms = wait.as_millis() as u64,
                        "action failed; retrying after backoff"
                    );
                    tokio::select! {
                        () = tokio::time::sleep(wait) => {}
                        () = self.cancellation.cancelled() => return Err(WalkError::Cancelled),
                    }
                    retries += 1;
                }
                // Cancellation, action timeouts, and evaluation failures
                // are not retriable.
                Err(other) => return Err(other),
            }
        }

        Err(WalkError::ActionTimeout {
            node_key: node_key.to_owned(),
            action_key: action_key.to_owned(),
            action_name: action.action.clone(),
            retries,
            policy: policy.kind,
            source: last_failure,
        })
    }

    /// One invocation: materialize the context, run the handler, race the
    /// shared action deadline.
    #[allow(clippy::too_many_arguments)]
    async fn invoke_action(
        &self,
        node_key: &str,
        action_key: &str,
        action: &TreeAction,
        definition: &ActionDefinition,
        deadline: Option<Instant>,
        retries: u32,
        policy: RetryKind,
    ) -> Result<(), WalkError> {
        // With a continuation the timeout must be able to stop the
        // in-flight invocation without stopping the walk, so the action
        // gets its own child token; otherwise it shares the walker's.
        let token = if action.continuation_on_timeout {
            self.cancellation.child_token()
        } else {
            self.cancellation.clone()
        };

        let input = match &action.input {
            Some(value) => {
                self.evaluate(value.clone(), definition.input_type.clone())
                    .await?
            }
            None => Value::Null,
        };
        let properties = match &action.properties {
            Some(value) => self.evaluate(value.clone(), None).await?,
            None => Value::Null,
        };

        let mut context = ActionContext::new(
            self.session_id,
            node_key,
            action_key,
            &action.action,
            Arc::clone(&self.state),
        )
        .with_input(input)
        .with_properties(properties)
        .with_cancellation(token.clone());
        if let Some(user_context) = &self.user_context {
            context = context.with_user_context(Arc::clone(user_context));
        }

        debug!(node = %node_key, action = %action_key, name = %action.action, "invoking action");
        let run = definition.handler.run(context);
        tokio::pin!(run);
        let action_deadline = sleep_until_or_forever(deadline);
        tokio::pin!(action_deadline);

        tokio::select! {
            result = &mut run => match result {
                Ok(response) => {
                    self.commit_response(action_key, &response).await?;
                    Ok(())
                }
                Err(ActionError::Cancelled) => Err(WalkError::Cancelled),
                Err(source) => Err(WalkError::Action {
                    node_key: node_key.to_owned(),
                    action_key: action_key.to_owned(),
                    source,
                }),
            },
            () = &mut action_deadline => {
                if self.cancellation.is_cancelled() {
                    Err(WalkError::Cancelled)
                } else if action.continuation_on_timeout {
                    // Ask the in-flight invocation to stop; the walk moves
                    // on with the synthetic response.
                    token.cancel();
                    self.commit_response(action_key, &ActionResponse::timeout()).await?;
                    Ok(())
                } else {
                    Err(WalkError::ActionTimeout {
                        node_key: node_key.to_owned(),
                        action_key: action_key.to_owned(),
                        action_name: action.action.clone(),
                        retries,
                        policy,
                        source: None,
                    })
                }
            },
            () = self.cancellation.cancelled() => Err(WalkError::Cancelled),
        }
    }

    /// Commit an action response: the response key first, then the
    /// last-action key, in that order.
    pub(crate) async fn commit_response(
        &self,
        action_key: &str,
        response: &ActionResponse,
    ) -> Result<(), WalkError> {
        let value = serde_json::to_value(response)?;
        self.state.set(&keys::response_key(action_key), value).await?;
        self.state
            .set(keys::LAST_ACTION, Value::String(action_key.to_owned()))
            .await?;
        debug!(action = %action_key, status = %response.status, "committed action response");
        Ok(())
    }
}
