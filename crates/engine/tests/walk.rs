//! End-to-end walks over small schemas: linear runs, branching, timeouts,
//! retries, rehydration, and cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tracing_test::traced_test;

use forge_action::{Action, ActionContext, ActionError, ActionRegistry, ActionResponse};
use forge_core::{MemoryState, StateStore};
use forge_engine::{
    BoxError, ExpressionExecutor, NodeVisit, SessionView, TreeSession, WalkCallbacks, WalkError,
    WalkStatus,
};
use forge_schema::{ForgeTree, TypeHint};

// -- Test fixtures --

/// Evaluates `true` / `false` / integer literals; everything else echoes
/// back as a string.
struct LiteralExpressions;

#[async_trait]
impl ExpressionExecutor for LiteralExpressions {
    async fn execute(
        &self,
        source: &str,
        _hint: Option<&TypeHint>,
        _session: &dyn SessionView,
    ) -> Result<Value, BoxError> {
        Ok(match source.trim() {
            "true" => json!(true),
            "false" => json!(false),
            other => other
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| json!(other)),
        })
    }
}

/// Completes immediately, echoing its action key and counting invocations.
#[derive(Default)]
struct EchoAction {
    invocations: AtomicU32,
}

#[async_trait]
impl Action for EchoAction {
    async fn run(&self, ctx: ActionContext) -> Result<ActionResponse, ActionError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        Ok(ActionResponse::with_status("Done").with_field("key", json!(ctx.action_key)))
    }
}

/// Sleeps for the number of milliseconds in its input before completing.
struct SleepAction;

#[async_trait]
impl Action for SleepAction {
    async fn run(&self, ctx: ActionContext) -> Result<ActionResponse, ActionError> {
        let ms = ctx.input.get("ms").and_then(Value::as_u64).unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Ok(ActionResponse::with_status("Done"))
    }
}

/// Never completes on its own; only the cancellation token ends it.
struct StuckAction;

#[async_trait]
impl Action for StuckAction {
    async fn run(&self, ctx: ActionContext) -> Result<ActionResponse, ActionError> {
        ctx.cancellation.cancelled().await;
        Err(ActionError::Cancelled)
    }
}

/// Fails the first `failures` invocations, then succeeds.
struct FlakyAction {
    failures: u32,
    invocations: AtomicU32,
}

impl FlakyAction {
    fn new(failures: u32) -> Self {
        Self {
            failures,
            invocations: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl Action for FlakyAction {
    async fn run(&self, _ctx: ActionContext) -> Result<ActionResponse, ActionError> {
        let attempt = self.invocations.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failures {
            Err(ActionError::failed("transient failure"))
        } else {
            Ok(ActionResponse::with_status("Done").with_field("attempt", json!(attempt)))
        }
    }
}

/// Records every before/after pair for callback-ordering assertions.
#[derive(Default)]
struct RecordingCallbacks {
    events: std::sync::Mutex<Vec<(String, String)>>,
}

impl RecordingCallbacks {
    fn events(&self) -> Vec<(String, String)> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl WalkCallbacks for RecordingCallbacks {
    async fn before_visit_node(&self, visit: &NodeVisit<'_>) -> Result<(), BoxError> {
        self.events
            .lock()
            .unwrap()
            .push(("before".into(), visit.node_key.into()));
        Ok(())
    }

    async fn after_visit_node(&self, visit: &NodeVisit<'_>) -> Result<(), BoxError> {
        self.events
            .lock()
            .unwrap()
            .push(("after".into(), visit.node_key.into()));
        Ok(())
    }
}

fn tree(value: Value) -> ForgeTree {
    serde_json::from_value(value).expect("valid schema")
}

fn session(schema: Value, registry: ActionRegistry, state: Arc<MemoryState>) -> TreeSession {
    TreeSession::builder(tree(schema), state)
        .with_registry(registry)
        .with_expression_executor(Arc::new(LiteralExpressions))
        .build()
}

async fn state_str(state: &MemoryState, key: &str) -> Option<String> {
    state
        .get(key)
        .await
        .unwrap()
        .and_then(|v| v.as_str().map(str::to_owned))
}

// -- End-to-end scenarios --

#[tokio::test]
async fn linear_walk_commits_response_and_progress() {
    let echo = Arc::new(EchoAction::default());
    let mut registry = ActionRegistry::new();
    registry.register("Noop", echo.clone());

    let state = Arc::new(MemoryState::new());
    let session = session(
        json!({
            "Root": {
                "type": "Action",
                "actions": { "A1": { "action": "Noop" } },
                "childSelector": [ { "shouldSelect": "", "child": "End" } ]
            },
            "End": { "type": "Leaf" }
        }),
        registry,
        state.clone(),
    );

    let status = session.walk_tree("Root").await.unwrap();
    assert_eq!(status, WalkStatus::RanToCompletion);
    assert_eq!(session.status(), WalkStatus::RanToCompletion);

    let response = session.output("A1").await.unwrap();
    assert_eq!(response.status, "Done");
    assert_eq!(response.field("key"), Some(&json!("A1")));

    assert_eq!(state_str(&state, "LTA").await.as_deref(), Some("A1"));
    assert_eq!(state_str(&state, "CTN").await.as_deref(), Some("End"));
    assert_eq!(echo.invocations.load(Ordering::SeqCst), 1);

    let (node_key, node) = session.current_tree_node().await.unwrap();
    assert_eq!(node_key, "End");
    assert!(node.actions.is_empty());

    let last = session.last_action_response().await.unwrap();
    assert_eq!(last.status, "Done");
    assert_eq!(session.last_tree_action().await.unwrap().action, "Noop");
}

#[tokio::test]
async fn expression_gated_branch_takes_fallthrough_child() {
    let state = Arc::new(MemoryState::new());
    let session = session(
        json!({
            "Root": {
                "childSelector": [
                    { "shouldSelect": "C#<Boolean>|false", "child": "A" },
                    { "shouldSelect": "", "child": "B" }
                ]
            },
            "A": { "type": "Leaf" },
            "B": { "type": "Leaf" }
        }),
        ActionRegistry::new(),
        state.clone(),
    );

    let status = session.walk_tree("Root").await.unwrap();
    assert_eq!(status, WalkStatus::RanToCompletion);
    assert_eq!(state_str(&state, "CTN").await.as_deref(), Some("B"));
}

#[tokio::test]
async fn expression_gated_branch_takes_true_guard() {
    let state = Arc::new(MemoryState::new());
    let session = session(
        json!({
            "Root": {
                "childSelector": [
                    { "shouldSelect": "C#<Boolean>|true", "child": "A" },
                    { "shouldSelect": "", "child": "B" }
                ]
            },
            "A": { "type": "Leaf" },
            "B": { "type": "Leaf" }
        }),
        ActionRegistry::new(),
        state.clone(),
    );

    session.walk_tree("Root").await.unwrap();
    assert_eq!(state_str(&state, "CTN").await.as_deref(), Some("A"));
}

#[tokio::test]
async fn no_child_matched_is_successful_completion() {
    let session = session(
        json!({
            "Root": {
                "childSelector": [ { "shouldSelect": "C#<Boolean>|false", "child": "A" } ]
            },
            "A": { "type": "Leaf" }
        }),
        ActionRegistry::new(),
        Arc::new(MemoryState::new()),
    );

    let status = session.walk_tree("Root").await.unwrap();
    assert_eq!(status, WalkStatus::RanToCompletionNoChildMatched);
    assert_eq!(session.status(), WalkStatus::RanToCompletionNoChildMatched);
    assert!(session.status().is_success());
}

#[tokio::test(start_paused = true)]
async fn action_timeout_with_continuation_commits_synthetic_response() {
    let mut registry = ActionRegistry::new();
    registry.register("Slow", Arc::new(SleepAction));

    let session = session(
        json!({
            "Root": {
                "type": "Action",
                "actions": {
                    "A1": {
                        "action": "Slow",
                        "input": { "ms": 500 },
                        "timeout": 100,
                        "continuationOnTimeout": true
                    }
                },
                "childSelector": [ { "shouldSelect": "", "child": "End" } ]
            },
            "End": { "type": "Leaf" }
        }),
        registry,
        Arc::new(MemoryState::new()),
    );

    let status = session.walk_tree("Root").await.unwrap();
    assert_eq!(status, WalkStatus::RanToCompletion);

    let response = session.output("A1").await.unwrap();
    assert_eq!(response.status, "TimeoutOnAction");
    assert!(response.is_synthetic());
}

#[tokio::test(start_paused = true)]
async fn action_timeout_without_continuation_fails_the_walk() {
    let mut registry = ActionRegistry::new();
    registry.register("Slow", Arc::new(SleepAction));

    let session = session(
        json!({
            "Root": {
                "type": "Action",
                "actions": {
                    "A1": { "action": "Slow", "input": { "ms": 500 }, "timeout": 100 }
                }
            }
        }),
        registry,
        Arc::new(MemoryState::new()),
    );

    let err = session.walk_tree("Root").await.unwrap_err();
    assert!(matches!(err, WalkError::ActionTimeout { .. }));
    assert_eq!(session.status(), WalkStatus::TimeoutOnAction);
    // No response was committed for the timed-out action.
    assert!(session.output("A1").await.is_none());
}

#[tokio::test(start_paused = true)]
#[traced_test]
async fn fixed_interval_retry_recovers_after_transient_failures() {
    let flaky = Arc::new(FlakyAction::new(2));
    let mut registry = ActionRegistry::new();
    registry.register("Flaky", flaky.clone());

    let session = session(
        json!({
            "Root": {
                "type": "Action",
                "actions": {
                    "A1": {
                        "action": "Flaky",
                        "timeout": 1000,
                        "retryPolicy": { "type": "FixedInterval", "minBackoffMs": 10 }
                    }
                },
                "childSelector": [ { "shouldSelect": "", "child": "End" } ]
            },
            "End": { "type": "Leaf" }
        }),
        registry,
        Arc::new(MemoryState::new()),
    );

    let status = session.walk_tree("Root").await.unwrap();
    assert_eq!(status, WalkStatus::RanToCompletion);

    let response = session.output("A1").await.unwrap();
    assert_eq!(response.status, "Done");
    assert_eq!(response.field("attempt"), Some(&json!(2)));
    assert_eq!(flaky.invocations.load(Ordering::SeqCst), 3);

    // Both failed attempts slept through the backoff.
    assert!(logs_contain("retrying after backoff"));
}

#[tokio::test(start_paused = true)]
async fn exponential_backoff_retries_within_budget() {
    let flaky = Arc::new(FlakyAction::new(3));
    let mut registry = ActionRegistry::new();
    registry.register("Flaky", flaky.clone());

    let session = session(
        json!({
            "Root": {
                "type": "Action",
                "actions": {
                    "A1": {
                        "action": "Flaky",
                        "timeout": 5000,
                        "retryPolicy": {
                            "type": "ExponentialBackoff",
                            "minBackoffMs": 10,
                            "maxBackoffMs": 30
                        }
                    }
                }
            }
        }),
        registry,
        Arc::new(MemoryState::new()),
    );

    let status = session.walk_tree("Root").await.unwrap();
    assert_eq!(status, WalkStatus::RanToCompletion);
    // 3 failures then success: waits 20, 30 (capped), 30 (capped).
    assert_eq!(flaky.invocations.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn retry_exhaustion_with_continuation_commits_synthetic_response() {
    let mut registry = ActionRegistry::new();
    registry.register("Flaky", Arc::new(FlakyAction::new(u32::MAX)));

    let session = session(
        json!({
            "Root": {
                "type": "Action",
                "actions": {
                    "A1": {
                        "action": "Flaky",
                        "continuationOnRetryExhaustion": true
                    }
                },
                "childSelector": [ { "shouldSelect": "", "child": "End" } ]
            },
            "End": { "type": "Leaf" }
        }),
        registry,
        Arc::new(MemoryState::new()),
    );

    let status = session.walk_tree("Root").await.unwrap();
    assert_eq!(status, WalkStatus::RanToCompletion);
    assert_eq!(
        session.output("A1").await.unwrap().status,
        "RetryExhaustedOnAction"
    );
}

#[tokio::test]
async fn retry_exhaustion_without_continuation_raises_action_timeout() {
    let mut registry = ActionRegistry::new();
    registry.register("Flaky", Arc::new(FlakyAction::new(u32::MAX)));

    let session = session(
        json!({
            "Root": {
                "type": "Action",
                "actions": { "A1": { "action": "Flaky" } }
            }
        }),
        registry,
        Arc::new(MemoryState::new()),
    );

    let err = session.walk_tree("Root").await.unwrap_err();
    match err {
        WalkError::ActionTimeout {
            node_key,
            action_key,
            action_name,
            retries,
            source,
            ..
        } => {
            assert_eq!(node_key, "Root");
            assert_eq!(action_key, "A1");
            assert_eq!(action_name, "Flaky");
            assert_eq!(retries, 0);
            assert!(source.is_some());
        }
        other => panic!("expected ActionTimeout, got {other:?}"),
    }
    assert_eq!(session.status(), WalkStatus::TimeoutOnAction);
}

#[tokio::test]
async fn rehydration_skips_completed_action_and_repairs_last_action() {
    let echo = Arc::new(EchoAction::default());
    let mut registry = ActionRegistry::new();
    registry.register("Noop", echo.clone());

    // A previous attempt committed the response but crashed before the
    // last-action key was written.
    let state = Arc::new(MemoryState::new());
    state.insert("A1_AR", json!({"status": "Done"}));

    let session = session(
        json!({
            "Root": {
                "type": "Action",
                "actions": { "A1": { "action": "Noop" } },
                "childSelector": [ { "shouldSelect": "", "child": "End" } ]
            },
            "End": { "type": "Leaf" }
        }),
        registry,
        state.clone(),
    );

    let status = session.walk_tree("Root").await.unwrap();
    assert_eq!(status, WalkStatus::RanToCompletion);
    // The completed action did not run again.
    assert_eq!(echo.invocations.load(Ordering::SeqCst), 0);
    // The last-action key was repaired.
    assert_eq!(state_str(&state, "LTA").await.as_deref(), Some("A1"));
}

#[tokio::test]
async fn rerunning_a_fully_committed_walk_is_a_noop() {
    let echo = Arc::new(EchoAction::default());
    let schema = json!({
        "Root": {
            "type": "Action",
            "actions": { "A1": { "action": "Noop" } },
            "childSelector": [ { "shouldSelect": "", "child": "End" } ]
        },
        "End": { "type": "Leaf" }
    });
    let state = Arc::new(MemoryState::new());

    let mut registry = ActionRegistry::new();
    registry.register("Noop", echo.clone());
    let first = session(schema.clone(), registry, state.clone());
    first.walk_tree("Root").await.unwrap();
    assert_eq!(echo.invocations.load(Ordering::SeqCst), 1);

    // A fresh session over the same state walks to completion without
    // re-invoking anything.
    let mut registry = ActionRegistry::new();
    registry.register("Noop", echo.clone());
    let second = session(schema, registry, state);
    let status = second.walk_tree("Root").await.unwrap();
    assert_eq!(status, WalkStatus::RanToCompletion);
    assert_eq!(echo.invocations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn leaf_summary_input_becomes_the_response() {
    let state = Arc::new(MemoryState::new());
    let session = session(
        json!({
            "End": {
                "type": "Leaf",
                "actions": {
                    "Summary": {
                        "action": "LeafNodeSummaryAction",
                        "input": { "status": "Done", "rows": 3 }
                    }
                }
            }
        }),
        ActionRegistry::new(),
        state.clone(),
    );

    let status = session.walk_tree("End").await.unwrap();
    assert_eq!(status, WalkStatus::RanToCompletion);

    let response = session.output("Summary").await.unwrap();
    assert_eq!(response.status, "Done");
    assert_eq!(response.field("rows"), Some(&json!(3)));
    assert_eq!(state_str(&state, "LTA").await.as_deref(), Some("Summary"));
}

// -- Timeouts and cancellation --

#[tokio::test(start_paused = true)]
async fn node_timeout_raises_timeout_on_node() {
    let mut registry = ActionRegistry::new();
    registry.register("Stuck", Arc::new(StuckAction));

    let session = session(
        json!({
            "Root": {
                "type": "Action",
                "timeout": 100,
                "actions": { "A1": { "action": "Stuck", "continuationOnTimeout": true } }
            }
        }),
        registry,
        Arc::new(MemoryState::new()),
    );

    let err = session.walk_tree("Root").await.unwrap_err();
    assert!(matches!(err, WalkError::NodeTimeout { .. }));
    assert_eq!(session.status(), WalkStatus::TimeoutOnNode);
}

#[tokio::test(start_paused = true)]
async fn infinite_timeouts_disable_both_timers() {
    let mut registry = ActionRegistry::new();
    registry.register("Slow", Arc::new(SleepAction));

    let session = session(
        json!({
            "Root": {
                "type": "Action",
                "timeout": -1,
                "actions": {
                    "A1": { "action": "Slow", "input": { "ms": 60_000 }, "timeout": -1 }
                }
            }
        }),
        registry,
        Arc::new(MemoryState::new()),
    );

    let status = session.walk_tree("Root").await.unwrap();
    assert_eq!(status, WalkStatus::RanToCompletion);
    assert_eq!(session.output("A1").await.unwrap().status, "Done");
}

#[tokio::test]
async fn cancellation_before_the_walk_starts() {
    let token = CancellationToken::new();
    token.cancel();

    let session = TreeSession::builder(
        tree(json!({ "Root": { "type": "Leaf" } })),
        Arc::new(MemoryState::new()),
    )
    .with_cancellation(token)
    .build();

    let err = session.walk_tree("Root").await.unwrap_err();
    assert!(matches!(err, WalkError::Cancelled));
    assert_eq!(session.status(), WalkStatus::CancelledBeforeExecution);
}

#[tokio::test(start_paused = true)]
async fn external_cancellation_stops_a_stuck_walk() {
    let mut registry = ActionRegistry::new();
    registry.register("Stuck", Arc::new(StuckAction));

    let session = session(
        json!({
            "Root": {
                "type": "Action",
                "actions": { "A1": { "action": "Stuck" } }
            }
        }),
        registry,
        Arc::new(MemoryState::new()),
    );

    let walker = session.clone();
    let handle = tokio::spawn(async move { walker.walk_tree("Root").await });
    // Let the walk reach the action before cancelling.
    tokio::time::sleep(Duration::from_millis(10)).await;
    session.cancel_walk_tree();

    let err = handle.await.unwrap().unwrap_err();
    assert!(matches!(err, WalkError::Cancelled));
    assert_eq!(session.status(), WalkStatus::Cancelled);
}

// -- Driver behavior --

#[tokio::test]
async fn walker_is_single_use() {
    let session = session(
        json!({ "Root": { "type": "Leaf" } }),
        ActionRegistry::new(),
        Arc::new(MemoryState::new()),
    );

    session.walk_tree("Root").await.unwrap();
    let err = session.walk_tree("Root").await.unwrap_err();
    assert!(matches!(err, WalkError::AlreadyWalked));
    // The terminal status of the completed walk is untouched.
    assert_eq!(session.status(), WalkStatus::RanToCompletion);
}

#[tokio::test]
async fn callbacks_fire_in_pairs_for_every_visited_node() {
    let callbacks = Arc::new(RecordingCallbacks::default());
    let session = TreeSession::builder(
        tree(json!({
            "Root": { "childSelector": [ { "shouldSelect": "", "child": "Mid" } ] },
            "Mid": { "childSelector": [ { "shouldSelect": "", "child": "End" } ] },
            "End": { "type": "Leaf" }
        })),
        Arc::new(MemoryState::new()),
    )
    .with_callbacks(callbacks.clone())
    .build();

    session.walk_tree("Root").await.unwrap();

    let events = callbacks.events();
    assert_eq!(
        events,
        vec![
            ("before".to_owned(), "Root".to_owned()),
            ("after".to_owned(), "Root".to_owned()),
            ("before".to_owned(), "Mid".to_owned()),
            ("after".to_owned(), "Mid".to_owned()),
            ("before".to_owned(), "End".to_owned()),
            ("after".to_owned(), "End".to_owned()),
        ]
    );
}

#[tokio::test]
async fn after_callback_fires_even_when_the_visit_fails() {
    let callbacks = Arc::new(RecordingCallbacks::default());
    let mut registry = ActionRegistry::new();
    registry.register("Flaky", Arc::new(FlakyAction::new(u32::MAX)));

    let session = TreeSession::builder(
        tree(json!({
            "Root": {
                "type": "Action",
                "actions": { "A1": { "action": "Flaky" } }
            }
        })),
        Arc::new(MemoryState::new()),
    )
    .with_registry(registry)
    .with_callbacks(callbacks.clone())
    .build();

    session.walk_tree("Root").await.unwrap_err();

    let events = callbacks.events();
    let befores = events.iter().filter(|(phase, _)| phase == "before").count();
    let afters = events.iter().filter(|(phase, _)| phase == "after").count();
    assert_eq!(befores, afters);
}

#[tokio::test]
async fn failing_before_callback_fails_the_walk() {
    struct FailingCallbacks;

    #[async_trait]
    impl WalkCallbacks for FailingCallbacks {
        async fn before_visit_node(&self, _visit: &NodeVisit<'_>) -> Result<(), BoxError> {
            Err("host rejected the visit".into())
        }
    }

    let session = TreeSession::builder(
        tree(json!({ "Root": { "type": "Leaf" } })),
        Arc::new(MemoryState::new()),
    )
    .with_callbacks(Arc::new(FailingCallbacks))
    .build();

    let err = session.walk_tree("Root").await.unwrap_err();
    assert!(matches!(err, WalkError::Callback(_)));
    assert_eq!(session.status(), WalkStatus::Failed);
}

#[tokio::test]
async fn evaluator_failure_maps_to_its_own_status() {
    // Expressions without an executor configured cannot evaluate.
    let session = TreeSession::builder(
        tree(json!({
            "Root": { "type": "Leaf", "properties": { "flag": "C#<Boolean>|true" } }
        })),
        Arc::new(MemoryState::new()),
    )
    .build();

    let err = session.walk_tree("Root").await.unwrap_err();
    assert!(matches!(err, WalkError::Evaluate(_)));
    assert_eq!(session.status(), WalkStatus::FailedEvaluateDynamicProperty);
}

#[tokio::test]
async fn missing_start_node_fails_the_walk() {
    let session = session(
        json!({ "Root": { "type": "Leaf" } }),
        ActionRegistry::new(),
        Arc::new(MemoryState::new()),
    );

    let err = session.walk_tree("Elsewhere").await.unwrap_err();
    assert!(matches!(err, WalkError::NodeNotFound { .. }));
    assert_eq!(session.status(), WalkStatus::Failed);
}

#[tokio::test]
async fn unknown_action_names_are_skipped() {
    let state = Arc::new(MemoryState::new());
    let session = session(
        json!({
            "Root": {
                "type": "Action",
                "actions": { "A1": { "action": "NotRegistered" } }
            }
        }),
        ActionRegistry::new(),
        state.clone(),
    );

    let status = session.walk_tree("Root").await.unwrap();
    assert_eq!(status, WalkStatus::RanToCompletion);
    assert!(session.output("A1").await.is_none());
}

#[tokio::test]
async fn concurrent_actions_all_commit() {
    let echo = Arc::new(EchoAction::default());
    let mut registry = ActionRegistry::new();
    registry.register("Noop", echo.clone());

    let state = Arc::new(MemoryState::new());
    let session = session(
        json!({
            "Root": {
                "type": "Action",
                "actions": {
                    "A1": { "action": "Noop" },
                    "A2": { "action": "Noop" },
                    "A3": { "action": "Noop" }
                }
            }
        }),
        registry,
        state.clone(),
    );

    let status = session.walk_tree("Root").await.unwrap();
    assert_eq!(status, WalkStatus::RanToCompletion);
    assert_eq!(echo.invocations.load(Ordering::SeqCst), 3);

    for key in ["A1", "A2", "A3"] {
        assert_eq!(
            session.output(key).await.unwrap().field("key"),
            Some(&json!(key))
        );
    }
    // The last-action key points at whichever commit landed last.
    let last = state_str(&state, "LTA").await.unwrap();
    assert!(["A1", "A2", "A3"].contains(&last.as_str()));
}

#[tokio::test]
async fn actionless_selectorless_node_terminates_the_walk() {
    let session = session(
        json!({ "Root": {} }),
        ActionRegistry::new(),
        Arc::new(MemoryState::new()),
    );

    let status = session.walk_tree("Root").await.unwrap();
    assert_eq!(status, WalkStatus::RanToCompletion);
}
