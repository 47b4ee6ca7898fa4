//! Prefix-matched external executors.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::BoxError;

/// A plug-in that transforms a schema string into a value without invoking
/// the expression compiler.
///
/// Registered against a string prefix at session construction; when a
/// schema string starts with that prefix, the evaluator hands the executor
/// the remainder along with the walker's cancellation token.
#[async_trait]
pub trait ExternalExecutor: Send + Sync {
    /// Produce a value from the prefix-stripped payload.
    async fn execute(
        &self,
        payload: &str,
        token: &CancellationToken,
    ) -> Result<serde_json::Value, BoxError>;
}
