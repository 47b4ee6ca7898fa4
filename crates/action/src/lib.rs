#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Forge Action
//!
//! The action capability of the Forge workflow engine: the [`Action`] trait
//! hosts implement, the [`ActionContext`] each invocation receives, the
//! [`ActionResponse`] envelope invocations produce, and the
//! [`ActionRegistry`] the engine resolves schema action names through.
//!
//! Actions are external code. The engine shares no mutable state with them
//! beyond the state capability on their context, and asks them to stop only
//! through the cancellation token they are handed.

pub mod context;
pub mod error;
pub mod registry;
pub mod response;

pub use context::ActionContext;
pub use error::ActionError;
pub use registry::{ActionDefinition, ActionRegistry};
pub use response::{ActionResponse, STATUS_RETRY_EXHAUSTED, STATUS_TIMEOUT};

use async_trait::async_trait;

/// A host-supplied unit of work attached to an Action-type node.
///
/// # Object Safety
///
/// This trait is object-safe; the engine stores actions as
/// `Arc<dyn Action>` in the registry and invokes them concurrently, so
/// implementations must be `Send + Sync`.
///
/// Long-running implementations **must** periodically call
/// [`ActionContext::check_cancelled`] (or select on the context's token)
/// so cancellation is observable in bounded time.
#[async_trait]
pub trait Action: Send + Sync + 'static {
    /// Run the action to a terminal outcome.
    async fn run(&self, ctx: ActionContext) -> Result<ActionResponse, ActionError>;
}
