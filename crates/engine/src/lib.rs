#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Forge Engine
//!
//! The tree-walking session driver of the Forge workflow engine.
//!
//! A [`TreeSession`] walks a declarative decision tree
//! ([`forge_schema::ForgeTree`]) to completion: it visits nodes one at a
//! time, runs the actions of Action-type nodes concurrently under composed
//! node-level and action-level timeouts, selects successors by evaluating
//! guard expressions, and commits progress through the state capability so
//! a crashed walk resumes without re-running completed actions.
//!
//! The engine delegates at well-defined ports: expressions compile through
//! an injected [`ExpressionExecutor`], prefix-matched strings through
//! [`ExternalExecutor`]s, and hosts observe every visit through
//! [`WalkCallbacks`]. One cancellation token flows through the whole walk.
//!
//! ```rust,ignore
//! let session = TreeSession::builder(tree, state)
//!     .with_registry(registry)
//!     .with_expression_executor(expressions)
//!     .build();
//! let status = session.walk_tree("Root").await?;
//! ```

pub mod callbacks;
pub mod error;
pub mod expression;
pub mod external;
pub mod session;
pub mod status;

mod evaluator;
mod executor;
mod walker;

pub use callbacks::{NodeVisit, NoopCallbacks, WalkCallbacks};
pub use error::{BoxError, EvaluateError, WalkError};
pub use expression::{EXPRESSION_TAG, ExpressionExecutor, ExpressionRef, SessionView, parse_expression};
pub use external::ExternalExecutor;
pub use session::{SessionBuilder, TreeSession};
pub use status::WalkStatus;
