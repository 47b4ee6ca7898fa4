#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Forge Core
//!
//! Core types and capabilities for the Forge workflow engine.
//! This crate provides the fundamental building blocks used by all other
//! Forge crates.
//!
//! ## Key Components
//!
//! - **Identifiers**: [`SessionId`], the identity of one tree-walking session
//! - **State-key protocol**: the durable key suffixes a session commits
//!   progress under ([`keys`])
//! - **State capability**: the [`StateStore`] port sessions persist through,
//!   plus the [`MemoryState`] in-memory implementation

pub mod id;
pub mod keys;
pub mod state;

pub use id::SessionId;
pub use state::{MemoryState, StateError, StateStore};

use std::any::Any;
use std::sync::Arc;

/// Opaque host value threaded through callbacks and action contexts.
///
/// The engine never inspects it; hosts downcast on their side:
///
/// ```rust
/// use std::sync::Arc;
/// use forge_core::UserContext;
///
/// struct HostState { tenant: String }
///
/// let ctx: UserContext = Arc::new(HostState { tenant: "acme".into() });
/// let host = ctx.downcast_ref::<HostState>().unwrap();
/// assert_eq!(host.tenant, "acme");
/// ```
pub type UserContext = Arc<dyn Any + Send + Sync>;
