#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Forge Schema
//!
//! The declarative decision-tree model driving a Forge walk.
//!
//! A [`ForgeTree`] maps node keys to [`TreeNode`]s; each node may carry
//! ordered [`TreeAction`]s, ordered [`ChildSelector`]s, opaque properties,
//! and a timeout. Schema values are plain [`serde_json::Value`]s; strings
//! inside them may embed expressions that the engine resolves at walk time.
//!
//! [`TypeHint`] and [`TypeDescriptor`] describe the *target type* of such a
//! resolution: the primitive an expression should produce, or the field
//! shape an object input should materialize into.

pub mod tree;
pub mod value;

pub use tree::{
    ChildSelector, ForgeTree, LEAF_SUMMARY_ACTION, NodeType, RetryKind, RetryPolicy, TreeAction,
    TreeNode,
};
pub use value::{CoerceError, TypeDescriptor, TypeHint, coerce};
