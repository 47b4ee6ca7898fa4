//! Unique identifiers for Forge entities.
//!
//! Session identity uses a [`domain-key`](https://crates.io/crates/domain-key)
//! `Uuid<D>` wrapper: a `Copy`, 16-byte, stack-allocated UUID with a unique
//! domain marker so it cannot be confused with other UUID-typed values at
//! compile time.
//!
//! Supports `v4()` for random generation, `nil()` for the zero value,
//! `parse(&str)`, full serde support (serializes as a UUID string), and
//! `Display` / `FromStr` / `Eq` / `Ord` / `Hash`.

use domain_key::define_uuid;

// Re-export for downstream parse error handling
pub use domain_key::UuidParseError;

define_uuid!(pub SessionIdDomain => SessionId);
