//! The durable state-key protocol.
//!
//! A walking session commits its progress under a small set of well-known
//! keys. Namespacing by session is the storage capability's concern; the
//! engine only ever sees the suffixes defined here.
//!
//! Commit ordering is part of the protocol:
//!
//! - the current-node key is written *before* the host's before-visit
//!   callback runs for that node;
//! - an action's response key is written *before* the last-action key is
//!   updated to point at it.
//!
//! A persisted response key means the action ran to a terminal outcome
//! exactly once; a resumed walk must not re-execute it.

/// Key holding the node key currently being walked.
pub const CURRENT_NODE: &str = "CTN";

/// Key holding the action key whose response was committed most recently.
pub const LAST_ACTION: &str = "LTA";

/// Key under which an action's committed response lives.
#[must_use]
pub fn response_key(action_key: &str) -> String {
    format!("{action_key}_AR")
}

/// Key reserved for an action's own persisted intermediates.
///
/// The engine never reads or writes this slot; it exists so actions can
/// checkpoint partial work under a stable, per-action name.
#[must_use]
pub fn intermediate_key(action_key: &str) -> String {
    format!("{action_key}_Int")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_known_keys() {
        assert_eq!(CURRENT_NODE, "CTN");
        assert_eq!(LAST_ACTION, "LTA");
    }

    #[test]
    fn response_key_suffix() {
        assert_eq!(response_key("A1"), "A1_AR");
        assert_eq!(response_key("fetch-user"), "fetch-user_AR");
    }

    #[test]
    fn intermediate_key_suffix() {
        assert_eq!(intermediate_key("A1"), "A1_Int");
    }

    #[test]
    fn response_and_intermediate_keys_never_collide() {
        assert_ne!(response_key("x"), intermediate_key("x"));
    }
}
