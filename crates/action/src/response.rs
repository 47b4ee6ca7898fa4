//! The action outcome envelope.

use serde::{Deserialize, Serialize};

/// Status recorded when an action timed out but the schema asked the walk
/// to continue.
pub const STATUS_TIMEOUT: &str = "TimeoutOnAction";

/// Status recorded when a single-attempt action failed but the schema asked
/// the walk to continue.
pub const STATUS_RETRY_EXHAUSTED: &str = "RetryExhaustedOnAction";

/// The outcome envelope an action returns.
///
/// Opaque beyond the `status` discriminant: everything else the action puts
/// in the envelope round-trips through state untouched and is readable by
/// downstream expressions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    /// Outcome discriminant. The engine reserves [`STATUS_TIMEOUT`] and
    /// [`STATUS_RETRY_EXHAUSTED`] for synthetic responses.
    pub status: String,
    /// Everything else the action chose to record.
    #[serde(flatten)]
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl ActionResponse {
    /// A response carrying only a status.
    #[must_use]
    pub fn with_status(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            data: serde_json::Map::new(),
        }
    }

    /// Attach a data field to the envelope.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// The synthetic response committed on a continued action timeout.
    #[must_use]
    pub fn timeout() -> Self {
        Self::with_status(STATUS_TIMEOUT)
    }

    /// The synthetic response committed on continued retry exhaustion.
    #[must_use]
    pub fn retry_exhausted() -> Self {
        Self::with_status(STATUS_RETRY_EXHAUSTED)
    }

    /// Returns `true` if this is one of the engine's synthetic responses.
    #[must_use]
    pub fn is_synthetic(&self) -> bool {
        self.status == STATUS_TIMEOUT || self.status == STATUS_RETRY_EXHAUSTED
    }

    /// Read a data field.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }
}
