//! Identifier types for RPCC.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier for one inbound call.
///
/// Every [`CallContext`](../rpcc_auth/struct.CallContext.html) gets a fresh
/// `CallId`, and every log line emitted while the call is in flight carries
/// it, so a single request can be followed through registry lookup,
/// parameter binding, guard evaluation and the operation body.
///
/// # Example
///
/// ```
/// use rpcc_types::CallId;
///
/// let a = CallId::new();
/// let b = CallId::new();
/// assert_ne!(a, b);
/// assert_eq!(a.to_string().len(), 36);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallId(Uuid);

impl CallId {
    /// Creates a new random `CallId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn uuid(&self) -> &Uuid {
        &self.0
    }

    /// Returns the first eight hex digits, for compact log output.
    #[must_use]
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_ids_are_unique() {
        let ids: Vec<CallId> = (0..64).map(|_| CallId::new()).collect();
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn short_is_prefix_of_simple_form() {
        let id = CallId::new();
        let short = id.short();
        assert_eq!(short.len(), 8);
        assert!(id.uuid().simple().to_string().starts_with(&short));
    }

    #[test]
    fn serde_roundtrip() {
        let id = CallId::new();
        let json = serde_json::to_string(&id).expect("CallId should serialize");
        let back: CallId = serde_json::from_str(&json).expect("CallId should deserialize");
        assert_eq!(id, back);
    }
}
