//! Permission store contract and an in-memory implementation.
//!
//! # Architecture
//!
//! ```text
//! PermissionStore trait         ← consumed by PermissionGuard
//!          │
//!          └── MemoryPermissionStore  ← tests, small deployments
//! ```
//!
//! Real deployments back the trait with their account database.

use parking_lot::RwLock;
use rpcc_types::Principal;
use std::collections::{HashMap, HashSet};

/// Answers "does principal X hold permission Y".
///
/// Implementations must be cheap to call repeatedly; the guard layer
/// caches results per call, not across calls.
pub trait PermissionStore: Send + Sync {
    fn holds(&self, principal: &Principal, permission: &str) -> bool;
}

/// Thread-safe, in-memory permission store.
///
/// # Example
///
/// ```
/// use rpcc_auth::permission::{MemoryPermissionStore, PermissionStore};
/// use rpcc_types::Principal;
///
/// let store = MemoryPermissionStore::new();
/// let alice = Principal::user("alice");
///
/// store.grant(&alice, "host.create");
/// assert!(store.holds(&alice, "host.create"));
/// assert!(!store.holds(&alice, "host.delete"));
///
/// store.revoke(&alice, "host.create");
/// assert!(!store.holds(&alice, "host.create"));
/// ```
#[derive(Debug, Default)]
pub struct MemoryPermissionStore {
    grants: RwLock<HashMap<Principal, HashSet<String>>>,
}

impl MemoryPermissionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&self, principal: &Principal, permission: impl Into<String>) {
        self.grants
            .write()
            .entry(principal.clone())
            .or_default()
            .insert(permission.into());
    }

    /// Removes one permission. Unknown principals and permissions are ignored.
    pub fn revoke(&self, principal: &Principal, permission: &str) {
        let mut grants = self.grants.write();
        if let Some(set) = grants.get_mut(principal) {
            set.remove(permission);
            if set.is_empty() {
                grants.remove(principal);
            }
        }
    }

    /// All permissions held by `principal`, sorted.
    #[must_use]
    pub fn list(&self, principal: &Principal) -> Vec<String> {
        let mut perms: Vec<String> = self
            .grants
            .read()
            .get(principal)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        perms.sort();
        perms
    }
}

impl PermissionStore for MemoryPermissionStore {
    fn holds(&self, principal: &Principal, permission: &str) -> bool {
        self.grants
            .read()
            .get(principal)
            .is_some_and(|set| set.contains(permission))
    }
}
