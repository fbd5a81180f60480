//! Building-block guards.
//!
//! | Guard | Granted when | Otherwise |
//! |-------|--------------|-----------|
//! | [`AlwaysAllow`] | always | — |
//! | [`NeverAllow`] | never | Denied |
//! | [`AuthRequired`] | the call has a principal | Referred |
//! | [`IdentityListGuard`] | caller's user name is in the list | Referred |
//! | [`PermissionGuard`] | the permission store says so | Referred |
//! | `SuperuserProxy` | the current superuser guard grants | its decision |
//!
//! All of these are stable for the duration of a call and report
//! `CacheInFunction`, except [`PermissionGuard`] whose cacheability is
//! configurable.

use crate::permission::PermissionStore;
use crate::{CallContext, Cacheability, Decision, Guard, GuardRef, Subject};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;

/// Grants every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysAllow;

impl Guard for AlwaysAllow {
    fn check(&self, _subject: &dyn Subject, _call: &CallContext) -> Decision {
        Decision::granted(Cacheability::CacheInFunction)
    }

    fn name(&self) -> &str {
        "always-allow"
    }
}

/// Denies every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverAllow;

impl Guard for NeverAllow {
    fn check(&self, _subject: &dyn Subject, _call: &CallContext) -> Decision {
        Decision::denied(Cacheability::CacheInFunction)
    }

    fn name(&self) -> &str {
        "never-allow"
    }
}

/// Grants authenticated callers, refers the rest.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthRequired;

impl Guard for AuthRequired {
    fn check(&self, _subject: &dyn Subject, call: &CallContext) -> Decision {
        if call.is_authenticated() {
            Decision::granted(Cacheability::CacheInFunction)
        } else {
            Decision::referred(Cacheability::CacheInFunction)
        }
    }

    fn name(&self) -> &str {
        "auth-required"
    }
}

/// Grants callers whose user name is in a fixed list.
///
/// # Example
///
/// ```
/// use rpcc_auth::guards::IdentityListGuard;
/// use rpcc_auth::{CallContext, DecisionEngine};
/// use rpcc_types::Principal;
/// use std::sync::Arc;
///
/// let engine = Arc::new(DecisionEngine::new());
/// let admins = engine.register(IdentityListGuard::new("admins", ["root", "alice"]));
///
/// let call = CallContext::new(Arc::clone(&engine), 0).with_principal(Principal::user("alice"));
/// assert!(engine.decide(&admins, &call, &call).is_granted());
/// ```
#[derive(Debug, Clone)]
pub struct IdentityListGuard {
    name: String,
    identities: HashSet<String>,
}

impl IdentityListGuard {
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, identities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            identities: identities.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn contains(&self, user: &str) -> bool {
        self.identities.contains(user)
    }
}

impl Guard for IdentityListGuard {
    fn check(&self, _subject: &dyn Subject, call: &CallContext) -> Decision {
        let listed = call
            .principal()
            .and_then(|p| p.user_name())
            .is_some_and(|user| self.contains(user));
        if listed {
            Decision::granted(Cacheability::CacheInFunction)
        } else {
            Decision::referred(Cacheability::CacheInFunction)
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Grants callers holding a named permission in an external store.
#[derive(Clone)]
pub struct PermissionGuard {
    name: String,
    permission: String,
    store: Arc<dyn PermissionStore>,
    cacheability: Cacheability,
}

impl PermissionGuard {
    /// Checks `permission` against `store`; decisions are `CacheInFunction`.
    #[must_use]
    pub fn new(permission: impl Into<String>, store: Arc<dyn PermissionStore>) -> Self {
        let permission = permission.into();
        Self {
            name: format!("permission:{permission}"),
            permission,
            store,
            cacheability: Cacheability::CacheInFunction,
        }
    }

    /// Overrides the cacheability of this guard's decisions, e.g.
    /// `NeverCache` for a store whose grants change mid-call.
    #[must_use]
    pub fn with_cacheability(mut self, cacheability: Cacheability) -> Self {
        self.cacheability = cacheability;
        self
    }

    #[must_use]
    pub fn permission(&self) -> &str {
        &self.permission
    }
}

impl Guard for PermissionGuard {
    fn check(&self, _subject: &dyn Subject, call: &CallContext) -> Decision {
        let held = call
            .principal()
            .is_some_and(|p| self.store.holds(p, &self.permission));
        if held {
            Decision::granted(self.cacheability)
        } else {
            Decision::referred(self.cacheability)
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for PermissionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionGuard")
            .field("permission", &self.permission)
            .field("cacheability", &self.cacheability)
            .finish_non_exhaustive()
    }
}

/// Delegates to the engine's current superuser guard.
pub(crate) struct SuperuserProxy {
    target: Arc<RwLock<GuardRef>>,
}

impl SuperuserProxy {
    pub(crate) fn new(target: Arc<RwLock<GuardRef>>) -> Self {
        Self { target }
    }
}

impl Guard for SuperuserProxy {
    fn check(&self, subject: &dyn Subject, call: &CallContext) -> Decision {
        let target = self.target.read().clone();
        call.engine().decide(&target, subject, call)
    }

    fn name(&self) -> &str {
        "superuser"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::MemoryPermissionStore;
    use crate::{DecisionEngine, Outcome};
    use rpcc_types::Principal;

    fn call(principal: Option<Principal>) -> CallContext {
        let call = CallContext::new(Arc::new(DecisionEngine::new()), 0);
        match principal {
            Some(p) => call.with_principal(p),
            None => call,
        }
    }

    #[test]
    fn always_and_never() {
        let c = call(None);
        assert_eq!(AlwaysAllow.check(&c, &c).outcome, Outcome::Granted);
        assert_eq!(NeverAllow.check(&c, &c).outcome, Outcome::Denied);
        assert_eq!(
            NeverAllow.check(&c, &c).cacheability,
            Cacheability::CacheInFunction
        );
    }

    #[test]
    fn auth_required() {
        let anon = call(None);
        let user = call(Some(Principal::user("bob")));
        assert_eq!(AuthRequired.check(&anon, &anon).outcome, Outcome::Referred);
        assert_eq!(AuthRequired.check(&user, &user).outcome, Outcome::Granted);
    }

    #[test]
    fn identity_list() {
        let guard = IdentityListGuard::new("ops", ["root"]);
        let root = call(Some(Principal::user("root")));
        let bob = call(Some(Principal::user("bob")));
        let system = call(Some(Principal::System));

        assert_eq!(guard.check(&root, &root).outcome, Outcome::Granted);
        assert_eq!(guard.check(&bob, &bob).outcome, Outcome::Referred);
        assert_eq!(guard.check(&system, &system).outcome, Outcome::Referred);
        assert_eq!(guard.name(), "ops");
    }

    #[test]
    fn permission_guard_delegates_to_store() {
        let store = Arc::new(MemoryPermissionStore::new());
        store.grant(&Principal::user("alice"), "dhcp.write");
        let guard = PermissionGuard::new("dhcp.write", store.clone())
            .with_cacheability(Cacheability::NeverCache);

        let alice = call(Some(Principal::user("alice")));
        let bob = call(Some(Principal::user("bob")));
        let anon = call(None);

        assert_eq!(
            guard.check(&alice, &alice),
            Decision::granted(Cacheability::NeverCache)
        );
        assert_eq!(guard.check(&bob, &bob).outcome, Outcome::Referred);
        assert_eq!(guard.check(&anon, &anon).outcome, Outcome::Referred);
        assert_eq!(guard.name(), "permission:dhcp.write");

        store.revoke(&Principal::user("alice"), "dhcp.write");
        assert_eq!(guard.check(&alice, &alice).outcome, Outcome::Referred);
    }
}
