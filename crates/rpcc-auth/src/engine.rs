//! The decision engine and the entry-point protocol.
//!
//! # Entry Protocol
//!
//! ```text
//! entry(guard, subject, call, body)
//!   │
//!   ├─ call.entry_granted()? ──yes──► body()            (perimeter pass)
//!   │
//!   ├─ decide(guard, subject, call)
//!   │     ├─ call function cache hit?  ──► cached
//!   │     ├─ subject object cache hit? ──► cached
//!   │     └─ guard.check() ──► store by cacheability
//!   │
//!   ├─ Granted ──► set flag ─► body() ─► clear flag (always, even on unwind)
//!   └─ Denied / Referred ──► Err(RuntimeError::AccessDenied)
//! ```
//!
//! # Audit Logging
//!
//! - Granted entry: debug level
//! - Denied entry: warn level
//! - Cache hits and perimeter passes: trace level

use crate::guards::{AlwaysAllow, NeverAllow, SuperuserProxy};
use crate::{CallContext, Cacheability, Decision, Guard, GuardId, GuardRef, Outcome, Subject};
use parking_lot::RwLock;
use rpcc_error::RpcError;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of long-lived guards plus the cache-aware decision procedure.
///
/// One engine is created at startup and shared (via `Arc`) by every
/// [`CallContext`].
///
/// # Example
///
/// ```
/// use rpcc_auth::{CallContext, DecisionEngine};
/// use rpcc_error::{kinds, RpcError};
/// use std::sync::Arc;
///
/// let engine = Arc::new(DecisionEngine::new());
/// let allow = engine.always_allow();
/// let deny = engine.never_allow();
///
/// let call = CallContext::new(Arc::clone(&engine), 0);
/// let ok: Result<i32, RpcError> = engine.entry(&allow, &call, &call, || Ok(42));
/// assert_eq!(ok.ok(), Some(42));
///
/// let err = engine
///     .entry::<(), RpcError>(&deny, &call, &call, || Ok(()))
///     .unwrap_err();
/// assert!(err.is_a(&kinds::ACCESS_DENIED));
/// ```
pub struct DecisionEngine {
    guards: RwLock<HashMap<GuardId, GuardRef>>,
    always_allow: GuardRef,
    never_allow: GuardRef,
    superuser_proxy: GuardRef,
    superuser: Arc<RwLock<GuardRef>>,
}

impl DecisionEngine {
    /// Creates an engine with the built-in guards registered.
    ///
    /// The server-wide superuser guard starts as never-allow.
    #[must_use]
    pub fn new() -> Self {
        let always_allow = GuardRef::new(Arc::new(AlwaysAllow));
        let never_allow = GuardRef::new(Arc::new(NeverAllow));
        let superuser = Arc::new(RwLock::new(never_allow.clone()));
        let superuser_proxy = GuardRef::new(Arc::new(SuperuserProxy::new(Arc::clone(&superuser))));

        let guards = [&always_allow, &never_allow, &superuser_proxy]
            .into_iter()
            .map(|g| (g.id(), g.clone()))
            .collect();

        Self {
            guards: RwLock::new(guards),
            always_allow,
            never_allow,
            superuser_proxy,
            superuser,
        }
    }

    /// Registers a guard and returns its identity handle.
    ///
    /// Register each guard once and keep the returned [`GuardRef`].
    /// Registering the same policy twice yields two identities with
    /// separate cache entries.
    pub fn register(&self, guard: impl Guard + 'static) -> GuardRef {
        let guard_ref = GuardRef::new(Arc::new(guard));
        tracing::debug!(guard = guard_ref.name(), id = %guard_ref.id(), "guard registered");
        self.guards.write().insert(guard_ref.id(), guard_ref.clone());
        guard_ref
    }

    /// Name of a registered guard, for diagnostics.
    #[must_use]
    pub fn guard_name(&self, id: GuardId) -> Option<String> {
        self.guards.read().get(&id).map(|g| g.name().to_string())
    }

    #[must_use]
    pub fn guard_count(&self) -> usize {
        self.guards.read().len()
    }

    #[must_use]
    pub fn always_allow(&self) -> GuardRef {
        self.always_allow.clone()
    }

    #[must_use]
    pub fn never_allow(&self) -> GuardRef {
        self.never_allow.clone()
    }

    /// The indirection guard that delegates to the current superuser guard.
    ///
    /// Operations reference the proxy; the privilege model is swapped by
    /// [`set_superuser_guard`](Self::set_superuser_guard).
    #[must_use]
    pub fn superuser(&self) -> GuardRef {
        self.superuser_proxy.clone()
    }

    /// The guard the superuser proxy currently delegates to.
    #[must_use]
    pub fn superuser_guard(&self) -> GuardRef {
        self.superuser.read().clone()
    }

    /// Replaces the server-wide superuser guard. Intended for startup.
    pub fn set_superuser_guard(&self, guard: GuardRef) {
        tracing::info!(guard = guard.name(), "superuser guard set");
        *self.superuser.write() = guard;
    }

    /// Decides `guard` for `subject` within `call`, consulting and filling
    /// the decision caches.
    ///
    /// Lookup order is the call's function cache, then the subject's object
    /// cache, then `guard.check`. A fresh decision is stored according to
    /// its cacheability; `NeverCache` decisions are never stored.
    pub fn decide(&self, guard: &GuardRef, subject: &dyn Subject, call: &CallContext) -> Decision {
        let id = guard.id();

        if let Some(decision) = call.cached_decision(id) {
            tracing::trace!(
                call_id = %call.id(),
                guard = guard.name(),
                %decision,
                "function cache hit"
            );
            return decision;
        }
        if let Some(decision) = subject.decision_cache().get(id) {
            tracing::trace!(
                call_id = %call.id(),
                guard = guard.name(),
                %decision,
                "object cache hit"
            );
            return decision;
        }

        let decision = guard.check(subject, call);
        match decision.cacheability {
            Cacheability::CacheInFunction => call.cache_decision(id, decision),
            Cacheability::CacheInObject => subject.decision_cache().insert(id, decision),
            Cacheability::NeverCache => {}
        }
        decision
    }

    /// Runs `body` behind `guard` (perimeter defense).
    ///
    /// If an enclosing entry point of the same call has already been
    /// granted, `body` runs without consulting `guard`. Otherwise a Granted
    /// decision sets the call's entry flag for the duration of `body`, and
    /// Denied or Referred fail with AccessDenied naming the guard.
    ///
    /// # Errors
    ///
    /// Returns AccessDenied (converted into `E`) when the guard does not
    /// grant, or whatever `body` returns.
    pub fn entry<T, E>(
        &self,
        guard: &GuardRef,
        subject: &dyn Subject,
        call: &CallContext,
        body: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<RpcError>,
    {
        if call.entry_granted() {
            tracing::trace!(call_id = %call.id(), guard = guard.name(), "inside granted perimeter");
            return body();
        }

        let decision = self.decide(guard, subject, call);
        match decision.outcome {
            Outcome::Granted => {
                tracing::debug!(
                    call_id = %call.id(),
                    guard = guard.name(),
                    principal = ?call.principal(),
                    %decision,
                    "entry granted"
                );
                let _pass = call.enter();
                body()
            }
            Outcome::Denied | Outcome::Referred => {
                tracing::warn!(
                    call_id = %call.id(),
                    guard = guard.name(),
                    principal = ?call.principal(),
                    %decision,
                    "entry denied"
                );
                Err(RpcError::access_denied(guard.name()).into())
            }
        }
    }
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DecisionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionEngine")
            .field("guards", &self.guards.read().len())
            .field("superuser", &self.superuser.read().name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ObjectDecisionCache;
    use rpcc_error::kinds;
    use std::any::Any;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns a fixed decision and counts invocations.
    struct Counting {
        decision: Decision,
        calls: Arc<AtomicUsize>,
    }

    impl Counting {
        fn new(decision: Decision) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    decision,
                    calls: Arc::clone(&calls),
                },
                calls,
            )
        }
    }

    impl Guard for Counting {
        fn check(&self, _subject: &dyn Subject, _call: &CallContext) -> Decision {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.decision
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    struct Record {
        decisions: ObjectDecisionCache,
    }

    impl Subject for Record {
        fn decision_cache(&self) -> &ObjectDecisionCache {
            &self.decisions
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn setup() -> (Arc<DecisionEngine>, CallContext) {
        let engine = Arc::new(DecisionEngine::new());
        let call = CallContext::new(Arc::clone(&engine), 0);
        (engine, call)
    }

    #[test]
    fn builtin_guards_are_indexed() {
        let (engine, _) = setup();
        assert_eq!(engine.guard_count(), 3);
        assert_eq!(
            engine.guard_name(engine.always_allow().id()).as_deref(),
            Some("always-allow")
        );
        assert_eq!(
            engine.guard_name(engine.superuser().id()).as_deref(),
            Some("superuser")
        );
    }

    #[test]
    fn function_cacheable_decision_is_reused_within_call() {
        let (engine, call) = setup();
        let (guard, calls) = Counting::new(Decision::granted(Cacheability::CacheInFunction));
        let guard = engine.register(guard);

        engine.decide(&guard, &call, &call);
        engine.decide(&guard, &call, &call);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let other = CallContext::new(Arc::clone(&engine), 0);
        engine.decide(&guard, &other, &other);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn object_cacheable_decision_survives_calls() {
        let (engine, call) = setup();
        let (guard, calls) = Counting::new(Decision::denied(Cacheability::CacheInObject));
        let guard = engine.register(guard);
        let record = Record {
            decisions: ObjectDecisionCache::new(),
        };

        engine.decide(&guard, &record, &call);
        let next_call = CallContext::new(Arc::clone(&engine), 0);
        engine.decide(&guard, &record, &next_call);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(record.decisions.len(), 1);
        assert!(call.cached_decision(guard.id()).is_none());
    }

    #[test]
    fn never_cache_is_always_recomputed() {
        let (engine, call) = setup();
        let (guard, calls) = Counting::new(Decision::granted(Cacheability::NeverCache));
        let guard = engine.register(guard);
        let record = Record {
            decisions: ObjectDecisionCache::new(),
        };

        for _ in 0..3 {
            engine.decide(&guard, &record, &call);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(record.decisions.is_empty());
        assert!(call.cached_decision(guard.id()).is_none());
    }

    #[test]
    fn nested_entry_skips_inner_guard() {
        let (engine, call) = setup();
        let (outer, outer_calls) = Counting::new(Decision::granted(Cacheability::CacheInFunction));
        let (inner, inner_calls) = Counting::new(Decision::denied(Cacheability::CacheInFunction));
        let outer = engine.register(outer);
        let inner = engine.register(inner);

        let result: Result<&str, RpcError> = engine.entry(&outer, &call, &call, || {
            assert!(call.entry_granted());
            engine.entry(&inner, &call, &call, || Ok("inner ran"))
        });

        assert_eq!(result.ok(), Some("inner ran"));
        assert_eq!(outer_calls.load(Ordering::SeqCst), 1);
        assert_eq!(inner_calls.load(Ordering::SeqCst), 0);
        assert!(!call.entry_granted());
    }

    #[test]
    fn flag_cleared_after_failing_body() {
        let (engine, call) = setup();
        let allow = engine.always_allow();
        let deny = engine.never_allow();

        let failed: Result<(), RpcError> =
            engine.entry(&allow, &call, &call, || Err(RpcError::internal("body failed")));
        assert!(failed.is_err());
        assert!(!call.entry_granted());

        let denied: Result<(), RpcError> = engine.entry(&deny, &call, &call, || Ok(()));
        let err = denied.expect_err("never-allow must deny after the flag is cleared");
        assert!(err.is_a(&kinds::ACCESS_DENIED));
    }

    #[test]
    fn referred_is_denied_and_body_not_run() {
        let (engine, call) = setup();
        let (guard, _) = Counting::new(Decision::referred(Cacheability::CacheInFunction));
        let guard = engine.register(guard);

        let mut ran = false;
        let result: Result<(), RpcError> = engine.entry(&guard, &call, &call, || {
            ran = true;
            Ok(())
        });

        let err = result.expect_err("referred must not grant");
        assert!(err.is_a(&kinds::ACCESS_DENIED));
        assert!(err.detail().is_some_and(|d| d.contains("counting")));
        assert!(!ran);
    }

    #[test]
    fn superuser_proxy_follows_replacement() {
        let (engine, call) = setup();
        let proxy = engine.superuser();

        assert!(!engine.decide(&proxy, &call, &call).is_granted());

        engine.set_superuser_guard(engine.always_allow());
        let fresh = CallContext::new(Arc::clone(&engine), 0);
        assert!(engine.decide(&proxy, &fresh, &fresh).is_granted());
    }
}
