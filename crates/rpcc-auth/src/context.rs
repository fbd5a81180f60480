//! Per-call state.
//!
//! A [`CallContext`] is created by the transport for each inbound call and
//! handed to the dispatcher by value. Everything in it dies with the call:
//!
//! ```text
//! CallContext
//! ├── id, api_version, principal     (set by the transport)
//! ├── params                         (bound by the dispatcher, in order)
//! ├── function cache                 (CacheInFunction decisions)
//! ├── object cache                   (the call is the subject of operation guards)
//! ├── entry flag                     (perimeter defense)
//! └── extensions                     (collaborator handles, by type)
//! ```
//!
//! The context is `Send` but not `Sync`: one call runs on one thread, so
//! the function cache and entry flag use `RefCell`/`Cell` without locking.

use crate::{Decision, DecisionEngine, GuardId, ObjectDecisionCache, Subject};
use rpcc_types::{ApiVersion, CallId, Principal, Value};
use std::any::{Any, TypeId};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Type-keyed storage for collaborator handles (repositories, registries).
#[derive(Default)]
pub struct Extensions {
    map: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Extensions {
    /// Inserts `value`, returning the previous value of the same type.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) -> Option<T> {
        self.map
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|prev| prev.downcast::<T>().ok().map(|b| *b))
    }

    #[must_use]
    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.map
            .get(&TypeId::of::<T>())
            .and_then(|b| b.downcast_ref::<T>())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extensions")
            .field("len", &self.map.len())
            .finish()
    }
}

/// State for one in-flight call.
///
/// # Example
///
/// ```
/// use rpcc_auth::{CallContext, DecisionEngine};
/// use rpcc_types::Principal;
/// use std::sync::Arc;
///
/// let engine = Arc::new(DecisionEngine::new());
/// let call = CallContext::new(engine, 3).with_principal(Principal::user("alice"));
///
/// assert_eq!(call.api_version(), 3);
/// assert!(call.is_authenticated());
/// assert!(!call.entry_granted());
/// ```
pub struct CallContext {
    id: CallId,
    api_version: ApiVersion,
    principal: Option<Principal>,
    engine: Arc<DecisionEngine>,
    params: BTreeMap<String, Value>,
    function_cache: RefCell<HashMap<GuardId, Decision>>,
    object_cache: ObjectDecisionCache,
    entry_granted: Cell<bool>,
    extensions: Extensions,
    started: Instant,
}

impl CallContext {
    /// Creates an unauthenticated context for `api_version`.
    #[must_use]
    pub fn new(engine: Arc<DecisionEngine>, api_version: ApiVersion) -> Self {
        Self {
            id: CallId::new(),
            api_version,
            principal: None,
            engine,
            params: BTreeMap::new(),
            function_cache: RefCell::new(HashMap::new()),
            object_cache: ObjectDecisionCache::new(),
            entry_granted: Cell::new(false),
            extensions: Extensions::default(),
            started: Instant::now(),
        }
    }

    /// Sets the authenticated caller.
    #[must_use]
    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.principal = Some(principal);
        self
    }

    /// Attaches a collaborator handle.
    #[must_use]
    pub fn with_extension<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.extensions.insert(value);
        self
    }

    #[must_use]
    pub fn id(&self) -> CallId {
        self.id
    }

    #[must_use]
    pub fn api_version(&self) -> ApiVersion {
        self.api_version
    }

    #[must_use]
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }

    #[must_use]
    pub fn engine(&self) -> &Arc<DecisionEngine> {
        &self.engine
    }

    /// Bound parameters by name.
    #[must_use]
    pub fn params(&self) -> &BTreeMap<String, Value> {
        &self.params
    }

    /// A bound parameter. Optional parameters that were not supplied are
    /// absent.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// Binds a resolved parameter value.
    pub fn bind_param(&mut self, name: impl Into<String>, value: Value) {
        self.params.insert(name.into(), value);
    }

    /// Drops what an earlier call left behind: bound parameters, cached
    /// decisions and the entry flag. Identity, version and extensions stay.
    pub fn reset_bindings(&mut self) {
        self.params.clear();
        self.function_cache.get_mut().clear();
        self.object_cache.clear();
        self.entry_granted.set(false);
        self.started = Instant::now();
    }

    #[must_use]
    pub fn extension<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.extensions.get::<T>()
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// `true` while a guarded entry point is executing within this call.
    #[must_use]
    pub fn entry_granted(&self) -> bool {
        self.entry_granted.get()
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// The `CacheInFunction` decision cached for `guard` in this call.
    #[must_use]
    pub fn cached_decision(&self, guard: GuardId) -> Option<Decision> {
        self.function_cache.borrow().get(&guard).copied()
    }

    pub(crate) fn cache_decision(&self, guard: GuardId, decision: Decision) {
        self.function_cache.borrow_mut().insert(guard, decision);
    }

    pub(crate) fn enter(&self) -> EntryPass<'_> {
        self.entry_granted.set(true);
        EntryPass { call: self }
    }
}

impl Subject for CallContext {
    fn decision_cache(&self) -> &ObjectDecisionCache {
        &self.object_cache
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for CallContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallContext")
            .field("id", &self.id)
            .field("api_version", &self.api_version)
            .field("principal", &self.principal)
            .field("params", &self.params.keys().collect::<Vec<_>>())
            .field("entry_granted", &self.entry_granted.get())
            .finish_non_exhaustive()
    }
}

/// Holds the entry flag set; clears it when dropped, including on unwind.
pub(crate) struct EntryPass<'a> {
    call: &'a CallContext,
}

impl Drop for EntryPass<'_> {
    fn drop(&mut self) {
        self.call.entry_granted.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cacheability;

    fn call() -> CallContext {
        CallContext::new(Arc::new(DecisionEngine::new()), 0)
    }

    #[test]
    fn starts_unauthenticated() {
        let c = call();
        assert!(!c.is_authenticated());
        assert!(c.principal().is_none());
        assert!(c.params().is_empty());
    }

    #[test]
    fn bind_and_read_params() {
        let mut c = call();
        c.bind_param("name", Value::from("web01"));
        assert_eq!(c.param("name").and_then(Value::as_str), Some("web01"));
        assert!(c.param("missing").is_none());
    }

    #[test]
    fn extensions_by_type() {
        #[derive(Debug, PartialEq)]
        struct NodeName(&'static str);

        let mut c = call().with_extension(NodeName("node-a"));
        assert_eq!(c.extension::<NodeName>(), Some(&NodeName("node-a")));
        assert!(c.extension::<String>().is_none());

        let prev = c.extensions_mut().insert(NodeName("node-b"));
        assert_eq!(prev, Some(NodeName("node-a")));
    }

    #[test]
    fn entry_pass_clears_on_drop() {
        let c = call();
        {
            let _pass = c.enter();
            assert!(c.entry_granted());
        }
        assert!(!c.entry_granted());
    }

    #[test]
    fn entry_pass_clears_on_unwind() {
        let c = call();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _pass = c.enter();
            panic!("body failed");
        }));
        assert!(result.is_err());
        assert!(!c.entry_granted());
    }

    #[test]
    fn reset_drops_bindings_and_cached_decisions() {
        let mut c = call().with_principal(Principal::user("alice"));
        let id = GuardId::next();
        c.bind_param("name", Value::from("web01"));
        c.cache_decision(id, Decision::granted(Cacheability::CacheInFunction));
        c.object_cache.insert(id, Decision::granted(Cacheability::CacheInObject));

        c.reset_bindings();
        assert!(c.params().is_empty());
        assert!(c.cached_decision(id).is_none());
        assert!(c.decision_cache().is_empty());
        assert_eq!(c.principal(), Some(&Principal::user("alice")));
    }

    #[test]
    fn function_cache_is_per_call() {
        let a = call();
        let b = call();
        let id = GuardId::next();
        a.cache_decision(id, Decision::granted(Cacheability::CacheInFunction));
        assert!(a.cached_decision(id).is_some());
        assert!(b.cached_decision(id).is_none());
    }
}
