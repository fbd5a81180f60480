//! The guard contract.

use crate::{CallContext, Decision, ObjectDecisionCache};
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Process-unique identity of a registered guard.
///
/// Decision caches are keyed by `GuardId`, never by guard value. Guards are
/// therefore registered once at startup and reused for every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GuardId(u64);

impl GuardId {
    /// Allocates the next identity.
    #[must_use]
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for GuardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "guard#{}", self.0)
    }
}

/// The object an access check is made against.
///
/// Any type that can be guarded carries an [`ObjectDecisionCache`] so that
/// `CacheInObject` decisions live exactly as long as the instance.
///
/// # Example
///
/// ```
/// use rpcc_auth::{ObjectDecisionCache, Subject};
/// use std::any::Any;
///
/// struct Host {
///     name: String,
///     decisions: ObjectDecisionCache,
/// }
///
/// impl Subject for Host {
///     fn decision_cache(&self) -> &ObjectDecisionCache {
///         &self.decisions
///     }
///
///     fn as_any(&self) -> &dyn Any {
///         self
///     }
/// }
/// ```
pub trait Subject {
    fn decision_cache(&self) -> &ObjectDecisionCache;

    /// Upcast so guards can inspect the concrete subject.
    fn as_any(&self) -> &dyn Any;
}

/// A policy unit: a pure function of `(subject, call)` to a [`Decision`].
///
/// Guards must be `Send + Sync`. A guard instance is shared by every call
/// that reaches it.
///
/// Chain guards evaluate their members through
/// [`DecisionEngine::decide`](crate::DecisionEngine::decide) so that member
/// decisions are cached like any other.
///
/// # Example
///
/// ```
/// use rpcc_auth::{CallContext, Cacheability, Decision, Guard, Subject};
///
/// /// Allows calls made against API version 2 or later.
/// struct NewApiOnly;
///
/// impl Guard for NewApiOnly {
///     fn check(&self, _subject: &dyn Subject, call: &CallContext) -> Decision {
///         if call.api_version() >= 2 {
///             Decision::granted(Cacheability::CacheInFunction)
///         } else {
///             Decision::referred(Cacheability::CacheInFunction)
///         }
///     }
///
///     fn name(&self) -> &str {
///         "new-api-only"
///     }
/// }
/// ```
pub trait Guard: Send + Sync {
    fn check(&self, subject: &dyn Subject, call: &CallContext) -> Decision;

    /// Name used in logs and AccessDenied diagnostics.
    fn name(&self) -> &str;
}

/// A registered guard: its identity plus the shared instance.
///
/// Obtained from [`DecisionEngine::register`](crate::DecisionEngine::register).
#[derive(Clone)]
pub struct GuardRef {
    id: GuardId,
    guard: Arc<dyn Guard>,
}

impl GuardRef {
    pub(crate) fn new(guard: Arc<dyn Guard>) -> Self {
        Self {
            id: GuardId::next(),
            guard,
        }
    }

    #[must_use]
    pub fn id(&self) -> GuardId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.guard.name()
    }

    /// Runs the guard directly, bypassing every cache.
    #[must_use]
    pub fn check(&self, subject: &dyn Subject, call: &CallContext) -> Decision {
        self.guard.check(subject, call)
    }
}

impl fmt::Debug for GuardRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardRef")
            .field("id", &self.id)
            .field("name", &self.name())
            .finish()
    }
}

impl PartialEq for GuardRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for GuardRef {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_increasing() {
        let a = GuardId::next();
        let b = GuardId::next();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn guard_ref_identity_is_registration() {
        struct Nop;
        impl Guard for Nop {
            fn check(&self, _: &dyn Subject, _: &CallContext) -> Decision {
                Decision::referred(crate::Cacheability::NeverCache)
            }
            fn name(&self) -> &str {
                "nop"
            }
        }

        let shared: Arc<dyn Guard> = Arc::new(Nop);
        let a = GuardRef::new(Arc::clone(&shared));
        let b = GuardRef::new(shared);
        assert_ne!(a, b);
        assert_eq!(a.clone(), a);
        assert_eq!(a.name(), "nop");
    }
}
