//! Object-scoped decision cache.

use crate::{Decision, GuardId};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Decisions cached on a subject object, keyed by guard identity.
///
/// A subject instance may be shared by concurrent calls (a cached domain
/// record, for example), so the map is behind a `RwLock`. Two calls racing
/// to compute the same decision both insert it; the second write replaces
/// an identical value.
#[derive(Debug, Default)]
pub struct ObjectDecisionCache {
    decisions: RwLock<HashMap<GuardId, Decision>>,
}

impl ObjectDecisionCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, guard: GuardId) -> Option<Decision> {
        self.decisions.read().get(&guard).copied()
    }

    pub fn insert(&self, guard: GuardId, decision: Decision) {
        self.decisions.write().insert(guard, decision);
    }

    /// Drops every cached decision, e.g. after the object's data changed.
    pub fn clear(&self) {
        self.decisions.write().clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.decisions.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.decisions.read().is_empty()
    }
}
