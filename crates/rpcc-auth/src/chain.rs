//! Chain combinators.
//!
//! A [`Chain`] scans an ordered list of guards and stops at the first
//! decision that settles it:
//!
//! | Mode | Stops at | Else |
//! |------|----------|------|
//! | [`ChainMode::FirstOpinion`] | first Granted or Denied | default |
//! | [`ChainMode::AnyGrants`] | first Granted | default |
//! | [`ChainMode::NoDenies`] | first Denied | default |
//!
//! The returned decision carries the minimum cacheability among the member
//! decisions actually consulted. Members after the stopping point are never
//! evaluated, so they cannot lower it. With no member consulted the level
//! is `CacheInFunction`.

use crate::{CallContext, Cacheability, Decision, Guard, GuardRef, Outcome, Subject};

/// Which member outcome ends the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainMode {
    FirstOpinion,
    AnyGrants,
    NoDenies,
}

impl ChainMode {
    fn settles(self, outcome: Outcome) -> bool {
        match self {
            Self::FirstOpinion => outcome != Outcome::Referred,
            Self::AnyGrants => outcome == Outcome::Granted,
            Self::NoDenies => outcome == Outcome::Denied,
        }
    }
}

/// A guard combining other registered guards.
///
/// Members are evaluated through the engine, so their decisions are
/// cached exactly as if each were an entry guard.
///
/// # Example
///
/// ```
/// use rpcc_auth::chain::Chain;
/// use rpcc_auth::guards::AuthRequired;
/// use rpcc_auth::{CallContext, DecisionEngine, Outcome};
/// use std::sync::Arc;
///
/// let engine = Arc::new(DecisionEngine::new());
/// let auth = engine.register(AuthRequired);
/// let chain = engine.register(Chain::any_grants("auth-or-superuser", [auth, engine.superuser()]));
///
/// // Neither member grants: AuthRequired refers, the superuser guard denies.
/// let anonymous = CallContext::new(Arc::clone(&engine), 0);
/// assert_eq!(engine.decide(&chain, &anonymous, &anonymous).outcome, Outcome::Referred);
/// ```
#[derive(Debug, Clone)]
pub struct Chain {
    name: String,
    mode: ChainMode,
    guards: Vec<GuardRef>,
    default: Outcome,
}

impl Chain {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        mode: ChainMode,
        guards: impl IntoIterator<Item = GuardRef>,
    ) -> Self {
        Self {
            name: name.into(),
            mode,
            guards: guards.into_iter().collect(),
            default: Outcome::Referred,
        }
    }

    #[must_use]
    pub fn first_opinion(
        name: impl Into<String>,
        guards: impl IntoIterator<Item = GuardRef>,
    ) -> Self {
        Self::new(name, ChainMode::FirstOpinion, guards)
    }

    #[must_use]
    pub fn any_grants(name: impl Into<String>, guards: impl IntoIterator<Item = GuardRef>) -> Self {
        Self::new(name, ChainMode::AnyGrants, guards)
    }

    #[must_use]
    pub fn no_denies(name: impl Into<String>, guards: impl IntoIterator<Item = GuardRef>) -> Self {
        Self::new(name, ChainMode::NoDenies, guards)
    }

    /// Outcome returned when no member settles the chain. Defaults to
    /// Referred.
    #[must_use]
    pub fn with_default(mut self, outcome: Outcome) -> Self {
        self.default = outcome;
        self
    }

    #[must_use]
    pub fn mode(&self) -> ChainMode {
        self.mode
    }

    #[must_use]
    pub fn members(&self) -> &[GuardRef] {
        &self.guards
    }
}

impl Guard for Chain {
    fn check(&self, subject: &dyn Subject, call: &CallContext) -> Decision {
        let engine = call.engine();
        let mut level = Cacheability::CacheInFunction;

        for guard in &self.guards {
            let decision = engine.decide(guard, subject, call);
            level = level.min(decision.cacheability);
            if self.mode.settles(decision.outcome) {
                return Decision::new(decision.outcome, level);
            }
        }

        Decision::new(self.default, level)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
