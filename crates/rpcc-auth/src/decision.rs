//! Decisions and the cacheability lattice.

use std::fmt;

/// The verdict of a guard.
///
/// | Outcome | Meaning |
/// |---------|---------|
/// | `Granted` | definitely allow |
/// | `Denied` | definitely deny |
/// | `Referred` | no opinion; defer to the next guard or the chain default |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Granted,
    Denied,
    Referred,
}

impl Outcome {
    #[must_use]
    pub fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// How long a decision stays valid.
///
/// Ordered ascending: `NeverCache < CacheInObject < CacheInFunction`.
/// Combining decisions takes the minimum of the levels actually consulted.
///
/// | Level | Stored in | Lifetime |
/// |-------|-----------|----------|
/// | `NeverCache` | nowhere | recomputed on every check |
/// | `CacheInObject` | the checked subject | as long as the subject instance |
/// | `CacheInFunction` | the call context | until the call ends |
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Cacheability {
    NeverCache = 0,
    CacheInObject = 1,
    CacheInFunction = 2,
}

impl Cacheability {
    /// Numeric level (0, 1, 2).
    #[must_use]
    pub fn level(self) -> u8 {
        self as u8
    }
}

/// An outcome paired with its cacheability.
///
/// # Example
///
/// ```
/// use rpcc_auth::{Cacheability, Decision, Outcome};
///
/// let d = Decision::granted(Cacheability::CacheInObject);
/// assert!(d.is_granted());
/// assert_eq!(d.restrict(Cacheability::NeverCache).cacheability, Cacheability::NeverCache);
/// assert_eq!(d.restrict(Cacheability::CacheInFunction), d);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decision {
    pub outcome: Outcome,
    pub cacheability: Cacheability,
}

impl Decision {
    #[must_use]
    pub const fn new(outcome: Outcome, cacheability: Cacheability) -> Self {
        Self {
            outcome,
            cacheability,
        }
    }

    #[must_use]
    pub const fn granted(cacheability: Cacheability) -> Self {
        Self::new(Outcome::Granted, cacheability)
    }

    #[must_use]
    pub const fn denied(cacheability: Cacheability) -> Self {
        Self::new(Outcome::Denied, cacheability)
    }

    #[must_use]
    pub const fn referred(cacheability: Cacheability) -> Self {
        Self::new(Outcome::Referred, cacheability)
    }

    #[must_use]
    pub fn is_granted(&self) -> bool {
        self.outcome.is_granted()
    }

    /// Same outcome, cacheability lowered to at most `level`.
    #[must_use]
    pub fn restrict(self, level: Cacheability) -> Self {
        Self::new(self.outcome, self.cacheability.min(level))
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?})", self.outcome, self.cacheability)
    }
}
