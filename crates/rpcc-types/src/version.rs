//! API version numbers and inclusive version ranges.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An API version number. Versions are dense and start at 0.
pub type ApiVersion = u32;

/// An inclusive range of API versions, `[from, to]`.
///
/// `to == None` means the range is open-ended: it covers every version
/// from `from` onward, including versions added later.
///
/// # Example
///
/// ```
/// use rpcc_types::VersionRange;
///
/// let r = VersionRange::new(1, Some(3));
/// assert!(!r.contains(0));
/// assert!(r.contains(1) && r.contains(3));
/// assert!(!r.contains(4));
///
/// assert!(r.overlaps(&VersionRange::from_version(3)));
/// assert!(!r.overlaps(&VersionRange::from_version(4)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionRange {
    /// First version (inclusive).
    pub from: ApiVersion,
    /// Last version (inclusive); `None` for open-ended.
    pub to: Option<ApiVersion>,
}

impl VersionRange {
    /// Creates a range `[from, to]`.
    #[must_use]
    pub const fn new(from: ApiVersion, to: Option<ApiVersion>) -> Self {
        Self { from, to }
    }

    /// Every version, `[0, ∞)`.
    #[must_use]
    pub const fn all() -> Self {
        Self { from: 0, to: None }
    }

    /// Open-ended range starting at `from`.
    #[must_use]
    pub const fn from_version(from: ApiVersion) -> Self {
        Self { from, to: None }
    }

    /// Exactly one version.
    #[must_use]
    pub const fn only(version: ApiVersion) -> Self {
        Self {
            from: version,
            to: Some(version),
        }
    }

    /// Returns `true` if `version` lies within the range.
    #[must_use]
    pub fn contains(&self, version: ApiVersion) -> bool {
        version >= self.from && self.to.map_or(true, |to| version <= to)
    }

    /// Returns `true` if the two ranges share at least one version.
    #[must_use]
    pub fn overlaps(&self, other: &VersionRange) -> bool {
        let self_below = self.to.is_some_and(|to| to < other.from);
        let other_below = other.to.is_some_and(|to| to < self.from);
        !self_below && !other_below
    }

    /// Returns `true` if `to < from`, which covers no versions at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to.is_some_and(|to| to < self.from)
    }

    /// The versions in both ranges, or `None` if they do not overlap.
    #[must_use]
    pub fn intersect(&self, other: &VersionRange) -> Option<VersionRange> {
        if !self.overlaps(other) {
            return None;
        }
        let to = match (self.to, other.to) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        Some(Self::new(self.from.max(other.from), to))
    }

    /// Returns `true` if every version of `other` is also in `self`.
    #[must_use]
    pub fn covers(&self, other: &VersionRange) -> bool {
        if other.from < self.from {
            return false;
        }
        match (self.to, other.to) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(a), Some(b)) => b <= a,
        }
    }
}

impl Default for VersionRange {
    fn default() -> Self {
        Self::all()
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to {
            Some(to) => write!(f, "[{}, {}]", self.from, to),
            None => write!(f, "[{}, ..)", self.from),
        }
    }
}
