//! Error kinds and wire path computation.

use std::fmt;
use std::hash::{Hash, Hasher};

/// Prefix stripped from a kind identifier when deriving its path segment.
const PREFIX: &str = "Ext";

/// Suffix stripped from a kind identifier below the first path level.
const SUFFIX: &str = "Error";

/// One node in the error kind tree.
///
/// Kinds are `static` items linked to their parent by reference. Identity
/// is the address of the static, so two kinds with the same identifier
/// are still distinct.
///
/// # Path Segments
///
/// | Condition | Segment |
/// |-----------|---------|
/// | `visible == false` | none (the parent path is passed through) |
/// | explicit `name` set | the name, verbatim |
/// | otherwise | `ident` minus `Ext` prefix, minus `Error` suffix unless at the top level |
///
/// The root kind itself never contributes a segment.
///
/// # Defining Application Kinds
///
/// ```
/// use rpcc_error::{kinds, ErrorKind};
///
/// static MUTEX_HELD: ErrorKind = ErrorKind::new(
///     "MutexHeldError",
///     &kinds::RUNTIME_ERROR,
///     "Another session already holds the mutex.",
/// );
///
/// assert_eq!(MUTEX_HELD.path(), vec!["RuntimeError", "MutexHeld"]);
/// assert!(MUTEX_HELD.is_a(&kinds::RUNTIME_ERROR));
/// ```
pub struct ErrorKind {
    ident: &'static str,
    name: Option<&'static str>,
    parent: Option<&'static ErrorKind>,
    visible: bool,
    desc: &'static str,
}

impl ErrorKind {
    /// Creates the root of a kind tree.
    #[must_use]
    pub const fn root(ident: &'static str, desc: &'static str) -> Self {
        Self {
            ident,
            name: None,
            parent: None,
            visible: false,
            desc,
        }
    }

    /// Creates a visible kind below `parent`.
    #[must_use]
    pub const fn new(ident: &'static str, parent: &'static ErrorKind, desc: &'static str) -> Self {
        Self {
            ident,
            name: None,
            parent: Some(parent),
            visible: true,
            desc,
        }
    }

    /// Sets an explicit path segment, overriding the derived one.
    #[must_use]
    pub const fn named(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }

    /// Hides this kind from the wire path.
    #[must_use]
    pub const fn invisible(mut self) -> Self {
        self.visible = false;
        self
    }

    /// The kind's identifier as written at its definition.
    #[must_use]
    pub fn ident(&self) -> &'static str {
        self.ident
    }

    /// Default human description.
    #[must_use]
    pub fn desc(&self) -> &'static str {
        self.desc
    }

    #[must_use]
    pub fn parent(&self) -> Option<&'static ErrorKind> {
        self.parent
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Ordered list of path segments from just below the root to this kind.
    #[must_use]
    pub fn path(&self) -> Vec<&'static str> {
        let Some(parent) = self.parent else {
            return Vec::new();
        };
        let mut path = parent.path();
        if !self.visible {
            return path;
        }
        let segment = match self.name {
            Some(name) => name,
            None => {
                let mut derived = self.ident.strip_prefix(PREFIX).unwrap_or(self.ident);
                if !path.is_empty() {
                    derived = derived.strip_suffix(SUFFIX).unwrap_or(derived);
                }
                derived
            }
        };
        path.push(segment);
        path
    }

    /// The path joined with `::`.
    #[must_use]
    pub fn wire_name(&self) -> String {
        self.path().join("::")
    }

    /// Returns `true` if `ancestor` is this kind or one of its ancestors.
    #[must_use]
    pub fn is_a(&self, ancestor: &ErrorKind) -> bool {
        let mut current = Some(self);
        while let Some(kind) = current {
            if kind == ancestor {
                return true;
            }
            current = kind.parent;
        }
        false
    }
}

impl PartialEq for ErrorKind {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for ErrorKind {}

impl Hash for ErrorKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(self, state);
    }
}

impl fmt::Debug for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorKind")
            .field("ident", &self.ident)
            .field("wire_name", &self.wire_name())
            .finish()
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.wire_name())
    }
}
