//! Type descriptors.

use crate::{Lookup, SchemaError};
use regex::Regex;
use rpcc_types::VersionRange;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Constraints for a string descriptor.
///
/// # Example
///
/// ```
/// use rpcc_schema::{StringRules, TypeDescriptor};
///
/// let fqdn = TypeDescriptor::string_with(
///     "fqdn",
///     StringRules::new().regexp("[a-z0-9.-]+").maxlen(255),
/// )
/// .unwrap();
/// assert_eq!(fqdn.name(), "fqdn");
/// ```
#[derive(Debug, Clone, Default)]
pub struct StringRules {
    regexp: Option<String>,
    compiled: Option<Regex>,
    maxlen: Option<usize>,
    latin1_only: bool,
    masked: bool,
}

impl StringRules {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Full-match regexp. `^` and `$` are implied when missing.
    #[must_use]
    pub fn regexp(mut self, pattern: impl Into<String>) -> Self {
        self.regexp = Some(pattern.into());
        self
    }

    /// Maximum length in characters.
    #[must_use]
    pub fn maxlen(mut self, maxlen: usize) -> Self {
        self.maxlen = Some(maxlen);
        self
    }

    /// Rejects characters outside ISO-8859-1.
    #[must_use]
    pub fn latin1_only(mut self) -> Self {
        self.latin1_only = true;
        self
    }

    /// Presents every value as a fixed mask. Masked strings do not
    /// round-trip.
    #[must_use]
    pub fn masked(mut self) -> Self {
        self.masked = true;
        self
    }

    /// The anchored regexp, as shown in errors and documentation.
    #[must_use]
    pub fn anchored_regexp(&self) -> Option<&str> {
        self.compiled.as_ref().map(Regex::as_str)
    }

    #[must_use]
    pub fn max_len(&self) -> Option<usize> {
        self.maxlen
    }

    #[must_use]
    pub fn is_latin1_only(&self) -> bool {
        self.latin1_only
    }

    #[must_use]
    pub fn is_masked(&self) -> bool {
        self.masked
    }

    pub(crate) fn compiled(&self) -> Option<&Regex> {
        self.compiled.as_ref()
    }

    fn compile(mut self, name: &str) -> Result<Self, SchemaError> {
        if let Some(pattern) = &self.regexp {
            let anchored = anchor(pattern);
            let regex = Regex::new(&anchored).map_err(|source| SchemaError::InvalidRegexp {
                name: name.to_string(),
                pattern: pattern.clone(),
                source,
            })?;
            self.compiled = Some(regex);
        }
        Ok(self)
    }
}

/// Wraps `pattern` so it must match the whole string.
fn anchor(pattern: &str) -> String {
    if pattern.starts_with('^') && pattern.ends_with('$') {
        pattern.to_string()
    } else {
        format!("^(?:{pattern})$")
    }
}

/// Declared members of a struct descriptor.
#[derive(Debug, Clone, Default)]
pub struct StructMembers {
    pub mandatory: BTreeMap<String, Arc<TypeDescriptor>>,
    pub optional: BTreeMap<String, Arc<TypeDescriptor>>,
}

impl StructMembers {
    /// The member type for `key`, mandatory or optional.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Arc<TypeDescriptor>> {
        self.mandatory.get(key).or_else(|| self.optional.get(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Arc<TypeDescriptor>)> {
        self.mandatory.iter().chain(self.optional.iter())
    }
}

/// Kind tag plus kind-specific constraints.
#[derive(Debug, Clone)]
pub enum TypeKind {
    String(StringRules),
    /// Optional inclusive `(min, max)` range.
    Integer(Option<(i64, i64)>),
    Boolean,
    Null,
    Enum(Vec<String>),
    /// `YYYY-MM-DDTHH:MM:SS` on the wire.
    DateTime,
    List(Arc<TypeDescriptor>),
    Struct(StructMembers),
    Nullable(Arc<TypeDescriptor>),
}

/// A reusable value type with check, resolve and present behavior.
///
/// Descriptors are immutable after construction and shared through `Arc`.
/// Composite descriptors can only be built from existing descriptors, so
/// the type graph is acyclic.
///
/// # Naming
///
/// | Constructor | Wire name |
/// |-------------|-----------|
/// | `list(elem)` | `<elem>-list` |
/// | `nullable(inner)` | `<inner>\|null` |
/// | every other | as given |
pub struct TypeDescriptor {
    name: String,
    description: Option<String>,
    kind: TypeKind,
    versions: VersionRange,
    lookup: Option<Arc<dyn Lookup>>,
}

impl TypeDescriptor {
    fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind,
            versions: VersionRange::all(),
            lookup: None,
        }
    }

    /// Unconstrained string.
    #[must_use]
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::String(StringRules::new()))
    }

    /// String with constraints.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidRegexp`] if the regexp does not compile.
    pub fn string_with(name: impl Into<String>, rules: StringRules) -> Result<Self, SchemaError> {
        let name = name.into();
        let rules = rules.compile(&name)?;
        Ok(Self::new(name, TypeKind::String(rules)))
    }

    /// Unbounded integer.
    #[must_use]
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Integer(None))
    }

    /// Integer within `[min, max]`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::EmptyRange`] if `min > max`.
    pub fn integer_range(name: impl Into<String>, min: i64, max: i64) -> Result<Self, SchemaError> {
        let name = name.into();
        if min > max {
            return Err(SchemaError::EmptyRange { name, min, max });
        }
        Ok(Self::new(name, TypeKind::Integer(Some((min, max)))))
    }

    #[must_use]
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Boolean)
    }

    #[must_use]
    pub fn null(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Null)
    }

    #[must_use]
    pub fn datetime(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::DateTime)
    }

    /// String restricted to a fixed value set.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::EmptyEnum`] if `values` is empty.
    pub fn enumeration<I, S>(name: impl Into<String>, values: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return Err(SchemaError::EmptyEnum { name });
        }
        Ok(Self::new(name, TypeKind::Enum(values)))
    }

    /// List of `element`, named `<element>-list`.
    #[must_use]
    pub fn list(element: Arc<TypeDescriptor>) -> Self {
        let name = format!("{}-list", element.name);
        Self::new(name, TypeKind::List(element))
    }

    /// `inner` or null, named `<inner>|null`.
    #[must_use]
    pub fn nullable(inner: Arc<TypeDescriptor>) -> Self {
        let name = format!("{}|null", inner.name);
        Self::new(name, TypeKind::Nullable(inner))
    }

    /// Struct with mandatory and optional members.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DuplicateMember`] if a key is both mandatory
    /// and optional, or [`SchemaError::NoCommonVersion`] if the member types
    /// share no API version.
    pub fn structure<M, O, K1, K2>(
        name: impl Into<String>,
        mandatory: M,
        optional: O,
    ) -> Result<Self, SchemaError>
    where
        M: IntoIterator<Item = (K1, Arc<TypeDescriptor>)>,
        O: IntoIterator<Item = (K2, Arc<TypeDescriptor>)>,
        K1: Into<String>,
        K2: Into<String>,
    {
        let name = name.into();
        let members = StructMembers {
            mandatory: mandatory.into_iter().map(|(k, t)| (k.into(), t)).collect(),
            optional: optional.into_iter().map(|(k, t)| (k.into(), t)).collect(),
        };
        if let Some(key) = members
            .mandatory
            .keys()
            .find(|k| members.optional.contains_key(*k))
        {
            return Err(SchemaError::DuplicateMember {
                name,
                key: key.clone(),
            });
        }
        Self::new(name, TypeKind::Struct(members)).validated_versions()
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Restricts the API versions in which this type is valid.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::NoCommonVersion`] if no version is left once
    /// `versions` is intersected with the member types.
    pub fn with_versions(mut self, versions: VersionRange) -> Result<Self, SchemaError> {
        self.versions = versions;
        self.validated_versions()
    }

    fn validated_versions(self) -> Result<Self, SchemaError> {
        match self.versions() {
            Some(range) if !range.is_empty() => Ok(self),
            _ => Err(SchemaError::NoCommonVersion { name: self.name }),
        }
    }

    /// Attaches an application lookup hook.
    #[must_use]
    pub fn with_lookup(mut self, lookup: Arc<dyn Lookup>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    /// Wraps in an `Arc` for sharing.
    #[must_use]
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    #[must_use]
    pub fn declared_versions(&self) -> VersionRange {
        self.versions
    }

    pub(crate) fn lookup_hook(&self) -> Option<&Arc<dyn Lookup>> {
        self.lookup.as_ref()
    }

    #[must_use]
    pub fn has_lookup(&self) -> bool {
        self.lookup.is_some()
    }

    /// Directly referenced member types.
    #[must_use]
    pub fn children(&self) -> Vec<&Arc<TypeDescriptor>> {
        match &self.kind {
            TypeKind::List(inner) | TypeKind::Nullable(inner) => vec![inner],
            TypeKind::Struct(members) => members.iter().map(|(_, t)| t).collect(),
            _ => Vec::new(),
        }
    }

    /// Versions in which this type and every member type are valid.
    #[must_use]
    pub fn versions(&self) -> Option<VersionRange> {
        self.children()
            .into_iter()
            .try_fold(self.versions, |acc, child| acc.intersect(&child.versions()?))
    }

    /// `true` if presenting a value of this type may lose information.
    #[must_use]
    pub fn is_lossy(&self) -> bool {
        match &self.kind {
            TypeKind::String(rules) => rules.masked,
            _ => self.children().into_iter().any(|c| c.is_lossy()),
        }
    }

    /// `true` for the same descriptor, or for list/nullable wrappers built
    /// around the same descriptor.
    #[must_use]
    pub fn same_type(&self, other: &TypeDescriptor) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        match (&self.kind, &other.kind) {
            (TypeKind::List(a), TypeKind::List(b))
            | (TypeKind::Nullable(a), TypeKind::Nullable(b)) => {
                self.versions == other.versions
                    && self.lookup.is_none()
                    && other.lookup.is_none()
                    && a.same_type(b)
            }
            _ => false,
        }
    }

    /// This type followed by every type it references, depth first, each
    /// distinct type once.
    #[must_use]
    pub fn referenced_types(self: &Arc<Self>) -> Vec<Arc<TypeDescriptor>> {
        let mut out: Vec<Arc<TypeDescriptor>> = Vec::new();
        collect(self, &mut out);
        out
    }
}

fn collect(ty: &Arc<TypeDescriptor>, out: &mut Vec<Arc<TypeDescriptor>>) {
    if out.iter().any(|seen| seen.same_type(ty)) {
        return;
    }
    out.push(Arc::clone(ty));
    for child in ty.children() {
        collect(child, out);
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("versions", &self.versions)
            .field("lookup", &self.lookup.is_some())
            .finish()
    }
}
