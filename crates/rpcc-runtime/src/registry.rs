//! Versioned operation registry.
//!
//! # Lifecycle
//!
//! ```text
//! RegistryBuilder ──register_operation()──▶ (fail fast on overlap)
//!        │          register_type()
//!        ▼
//!     build() ──▶ Registry (immutable, shared behind Arc)
//!                   │
//!                   ├─ version 0: { name → definition, type name → descriptor }
//!                   ├─ version 1: ...
//!                   └─ version N = highest version any definition mentions
//! ```
//!
//! # Supersession
//!
//! Definitions sharing a canonical name are ordered by their first
//! version. An open-ended definition ends where the next one begins, so a
//! new version inherits every operation of the previous one except those
//! redefined from that version on. Explicitly bounded ranges that overlap
//! are rejected at registration.
//!
//! The result depends only on the set of definitions, never on the order
//! in which they were registered.

use crate::operation::OperationDefinition;
use rpcc_error::RpcError;
use rpcc_schema::{SchemaError, TypeDescriptor};
use rpcc_types::{ApiVersion, VersionRange};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Highest API version a definition may mention. One dispatch table is
/// built per version, so this bounds startup work.
pub const MAX_API_VERSION: ApiVersion = 1024;

/// A startup configuration defect. Never returned to callers.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("operation has an empty name")]
    EmptyName,

    #[error("operation {name}: empty version range {versions}")]
    EmptyRange { name: String, versions: VersionRange },

    #[error("operation {name}: version range {versions} goes past {max}")]
    VersionTooHigh {
        name: String,
        versions: VersionRange,
        max: ApiVersion,
    },

    #[error("operation {name}: mandatory parameter '{param}' follows an optional one")]
    OptionalBeforeMandatory { name: String, param: String },

    #[error("operation {name}: parameter '{param}' declared twice")]
    DuplicateParam { name: String, param: String },

    /// Two definitions of one canonical name claim a common version.
    #[error("{first} {first_versions} and {second} {second_versions} both define '{canonical}'")]
    Overlap {
        canonical: String,
        first: String,
        first_versions: VersionRange,
        second: String,
        second_versions: VersionRange,
    },

    /// An operation is visible in a version where one of its types is not.
    #[error("operation {function}: type {type_name} is not valid in version {version}")]
    TypeNotAvailable {
        function: String,
        type_name: String,
        version: ApiVersion,
    },

    /// Two different descriptors share a wire name within one version.
    #[error("two different types are named {type_name} in version {version}")]
    TypeConflict {
        type_name: String,
        version: ApiVersion,
    },

    /// Registration attempted after the server started.
    #[error("registration is closed once the server has started")]
    RegistrationClosed,

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Canonical studlyCaps form of an operation name.
///
/// `_`, `-` and `.` split words, as does a lower-to-upper case change.
/// An acronym followed by a word splits before the word's capital. The
/// first word is lowercase, the rest are capitalized.
///
/// ```
/// use rpcc_runtime::capsify;
///
/// assert_eq!(capsify("server_list_functions"), "serverListFunctions");
/// assert_eq!(capsify("serverListFunctions"), "serverListFunctions");
/// assert_eq!(capsify("HTTPServer"), "httpServer");
/// ```
#[must_use]
pub fn capsify(name: &str) -> String {
    if name == "_" {
        return "X".to_string();
    }
    let chars: Vec<char> = name.chars().collect();
    let mut parts: Vec<String> = vec![String::new()];
    for (idx, &c) in chars.iter().enumerate() {
        if matches!(c, '_' | '-' | '.') {
            parts.push(String::new());
            continue;
        }
        let next = chars.get(idx + 1).copied();
        let after = chars.get(idx + 2).copied();
        let current = parts.len() - 1;
        if c.is_uppercase()
            && next.is_some_and(char::is_uppercase)
            && after.is_some_and(char::is_lowercase)
        {
            parts[current].extend(c.to_lowercase());
            parts.push(String::new());
        } else if c.is_lowercase() && next.is_some_and(char::is_uppercase) {
            parts[current].push(c);
            parts.push(String::new());
        } else {
            parts[current].extend(c.to_lowercase());
        }
    }

    let mut out = parts[0].clone();
    for part in &parts[1..] {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

/// `true` if two definitions of one name may coexist.
fn compatible(a: &VersionRange, b: &VersionRange) -> bool {
    let (early, late) = if a.from <= b.from { (a, b) } else { (b, a) };
    if early.from == late.from {
        return false;
    }
    match early.to {
        None => true,
        Some(to) => to < late.from,
    }
}

/// Collects definitions before serving starts.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    operations: BTreeMap<String, Vec<Arc<OperationDefinition>>>,
    types: Vec<Arc<TypeDescriptor>>,
}

impl RegistryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a definition.
    ///
    /// # Errors
    ///
    /// Fails on an empty name or version range, a version above
    /// [`MAX_API_VERSION`], badly ordered or repeated parameters, or a
    /// version overlap with an existing definition of the same canonical
    /// name.
    pub fn register_operation(
        &mut self,
        def: OperationDefinition,
    ) -> Result<(), RegistryError> {
        let canonical = capsify(def.name());
        if canonical.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        let versions = def.declared_versions();
        if versions.is_empty() {
            return Err(RegistryError::EmptyRange {
                name: def.name().to_string(),
                versions,
            });
        }
        if versions.from > MAX_API_VERSION || versions.to.is_some_and(|to| to > MAX_API_VERSION) {
            return Err(RegistryError::VersionTooHigh {
                name: def.name().to_string(),
                versions,
                max: MAX_API_VERSION,
            });
        }
        let mut seen_optional = false;
        for (idx, param) in def.params().iter().enumerate() {
            if param.is_mandatory() && seen_optional {
                return Err(RegistryError::OptionalBeforeMandatory {
                    name: def.name().to_string(),
                    param: param.name().to_string(),
                });
            }
            seen_optional |= !param.is_mandatory();
            if def.params()[..idx].iter().any(|p| p.name() == param.name()) {
                return Err(RegistryError::DuplicateParam {
                    name: def.name().to_string(),
                    param: param.name().to_string(),
                });
            }
        }

        let existing = self.operations.entry(canonical.clone()).or_default();
        if let Some(other) = existing
            .iter()
            .find(|other| !compatible(&other.declared_versions(), &versions))
        {
            return Err(RegistryError::Overlap {
                canonical,
                first: other.name().to_string(),
                first_versions: other.declared_versions(),
                second: def.name().to_string(),
                second_versions: versions,
            });
        }
        tracing::debug!(operation = %def.name(), versions = %versions, "registered operation");
        existing.push(Arc::new(def));
        Ok(())
    }

    /// Adds a type to the documented type set of every version it is
    /// valid in, whether or not an operation references it.
    pub fn register_type(&mut self, ty: Arc<TypeDescriptor>) {
        self.types.push(ty);
    }

    /// Number of registered definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Freezes the registry.
    ///
    /// # Errors
    ///
    /// Fails if an operation is visible in a version one of its types does
    /// not cover, or if two different types share a name in one version.
    pub fn build(self) -> Result<Registry, RegistryError> {
        let max_version = self
            .operations
            .values()
            .flatten()
            .map(|def| {
                let v = def.declared_versions();
                v.to.unwrap_or(v.from).max(v.from)
            })
            .max()
            .unwrap_or(0);

        let mut tables: Vec<VersionTable> = (0..=max_version)
            .map(|_| VersionTable::default())
            .collect();
        let mut effective = Vec::new();

        for (canonical, mut defs) in self.operations {
            defs.sort_by_key(|def| def.declared_versions().from);
            let starts: Vec<ApiVersion> =
                defs.iter().map(|d| d.declared_versions().from).collect();
            for (idx, def) in defs.into_iter().enumerate() {
                let declared = def.declared_versions();
                let effective_to = declared
                    .to
                    .or_else(|| starts.get(idx + 1).map(|next| next.saturating_sub(1)));
                let to = effective_to.unwrap_or(max_version);
                let range = VersionRange::new(declared.from, effective_to);

                let types = def.referenced_types();
                for ty in &types {
                    let covered = ty.versions();
                    let missing = (range.from..=to)
                        .find(|v| !covered.is_some_and(|c| c.contains(*v)));
                    if let Some(version) = missing {
                        return Err(RegistryError::TypeNotAvailable {
                            function: def.name().to_string(),
                            type_name: ty.name().to_string(),
                            version,
                        });
                    }
                }
                for version in range.from..=to {
                    let table = &mut tables[version as usize];
                    for ty in &types {
                        table.add_type(version, ty)?;
                    }
                    table.operations.insert(canonical.clone(), Arc::clone(&def));
                }
                effective.push((Arc::clone(&def), range));
            }
        }

        for root in &self.types {
            for ty in root.referenced_types() {
                let Some(covered) = ty.versions() else { continue };
                for (version, table) in tables.iter_mut().enumerate() {
                    let version = version as ApiVersion;
                    if covered.contains(version) {
                        table.add_type(version, &ty)?;
                    }
                }
            }
        }

        tracing::info!(
            max_version,
            operations = effective.len(),
            "operation registry built"
        );
        Ok(Registry {
            tables,
            effective,
        })
    }
}

#[derive(Debug, Default)]
struct VersionTable {
    operations: BTreeMap<String, Arc<OperationDefinition>>,
    types: BTreeMap<String, Arc<TypeDescriptor>>,
}

impl VersionTable {
    fn add_type(
        &mut self,
        version: ApiVersion,
        ty: &Arc<TypeDescriptor>,
    ) -> Result<(), RegistryError> {
        match self.types.get(ty.name()) {
            Some(existing) if existing.same_type(ty) => Ok(()),
            Some(_) => Err(RegistryError::TypeConflict {
                type_name: ty.name().to_string(),
                version,
            }),
            None => {
                self.types.insert(ty.name().to_string(), Arc::clone(ty));
                Ok(())
            }
        }
    }
}

/// Immutable operation registry, shared read-only by every call.
#[derive(Debug)]
pub struct Registry {
    tables: Vec<VersionTable>,
    effective: Vec<(Arc<OperationDefinition>, VersionRange)>,
}

impl Registry {
    /// Highest API version.
    #[must_use]
    pub fn max_version(&self) -> ApiVersion {
        (self.tables.len() - 1) as ApiVersion
    }

    /// All versions, 0 through [`max_version`](Self::max_version).
    pub fn versions(&self) -> impl Iterator<Item = ApiVersion> {
        0..=self.max_version()
    }

    #[must_use]
    pub fn has_version(&self, version: ApiVersion) -> bool {
        (version as usize) < self.tables.len()
    }

    fn table(&self, version: ApiVersion) -> Result<&VersionTable, RpcError> {
        self.tables
            .get(version as usize)
            .ok_or_else(|| RpcError::no_such_api_version(i64::from(version)))
    }

    /// The definition of `name` visible in `version`.
    ///
    /// # Errors
    ///
    /// `LookupError::NoSuchAPIVersion` for an unknown version and
    /// `LookupError::NoSuchFunction` when `name` is not visible in it.
    pub fn resolve(
        &self,
        name: &str,
        version: ApiVersion,
    ) -> Result<&Arc<OperationDefinition>, RpcError> {
        self.table(version)?
            .operations
            .get(&capsify(name))
            .ok_or_else(|| RpcError::no_such_function(name))
    }

    /// `true` if `name` is visible in `version`.
    #[must_use]
    pub fn has_operation(&self, name: &str, version: ApiVersion) -> bool {
        self.resolve(name, version).is_ok()
    }

    /// Every definition in `version`, hidden ones included.
    pub fn operations(
        &self,
        version: ApiVersion,
    ) -> impl Iterator<Item = &Arc<OperationDefinition>> {
        self.tables
            .get(version as usize)
            .into_iter()
            .flat_map(|t| t.operations.values())
    }

    /// Names of the visible operations in `version`, sorted.
    #[must_use]
    pub fn visible_operation_names(&self, version: ApiVersion) -> Vec<String> {
        let mut names: Vec<String> = self
            .operations(version)
            .filter(|def| def.is_visible())
            .map(|def| def.name().to_string())
            .collect();
        names.sort();
        names
    }

    /// Every type referenced in `version`, by wire name.
    pub fn types(&self, version: ApiVersion) -> impl Iterator<Item = &Arc<TypeDescriptor>> {
        self.tables
            .get(version as usize)
            .into_iter()
            .flat_map(|t| t.types.values())
    }

    /// The versions in which `def` is actually visible. An open range stays
    /// open unless a later definition of the same name truncates it.
    #[must_use]
    pub fn effective_versions(&self, def: &OperationDefinition) -> Option<VersionRange> {
        self.effective
            .iter()
            .find(|(d, _)| std::ptr::eq(d.as_ref(), def))
            .map(|(_, range)| *range)
    }
}
