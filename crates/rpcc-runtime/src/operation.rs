//! Operation definitions.

use rpcc_auth::{CallContext, GuardRef};
use rpcc_schema::TypeDescriptor;
use rpcc_types::{Value, VersionRange};
use std::fmt;
use std::sync::Arc;

/// The body of an operation.
///
/// Bound parameters are read from the call with
/// [`CallContext::param`]. Return [`RpcError`](rpcc_error::RpcError) (via
/// `anyhow`) for caller-visible failures; any other error is reported as
/// InternalError.
///
/// Implemented for closures:
///
/// ```
/// use rpcc_auth::CallContext;
/// use rpcc_runtime::Operation;
/// use rpcc_types::Value;
///
/// fn takes(_: impl Operation) {}
///
/// takes(|call: &CallContext| -> anyhow::Result<Value> {
///     Ok(call.param("name").cloned().unwrap_or(Value::Null))
/// });
/// ```
pub trait Operation: Send + Sync {
    /// Runs the operation.
    ///
    /// # Errors
    ///
    /// Any failure; see the trait documentation for classification.
    fn call(&self, call: &CallContext) -> anyhow::Result<Value>;
}

impl<F> Operation for F
where
    F: Fn(&CallContext) -> anyhow::Result<Value> + Send + Sync,
{
    fn call(&self, call: &CallContext) -> anyhow::Result<Value> {
        self(call)
    }
}

/// A declared positional parameter.
#[derive(Debug, Clone)]
pub struct Param {
    name: String,
    ty: Arc<TypeDescriptor>,
    mandatory: bool,
    description: Option<String>,
}

impl Param {
    #[must_use]
    pub fn new(name: impl Into<String>, ty: Arc<TypeDescriptor>) -> Self {
        Self {
            name: name.into(),
            ty,
            mandatory: true,
            description: None,
        }
    }

    /// A trailing parameter the caller may omit.
    #[must_use]
    pub fn optional(name: impl Into<String>, ty: Arc<TypeDescriptor>) -> Self {
        Self {
            mandatory: false,
            ..Self::new(name, ty)
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn ty(&self) -> &Arc<TypeDescriptor> {
        &self.ty
    }

    #[must_use]
    pub fn is_mandatory(&self) -> bool {
        self.mandatory
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// A registered, versioned, typed operation.
///
/// # Example
///
/// ```
/// use rpcc_auth::CallContext;
/// use rpcc_runtime::{OperationDefinition, Param};
/// use rpcc_schema::TypeDescriptor;
/// use rpcc_types::{Value, VersionRange};
///
/// let string = TypeDescriptor::string("string").shared();
/// let echo = OperationDefinition::new(
///     "echo",
///     string.clone(),
///     |call: &CallContext| -> anyhow::Result<Value> {
///         Ok(call.param("text").cloned().unwrap_or(Value::Null))
///     },
/// )
/// .with_param(Param::new("text", string))
/// .with_versions(VersionRange::from_version(1))
/// .with_description("Returns its argument.");
///
/// assert_eq!(echo.name(), "echo");
/// assert_eq!(echo.params().len(), 1);
/// ```
#[derive(Clone)]
pub struct OperationDefinition {
    name: String,
    params: Vec<Param>,
    returns: Arc<TypeDescriptor>,
    description: Option<String>,
    versions: VersionRange,
    guard: Option<GuardRef>,
    visible: bool,
    body: Arc<dyn Operation>,
}

impl OperationDefinition {
    /// Open-ended from version 0, unguarded and visible.
    pub fn new(
        name: impl Into<String>,
        returns: Arc<TypeDescriptor>,
        body: impl Operation + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            returns,
            description: None,
            versions: VersionRange::all(),
            guard: None,
            visible: true,
            body: Arc::new(body),
        }
    }

    #[must_use]
    pub fn with_param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_versions(mut self, versions: VersionRange) -> Self {
        self.versions = versions;
        self
    }

    /// Requires `guard` to grant before the body runs.
    #[must_use]
    pub fn with_guard(mut self, guard: GuardRef) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Callable, but left out of `server_list_functions`.
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Number of parameters the caller must pass.
    #[must_use]
    pub fn mandatory_count(&self) -> usize {
        self.params.iter().filter(|p| p.mandatory).count()
    }

    #[must_use]
    pub fn returns(&self) -> &Arc<TypeDescriptor> {
        &self.returns
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Versions as declared. The registry may end an open range earlier
    /// when a later definition supersedes it.
    #[must_use]
    pub fn declared_versions(&self) -> VersionRange {
        self.versions
    }

    #[must_use]
    pub fn guard(&self) -> Option<&GuardRef> {
        self.guard.as_ref()
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub(crate) fn body(&self) -> &dyn Operation {
        self.body.as_ref()
    }

    /// Every descriptor referenced by parameters and return type.
    #[must_use]
    pub fn referenced_types(&self) -> Vec<Arc<TypeDescriptor>> {
        let mut out: Vec<Arc<TypeDescriptor>> = Vec::new();
        let roots = self.params.iter().map(|p| &p.ty).chain(std::iter::once(&self.returns));
        for root in roots {
            for ty in root.referenced_types() {
                if !out.iter().any(|seen| seen.same_type(&ty)) {
                    out.push(ty);
                }
            }
        }
        out
    }
}

impl fmt::Debug for OperationDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationDefinition")
            .field("name", &self.name)
            .field("params", &self.params.iter().map(Param::name).collect::<Vec<_>>())
            .field("returns", &self.returns.name())
            .field("versions", &self.versions)
            .field("guard", &self.guard.as_ref().map(GuardRef::name))
            .field("visible", &self.visible)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &CallContext) -> anyhow::Result<Value> {
        Ok(Value::Null)
    }

    #[test]
    fn mandatory_count_skips_optional_params() {
        let int = TypeDescriptor::integer("integer").shared();
        let def = OperationDefinition::new("f", TypeDescriptor::null("null").shared(), noop)
            .with_param(Param::new("a", int.clone()))
            .with_param(Param::optional("b", int));
        assert_eq!(def.params().len(), 2);
        assert_eq!(def.mandatory_count(), 1);
    }

    #[test]
    fn referenced_types_dedup_across_params() {
        let int = TypeDescriptor::integer("integer").shared();
        let def = OperationDefinition::new(
            "sum",
            int.clone(),
            noop,
        )
        .with_param(Param::new("a", int.clone()))
        .with_param(Param::new("bs", TypeDescriptor::list(int).shared()));

        let names: Vec<String> = def
            .referenced_types()
            .iter()
            .map(|t| t.name().to_string())
            .collect();
        assert_eq!(names, vec!["integer", "integer-list"]);
    }

    #[test]
    fn defaults() {
        let def = OperationDefinition::new("f", TypeDescriptor::null("null").shared(), noop);
        assert!(def.is_visible());
        assert!(def.guard().is_none());
        assert_eq!(def.declared_versions(), VersionRange::all());
        assert!(!def.clone().hidden().is_visible());
    }
}
