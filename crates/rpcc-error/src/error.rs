//! Classified error instances.

use crate::kinds;
use crate::{ErrorKind, ErrorStruct};
use rpcc_types::WireValue;
use thiserror::Error;
use uuid::Uuid;

/// A classified failure on its way to the caller.
///
/// Created at the point of failure and annotated while it propagates:
///
/// - [`add_traceback`](Self::add_traceback) prepends a location entry
///   (struct key, list index, parameter index), so the finished trace reads
///   outermost first.
/// - [`set_argno`](Self::set_argno) records which positional parameter
///   failed.
///
/// `detail` is server-side only. It is logged but never serialized.
///
/// # Example
///
/// ```
/// use rpcc_error::RpcError;
///
/// let mut err = RpcError::incomplete_struct("b");
/// err.add_traceback("inner");
/// err.add_traceback("outer");
/// err.set_argno(0);
///
/// let wire = err.to_struct();
/// assert_eq!(wire.name, "ValueError::MalformedStruct::IncompleteStruct");
/// assert_eq!(wire.traceback, vec!["outer", "inner"]);
/// assert_eq!(wire.argno, Some(0));
/// assert!(wire.desc.contains('b'));
/// ```
#[derive(Debug, Clone, Error)]
#[error("{}: {}", .kind.wire_name(), .desc)]
pub struct RpcError {
    kind: &'static ErrorKind,
    id: String,
    desc: String,
    value: Option<WireValue>,
    argno: Option<usize>,
    traceback: Vec<String>,
    detail: Option<String>,
}

impl RpcError {
    /// Creates an error of `kind` with the kind's default description.
    #[must_use]
    pub fn new(kind: &'static ErrorKind) -> Self {
        Self {
            kind,
            id: new_error_id(),
            desc: kind.desc().to_string(),
            value: None,
            argno: None,
            traceback: Vec::new(),
            detail: None,
        }
    }

    /// Replaces the description.
    #[must_use]
    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = desc.into();
        self
    }

    /// Attaches the offending raw value.
    #[must_use]
    pub fn with_value(mut self, value: impl Into<WireValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Attaches a server-side diagnostic.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Builder form of [`add_traceback`](Self::add_traceback).
    #[must_use]
    pub fn traced(mut self, entry: impl Into<String>) -> Self {
        self.add_traceback(entry);
        self
    }

    /// Prepends a trace entry.
    pub fn add_traceback(&mut self, entry: impl Into<String>) {
        self.traceback.insert(0, entry.into());
    }

    /// Records the failing positional parameter.
    pub fn set_argno(&mut self, argno: usize) {
        self.argno = Some(argno);
    }

    #[must_use]
    pub fn kind(&self) -> &'static ErrorKind {
        self.kind
    }

    /// Correlation id, twelve decimal digits.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn desc(&self) -> &str {
        &self.desc
    }

    #[must_use]
    pub fn value(&self) -> Option<&WireValue> {
        self.value.as_ref()
    }

    #[must_use]
    pub fn argno(&self) -> Option<usize> {
        self.argno
    }

    #[must_use]
    pub fn traceback(&self) -> &[String] {
        &self.traceback
    }

    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Returns `true` if this error's kind is `kind` or descends from it.
    #[must_use]
    pub fn is_a(&self, kind: &ErrorKind) -> bool {
        self.kind.is_a(kind)
    }

    /// Returns `true` for InternalError and its sub-kinds.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        self.is_a(&kinds::INTERNAL_ERROR)
    }

    /// Serializes into the wire error struct.
    #[must_use]
    pub fn to_struct(&self) -> ErrorStruct {
        let namelist: Vec<String> = self.kind.path().into_iter().map(String::from).collect();
        ErrorStruct {
            name: namelist.join("::"),
            namelist,
            id: self.id.clone(),
            desc: self.desc.clone(),
            value: self.value.clone(),
            traceback: self.traceback.clone(),
            argno: self.argno,
        }
    }
}

// === Constructors for built-in kinds ===

impl RpcError {
    #[must_use]
    pub fn unhandled_characters() -> Self {
        Self::new(&kinds::UNHANDLED_CHARACTERS)
    }

    #[must_use]
    pub fn string_too_long(maxlen: usize) -> Self {
        Self::new(&kinds::STRING_TOO_LONG).with_desc(format!(
            "The string exceeds the maximum length for this type, which is {maxlen} characters."
        ))
    }

    #[must_use]
    pub fn regexp_mismatch(regexp: &str) -> Self {
        Self::new(&kinds::REGEXP_MISMATCH).with_desc(format!(
            "The string did not match the regexp for this type, which is '{regexp}'."
        ))
    }

    #[must_use]
    pub fn string_not_in_enum<S: AsRef<str>>(valid: &[S]) -> Self {
        let listed: Vec<&str> = valid.iter().map(AsRef::as_ref).collect();
        Self::new(&kinds::STRING_NOT_IN_ENUM).with_desc(format!(
            "The string is not among the valid values: {}",
            listed.join(", ")
        ))
    }

    #[must_use]
    pub fn integer_out_of_range(min: i64, max: i64) -> Self {
        Self::new(&kinds::INTEGER_OUT_OF_RANGE)
            .with_desc(format!("Integer out of range for this type, which is {min}-{max}"))
    }

    #[must_use]
    pub fn incomplete_struct(key: &str) -> Self {
        Self::new(&kinds::INCOMPLETE_STRUCT).with_desc(format!(
            "Struct is incomplete, the mandatory key {key} is missing"
        ))
    }

    /// The offending key is carried as the error's value.
    #[must_use]
    pub fn unknown_struct_key(key: &str) -> Self {
        Self::new(&kinds::UNKNOWN_STRUCT_KEY).with_value(key)
    }

    #[must_use]
    pub fn no_such_function(name: &str) -> Self {
        Self::new(&kinds::NO_SUCH_FUNCTION).with_value(name)
    }

    #[must_use]
    pub fn no_such_api_version(version: i64) -> Self {
        Self::new(&kinds::NO_SUCH_API_VERSION).with_value(version)
    }

    #[must_use]
    pub fn argument_count(expected: usize, got: usize) -> Self {
        Self::new(&kinds::ARGUMENT_COUNT).with_desc(format!(
            "The function takes {expected} argument(s), {got} given."
        ))
    }

    #[must_use]
    pub fn authentication_failed() -> Self {
        Self::new(&kinds::AUTHENTICATION_FAILED)
    }

    /// Access denied by `guard`. The guard name stays server side.
    #[must_use]
    pub fn access_denied(guard: &str) -> Self {
        Self::new(&kinds::ACCESS_DENIED).with_detail(format!("denied by guard {guard}"))
    }

    /// An unexpected defect. `detail` is logged, never returned.
    #[must_use]
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(&kinds::INTERNAL_ERROR).with_detail(detail)
    }

    /// An output conversion failure, wire-identical to InternalError.
    #[must_use]
    pub fn output(detail: impl Into<String>) -> Self {
        Self::new(&kinds::OUTPUT_ERROR).with_detail(detail)
    }
}

/// Twelve random decimal digits derived from a v4 UUID.
fn new_error_id() -> String {
    let n = Uuid::new_v4().as_u128() % 1_000_000_000_000;
    format!("{n:012}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_description_comes_from_kind() {
        let err = RpcError::authentication_failed();
        assert_eq!(err.desc(), "Authentication failed.");
        assert!(err.is_a(&kinds::RUNTIME_ERROR));
    }

    #[test]
    fn id_is_twelve_digits() {
        for _ in 0..32 {
            let err = RpcError::new(&kinds::VALUE_ERROR);
            assert_eq!(err.id().len(), 12);
            assert!(err.id().chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn ids_differ() {
        let a = RpcError::internal("x");
        let b = RpcError::internal("x");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn traceback_is_prepended() {
        let err = RpcError::unknown_struct_key("z")
            .traced("host")
            .traced("options");
        assert_eq!(err.traceback(), ["options", "host"]);
        assert_eq!(err.value(), Some(&json!("z")));
    }

    #[test]
    fn parameterized_descriptions() {
        assert!(RpcError::string_too_long(8).desc().contains("8 characters"));
        assert!(RpcError::regexp_mismatch("^a$").desc().contains("'^a$'"));
        assert!(RpcError::integer_out_of_range(1, 10).desc().ends_with("1-10"));
        assert!(RpcError::string_not_in_enum(&["a", "b"])
            .desc()
            .ends_with("a, b"));
        assert!(RpcError::incomplete_struct("b").desc().contains(" b "));
    }

    #[test]
    fn access_denied_keeps_guard_server_side() {
        let err = RpcError::access_denied("superuser");
        assert_eq!(err.desc(), "Access not allowed.");
        assert!(err.detail().is_some_and(|d| d.contains("superuser")));

        let wire = serde_json::to_value(err.to_struct()).expect("should serialize");
        assert!(!wire.to_string().contains("superuser"));
    }

    #[test]
    fn output_error_is_internal_on_the_wire() {
        let err = RpcError::output("bad return");
        assert!(err.is_internal());
        assert_eq!(err.to_struct().name, "InternalError");
        assert_eq!(err.to_struct().namelist, vec!["InternalError"]);
    }

    #[test]
    fn display_uses_wire_name() {
        let err = RpcError::no_such_function("fooBar");
        assert!(err.to_string().starts_with("LookupError::NoSuchFunction: "));
    }
}
