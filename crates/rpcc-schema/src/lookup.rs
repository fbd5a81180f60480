//! Application leaf hooks.

use rpcc_auth::CallContext;
use rpcc_error::RpcError;
use rpcc_types::Value;

/// Turns a checked scalar into an application value and back.
///
/// Attached to a scalar descriptor with
/// [`TypeDescriptor::with_lookup`](crate::TypeDescriptor::with_lookup). On
/// input the descriptor's own constraints run first and `lookup` receives
/// the already-validated value; on output `output` runs first and the
/// descriptor's present-side checks apply to what it returns.
///
/// # Example
///
/// ```
/// use rpcc_auth::CallContext;
/// use rpcc_error::{kinds, RpcError};
/// use rpcc_schema::Lookup;
/// use rpcc_types::Value;
///
/// /// Maps user names to numeric ids.
/// struct UserIds;
///
/// impl Lookup for UserIds {
///     fn lookup(&self, value: Value, _call: &CallContext) -> Result<Value, RpcError> {
///         match value.as_str() {
///             Some("root") => Ok(Value::Integer(0)),
///             _ => Err(RpcError::new(&kinds::LOOKUP_ERROR).with_desc("No such user.")),
///         }
///     }
///
///     fn output(&self, value: &Value, _call: &CallContext) -> Result<Value, RpcError> {
///         match value.as_i64() {
///             Some(0) => Ok(Value::from("root")),
///             _ => Err(RpcError::internal("unknown user id")),
///         }
///     }
/// }
/// ```
pub trait Lookup: Send + Sync {
    /// Resolves a constraint-checked value. Failures propagate unchanged,
    /// typically as LookupError kinds.
    ///
    /// # Errors
    ///
    /// Returns the classified failure when the referent cannot be loaded.
    fn lookup(&self, value: Value, call: &CallContext) -> Result<Value, RpcError>;

    /// Inverse of [`lookup`](Self::lookup). Failures surface as
    /// InternalError.
    ///
    /// # Errors
    ///
    /// Returns an error when the value cannot be represented.
    fn output(&self, value: &Value, call: &CallContext) -> Result<Value, RpcError>;
}
