//! Type descriptors for RPCC.
//!
//! A [`TypeDescriptor`] describes one wire type and carries the three steps
//! every parameter and return value goes through:
//!
//! | Step | Input | Output | Failure kinds |
//! |------|-------|--------|---------------|
//! | [`check`](TypeDescriptor::check) | wire JSON | `()` | TypeError |
//! | [`resolve`](TypeDescriptor::resolve) | wire JSON | [`Value`](rpcc_types::Value) | ValueError, LookupError |
//! | [`present`](TypeDescriptor::present) | [`Value`](rpcc_types::Value) | wire JSON | InternalError |
//!
//! # Kinds
//!
//! ```text
//!   scalars:    string  integer  boolean  null  enum  datetime
//!   composites: list(T)  nullable(T)  struct{mandatory, optional}
//!   leaves:     any scalar + Lookup hook
//! ```
//!
//! Composites are built from existing `Arc<TypeDescriptor>`s, so the type
//! graph cannot contain cycles.
//!
//! # Example
//!
//! ```
//! use rpcc_auth::{CallContext, DecisionEngine};
//! use rpcc_schema::TypeDescriptor;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let port = TypeDescriptor::integer_range("port", 1, 65535).unwrap().shared();
//! let ports = TypeDescriptor::list(port);
//! let call = CallContext::new(Arc::new(DecisionEngine::new()), 0);
//!
//! let raw = json!([22, 80]);
//! ports.check(&raw).unwrap();
//! let value = ports.resolve(&raw, &call).unwrap();
//! assert_eq!(ports.present(&value, &call).unwrap(), raw);
//!
//! let err = ports.resolve(&json!([22, 0]), &call).unwrap_err();
//! assert_eq!(err.traceback(), ["1"]);
//! ```

mod descriptor;
mod doc;
mod error;
mod lookup;
mod pipeline;
mod standard;

pub use descriptor::{StringRules, StructMembers, TypeDescriptor, TypeKind};
pub use doc::{BaseKind, DocParameter, DocTypes, TypeDoc};
pub use error::SchemaError;
pub use lookup::Lookup;
pub use pipeline::{DATETIME_FORMAT, DATETIME_REGEXP, MASK};
pub use standard::StandardTypes;
