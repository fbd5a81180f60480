//! Error taxonomy for RPCC.
//!
//! Every failure a caller can see is an [`RpcError`]: an instance of one
//! [`ErrorKind`] in a closed tree, plus the per-instance data the wire
//! struct needs.
//!
//! # Kinds and Paths
//!
//! Kinds are `static` nodes with an explicit parent reference and a
//! visibility flag. A kind's wire path lists the visible ancestors from
//! just below the root down to itself:
//!
//! ```
//! use rpcc_error::kinds;
//!
//! assert_eq!(kinds::ACCESS_DENIED.path(), vec!["RuntimeError", "AccessDenied"]);
//! assert_eq!(kinds::ACCESS_DENIED.wire_name(), "RuntimeError::AccessDenied");
//! ```
//!
//! Callers may match on the leaf name or on any ancestor in the list.
//!
//! # Top-Level Kinds
//!
//! | Kind | Meaning |
//! |------|---------|
//! | `ValueError` | malformed input (regexp, range, enum, struct keys) |
//! | `LookupError` | referenced entity absent |
//! | `TypeError` | wrong structural shape, wrong argument count |
//! | `RuntimeError` | authorization and environment (AccessDenied, AuthenticationFailed) |
//! | `InternalError` | unexpected defect, never detailed to the caller |
//!
//! # Wire Form
//!
//! [`RpcError::to_struct`] produces the [`ErrorStruct`] every transport
//! serializes. Server-side detail ([`RpcError::detail`]) is never part of
//! it.

mod error;
mod kind;
pub mod kinds;
mod wire;

pub use error::RpcError;
pub use kind::ErrorKind;
pub use wire::ErrorStruct;

/// Result alias for operations that fail with a classified error.
pub type RpcResult<T> = Result<T, RpcError>;
