//! Core types for RPCC.
//!
//! This crate holds the vocabulary shared by every layer of the
//! request-processing pipeline and has no dependency on any of them.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  rpcc-types   : IDs, Principal, VersionRange, Value  ◄ HERE │
//! │  rpcc-error   : ErrorKind tree, RpcError, ErrorStruct       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  rpcc-auth    : DecisionEngine, Guard, CallContext          │
//! │  rpcc-schema  : TypeDescriptor (check / resolve / present)  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  rpcc-runtime : Registry, Dispatcher, builtin operations    │
//! │  rpcc-cli     : stdio driver                                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Two Value Spaces
//!
//! | Space | Type | Produced by |
//! |-------|------|-------------|
//! | Wire | [`WireValue`] (`serde_json::Value`) | the transport collaborator |
//! | Internal | [`Value`] | `TypeDescriptor::resolve` |
//!
//! Conversion between the two only ever happens inside the type system.
//!
//! # Example
//!
//! ```
//! use rpcc_types::{CallId, Principal, Value, VersionRange};
//!
//! let call = CallId::new();
//! assert_ne!(call, CallId::new());
//!
//! let caller = Principal::user("alice");
//! assert_eq!(caller.user_name(), Some("alice"));
//!
//! let range = VersionRange::from_version(2);
//! assert!(range.contains(7));
//! assert!(!range.contains(1));
//!
//! let v = Value::from("hello");
//! assert_eq!(v.as_str(), Some("hello"));
//! ```

mod id;
mod principal;
mod value;
mod version;

pub use id::CallId;
pub use principal::Principal;
pub use value::{Entity, Value};
pub use version::{ApiVersion, VersionRange};

/// The wire-side value space shared with the transport collaborator.
pub type WireValue = serde_json::Value;
