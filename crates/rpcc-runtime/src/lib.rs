//! Registry, dispatcher and built-in operations for RPCC.
//!
//! # Overview
//!
//! ```text
//! ┌────────────────────── Server ──────────────────────┐
//! │  ServerConfig ─┐                                   │
//! │  DecisionEngine┼──▶ RegistryBuilder ──build──▶ Registry
//! │  builtin ops  ─┘                                   │
//! └───────────────────────────┬────────────────────────┘
//!                             ▼
//!                        Dispatcher::invoke(name, params, CallContext)
//!                             │
//!                             ▼
//!                        Response { result | error }
//! ```
//!
//! # Versioning
//!
//! Every operation is defined for a contiguous range of API versions. A
//! definition with an open range is superseded by the next definition of
//! the same name; bounded ranges must not overlap. Names are compared in
//! their [`capsify`]d form, so `server_ping` and `ServerPing` collide.
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`config`] | [`ServerConfig`](config::ServerConfig), TOML and env loading |
//! | `operation` | [`OperationDefinition`], [`Param`], [`Operation`] |
//! | `registry` | [`RegistryBuilder`], [`Registry`], [`capsify`] |
//! | `dispatcher` | [`Dispatcher`], [`Request`], [`Response`] |
//! | `documentation` | [`FunctionDoc`], [`function_as_text`] |
//! | `builtin` | `server_*` introspection operations |
//!
//! # Example
//!
//! ```
//! use rpcc_runtime::config::ServerConfig;
//! use rpcc_runtime::{OperationDefinition, Param, Server};
//! use rpcc_auth::CallContext;
//! use rpcc_types::Value;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let mut server = Server::new(ServerConfig::default()).unwrap();
//! let int = Arc::clone(&server.types().integer);
//! let add = |call: &CallContext| -> anyhow::Result<Value> {
//!     let a = call.param("a").and_then(Value::as_i64).unwrap_or(0);
//!     let b = call.param("b").and_then(Value::as_i64).unwrap_or(0);
//!     Ok(Value::Integer(a + b))
//! };
//! server
//!     .register_operation(
//!         OperationDefinition::new("add", Arc::clone(&int), add)
//!             .with_param(Param::new("a", Arc::clone(&int)))
//!             .with_param(Param::new("b", int)),
//!     )
//!     .unwrap();
//!
//! let dispatcher = server.start().unwrap();
//! let response = dispatcher.invoke("add", &[json!(2), json!(3)], dispatcher.context(0));
//! assert_eq!(response.result(), Some(&json!(5)));
//! ```

mod builtin;
pub mod config;
mod dispatcher;
mod documentation;
mod operation;
mod registry;
mod server;

pub use dispatcher::{Dispatcher, Request, Response};
pub use documentation::{function_as_text, FunctionDoc};
pub use operation::{Operation, OperationDefinition, Param};
pub use registry::{capsify, Registry, RegistryBuilder, RegistryError, MAX_API_VERSION};
pub use server::Server;
