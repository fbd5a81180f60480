//! Call dispatch.
//!
//! # Flow
//!
//! ```text
//! invoke(name, params, call)
//!   │
//!   ├─ registry.resolve(name, version)        LookupError
//!   ├─ argument count                          TypeError::ArgumentCount
//!   ├─ for each param, in order:
//!   │     check(raw) then resolve(raw, call)   first failure aborts
//!   │     bind into call
//!   ├─ engine.entry(guard, call, body)         RuntimeError::AccessDenied
//!   │     body(call)                           any error
//!   └─ returns.present(value, call)            InternalError
//! ```
//!
//! Every failure leaves as an [`ErrorStruct`]. Errors outside the taxonomy
//! and panics are logged here with their full detail and returned as a
//! bare InternalError.

use crate::config::ServerConfig;
use crate::operation::OperationDefinition;
use crate::registry::Registry;
use rpcc_auth::{CallContext, DecisionEngine};
use rpcc_error::{ErrorStruct, RpcError};
use rpcc_types::{ApiVersion, Principal, Value, WireValue};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// The outcome of one call, as sent to the caller.
///
/// Serializes to `{"result": ...}` or `{"error": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Response {
    Result(WireValue),
    Error(ErrorStruct),
}

impl Response {
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    #[must_use]
    pub fn result(&self) -> Option<&WireValue> {
        match self {
            Self::Result(value) => Some(value),
            Self::Error(_) => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&ErrorStruct> {
        match self {
            Self::Result(_) => None,
            Self::Error(err) => Some(err),
        }
    }
}

/// A decoded request, as a transport would hand it over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub function: String,
    #[serde(default)]
    pub params: Vec<WireValue>,
    /// Defaults to the highest version.
    #[serde(default)]
    pub api_version: Option<i64>,
    /// Authenticated user name, if any.
    #[serde(default)]
    pub user: Option<String>,
}

/// Runs calls against a frozen registry.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
    engine: Arc<DecisionEngine>,
    config: Arc<ServerConfig>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(
        registry: Arc<Registry>,
        engine: Arc<DecisionEngine>,
        config: Arc<ServerConfig>,
    ) -> Self {
        Self {
            registry,
            engine,
            config,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    #[must_use]
    pub fn engine(&self) -> &Arc<DecisionEngine> {
        &self.engine
    }

    #[must_use]
    pub fn config(&self) -> &Arc<ServerConfig> {
        &self.config
    }

    /// A fresh, unauthenticated context for `version`.
    #[must_use]
    pub fn context(&self, version: ApiVersion) -> CallContext {
        CallContext::new(Arc::clone(&self.engine), version)
    }

    /// Runs a decoded request in a fresh context.
    #[must_use]
    pub fn invoke_request(&self, request: &Request) -> Response {
        let requested = request
            .api_version
            .unwrap_or_else(|| i64::from(self.registry.max_version()));
        let Ok(version) = ApiVersion::try_from(requested) else {
            let err = RpcError::no_such_api_version(requested);
            tracing::warn!(
                function = %request.function,
                api_version = requested,
                error_id = err.id(),
                "unknown API version"
            );
            return Response::Error(err.to_struct());
        };

        let mut call = self.context(version);
        if let Some(user) = &request.user {
            call = call.with_principal(Principal::user(user.as_str()));
        }
        self.invoke(&request.function, &request.params, call)
    }

    /// Runs `name` with positional `params` in `call`.
    #[must_use]
    pub fn invoke(&self, name: &str, params: &[WireValue], mut call: CallContext) -> Response {
        self.invoke_with(name, params, &mut call)
    }

    /// Like [`invoke`](Self::invoke), in a context the caller keeps.
    ///
    /// Anything a previous call bound into `call` is dropped first, so a
    /// reused context carries only its principal, version and extensions.
    pub fn invoke_with(
        &self,
        name: &str,
        params: &[WireValue],
        call: &mut CallContext,
    ) -> Response {
        call.reset_bindings();
        let outcome = catch_unwind(AssertUnwindSafe(|| self.run(name, params, call)))
            .unwrap_or_else(|panic| {
                Err(RpcError::internal(format!(
                    "operation panicked: {}",
                    panic_message(panic.as_ref())
                )))
            });

        let elapsed_ms = call.elapsed().as_secs_f64() * 1000.0;
        match outcome {
            Ok(result) => {
                tracing::info!(
                    call_id = %call.id(),
                    function = name,
                    api_version = call.api_version(),
                    elapsed_ms,
                    "call succeeded"
                );
                Response::Result(result)
            }
            Err(err) if err.is_internal() => {
                tracing::error!(
                    call_id = %call.id(),
                    function = name,
                    api_version = call.api_version(),
                    elapsed_ms,
                    error_id = err.id(),
                    detail = err.detail().unwrap_or_default(),
                    "call failed with internal error"
                );
                Response::Error(err.to_struct())
            }
            Err(err) => {
                tracing::warn!(
                    call_id = %call.id(),
                    function = name,
                    api_version = call.api_version(),
                    elapsed_ms,
                    error_id = err.id(),
                    error = %err,
                    detail = err.detail().unwrap_or_default(),
                    "call failed"
                );
                Response::Error(err.to_struct())
            }
        }
    }

    fn run(
        &self,
        name: &str,
        params: &[WireValue],
        call: &mut CallContext,
    ) -> Result<WireValue, RpcError> {
        let def = Arc::clone(self.registry.resolve(name, call.api_version())?);

        let declared = def.params();
        if params.len() > declared.len() {
            return Err(RpcError::argument_count(declared.len(), params.len()));
        }
        if params.len() < def.mandatory_count() {
            return Err(RpcError::argument_count(def.mandatory_count(), params.len()));
        }

        call.extensions_mut().insert(Arc::clone(&self.registry));
        call.extensions_mut().insert(Arc::clone(&self.config));

        for (argno, (param, raw)) in declared.iter().zip(params).enumerate() {
            let ty = param.ty();
            let value = ty
                .check(raw)
                .and_then(|()| ty.resolve(raw, call))
                .map_err(|mut err| {
                    err.set_argno(argno);
                    err.add_traceback(param.name());
                    err
                })?;
            call.bind_param(param.name(), value);
        }

        let call: &CallContext = call;
        let guard = def
            .guard()
            .cloned()
            .unwrap_or_else(|| self.engine.always_allow());
        let value = self
            .engine
            .entry(&guard, call, call, || run_body(&def, call))?;
        def.returns().present(&value, call)
    }
}

fn run_body(def: &OperationDefinition, call: &CallContext) -> Result<Value, RpcError> {
    def.body().call(call).map_err(|err| match err.downcast::<RpcError>() {
        Ok(rpc) => rpc,
        Err(other) => RpcError::internal(format!("{other:?}")),
    })
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_wire_shape() {
        let ok = Response::Result(serde_json::json!(1));
        assert_eq!(serde_json::to_value(&ok).unwrap(), serde_json::json!({"result": 1}));

        let err = Response::Error(RpcError::authentication_failed().to_struct());
        let wire = serde_json::to_value(&err).unwrap();
        assert_eq!(wire["error"]["name"], "RuntimeError::AuthenticationFailed");
        assert!(err.is_error());
        assert!(err.result().is_none());
    }

    #[test]
    fn request_defaults() {
        let req: Request = serde_json::from_str(r#"{"function": "server_ping"}"#).unwrap();
        assert!(req.params.is_empty());
        assert_eq!(req.api_version, None);
        assert_eq!(req.user, None);
    }

    #[test]
    fn panic_messages() {
        let boxed: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(boxed.as_ref()), "static");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");
        let boxed: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(boxed.as_ref()), "non-string panic payload");
    }
}
