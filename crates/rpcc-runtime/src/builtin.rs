//! Built-in operations.
//!
//! | Operation | Parameters | Returns |
//! |-----------|------------|---------|
//! | `server_ping` | | `null` |
//! | `server_node_name` | | `string` |
//! | `server_list_api_versions` | | `api-version-list` |
//! | `server_list_functions` | | `string-list` |
//! | `server_function_definition` | `function-name` | `doc-function` |
//! | `server_documentation` | `function-name` | `string` |
//!
//! All are open-ended from version 0 and unguarded.

use crate::config::ServerConfig;
use crate::documentation::{function_as_text, FunctionDoc};
use crate::operation::{OperationDefinition, Param};
use crate::registry::{RegistryBuilder, RegistryError, Registry};
use rpcc_auth::CallContext;
use rpcc_error::RpcError;
use rpcc_schema::{DocTypes, Lookup, StandardTypes, TypeDescriptor};
use rpcc_types::Value;
use std::sync::Arc;

/// Names a function visible in the caller's API version.
struct FunctionName;

impl Lookup for FunctionName {
    fn lookup(&self, value: Value, call: &CallContext) -> Result<Value, RpcError> {
        let name = value.as_str().unwrap_or_default();
        if registry(call)?.has_operation(name, call.api_version()) {
            Ok(value)
        } else {
            Err(RpcError::no_such_function(name))
        }
    }

    fn output(&self, value: &Value, _call: &CallContext) -> Result<Value, RpcError> {
        Ok(value.clone())
    }
}

fn registry(call: &CallContext) -> Result<&Arc<Registry>, RpcError> {
    call.extension::<Arc<Registry>>()
        .ok_or_else(|| RpcError::internal("registry not attached to call"))
}

fn config(call: &CallContext) -> Result<&Arc<ServerConfig>, RpcError> {
    call.extension::<Arc<ServerConfig>>()
        .ok_or_else(|| RpcError::internal("server config not attached to call"))
}

/// The `function` parameter, already checked by [`FunctionName`].
fn named_function<'a>(call: &'a CallContext) -> Result<&'a str, RpcError> {
    call.param("function")
        .and_then(Value::as_str)
        .ok_or_else(|| RpcError::internal("function parameter not bound"))
}

fn ping(_call: &CallContext) -> anyhow::Result<Value> {
    Ok(Value::Null)
}

fn node_name(call: &CallContext) -> anyhow::Result<Value> {
    Ok(Value::from(config(call)?.node_name()))
}

fn list_api_versions(call: &CallContext) -> anyhow::Result<Value> {
    let registry = registry(call)?;
    let comments = &config(call)?.api_version_comments;
    let versions = registry
        .versions()
        .map(|version| {
            Value::structure([
                ("version", Value::from(version)),
                ("comment", Value::from(comments.get(&version).cloned())),
            ])
        })
        .collect::<Vec<_>>();
    Ok(Value::List(versions))
}

fn list_functions(call: &CallContext) -> anyhow::Result<Value> {
    let names = registry(call)?.visible_operation_names(call.api_version());
    Ok(Value::from(names))
}

fn function_definition(call: &CallContext) -> anyhow::Result<Value> {
    let def = registry(call)?.resolve(named_function(call)?, call.api_version())?;
    Ok(FunctionDoc::new(def).to_value())
}

fn documentation(call: &CallContext) -> anyhow::Result<Value> {
    let registry = registry(call)?;
    let def = registry.resolve(named_function(call)?, call.api_version())?;
    let versions = registry
        .effective_versions(def)
        .unwrap_or_else(|| def.declared_versions());
    Ok(Value::from(function_as_text(def, versions)))
}

/// Registers the built-in operations and the shared scalar types.
///
/// # Errors
///
/// Fails if an operation of the same name is already registered.
pub fn register(
    builder: &mut RegistryBuilder,
    standard: &StandardTypes,
) -> Result<(), RegistryError> {
    let docs = DocTypes::new(standard)?;

    let function_name = TypeDescriptor::string("function-name")
        .with_description("The name of a function visible in the current API version.")
        .with_lookup(Arc::new(FunctionName))
        .shared();

    let api_version = TypeDescriptor::structure(
        "api-version",
        [("version", Arc::clone(&standard.integer))],
        [(
            "comment",
            TypeDescriptor::nullable(Arc::clone(&standard.string)).shared(),
        )],
    )?
    .with_description("An API version and its comment.")
    .shared();

    let doc_function = TypeDescriptor::structure(
        "doc-function",
        [
            ("function", Arc::clone(&function_name)),
            (
                "parameters",
                TypeDescriptor::list(Arc::clone(&docs.parameter)).shared(),
            ),
            ("returns", Arc::clone(&docs.parameter)),
            (
                "types",
                TypeDescriptor::list(Arc::clone(&docs.typedef)).shared(),
            ),
        ],
        [("description", Arc::clone(&standard.string))],
    )?
    .with_description("Top-level struct for documenting a function.")
    .shared();

    for ty in standard.all() {
        builder.register_type(Arc::clone(ty));
    }

    builder.register_operation(
        OperationDefinition::new("server_ping", Arc::clone(&standard.null), ping)
            .with_description("Does nothing. Useful for checking that the server answers."),
    )?;
    builder.register_operation(
        OperationDefinition::new("server_node_name", Arc::clone(&standard.string), node_name)
            .with_description("Returns the name of the node answering the call."),
    )?;
    builder.register_operation(
        OperationDefinition::new(
            "server_list_api_versions",
            TypeDescriptor::list(api_version).shared(),
            list_api_versions,
        )
        .with_description("Lists every API version with its comment."),
    )?;
    builder.register_operation(
        OperationDefinition::new(
            "server_list_functions",
            TypeDescriptor::list(Arc::clone(&standard.string)).shared(),
            list_functions,
        )
        .with_description("Returns the sorted names of the functions visible in this API version."),
    )?;
    builder.register_operation(
        OperationDefinition::new("server_function_definition", doc_function, function_definition)
            .with_param(
                Param::new("function", Arc::clone(&function_name))
                    .with_description("Name of function to document"),
            )
            .with_description("Returns a structured definition of the named function."),
    )?;
    builder.register_operation(
        OperationDefinition::new(
            "server_documentation",
            Arc::clone(&standard.string),
            documentation,
        )
        .with_param(
            Param::new("function", function_name).with_description("Name of function to document"),
        )
        .with_description("Returns a text version of the documentation for a function."),
    )?;
    Ok(())
}
