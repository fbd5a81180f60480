//! The `server_*` introspection operations.

use rpcc_auth::CallContext;
use rpcc_runtime::config::ServerConfig;
use rpcc_runtime::{Dispatcher, OperationDefinition, Param, Response, Server};
use rpcc_schema::TypeDescriptor;
use rpcc_types::{Value, VersionRange};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

fn null_body(_: &CallContext) -> anyhow::Result<Value> {
    Ok(Value::Null)
}

/// `echo` in versions 0-1, `echo` with a colour from 2 on, and a hidden
/// `debug_dump`.
fn dispatcher() -> Arc<Dispatcher> {
    let config = ServerConfig {
        node_name: Some("node-7".into()),
        api_version_comments: BTreeMap::from([(2, "Adds colours.".to_string())]),
        ..ServerConfig::default()
    };
    let mut server = Server::new(config).unwrap();
    let string = Arc::clone(&server.types().string);
    let null = Arc::clone(&server.types().null);
    let colour = TypeDescriptor::enumeration("colour", ["red", "green"])
        .unwrap()
        .with_description("A colour.")
        .with_versions(VersionRange::from_version(2))
        .unwrap()
        .shared();

    server
        .register_operation(
            OperationDefinition::new("echo", Arc::clone(&string), null_body)
                .with_versions(VersionRange::new(0, Some(1)))
                .with_param(Param::new("text", Arc::clone(&string)).with_description("What to say"))
                .with_description("Says it back."),
        )
        .unwrap();
    server
        .register_operation(
            OperationDefinition::new("echo", Arc::clone(&string), null_body)
                .with_versions(VersionRange::from_version(2))
                .with_param(Param::new("text", string))
                .with_param(Param::optional("colour", colour)),
        )
        .unwrap();
    server
        .register_operation(OperationDefinition::new("debug_dump", null, null_body).hidden())
        .unwrap();
    server.start().unwrap()
}

fn call(
    dispatcher: &Dispatcher,
    version: u32,
    name: &str,
    params: &[serde_json::Value],
) -> Response {
    dispatcher.invoke(name, params, dispatcher.context(version))
}

#[test]
fn ping_and_node_name() {
    let d = dispatcher();
    assert_eq!(call(&d, 0, "server_ping", &[]), Response::Result(json!(null)));
    assert_eq!(call(&d, 2, "server_node_name", &[]), Response::Result(json!("node-7")));
}

#[test]
fn api_versions_carry_comments() {
    let d = dispatcher();
    let response = call(&d, 0, "server_list_api_versions", &[]);
    assert_eq!(
        response.result(),
        Some(&json!([
            {"version": 0, "comment": null},
            {"version": 1, "comment": null},
            {"version": 2, "comment": "Adds colours."},
        ]))
    );
}

#[test]
fn function_list_is_sorted_and_skips_hidden() {
    let d = dispatcher();
    let response = call(&d, 1, "server_list_functions", &[]);
    let names: Vec<&str> = response
        .result()
        .and_then(|v| v.as_array())
        .unwrap()
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    assert_eq!(
        names,
        [
            "echo",
            "server_documentation",
            "server_function_definition",
            "server_list_api_versions",
            "server_list_functions",
            "server_node_name",
            "server_ping",
        ]
    );

    let response = call(&d, 1, "debug_dump", &[]);
    assert!(!response.is_error());
}

#[test]
fn definition_follows_api_version() {
    let d = dispatcher();

    let old = call(&d, 1, "server_function_definition", &[json!("echo")]);
    let old = old.result().unwrap();
    assert_eq!(old["function"], "echo");
    assert_eq!(old["description"], "Says it back.");
    assert_eq!(
        old["parameters"],
        json!([{"type_name": "string", "name": "text", "description": "What to say"}])
    );
    assert_eq!(old["returns"], json!({"type_name": "string"}));
    assert_eq!(old["types"], json!([{"name": "string", "base": "string"}]));

    let new = call(&d, 2, "server_function_definition", &[json!("echo")]);
    let new = new.result().unwrap();
    assert_eq!(new["parameters"].as_array().map(Vec::len), Some(2));
    assert!(new.get("description").is_none());
    assert_eq!(
        new["types"][0],
        json!({
            "name": "colour",
            "base": "enum",
            "description": "A colour.",
            "values": ["red", "green"],
        })
    );
}

#[test]
fn unknown_function_is_a_bound_lookup_error() {
    let d = dispatcher();
    let response = call(&d, 0, "server_documentation", &[json!("no_such_thing")]);
    let err = response.error().unwrap();
    assert_eq!(err.name, "LookupError::NoSuchFunction");
    assert_eq!(err.argno, Some(0));
    assert_eq!(err.traceback, vec!["function"]);
    assert_eq!(err.value, Some(json!("no_such_thing")));
}

#[test]
fn documentation_text() {
    let d = dispatcher();
    let response = call(&d, 0, "server_documentation", &[json!("echo")]);
    let text = response.result().and_then(|v| v.as_str()).unwrap();
    assert!(text.starts_with("Synopsis (API v.0-1):\n  echo(text)\n"));
    assert!(text.contains("\nDescription:\n  Says it back.\n"));
    assert!(text.contains("  text  <string>  What to say\n"));
    assert!(text.contains("\nReturns: <string>\n"));
    assert!(text.contains("  <string> ::= String with any content\n"));

    let response = call(&d, 2, "server_documentation", &[json!("echo")]);
    let text = response.result().and_then(|v| v.as_str()).unwrap();
    assert!(text.starts_with("Synopsis (API v.2-oo):\n  echo(text, colour)\n"));
    assert!(text.contains("  <colour> ::= String with content being one of [red, green]\n"));
}
