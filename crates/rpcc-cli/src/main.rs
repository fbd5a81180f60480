//! RPCC stdio server.
//!
//! Reads one JSON request per line on stdin and writes one JSON response per
//! line on stdout. Logs go to stderr.
//!
//! ```text
//! stdin:  {"function": "server_list_functions", "api_version": 0}
//! stdout: {"result": ["server_documentation", ...]}
//! ```
//!
//! # Configuration
//!
//! 1. Environment variables (`RPCC_*`, highest priority)
//! 2. Config file given with `--config`
//! 3. Default values
//!
//! # Logging
//!
//! `--debug` > `RPCC_LOG` > `log_level` from the configuration.

use anyhow::{Context, Result};
use clap::Parser;
use rpcc_error::{kinds, ErrorKind, RpcError};
use rpcc_runtime::config::ConfigLoader;
use rpcc_runtime::{Dispatcher, Request, Response, Server};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// A line that does not decode as a request.
static MALFORMED_REQUEST: ErrorKind = ErrorKind::new(
    "MalformedRequestError",
    &kinds::ROOT,
    "The request could not be decoded.",
);

/// RPCC stdio server
#[derive(Parser, Debug)]
#[command(name = "rpcc")]
#[command(version, about, long_about = None)]
struct Args {
    /// Config file (TOML)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Print the resolved configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.with_file(path);
    }
    let config = loader.load().context("config error")?;

    if args.print_config {
        print!("{}", config.to_toml().context("cannot serialize config")?);
        return Ok(());
    }

    let filter = if args.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("RPCC_LOG").unwrap_or_else(|_| EnvFilter::new(&config.log_level))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    info!(
        service = %config.service_name,
        node = %config.node_name(),
        version = env!("CARGO_PKG_VERSION"),
        "starting"
    );

    let mut server = Server::new(config).context("cannot register built-in operations")?;
    let dispatcher = server.start().context("cannot build operation registry")?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    let served = serve(&dispatcher, stdin.lock(), stdout.lock())?;
    info!(requests = served, "stdin closed, exiting");
    Ok(())
}

/// Answers every line of `input` on `output`. Returns the number of
/// requests handled.
fn serve(dispatcher: &Dispatcher, input: impl BufRead, mut output: impl Write) -> Result<usize> {
    let mut served = 0;
    for line in input.lines() {
        let line = line.context("cannot read request")?;
        if line.trim().is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => {
                debug!(function = %request.function, "request");
                dispatcher.invoke_request(&request)
            }
            Err(e) => {
                let err = RpcError::new(&MALFORMED_REQUEST).with_detail(e.to_string());
                warn!(error_id = err.id(), error = %e, "malformed request");
                Response::Error(err.to_struct())
            }
        };
        serde_json::to_writer(&mut output, &response).context("cannot encode response")?;
        output.write_all(b"\n").context("cannot write response")?;
        output.flush().context("cannot write response")?;
        served += 1;
    }
    Ok(served)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpcc_runtime::config::ServerConfig;
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn dispatcher() -> Arc<Dispatcher> {
        let config = ServerConfig {
            node_name: Some("test-node".into()),
            ..ServerConfig::default()
        };
        Server::new(config).unwrap().start().unwrap()
    }

    fn run(input: &str) -> Vec<Value> {
        let mut out = Vec::new();
        serve(&dispatcher(), input.as_bytes(), &mut out).unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn one_response_per_request_line() {
        let responses = run(concat!(
            r#"{"function": "server_ping"}"#,
            "\n\n",
            r#"{"function": "server_node_name", "api_version": 0}"#,
            "\n",
        ));
        assert_eq!(responses, vec![json!({"result": null}), json!({"result": "test-node"})]);
    }

    #[test]
    fn malformed_line_gets_an_error_and_serving_continues() {
        let responses = run("not json\n{\"function\": \"server_ping\"}\n");
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["error"]["name"], "MalformedRequestError");
        assert_eq!(responses[0]["error"]["namelist"], json!(["MalformedRequestError"]));
        assert_eq!(responses[1], json!({"result": null}));
    }

    #[test]
    fn args_parse() {
        let args = Args::try_parse_from(["rpcc", "--config", "rpcc.toml", "-d"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("rpcc.toml")));
        assert!(args.debug);
        assert!(!args.print_config);
    }
}
