//! CLI command implementations.
//!
//! Each command builds what it needs from the parsed [`Cli`]: `tools` needs
//! only the registry, `serve` and `call` connect to the store first.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::info;

use crate::cli::parser::{Cli, Commands};
use crate::config::AdapterConfig;
use crate::dispatch::{Dispatcher, Invocation};
use crate::error::{Error, Result};
use crate::registry::OperationRegistry;
use crate::store::{StoreGateway, WeaviateClient};

/// Executes the CLI command.
///
/// # Returns
///
/// Result with output string on success. `serve` returns an empty string
/// once the client disconnects.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the store cannot be
/// reached, or a `call` invocation fails.
pub fn execute(cli: &Cli) -> Result<String> {
    match &cli.command {
        Commands::Tools => cmd_tools(),
        Commands::Serve => {
            let config = build_config(cli)?;
            block_on(cmd_serve(&config))
        }
        Commands::Call { operation, args } => {
            let arguments = parse_arguments(args)?;
            let config = build_config(cli)?;
            block_on(cmd_call(&config, Invocation::new(operation.as_str(), arguments)))
        }
    }
}

/// Merges CLI flags (which already fall back to their env variables) with
/// the remaining environment configuration.
pub fn build_config(cli: &Cli) -> Result<AdapterConfig> {
    let mut builder = AdapterConfig::builder();
    if let Some(host) = &cli.host {
        builder = builder.host(host);
    }
    if let Some(scheme) = &cli.scheme {
        builder = builder.scheme(scheme);
    }
    if let Some(collection) = &cli.default_collection {
        builder = builder.default_collection(collection);
    }
    if let Some(secs) = cli.startup_timeout_secs {
        builder = builder.startup_timeout(Duration::from_secs(secs));
    }
    if let Some(secs) = cli.request_timeout_secs {
        builder = builder.request_timeout(Duration::from_secs(secs));
    }
    Ok(builder.from_env()?.build()?)
}

/// Connects to the store and wires the dispatcher over the standard registry.
///
/// # Errors
///
/// Returns [`Error::Store`] if the store does not become ready.
pub async fn connect_dispatcher(config: &AdapterConfig) -> Result<Dispatcher> {
    let client = WeaviateClient::connect(config).await?;
    let gateway = StoreGateway::new(Arc::new(client));
    Ok(Dispatcher::new(
        Arc::new(OperationRegistry::standard()),
        gateway,
        config.default_collection.clone(),
    ))
}

fn block_on<F: std::future::Future<Output = Result<String>>>(fut: F) -> Result<String> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(fut)
}

/// Parses `--args` into an argument map.
fn parse_arguments(raw: &str) -> Result<Map<String, Value>> {
    let value = serde_json::from_str::<Value>(raw).map_err(|e| Error::Arguments(e.to_string()))?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::Arguments(format!(
            "expected a JSON object, got: {other}"
        ))),
    }
}

fn cmd_tools() -> Result<String> {
    let registry = OperationRegistry::standard();
    Ok(serde_json::to_string_pretty(registry.descriptors())?)
}

async fn cmd_serve(config: &AdapterConfig) -> Result<String> {
    use crate::mcp::{WeaviateMcpServer, serve_stdio};

    let dispatcher = connect_dispatcher(config).await?;
    info!(
        default_collection = %config.default_collection,
        "starting MCP server"
    );
    serve_stdio(WeaviateMcpServer::new(Arc::new(dispatcher)))
        .await
        .map_err(|e| Error::Transport(e.to_string()))?;
    Ok(String::new())
}

async fn cmd_call(config: &AdapterConfig, invocation: Invocation) -> Result<String> {
    let dispatcher = connect_dispatcher(config).await?;
    let envelope = dispatcher.handle(&invocation).await;
    if envelope.is_failure() {
        Err(Error::Invocation(envelope.text()))
    } else {
        Ok(envelope.text())
    }
}
