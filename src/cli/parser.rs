//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Parser, Subcommand};

/// weaviate-mcp: MCP server for a Weaviate vector store.
///
/// Exposes `insert-one` and `query` as MCP tools over stdio, or runs a
/// single operation directly from the command line.
#[derive(Parser, Debug)]
#[command(name = "weaviate-mcp")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Weaviate host including port.
    #[arg(long, env = "WEAVIATE_HOST", global = true)]
    pub host: Option<String>,

    /// Weaviate scheme (http, https).
    #[arg(long, env = "WEAVIATE_SCHEME", global = true)]
    pub scheme: Option<String>,

    /// Collection used when an invocation omits `collection`.
    #[arg(long, env = "WEAVIATE_DEFAULT_COLLECTION", global = true)]
    pub default_collection: Option<String>,

    /// Seconds to wait for Weaviate to report ready.
    #[arg(long, env = "WEAVIATE_STARTUP_TIMEOUT_SECS", global = true)]
    pub startup_timeout_secs: Option<u64>,

    /// Upper bound in seconds on a single Weaviate call.
    #[arg(long, env = "WEAVIATE_REQUEST_TIMEOUT_SECS", global = true)]
    pub request_timeout_secs: Option<u64>,

    /// Enable debug logging (stderr).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the MCP server on stdio.
    ///
    /// Reads JSON-RPC messages from stdin, writes responses to stdout.
    #[command(after_help = r#"Examples:
  weaviate-mcp serve                                   # localhost:8080
  weaviate-mcp --host weaviate:8080 serve              # Custom host
  OPENAI_API_KEY=sk-... weaviate-mcp serve             # Forward vectorizer key
"#)]
    Serve,

    /// Run one operation and print its result.
    ///
    /// Exits non-zero if the operation fails.
    #[command(after_help = r#"Examples:
  weaviate-mcp call insert-one --args '{"collection":"WorldMap","properties":{"city":"Valencia"}}'
  weaviate-mcp call query --args '{"query":"What country is Valencia in?","targetProperties":["country"]}'
"#)]
    Call {
        /// Operation name (insert-one, query).
        operation: String,

        /// Arguments as a JSON object.
        #[arg(short, long, default_value = "{}")]
        args: String,
    },

    /// Print the registered operations and their parameter schemas as JSON.
    Tools,
}
