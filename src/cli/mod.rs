//! CLI layer for weaviate-mcp.
//!
//! Provides the command-line interface using clap, with commands for
//! serving MCP, running a single operation, and listing operations.

pub mod commands;
pub mod parser;

pub use commands::{build_config, connect_dispatcher, execute};
pub use parser::{Cli, Commands};
