//! MCP (Model Context Protocol) server for weaviate-mcp.
//!
//! Exposes the registered operations as MCP tools. The transport decodes
//! each `tools/call` into an [`Invocation`](crate::dispatch::Invocation),
//! hands it to the [`Dispatcher`](crate::dispatch::Dispatcher) and encodes
//! the returned envelope as a tool result.
//!
//! # Architecture
//!
//! ```text
//! MCP Client (agent)
//!   ↓ tools/call(name, arguments)
//! WeaviateMcpServer
//!   ↓ Invocation
//! Dispatcher
//!   ├── OperationRegistry::lookup
//!   ├── resolve (arguments → typed)
//!   └── StoreGateway (insert_one | query)
//!   ↓ Envelope
//! CallToolResult → MCP Client
//! ```

pub mod server;
pub mod transport;

pub use server::WeaviateMcpServer;
pub use transport::serve_stdio;
