//! MCP server implementation for weaviate-mcp.
//!
//! Tools are rendered from the [`OperationRegistry`] rather than declared
//! with rmcp's tool macros, so the registry stays the single source of
//! operation names and parameter schemas. Operation failures come back as
//! tool results flagged as errors, never as protocol errors.

use std::sync::Arc;

use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, Implementation, JsonObject, ListToolsResult,
    PaginatedRequestParams, ProtocolVersion, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler};
use tracing::debug;

use crate::dispatch::{Dispatcher, Envelope, Invocation};
use crate::registry::OperationRegistry;

/// Weaviate MCP server.
///
/// Cheap to clone: all clones share one dispatcher and therefore one store
/// connection.
#[derive(Debug, Clone)]
pub struct WeaviateMcpServer {
    dispatcher: Arc<Dispatcher>,
}

impl WeaviateMcpServer {
    /// Creates a server around a dispatcher.
    #[must_use]
    pub const fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }
}

/// Renders every registered operation as an MCP tool.
pub(crate) fn tools_from_registry(registry: &OperationRegistry) -> Vec<Tool> {
    registry
        .descriptors()
        .iter()
        .map(|d| Tool::new(d.name, d.description, Arc::new(d.input_schema())))
        .collect()
}

/// Decodes a `tools/call` request; absent arguments become an empty map.
pub(crate) fn invocation_from_request(name: &str, arguments: Option<JsonObject>) -> Invocation {
    Invocation::new(name, arguments.unwrap_or_default())
}

/// Encodes an envelope as a tool result.
pub(crate) fn envelope_to_result(envelope: &Envelope) -> CallToolResult {
    let content = vec![Content::text(envelope.text())];
    if envelope.is_failure() {
        CallToolResult::error(content)
    } else {
        CallToolResult::success(content)
    }
}

impl ServerHandler for WeaviateMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "weaviate-mcp".to_string(),
                title: Some("Weaviate MCP Server".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(format!(
                "Weaviate MCP server. Use `insert-one` to store an object and `query` to run a \
                 hybrid search returning selected properties. When `collection` is omitted, \
                 `{}` is used.",
                self.dispatcher.default_collection()
            )),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            tools: tools_from_registry(self.dispatcher.registry()),
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let CallToolRequestParams {
            name, arguments, ..
        } = request;
        debug!(tool = %name, "tools/call");

        let invocation = invocation_from_request(&name, arguments);
        let envelope = self.dispatcher.handle(&invocation).await;
        Ok(envelope_to_result(&envelope))
    }
}
