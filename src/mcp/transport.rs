//! MCP transport layer.
//!
//! Only stdio is served: the process speaks JSON-RPC on stdin/stdout and
//! logs to stderr.

use rmcp::ServiceExt;
use rmcp::transport::io::stdio;
use tracing::info;

use super::server::WeaviateMcpServer;

/// Starts the MCP server with stdio transport.
///
/// The server reads JSON-RPC messages from stdin and writes responses to
/// stdout until the client disconnects.
///
/// # Errors
///
/// Returns an error if the server fails to start or encounters a runtime error.
pub async fn serve_stdio(server: WeaviateMcpServer) -> anyhow::Result<()> {
    info!("serving MCP over stdio");
    let service = server.serve(stdio()).await?;
    let reason = service.waiting().await?;
    info!(?reason, "MCP session ended");
    Ok(())
}
