//! Tool: list_client_roots, reports the roots the client exposes.

use mcp_duplex::registry::RequestContext;
use mcp_duplex::types::{McpResult, ToolCallResult, ToolDefinition};
use serde_json::json;

/// Return the tool definition for list_client_roots.
pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "list_client_roots".to_string(),
        description: Some("List the filesystem roots the client has shared".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {}
        }),
    }
}

/// Execute the list_client_roots tool.
pub async fn execute(ctx: RequestContext) -> McpResult<ToolCallResult> {
    let roots = ctx.peer.list_roots().await?;
    tracing::debug!("Client shared {} roots", roots.len());

    Ok(ToolCallResult::structured(json!({ "roots": roots })))
}
