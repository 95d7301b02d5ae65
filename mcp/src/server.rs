//! MCP server exposing a [`ToolRegistry`] over RMCP.

use std::borrow::Cow;
use std::sync::Arc;

use rmcp::RoleServer;
use rmcp::service::RequestContext;
use rmcp::{
    ServerHandler,
    model::{
        CallToolRequestParams, CallToolResult, Content, ErrorData, JsonObject, ListToolsResult,
        PaginatedRequestParams, Tool as McpTool,
    },
};
use serde_json::Value;

use crate::registry::{ToolDescriptor, ToolRegistry, render_output};

/// Default server name advertised to MCP clients.
pub const DEFAULT_SERVER_NAME: &str = "rig-scrape";

/// MCP server handler that serves the tools of a [`ToolRegistry`].
///
/// Tool failures are returned as error results (`is_error: true`) rather than
/// protocol errors, so the client's model sees the message.
#[derive(Debug, Clone)]
pub struct ScrapeMcpHandler {
    registry: ToolRegistry,
    /// The name of the server.
    pub name: String,
    /// Catalog in MCP form, in registration order.
    pub tool_definitions: Vec<McpTool>,
}

impl ScrapeMcpHandler {
    /// Creates a handler named [`DEFAULT_SERVER_NAME`].
    #[must_use]
    pub fn new(registry: ToolRegistry) -> Self {
        Self::named(DEFAULT_SERVER_NAME, registry)
    }

    /// Creates a handler with a custom server name.
    #[must_use]
    pub fn named(name: impl Into<String>, registry: ToolRegistry) -> Self {
        let tool_definitions = registry
            .list()
            .into_iter()
            .map(descriptor_to_mcp)
            .collect();
        Self {
            registry,
            name: name.into(),
            tool_definitions,
        }
    }

    /// The registry being served.
    #[must_use]
    pub const fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Serves the MCP protocol over stdio until the client disconnects.
    ///
    /// # Errors
    /// Returns an error if the server fails to initialize or if the connection is lost.
    pub async fn serve_stdio(self) -> Result<(), Box<dyn std::error::Error>> {
        tracing::info!(
            event = "mcp_server_starting",
            name = %self.name,
            tools = self.tool_definitions.len(),
            "mcp_server_starting"
        );
        let (stdin, stdout) = rmcp::transport::io::stdio();
        let service = rmcp::ServiceExt::serve(self, (stdin, stdout)).await?;
        service.waiting().await?;
        Ok(())
    }
}

/// Converts a registry descriptor into an MCP tool definition.
#[must_use]
pub fn descriptor_to_mcp(descriptor: ToolDescriptor) -> McpTool {
    let input_schema = if let Value::Object(map) = descriptor.input_schema {
        Arc::new(map)
    } else {
        Arc::new(JsonObject::new())
    };

    McpTool {
        name: Cow::Owned(descriptor.name.clone()),
        title: Some(descriptor.name),
        description: Some(Cow::Owned(descriptor.description)),
        input_schema,
        output_schema: None,
        annotations: None,
        icons: None,
        meta: None,
    }
}

impl ServerHandler for ScrapeMcpHandler {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            protocol_version: rmcp::model::ProtocolVersion::V_2024_11_05,
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            server_info: rmcp::model::Implementation {
                name: self.name.clone(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                website_url: None,
                icons: None,
            },
            instructions: Some(
                "Call fetch_page with a product URL, then extract_info to read the product details."
                    .to_string(),
            ),
        }
    }

    async fn initialize(
        &self,
        _request: rmcp::model::InitializeRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<rmcp::model::InitializeResult, ErrorData> {
        Ok(self.get_info())
    }

    #[tracing::instrument(skip(self, _request, _context), fields(rpc.method = "list_tools"))]
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult {
            tools: self.tool_definitions.clone(),
            next_cursor: None,
            meta: None,
        })
    }

    #[tracing::instrument(skip(self, request, _context), fields(rpc.method = "call_tool", tool.name = %request.name))]
    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let arguments = Value::Object(request.arguments.unwrap_or_default());

        match self.registry.dispatch(&request.name, arguments).await {
            Ok(output) => Ok(CallToolResult::success(vec![Content::text(render_output(
                &output,
            ))])),
            Err(e) => {
                tracing::error!(event = "tool_call_failed", tool = %request.name, error = %e, "tool_call_failed");
                Ok(CallToolResult::error(vec![Content::text(e.to_string())]))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{FetchConfig, product_tools};
    use serde_json::json;

    #[test]
    fn test_descriptor_to_mcp() {
        let tool = descriptor_to_mcp(ToolDescriptor {
            name: "fetch_page".to_string(),
            description: "Fetch.".to_string(),
            input_schema: json!({"type": "object", "required": ["url"]}),
        });
        assert_eq!(tool.name, "fetch_page");
        assert_eq!(tool.description.as_deref(), Some("Fetch."));
        assert_eq!(tool.input_schema.get("required"), Some(&json!(["url"])));

        let odd = descriptor_to_mcp(ToolDescriptor {
            name: "odd".to_string(),
            description: String::new(),
            input_schema: json!(true),
        });
        assert!(odd.input_schema.is_empty());
    }

    #[tokio::test]
    async fn test_handler_advertises_registry_in_order() {
        let registry = product_tools(&FetchConfig::default()).await.unwrap();
        let handler = ScrapeMcpHandler::new(registry);

        let names: Vec<&str> = handler
            .tool_definitions
            .iter()
            .map(|t| t.name.as_ref())
            .collect();
        assert_eq!(names, vec!["fetch_page", "extract_info"]);
        assert_eq!(handler.get_info().server_info.name, DEFAULT_SERVER_NAME);
    }
}
