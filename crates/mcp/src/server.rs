// Stdio tool server: JSON-RPC 2.0, one message per line on stdin/stdout.

use crate::protocol::{
    methods, CallToolParams, InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse,
    ListToolsResult,
};
use crate::tools::ToolRegistry;
use anyhow::Result;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

pub struct McpServer {
    registry: ToolRegistry,
}

impl McpServer {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    /// Run the server, reading requests from stdin and writing responses
    /// to stdout until EOF. Logging must go to stderr; stdout is the
    /// protocol channel.
    pub async fn start(&self) -> Result<()> {
        let stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        let mut lines = BufReader::new(stdin).lines();

        while let Some(line) = lines.next_line().await? {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let response = match serde_json::from_str::<JsonRpcRequest>(trimmed) {
                Ok(request) => self.handle_request(request).await,
                Err(e) => {
                    tracing::warn!("Unparsable request line: {}", e);
                    Some(JsonRpcResponse::error(
                        Value::Null,
                        JsonRpcError::parse_error(),
                    ))
                }
            };

            if let Some(response) = response {
                let mut wire = serde_json::to_string(&response)?;
                wire.push('\n');
                stdout.write_all(wire.as_bytes()).await?;
                stdout.flush().await?;
            }
        }

        tracing::info!("stdin closed, shutting down");
        Ok(())
    }

    /// Dispatch one request. Notifications are consumed and produce no
    /// response; every request with an id produces exactly one.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            tracing::debug!("notification: {}", request.method);
            return None;
        }
        let id = request.id.clone().unwrap_or(Value::Null);

        let response = match request.method.as_str() {
            methods::INITIALIZE => {
                Self::success_value(id, &InitializeResult::default())
            }
            methods::LIST_TOOLS => {
                let result = ListToolsResult {
                    tools: self.registry.list_schemas(),
                };
                Self::success_value(id, &result)
            }
            methods::CALL_TOOL => self.call_tool(id, request.params).await,
            other => JsonRpcResponse::error(id, JsonRpcError::method_not_found(other)),
        };

        Some(response)
    }

    fn success_value(id: Value, result: &impl serde::Serialize) -> JsonRpcResponse {
        match serde_json::to_value(result) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::error(id, JsonRpcError::internal_error(e.to_string())),
        }
    }

    async fn call_tool(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let mut params: CallToolParams = match serde_json::from_value(params.unwrap_or_default()) {
            Ok(params) => params,
            Err(e) => {
                return JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_params(format!("Invalid tools/call params: {}", e)),
                );
            }
        };

        if params.arguments.is_null() {
            params.arguments = Value::Object(Default::default());
        }

        let Some(tool) = self.registry.get(&params.name) else {
            return JsonRpcResponse::error(
                id,
                JsonRpcError::method_not_found(&format!("tool {}", params.name)),
            );
        };

        tracing::debug!("calling tool {}", params.name);
        match tool.execute(params.arguments).await {
            Ok(result) => Self::success_value(id, &result),
            Err(e) => {
                tracing::error!("tool {} failed: {:#}", params.name, e);
                JsonRpcResponse::error(id, JsonRpcError::internal_error(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{CallToolResult, ToolSchema};
    use crate::tools::{json_schema_object, Tool};
    use std::sync::Arc;

    struct EchoTool;

    #[async_trait::async_trait]
    impl Tool for EchoTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "echo".to_string(),
                description: "Echo arguments".to_string(),
                input_schema: json_schema_object(serde_json::json!({}), vec![]),
            }
        }

        async fn execute(&self, arguments: Value) -> anyhow::Result<CallToolResult> {
            Ok(CallToolResult::json(&arguments))
        }
    }

    struct FailingTool;

    #[async_trait::async_trait]
    impl Tool for FailingTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "broken".to_string(),
                description: "Always fails".to_string(),
                input_schema: json_schema_object(serde_json::json!({}), vec![]),
            }
        }

        async fn execute(&self, _arguments: Value) -> anyhow::Result<CallToolResult> {
            anyhow::bail!("boom")
        }
    }

    fn server() -> McpServer {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        registry.register(Arc::new(FailingTool));
        McpServer::new(registry)
    }

    fn request(method: &str, params: Option<Value>) -> JsonRpcRequest {
        JsonRpcRequest::new(1, method, params)
    }

    #[tokio::test]
    async fn test_initialize() {
        let response = server()
            .handle_request(request(methods::INITIALIZE, None))
            .await
            .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert_eq!(result["serverInfo"]["name"], "finbridge-mcp");
    }

    #[tokio::test]
    async fn test_initialized_notification_gets_no_response() {
        let note = JsonRpcRequest::notification(methods::INITIALIZED);
        assert!(server().handle_request(note).await.is_none());
    }

    #[tokio::test]
    async fn test_tools_list_length_matches_registry() {
        let response = server()
            .handle_request(request(methods::LIST_TOOLS, None))
            .await
            .unwrap();
        let tools = response.result.unwrap()["tools"].as_array().unwrap().len();
        assert_eq!(tools, 2);
    }

    #[tokio::test]
    async fn test_call_tool_passes_arguments_through() {
        let params = serde_json::json!({"name": "echo", "arguments": {"ticker": "AAPL"}});
        let response = server()
            .handle_request(request(methods::CALL_TOOL, Some(params)))
            .await
            .unwrap();
        let result = response.result.unwrap();
        let text = result["content"][0]["text"].as_str().unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(text).unwrap(),
            serde_json::json!({"ticker": "AAPL"})
        );
    }

    #[tokio::test]
    async fn test_call_unknown_tool() {
        let params = serde_json::json!({"name": "nope", "arguments": {}});
        let response = server()
            .handle_request(request(methods::CALL_TOOL, Some(params)))
            .await
            .unwrap();
        assert_eq!(
            response.error.unwrap().code,
            JsonRpcError::METHOD_NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_call_tool_without_name_is_invalid_params() {
        let response = server()
            .handle_request(request(methods::CALL_TOOL, Some(serde_json::json!({}))))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, JsonRpcError::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_tool_failure_is_internal_error() {
        let params = serde_json::json!({"name": "broken", "arguments": {}});
        let response = server()
            .handle_request(request(methods::CALL_TOOL, Some(params)))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, JsonRpcError::INTERNAL_ERROR);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let response = server()
            .handle_request(request("resources/list", None))
            .await
            .unwrap();
        assert_eq!(
            response.error.unwrap().code,
            JsonRpcError::METHOD_NOT_FOUND
        );
    }
}
