//! Main request dispatcher: receives JSON-RPC messages, routes them to handlers.

use std::sync::Arc;
use std::time::Instant;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::auth::AuthContext;
use crate::tools::{ToolContext, ToolRegistry};
use crate::types::*;

use super::negotiation::negotiate;
use super::validator::validate_request;

/// Stateless dispatcher shared by every transport and session.
#[derive(Clone)]
pub struct ProtocolHandler {
    registry: Arc<ToolRegistry>,
}

impl ProtocolHandler {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Handle one inbound message on behalf of a session. Notifications and
    /// stray responses produce no reply.
    pub async fn handle_message(&self, msg: JsonRpcMessage, auth: &AuthContext) -> Option<Value> {
        match msg {
            JsonRpcMessage::Request(req) => Some(self.handle_request(req, auth).await),
            JsonRpcMessage::Notification(notif) => {
                self.handle_notification(notif);
                None
            }
            _ => {
                tracing::warn!("Received unexpected message type from client");
                None
            }
        }
    }

    async fn handle_request(&self, request: JsonRpcRequest, auth: &AuthContext) -> Value {
        let started = Instant::now();
        let id = request.id.clone();
        let tool = tool_name(&request);

        let result = match validate_request(&request) {
            Ok(()) => self.dispatch_request(&request, auth).await,
            Err(e) => Err(e),
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        let envelope = match result {
            Ok(value) => {
                tracing::info!(
                    method = %request.method,
                    tool = tool.as_deref().unwrap_or("-"),
                    outcome = "ok",
                    elapsed_ms,
                    "Dispatched request {id}"
                );
                serde_json::to_value(JsonRpcResponse::new(id, value))
            }
            Err(e) => {
                tracing::warn!(
                    method = %request.method,
                    tool = tool.as_deref().unwrap_or("-"),
                    outcome = "error",
                    code = e.code(),
                    elapsed_ms,
                    "Dispatched request {id}: {e}"
                );
                serde_json::to_value(e.to_json_rpc_error(id))
            }
        };

        envelope.unwrap_or_default()
    }

    async fn dispatch_request(&self, request: &JsonRpcRequest, auth: &AuthContext) -> GatewayResult<Value> {
        match request.method.as_str() {
            INITIALIZE_METHOD => self.handle_initialize(request.params.clone()),
            "ping" => Ok(Value::Object(serde_json::Map::new())),

            "tools/list" | "list_tools" => self.handle_tools_list(),
            "tools/call" | "call_tool" => self.handle_tools_call(request.params.clone(), auth).await,

            _ => Err(GatewayError::MethodNotFound(request.method.clone())),
        }
    }

    fn handle_notification(&self, notification: JsonRpcNotification) {
        match notification.method.as_str() {
            "notifications/initialized" | "initialized" => {
                tracing::info!("MCP handshake complete");
            }
            "notifications/cancelled" | "$/cancelRequest" => {
                tracing::info!("Received cancellation notification; in-flight calls run to completion");
            }
            _ => {
                tracing::debug!("Unknown notification: {}", notification.method);
            }
        }
    }

    fn handle_initialize(&self, params: Option<Value>) -> GatewayResult<Value> {
        let init_params: InitializeParams = required_params(params, "Initialize params required")?;
        let result = negotiate(&init_params);
        serde_json::to_value(result).map_err(|e| GatewayError::InternalError(e.to_string()))
    }

    fn handle_tools_list(&self) -> GatewayResult<Value> {
        let result = ToolListResult {
            tools: self.registry.list(),
            next_cursor: None,
        };
        serde_json::to_value(result).map_err(|e| GatewayError::InternalError(e.to_string()))
    }

    async fn handle_tools_call(&self, params: Option<Value>, auth: &AuthContext) -> GatewayResult<Value> {
        let call_params: ToolCallParams = required_params(params, "Tool call params required")?;

        let ctx = ToolContext::new(auth.clone());
        let result = self
            .registry
            .call(&call_params.name, call_params.arguments, &ctx)
            .await?;

        serde_json::to_value(result).map_err(|e| GatewayError::InternalError(e.to_string()))
    }
}

fn required_params<T: DeserializeOwned>(params: Option<Value>, missing: &str) -> GatewayResult<T> {
    params
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| GatewayError::InvalidParams(e.to_string()))?
        .ok_or_else(|| GatewayError::InvalidParams(missing.to_string()))
}

fn tool_name(request: &JsonRpcRequest) -> Option<String> {
    if !matches!(request.method.as_str(), "tools/call" | "call_tool") {
        return None;
    }
    request
        .params
        .as_ref()
        .and_then(|p| p.get("name"))
        .and_then(Value::as_str)
        .map(str::to_string)
}
