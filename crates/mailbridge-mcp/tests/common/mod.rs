//! Shared fixtures for the gateway integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use mailbridge_mcp::tools::say_hello::SayHello;
use mailbridge_mcp::tools::{Tool, ToolContext, ToolError, ToolResult};
use mailbridge_mcp::types::ToolDefinition;
use mailbridge_mcp::{ProtocolHandler, ToolRegistry};

/// Returns the caller's credentials.
pub struct WhoAmI;

#[async_trait]
impl Tool for WhoAmI {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "whoami".to_string(),
            description: Some("Echo the session credentials".to_string()),
            input_schema: json!({"type": "object", "properties": {}}),
        }
    }

    async fn invoke(&self, _args: Value, ctx: &ToolContext) -> ToolResult {
        Ok(json!({"token": ctx.auth.token, "api_key": ctx.auth.api_key}))
    }
}

/// Always fails with "boom".
pub struct Boom;

#[async_trait]
impl Tool for Boom {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "boom".to_string(),
            description: None,
            input_schema: json!({"type": "object", "properties": {}}),
        }
    }

    async fn invoke(&self, _args: Value, _ctx: &ToolContext) -> ToolResult {
        Err(ToolError::Failed("boom".to_string()))
    }
}

/// Sleeps for `ms` milliseconds, then answers with the same number.
pub struct Sleepy;

#[async_trait]
impl Tool for Sleepy {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "sleepy".to_string(),
            description: None,
            input_schema: json!({
                "type": "object",
                "properties": {"ms": {"type": "integer"}},
                "required": ["ms"]
            }),
        }
    }

    async fn invoke(&self, args: Value, _ctx: &ToolContext) -> ToolResult {
        let ms = args["ms"].as_u64().unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Ok(json!(ms))
    }
}

/// Counts invocations; requires a `name` argument.
pub struct Counted {
    pub calls: Arc<AtomicUsize>,
}

impl Counted {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Tool for Counted {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "counted".to_string(),
            description: None,
            input_schema: json!({
                "type": "object",
                "properties": {"name": {"type": "string"}},
                "required": ["name"]
            }),
        }
    }

    async fn invoke(&self, _args: Value, _ctx: &ToolContext) -> ToolResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!("counted"))
    }
}

/// Registry with the greeting tool plus the fixtures above.
pub fn test_registry(calls: Arc<AtomicUsize>) -> ToolRegistry {
    ToolRegistry::builder()
        .register(SayHello)
        .register(WhoAmI)
        .register(Boom)
        .register(Sleepy)
        .register(Counted { calls })
        .build()
        .expect("fixture tool names are unique")
}

pub fn test_handler() -> ProtocolHandler {
    ProtocolHandler::new(Arc::new(test_registry(Arc::new(AtomicUsize::new(0)))))
}

pub fn tool_call(id: i64, name: &str, arguments: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": {"name": name, "arguments": arguments}
    })
}

pub fn init_request(id: i64) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "initialize",
        "params": {
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": {"name": "test-client", "version": "1.0"}
        }
    })
}
