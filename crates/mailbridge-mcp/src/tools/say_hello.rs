//! Tool: say_hello. Returns a warm hello to the name provided.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::types::ToolDefinition;

use super::{parse_args, Tool, ToolContext, ToolResult};

#[derive(Debug, Deserialize)]
struct SayHelloParams {
    name: String,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "say_hello".to_string(),
        description: Some(
            "say hello is a tool that returns a warm hello to the name provided.".to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "description": "name of the person to say hello to"
                }
            },
            "required": ["name"]
        }),
    }
}

pub struct SayHello;

#[async_trait]
impl Tool for SayHello {
    fn definition(&self) -> ToolDefinition {
        definition()
    }

    async fn invoke(&self, args: Value, _ctx: &ToolContext) -> ToolResult {
        let params: SayHelloParams = parse_args(args)?;
        Ok(Value::String(format!("hello {}", params.name)))
    }
}
