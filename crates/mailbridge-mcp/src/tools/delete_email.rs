//! Tool: delete_email.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use mailbridge::Gmail;

use crate::types::ToolDefinition;

use super::{parse_args, Tool, ToolContext, ToolResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteParams {
    message_id: String,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "delete_email".to_string(),
        description: Some("Permanently deletes an email".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "messageId": {"type": "string", "description": "ID of the email message to delete"}
            },
            "required": ["messageId"]
        }),
    }
}

pub struct DeleteEmail {
    gmail: Arc<Gmail>,
}

impl DeleteEmail {
    pub fn new(gmail: Arc<Gmail>) -> Self {
        Self { gmail }
    }
}

#[async_trait]
impl Tool for DeleteEmail {
    fn definition(&self) -> ToolDefinition {
        definition()
    }

    async fn invoke(&self, args: Value, _ctx: &ToolContext) -> ToolResult {
        let params: DeleteParams = parse_args(args)?;
        self.gmail.delete(&params.message_id).await?;
        tracing::info!(message_id = %params.message_id, "Email deleted");
        Ok(Value::String(format!(
            "Email {} deleted successfully",
            params.message_id
        )))
    }
}
