//! Tool: modify_email. Moves a message between labels.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use mailbridge::{Gmail, LabelModification};

use crate::types::ToolDefinition;

use super::{parse_args, Tool, ToolContext, ToolResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModifyParams {
    message_id: String,
    #[serde(flatten)]
    changes: LabelModification,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "modify_email".to_string(),
        description: Some("Modifies email labels (move to different folders)".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "messageId": {"type": "string", "description": "ID of the email message to modify"},
                "labelIds": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "List of label IDs to apply"
                },
                "addLabelIds": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "List of label IDs to add to the message"
                },
                "removeLabelIds": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "List of label IDs to remove from the message"
                }
            },
            "required": ["messageId"]
        }),
    }
}

pub struct ModifyEmail {
    gmail: Arc<Gmail>,
}

impl ModifyEmail {
    pub fn new(gmail: Arc<Gmail>) -> Self {
        Self { gmail }
    }
}

#[async_trait]
impl Tool for ModifyEmail {
    fn definition(&self) -> ToolDefinition {
        definition()
    }

    async fn invoke(&self, args: Value, _ctx: &ToolContext) -> ToolResult {
        let params: ModifyParams = parse_args(args)?;
        self.gmail.modify(&params.message_id, &params.changes).await?;
        Ok(Value::String(format!(
            "Email {} labels updated successfully",
            params.message_id
        )))
    }
}
