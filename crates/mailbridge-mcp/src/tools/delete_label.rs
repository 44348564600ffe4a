//! Tool: delete_label.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use mailbridge::Gmail;

use crate::types::ToolDefinition;

use super::{parse_args, Tool, ToolContext, ToolResult};

#[derive(Debug, Deserialize)]
struct DeleteLabelParams {
    id: String,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "delete_label".to_string(),
        description: Some("Deletes a Gmail label".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "id": {"type": "string", "description": "ID of the label to delete"}
            },
            "required": ["id"]
        }),
    }
}

pub struct DeleteLabel {
    gmail: Arc<Gmail>,
}

impl DeleteLabel {
    pub fn new(gmail: Arc<Gmail>) -> Self {
        Self { gmail }
    }
}

#[async_trait]
impl Tool for DeleteLabel {
    fn definition(&self) -> ToolDefinition {
        definition()
    }

    async fn invoke(&self, args: Value, _ctx: &ToolContext) -> ToolResult {
        let params: DeleteLabelParams = parse_args(args)?;
        self.gmail.delete_label(&params.id).await?;
        Ok(Value::String(format!(
            "Label deleted successfully: ID: {}",
            params.id
        )))
    }
}
