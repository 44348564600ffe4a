//! Tool: list_email_labels.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use mailbridge::Gmail;

use crate::types::ToolDefinition;

use super::{Tool, ToolContext, ToolResult};

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "list_email_labels".to_string(),
        description: Some("Retrieves all available Gmail labels".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {}
        }),
    }
}

pub struct ListEmailLabels {
    gmail: Arc<Gmail>,
}

impl ListEmailLabels {
    pub fn new(gmail: Arc<Gmail>) -> Self {
        Self { gmail }
    }
}

#[async_trait]
impl Tool for ListEmailLabels {
    fn definition(&self) -> ToolDefinition {
        definition()
    }

    async fn invoke(&self, _args: Value, _ctx: &ToolContext) -> ToolResult {
        let labels = self.gmail.labels().await?;
        let text = labels
            .iter()
            .map(|l| format!("ID: {}\nName: {}\n", l.id, l.name))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(Value::String(text))
    }
}
