//! Tool: get_or_create_label.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use mailbridge::{Gmail, LabelRequest};

use crate::types::ToolDefinition;

use super::create_label::{describe, label_properties};
use super::{parse_args, Tool, ToolContext, ToolResult};

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "get_or_create_label".to_string(),
        description: Some(
            "Gets an existing label by name or creates it if it doesn't exist".to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": label_properties("Name of the label to get or create"),
            "required": ["name"]
        }),
    }
}

pub struct GetOrCreateLabel {
    gmail: Arc<Gmail>,
}

impl GetOrCreateLabel {
    pub fn new(gmail: Arc<Gmail>) -> Self {
        Self { gmail }
    }
}

#[async_trait]
impl Tool for GetOrCreateLabel {
    fn definition(&self) -> ToolDefinition {
        definition()
    }

    async fn invoke(&self, args: Value, _ctx: &ToolContext) -> ToolResult {
        let request: LabelRequest = parse_args(args)?;
        let (label, created) = self.gmail.get_or_create_label(&request).await?;
        let text = if created {
            format!("Label created successfully: {}", describe(&label))
        } else {
            format!("Label found: {}", describe(&label))
        };
        Ok(Value::String(text))
    }
}
