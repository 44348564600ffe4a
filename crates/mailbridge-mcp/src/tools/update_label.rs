//! Tool: update_label.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use mailbridge::{Gmail, LabelRequest};

use crate::types::ToolDefinition;

use super::create_label::{describe, label_properties};
use super::{parse_args, Tool, ToolContext, ToolResult};

#[derive(Debug, Deserialize)]
struct UpdateLabelParams {
    id: String,
    #[serde(flatten)]
    request: LabelRequest,
}

pub fn definition() -> ToolDefinition {
    let mut properties = label_properties("New name for the label");
    properties.insert(
        "id".to_string(),
        json!({"type": "string", "description": "ID of the label to update"}),
    );
    ToolDefinition {
        name: "update_label".to_string(),
        description: Some("Updates an existing Gmail label".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": properties,
            "required": ["id"]
        }),
    }
}

pub struct UpdateLabel {
    gmail: Arc<Gmail>,
}

impl UpdateLabel {
    pub fn new(gmail: Arc<Gmail>) -> Self {
        Self { gmail }
    }
}

#[async_trait]
impl Tool for UpdateLabel {
    fn definition(&self) -> ToolDefinition {
        definition()
    }

    async fn invoke(&self, args: Value, _ctx: &ToolContext) -> ToolResult {
        let params: UpdateLabelParams = parse_args(args)?;
        let label = self.gmail.update_label(&params.id, &params.request).await?;
        Ok(Value::String(format!(
            "Label updated successfully: {}",
            describe(&label)
        )))
    }
}
