//! Tool: create_label. Also holds the label schema shared by the other label tools.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use mailbridge::{Gmail, Label, LabelRequest};

use crate::types::ToolDefinition;

use super::{parse_args, Tool, ToolContext, ToolResult};

/// Label schema properties: `name` plus both visibility settings.
pub(crate) fn label_properties(name_description: &str) -> Map<String, Value> {
    let properties = json!({
        "name": {"type": "string", "description": name_description},
        "messageListVisibility": {
            "type": "string",
            "enum": ["show", "hide"],
            "description": "Whether to show or hide the label in the message list"
        },
        "labelListVisibility": {
            "type": "string",
            "enum": ["labelShow", "labelShowIfUnread", "labelHide"],
            "description": "Visibility of the label in the label list"
        }
    });
    match properties {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

pub(crate) fn describe(label: &Label) -> String {
    format!("ID: {}, Name: {}", label.id, label.name)
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "create_label".to_string(),
        description: Some("Creates a new Gmail label".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": label_properties("Name for the new label"),
            "required": ["name"]
        }),
    }
}

pub struct CreateLabel {
    gmail: Arc<Gmail>,
}

impl CreateLabel {
    pub fn new(gmail: Arc<Gmail>) -> Self {
        Self { gmail }
    }
}

#[async_trait]
impl Tool for CreateLabel {
    fn definition(&self) -> ToolDefinition {
        definition()
    }

    async fn invoke(&self, args: Value, _ctx: &ToolContext) -> ToolResult {
        let request: LabelRequest = parse_args(args)?;
        let label = self.gmail.create_label(&request).await?;
        Ok(Value::String(format!(
            "Label created successfully: {}",
            describe(&label)
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::validate_arguments;

    #[test]
    fn test_schema_requires_name() {
        let schema = definition().input_schema;
        assert!(validate_arguments(&schema, &json!({"name": "Work"})).is_ok());
        assert!(validate_arguments(&schema, &json!({"labelListVisibility": "labelHide"})).is_err());
        assert_eq!(
            schema["properties"]["messageListVisibility"]["enum"],
            json!(["show", "hide"])
        );
    }

    #[test]
    fn test_unknown_visibility_is_rejected() {
        let err = parse_args::<LabelRequest>(json!({"name": "x", "messageListVisibility": "maybe"}))
            .unwrap_err();
        assert!(matches!(err, crate::tools::ToolError::InvalidArguments(_)));
    }
}
