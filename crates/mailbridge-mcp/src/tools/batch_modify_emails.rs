//! Tool: batch_modify_emails.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use mailbridge::{Gmail, LabelModification};

use crate::types::ToolDefinition;

use super::{parse_args, Tool, ToolContext, ToolResult};

/// Messages handled concurrently per batch unless the caller says otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 50;

pub(crate) fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchModifyParams {
    message_ids: Vec<String>,
    #[serde(default)]
    add_label_ids: Option<Vec<String>>,
    #[serde(default)]
    remove_label_ids: Option<Vec<String>>,
    #[serde(default = "default_batch_size")]
    batch_size: usize,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "batch_modify_emails".to_string(),
        description: Some("Modifies labels for multiple emails in batches".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "messageIds": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "List of message IDs to modify"
                },
                "addLabelIds": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "List of label IDs to add to all messages"
                },
                "removeLabelIds": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "List of label IDs to remove from all messages"
                },
                "batchSize": {
                    "type": "integer",
                    "default": DEFAULT_BATCH_SIZE,
                    "description": "Number of messages to process in each batch (default: 50)"
                }
            },
            "required": ["messageIds"]
        }),
    }
}

pub struct BatchModifyEmails {
    gmail: Arc<Gmail>,
}

impl BatchModifyEmails {
    pub fn new(gmail: Arc<Gmail>) -> Self {
        Self { gmail }
    }
}

#[async_trait]
impl Tool for BatchModifyEmails {
    fn definition(&self) -> ToolDefinition {
        definition()
    }

    async fn invoke(&self, args: Value, _ctx: &ToolContext) -> ToolResult {
        let params: BatchModifyParams = parse_args(args)?;
        let changes = LabelModification {
            label_ids: None,
            add_label_ids: params.add_label_ids,
            remove_label_ids: params.remove_label_ids,
        };
        let count = self
            .gmail
            .batch_modify(&params.message_ids, &changes, params.batch_size)
            .await?;
        Ok(Value::String(format!(
            "Batch modification completed for {count} messages."
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_size_defaults() {
        let params: BatchModifyParams =
            serde_json::from_value(json!({"messageIds": ["a", "b"]})).unwrap();
        assert_eq!(params.batch_size, 50);
        assert!(params.add_label_ids.is_none());

        let params: BatchModifyParams =
            serde_json::from_value(json!({"messageIds": [], "batchSize": 5})).unwrap();
        assert_eq!(params.batch_size, 5);
    }
}
