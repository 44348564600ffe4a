//! Tool: batch_delete_emails.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use mailbridge::Gmail;

use crate::types::ToolDefinition;

use super::batch_modify_emails::{default_batch_size, DEFAULT_BATCH_SIZE};
use super::{parse_args, Tool, ToolContext, ToolResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchDeleteParams {
    message_ids: Vec<String>,
    #[serde(default = "default_batch_size")]
    batch_size: usize,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "batch_delete_emails".to_string(),
        description: Some("Permanently deletes multiple emails in batches".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "messageIds": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "List of message IDs to delete"
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

pub struct BatchDeleteEmails {
    gmail: Arc<Gmail>,
}

impl BatchDeleteEmails {
    pub fn new(gmail: Arc<Gmail>) -> Self {
        Self { gmail }
    }
}

#[async_trait]
impl Tool for BatchDeleteEmails {
    fn definition(&self) -> ToolDefinition {
        definition()
    }

    async fn invoke(&self, args: Value, _ctx: &ToolContext) -> ToolResult {
        let params: BatchDeleteParams = parse_args(args)?;
        let count = self
            .gmail
            .batch_delete(&params.message_ids, params.batch_size)
            .await?;
        tracing::info!(count, "Emails deleted");
        Ok(Value::String(format!(
            "Batch deletion completed for {count} messages."
        )))
    }
}
