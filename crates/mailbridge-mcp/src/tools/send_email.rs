//! Tool: send_email.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use mailbridge::{Gmail, OutgoingEmail};

use crate::types::ToolDefinition;

use super::{parse_args, Tool, ToolContext, ToolResult};

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "send_email".to_string(),
        description: Some("Sends a new email".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "to": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "List of recipient email addresses"
                },
                "subject": {"type": "string", "description": "Email subject"},
                "body": {"type": "string", "description": "Email body content"},
                "cc": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "List of CC recipients"
                },
                "bcc": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "List of BCC recipients"
                },
                "threadId": {"type": "string", "description": "Thread ID to reply to"},
                "inReplyTo": {"type": "string", "description": "Message ID being replied to"}
            },
            "required": ["to", "subject", "body"]
        }),
    }
}

pub struct SendEmail {
    gmail: Arc<Gmail>,
}

impl SendEmail {
    pub fn new(gmail: Arc<Gmail>) -> Self {
        Self { gmail }
    }
}

#[async_trait]
impl Tool for SendEmail {
    fn definition(&self) -> ToolDefinition {
        definition()
    }

    async fn invoke(&self, args: Value, _ctx: &ToolContext) -> ToolResult {
        let email: OutgoingEmail = parse_args(args)?;
        let id = self.gmail.send(&email).await?;
        tracing::info!(message_id = %id, recipients = email.to.len(), "Email sent");
        Ok(Value::String(format!("Email sent successfully with ID: {id}")))
    }
}
