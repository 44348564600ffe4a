//! Tool: read_email.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use mailbridge::{EmailContent, Gmail};

use crate::types::ToolDefinition;

use super::{parse_args, Tool, ToolContext, ToolResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadParams {
    message_id: String,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "read_email".to_string(),
        description: Some("Retrieves the content of a specific email".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "messageId": {
                    "type": "string",
                    "description": "ID of the email message to retrieve"
                }
            },
            "required": ["messageId"]
        }),
    }
}

pub struct ReadEmail {
    gmail: Arc<Gmail>,
}

impl ReadEmail {
    pub fn new(gmail: Arc<Gmail>) -> Self {
        Self { gmail }
    }
}

fn render(email: &EmailContent) -> String {
    format!(
        "Thread ID: {}\nSubject: {}\nFrom: {}\nTo: {}\nDate: {}\n\n{}",
        email.thread_id, email.subject, email.from, email.to, email.date, email.body
    )
}

#[async_trait]
impl Tool for ReadEmail {
    fn definition(&self) -> ToolDefinition {
        definition()
    }

    async fn invoke(&self, args: Value, _ctx: &ToolContext) -> ToolResult {
        let params: ReadParams = parse_args(args)?;
        let email = self.gmail.read(&params.message_id).await?;
        Ok(Value::String(render(&email)))
    }
}
