//! Tool: draft_email.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use mailbridge::{Gmail, OutgoingEmail};

use crate::types::ToolDefinition;

use super::{parse_args, send_email, Tool, ToolContext, ToolResult};

/// Same arguments as `send_email`.
pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "draft_email".to_string(),
        description: Some("Drafts a new email".to_string()),
        input_schema: send_email::definition().input_schema,
    }
}

pub struct DraftEmail {
    gmail: Arc<Gmail>,
}

impl DraftEmail {
    pub fn new(gmail: Arc<Gmail>) -> Self {
        Self { gmail }
    }
}

#[async_trait]
impl Tool for DraftEmail {
    fn definition(&self) -> ToolDefinition {
        definition()
    }

    async fn invoke(&self, args: Value, _ctx: &ToolContext) -> ToolResult {
        let email: OutgoingEmail = parse_args(args)?;
        let id = self.gmail.draft(&email).await?;
        Ok(Value::String(format!(
            "Email draft created successfully with ID: {id}"
        )))
    }
}
