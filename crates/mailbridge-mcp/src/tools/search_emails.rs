//! Tool: search_emails. Gmail search syntax, one summary block per match.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use mailbridge::{Gmail, MessageSummary};

use crate::types::ToolDefinition;

use super::{parse_args, Tool, ToolContext, ToolResult};

const DEFAULT_MAX_RESULTS: u32 = 10;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchParams {
    query: String,
    #[serde(default)]
    max_results: Option<u32>,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "search_emails".to_string(),
        description: Some(
            "Searches for emails using Gmail search syntax and lists the results".to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Gmail search query (e.g., 'from:example@gmail.com')"
                },
                "maxResults": {
                    "type": "integer",
                    "description": "Maximum number of results to return",
                    "default": DEFAULT_MAX_RESULTS
                }
            },
            "required": ["query"]
        }),
    }
}

pub struct SearchEmails {
    gmail: Arc<Gmail>,
}

impl SearchEmails {
    pub fn new(gmail: Arc<Gmail>) -> Self {
        Self { gmail }
    }
}

fn render(results: &[MessageSummary]) -> String {
    results
        .iter()
        .map(|m| {
            format!(
                "ID: {}\nSubject: {}\nFrom: {}\nDate: {}\n",
                m.id, m.subject, m.from, m.date
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl Tool for SearchEmails {
    fn definition(&self) -> ToolDefinition {
        definition()
    }

    async fn invoke(&self, args: Value, _ctx: &ToolContext) -> ToolResult {
        let params: SearchParams = parse_args(args)?;
        let max = params.max_results.unwrap_or(DEFAULT_MAX_RESULTS);
        let results = self.gmail.search(&params.query, max).await?;
        Ok(Value::String(render(&results)))
    }
}
