//! Tool: search_events. Free-text search over one calendar.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use mailbridge::Calendar;

use crate::types::ToolDefinition;

use super::list_events::render;
use super::{parse_args, Tool, ToolContext, ToolResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchEventsParams {
    calendar_id: String,
    query: String,
    #[serde(default)]
    time_min: Option<String>,
    #[serde(default)]
    time_max: Option<String>,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "search_events".to_string(),
        description: Some("Search for events in a calendar by text query".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "calendarId": {
                    "type": "string",
                    "description": "ID of the calendar to search events in (use 'primary' for the main calendar)"
                },
                "query": {
                    "type": "string",
                    "description": "Free text search query (searches summary, description, location, attendees, etc.)"
                },
                "timeMin": {
                    "type": "string",
                    "description": "Start time boundary in ISO format with timezone required (e.g., 2024-01-01T00:00:00Z)"
                },
                "timeMax": {
                    "type": "string",
                    "description": "End time boundary in ISO format with timezone required (e.g., 2024-12-31T23:59:59Z)"
                }
            },
            "required": ["calendarId", "query"]
        }),
    }
}

pub struct SearchEvents {
    calendar: Arc<Calendar>,
}

impl SearchEvents {
    pub fn new(calendar: Arc<Calendar>) -> Self {
        Self { calendar }
    }
}

#[async_trait]
impl Tool for SearchEvents {
    fn definition(&self) -> ToolDefinition {
        definition()
    }

    async fn invoke(&self, args: Value, _ctx: &ToolContext) -> ToolResult {
        let params: SearchEventsParams = parse_args(args)?;
        let events = self
            .calendar
            .search(
                &params.calendar_id,
                &params.query,
                params.time_min.as_deref(),
                params.time_max.as_deref(),
            )
            .await?;
        Ok(Value::String(render(&events)))
    }
}
