//! Tool: delete_event.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use mailbridge::Calendar;

use crate::types::ToolDefinition;

use super::{parse_args, Tool, ToolContext, ToolResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteEventParams {
    calendar_id: String,
    event_id: String,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "delete_event".to_string(),
        description: Some("Delete a calendar event".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "calendarId": {"type": "string", "description": "ID of the calendar containing the event"},
                "eventId": {"type": "string", "description": "ID of the event to delete"}
            },
            "required": ["calendarId", "eventId"]
        }),
    }
}

pub struct DeleteEvent {
    calendar: Arc<Calendar>,
}

impl DeleteEvent {
    pub fn new(calendar: Arc<Calendar>) -> Self {
        Self { calendar }
    }
}

#[async_trait]
impl Tool for DeleteEvent {
    fn definition(&self) -> ToolDefinition {
        definition()
    }

    async fn invoke(&self, args: Value, _ctx: &ToolContext) -> ToolResult {
        let params: DeleteEventParams = parse_args(args)?;
        self.calendar
            .delete_event(&params.calendar_id, &params.event_id)
            .await?;
        Ok(json!({
            "success": true,
            "message": format!("Event with ID {} deleted successfully.", params.event_id)
        }))
    }
}
