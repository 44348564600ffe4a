//! Tool: update_event.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use mailbridge::Calendar;

use crate::types::ToolDefinition;

use super::create_event::{event_properties, EventFields};
use super::{parse_args, Tool, ToolContext, ToolResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateEventParams {
    calendar_id: String,
    event_id: String,
    #[serde(flatten)]
    fields: EventFields,
}

pub fn definition() -> ToolDefinition {
    let mut properties = event_properties();
    properties.insert(
        "calendarId".to_string(),
        json!({"type": "string", "description": "ID of the calendar containing the event"}),
    );
    properties.insert(
        "eventId".to_string(),
        json!({"type": "string", "description": "ID of the event to update"}),
    );
    ToolDefinition {
        name: "update_event".to_string(),
        description: Some("Update an existing calendar event".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": properties,
            "required": ["calendarId", "eventId", "timeZone"]
        }),
    }
}

pub struct UpdateEvent {
    calendar: Arc<Calendar>,
}

impl UpdateEvent {
    pub fn new(calendar: Arc<Calendar>) -> Self {
        Self { calendar }
    }
}

#[async_trait]
impl Tool for UpdateEvent {
    fn definition(&self) -> ToolDefinition {
        definition()
    }

    async fn invoke(&self, args: Value, _ctx: &ToolContext) -> ToolResult {
        let params: UpdateEventParams = parse_args(args)?;
        let event = self
            .calendar
            .update_event(
                &params.calendar_id,
                &params.event_id,
                &params.fields.into_request(),
            )
            .await?;
        Ok(Value::String(format!(
            "Event updated: {} ({})",
            event.summary, event.id
        )))
    }
}
