//! Tool: list_events.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use mailbridge::{Calendar, EventSummary};

use crate::types::ToolDefinition;

use super::{parse_args, Tool, ToolContext, ToolResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListEventsParams {
    calendar_id: String,
    #[serde(default)]
    time_min: Option<String>,
    #[serde(default)]
    time_max: Option<String>,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "list_events".to_string(),
        description: Some("Lists events on a calendar".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "calendarId": {
                    "type": "string",
                    "description": "ID of the calendar to list events from (use 'primary' for the main calendar)"
                },
                "timeMin": {
                    "type": "string",
                    "description": "Start time in ISO format with timezone required (e.g., 2024-01-01T00:00:00Z or 2024-01-01T00:00:00+00:00)"
                },
                "timeMax": {
                    "type": "string",
                    "description": "End time in ISO format with timezone required (e.g., 2024-12-31T23:59:59Z or 2024-12-31T23:59:59+00:00)"
                }
            },
            "required": ["calendarId"]
        }),
    }
}

pub struct ListEvents {
    calendar: Arc<Calendar>,
}

impl ListEvents {
    pub fn new(calendar: Arc<Calendar>) -> Self {
        Self { calendar }
    }
}

pub(crate) fn render(events: &[EventSummary]) -> String {
    events
        .iter()
        .map(|e| {
            let mut block = format!(
                "{} ({})\nStart: {}\nEnd: {}",
                if e.summary.is_empty() { "Untitled" } else { e.summary.as_str() },
                e.id,
                e.start.display(),
                e.end.display()
            );
            if let Some(location) = &e.location {
                block.push_str(&format!("\nLocation: {location}"));
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl Tool for ListEvents {
    fn definition(&self) -> ToolDefinition {
        definition()
    }

    async fn invoke(&self, args: Value, _ctx: &ToolContext) -> ToolResult {
        let params: ListEventsParams = parse_args(args)?;
        let events = self
            .calendar
            .events(
                &params.calendar_id,
                params.time_min.as_deref(),
                params.time_max.as_deref(),
            )
            .await?;
        Ok(Value::String(render(&events)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailbridge::EventTime;

    #[test]
    fn test_render_event() {
        let events = vec![EventSummary {
            id: "ev1".into(),
            summary: "Standup".into(),
            start: EventTime {
                date_time: Some("2024-01-01T09:00:00Z".into()),
                date: None,
            },
            end: EventTime {
                date_time: None,
                date: Some("2024-01-02".into()),
            },
            location: Some("Room 1".into()),
        }];
        assert_eq!(
            render(&events),
            "Standup (ev1)\nStart: 2024-01-01T09:00:00Z\nEnd: 2024-01-02\nLocation: Room 1"
        );
    }
}
