//! Tool: create_event. Also holds the event fields shared with update_event.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use mailbridge::{Attendee, Calendar, EventDateTime, EventRequest, Reminders};

use crate::types::ToolDefinition;

use super::{parse_args, Tool, ToolContext, ToolResult};

const ISO_HINT: &str = "in ISO format with timezone required (e.g., 2024-08-15T10:00:00Z or 2024-08-15T10:00:00-07:00)";

/// Writable event fields as clients send them.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EventFields {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    start: Option<String>,
    #[serde(default)]
    end: Option<String>,
    #[serde(default)]
    time_zone: Option<String>,
    #[serde(default)]
    attendees: Option<Vec<Attendee>>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    color_id: Option<String>,
    #[serde(default)]
    reminders: Option<Reminders>,
    #[serde(default)]
    recurrence: Option<Vec<String>>,
}

impl EventFields {
    /// Request body. Whenever a time zone is given, both `start` and `end`
    /// carry it, even without a new date-time.
    pub(crate) fn into_request(self) -> EventRequest {
        let EventFields {
            summary,
            description,
            start,
            end,
            time_zone,
            attendees,
            location,
            color_id,
            reminders,
            recurrence,
        } = self;

        let at = |date_time: Option<String>| {
            (date_time.is_some() || time_zone.is_some()).then(|| EventDateTime {
                date_time,
                time_zone: time_zone.clone(),
            })
        };

        EventRequest {
            summary,
            description,
            start: at(start),
            end: at(end),
            attendees,
            location,
            color_id,
            reminders,
            recurrence,
        }
    }
}

/// Schema properties for the writable event fields.
pub(crate) fn event_properties() -> Map<String, Value> {
    let properties = json!({
        "summary": {"type": "string", "description": "Title of the event"},
        "description": {"type": "string", "description": "Description/notes for the event (optional)"},
        "start": {"type": "string", "description": format!("Start time {ISO_HINT}")},
        "end": {"type": "string", "description": format!("End time {ISO_HINT}")},
        "timeZone": {
            "type": "string",
            "description": "Timezone of the event start/end times, formatted as an IANA Time Zone Database name (e.g., America/Los_Angeles)"
        },
        "attendees": {
            "type": "array",
            "items": {
                "type": "object",
                "properties": {"email": {"type": "string", "description": "Email address of the attendee"}},
                "required": ["email"]
            },
            "description": "List of attendee email addresses (optional)"
        },
        "location": {"type": "string", "description": "Location of the event (optional)"},
        "colorId": {
            "type": "string",
            "description": "Color ID for the event (optional, use list_colors to see available IDs)"
        },
        "reminders": {
            "type": "object",
            "properties": {
                "useDefault": {"type": "boolean", "description": "Whether to use the default reminders"},
                "overrides": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "method": {"type": "string", "enum": ["email", "popup"], "default": "popup"},
                            "minutes": {"type": "number", "description": "Minutes before the event to trigger the reminder"}
                        },
                        "required": ["minutes"]
                    }
                }
            },
            "required": ["useDefault"],
            "description": "Reminder settings for the event"
        },
        "recurrence": {
            "type": "array",
            "items": {"type": "string"},
            "description": "List of recurrence rules (RRULE, EXRULE, RDATE, EXDATE) in RFC5545 format (optional). Example: [\"RRULE:FREQ=WEEKLY;COUNT=5\"]"
        }
    });
    match properties {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateEventParams {
    calendar_id: String,
    #[serde(flatten)]
    fields: EventFields,
}

pub fn definition() -> ToolDefinition {
    let mut properties = event_properties();
    properties.insert(
        "calendarId".to_string(),
        json!({
            "type": "string",
            "description": "ID of the calendar to create the event in (use 'primary' for the main calendar)"
        }),
    );
    ToolDefinition {
        name: "create_event".to_string(),
        description: Some("Create a new calendar event".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": properties,
            "required": ["calendarId", "summary", "start", "end", "timeZone"]
        }),
    }
}

pub struct CreateEvent {
    calendar: Arc<Calendar>,
}

impl CreateEvent {
    pub fn new(calendar: Arc<Calendar>) -> Self {
        Self { calendar }
    }
}

#[async_trait]
impl Tool for CreateEvent {
    fn definition(&self) -> ToolDefinition {
        definition()
    }

    async fn invoke(&self, args: Value, _ctx: &ToolContext) -> ToolResult {
        let params: CreateEventParams = parse_args(args)?;
        let event = self
            .calendar
            .create_event(&params.calendar_id, &params.fields.into_request())
            .await?;
        Ok(event)
    }
}
