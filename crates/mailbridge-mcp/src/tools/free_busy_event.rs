//! Tool: free_busy_event. Busy intervals for a set of calendars.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use mailbridge::{within_free_busy_window, Calendar, FreeBusyRequest, FreeBusyResponse};

use crate::types::ToolDefinition;

use super::{parse_args, Tool, ToolContext, ToolResult};

pub const WINDOW_TOO_LONG: &str =
    "The time gap between timeMin and timeMax must be less than 3 months";

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "free_busy_event".to_string(),
        description: Some(
            "Query free/busy information for calendars. Note: Time range is limited to a maximum of 3 months between timeMin and timeMax."
                .to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "timeMin": {
                    "type": "string",
                    "description": "The start of the interval in RFC3339 format"
                },
                "timeMax": {
                    "type": "string",
                    "description": "The end of the interval in RFC3339 format"
                },
                "timeZone": {
                    "type": "string",
                    "description": "Optional. Time zone used in the response (default is UTC)"
                },
                "groupExpansionMax": {
                    "type": "integer",
                    "description": "Optional. Maximum number of calendar identifiers to expand per group (max 100)"
                },
                "calendarExpansionMax": {
                    "type": "integer",
                    "description": "Optional. Maximum number of calendars to expand (max 50)"
                },
                "items": {
                    "type": "array",
                    "description": "List of calendar or group identifiers to check availability for",
                    "items": {
                        "type": "object",
                        "properties": {
                            "id": {"type": "string", "description": "The identifier of a calendar or group, it usually is a mail format"}
                        },
                        "required": ["id"]
                    }
                }
            },
            "required": ["timeMin", "timeMax", "items"]
        }),
    }
}

pub struct FreeBusyEvent {
    calendar: Arc<Calendar>,
}

impl FreeBusyEvent {
    pub fn new(calendar: Arc<Calendar>) -> Self {
        Self { calendar }
    }
}

/// One paragraph per calendar: unknown account, free, or the busy intervals.
fn summarize(response: &FreeBusyResponse) -> String {
    response
        .calendars
        .iter()
        .map(|(email, calendar)| {
            if calendar.errors.iter().any(|e| e.reason == "notFound") {
                format!("Cannot check availability for {email} (account not found)\n")
            } else if calendar.busy.is_empty() {
                format!(
                    "{email} is available during {} to {}, please schedule calendar to {email} if you want \n",
                    response.time_min, response.time_max
                )
            } else {
                let slots: String = calendar
                    .busy
                    .iter()
                    .map(|slot| format!("- From {} to {}\n", slot.start, slot.end))
                    .collect();
                format!("{email} is busy during:\n{slots}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[async_trait]
impl Tool for FreeBusyEvent {
    fn definition(&self) -> ToolDefinition {
        definition()
    }

    async fn invoke(&self, args: Value, _ctx: &ToolContext) -> ToolResult {
        let request: FreeBusyRequest = parse_args(args)?;
        if !within_free_busy_window(&request.time_min, &request.time_max)? {
            return Ok(Value::String(WINDOW_TOO_LONG.to_string()));
        }
        let response = self.calendar.free_busy(&request).await?;
        Ok(Value::String(summarize(&response)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(calendars: Value) -> FreeBusyResponse {
        serde_json::from_value(json!({
            "timeMin": "2024-08-15T00:00:00Z",
            "timeMax": "2024-08-16T00:00:00Z",
            "calendars": calendars
        }))
        .unwrap()
    }

    #[test]
    fn test_summary_per_calendar() {
        let text = summarize(&response(json!({
            "a@example.com": {"busy": [{"start": "2024-08-15T09:00:00Z", "end": "2024-08-15T10:00:00Z"}]},
            "b@example.com": {"busy": []},
            "c@example.com": {"errors": [{"domain": "global", "reason": "notFound"}], "busy": []}
        })));
        assert_eq!(
            text,
            "a@example.com is busy during:\n- From 2024-08-15T09:00:00Z to 2024-08-15T10:00:00Z\n\n\
             b@example.com is available during 2024-08-15T00:00:00Z to 2024-08-16T00:00:00Z, please schedule calendar to b@example.com if you want \n\n\
             Cannot check availability for c@example.com (account not found)"
        );
    }

    #[tokio::test]
    async fn test_long_window_is_refused_before_any_request() {
        use mailbridge::{GoogleClient, OAuthKeys};

        let client = GoogleClient::new(
            reqwest::Client::new(),
            OAuthKeys {
                client_id: "cid".into(),
                client_secret: "secret".into(),
            },
            "http://localhost:3000/oauth2callback".into(),
            None,
            std::path::PathBuf::from("unused.json"),
        );
        let calendar = Arc::new(Calendar::new(Arc::new(client)));
        let out = FreeBusyEvent::new(calendar)
            .invoke(
                json!({
                    "timeMin": "2024-01-01T00:00:00Z",
                    "timeMax": "2024-06-01T00:00:00Z",
                    "items": [{"id": "a@example.com"}]
                }),
                &ToolContext::default(),
            )
            .await
            .unwrap();
        assert_eq!(out, Value::String(WINDOW_TOO_LONG.to_string()));
    }
}
