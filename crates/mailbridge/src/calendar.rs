//! Google Calendar REST helpers.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::client::{endpoint, GoogleClient};
use crate::types::{
    CalendarSummary, ColorPalette, EventRequest, EventSummary, FreeBusyRequest, FreeBusyResponse,
    GoogleError, GoogleResult,
};

const CALENDAR_API: &str = "https://www.googleapis.com/calendar/v3";

#[derive(Debug, Default, Deserialize)]
struct CalendarList {
    #[serde(default)]
    items: Vec<CalendarSummary>,
}

#[derive(Debug, Default, Deserialize)]
struct EventList {
    #[serde(default)]
    items: Vec<EventSummary>,
}

/// Require an RFC 3339 timestamp with an explicit `Z` or `±HH:MM` offset.
pub fn validate_timestamp(field: &str, value: &str) -> GoogleResult<()> {
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|_| ())
        .map_err(|_| {
            GoogleError::InvalidInput(format!(
                "{field} must be ISO format with timezone (e.g., 2024-01-01T00:00:00Z or 2024-01-01T00:00:00+00:00)"
            ))
        })
}

/// Widest interval a free/busy query may span.
pub const MAX_FREE_BUSY_DAYS: i64 = 90;

/// Whether `time_max - time_min` stays within [`MAX_FREE_BUSY_DAYS`].
pub fn within_free_busy_window(time_min: &str, time_max: &str) -> GoogleResult<bool> {
    validate_timestamp("timeMin", time_min)?;
    validate_timestamp("timeMax", time_max)?;
    let min = chrono::DateTime::parse_from_rfc3339(time_min)
        .map_err(|e| GoogleError::InvalidInput(e.to_string()))?;
    let max = chrono::DateTime::parse_from_rfc3339(time_max)
        .map_err(|e| GoogleError::InvalidInput(e.to_string()))?;
    Ok(max - min <= chrono::Duration::days(MAX_FREE_BUSY_DAYS))
}

/// Calendar API bound to the authorized user.
pub struct Calendar {
    client: Arc<GoogleClient>,
}

impl Calendar {
    pub fn new(client: Arc<GoogleClient>) -> Self {
        Self { client }
    }

    pub async fn calendars(&self) -> GoogleResult<Vec<CalendarSummary>> {
        let list: CalendarList = self
            .client
            .get_json(&format!("{CALENDAR_API}/users/me/calendarList"), &[])
            .await?;
        Ok(list.items)
    }

    /// Events of one calendar, expanded into single instances and ordered by start.
    pub async fn events(
        &self,
        calendar_id: &str,
        time_min: Option<&str>,
        time_max: Option<&str>,
    ) -> GoogleResult<Vec<EventSummary>> {
        self.list_events(calendar_id, None, time_min, time_max).await
    }

    /// Events matching a free-text query (summary, description, location, attendees).
    pub async fn search(
        &self,
        calendar_id: &str,
        query: &str,
        time_min: Option<&str>,
        time_max: Option<&str>,
    ) -> GoogleResult<Vec<EventSummary>> {
        self.list_events(calendar_id, Some(query), time_min, time_max)
            .await
    }

    async fn list_events(
        &self,
        calendar_id: &str,
        text: Option<&str>,
        time_min: Option<&str>,
        time_max: Option<&str>,
    ) -> GoogleResult<Vec<EventSummary>> {
        let mut query = vec![
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
        ];
        if let Some(text) = text {
            query.push(("q", text.to_string()));
        }
        if let Some(min) = time_min {
            validate_timestamp("timeMin", min)?;
            query.push(("timeMin", min.to_string()));
        }
        if let Some(max) = time_max {
            validate_timestamp("timeMax", max)?;
            query.push(("timeMax", max.to_string()));
        }

        let list: EventList = self
            .client
            .get_json(&events_url(calendar_id)?, &query)
            .await?;
        Ok(list.items)
    }

    /// Insert an event, returning the created resource as Google reports it.
    pub async fn create_event(&self, calendar_id: &str, event: &EventRequest) -> GoogleResult<Value> {
        validate_event_times(event)?;
        self.client.post_json(&events_url(calendar_id)?, event).await
    }

    /// Patch the fields present in `changes`.
    pub async fn update_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        changes: &EventRequest,
    ) -> GoogleResult<EventSummary> {
        validate_event_times(changes)?;
        self.client
            .patch_json(
                &endpoint(CALENDAR_API, &["calendars", calendar_id, "events", event_id])?,
                changes,
            )
            .await
    }

    pub async fn delete_event(&self, calendar_id: &str, event_id: &str) -> GoogleResult<()> {
        self.client
            .delete(&endpoint(
                CALENDAR_API,
                &["calendars", calendar_id, "events", event_id],
            )?)
            .await
    }

    pub async fn free_busy(&self, request: &FreeBusyRequest) -> GoogleResult<FreeBusyResponse> {
        validate_timestamp("timeMin", &request.time_min)?;
        validate_timestamp("timeMax", &request.time_max)?;
        if request.group_expansion_max.is_some_and(|n| n > 100) {
            return Err(GoogleError::InvalidInput(
                "groupExpansionMax must be at most 100".to_string(),
            ));
        }
        if request.calendar_expansion_max.is_some_and(|n| n > 50) {
            return Err(GoogleError::InvalidInput(
                "calendarExpansionMax must be at most 50".to_string(),
            ));
        }
        if let Some(item) = request.items.iter().find(|i| !looks_like_email(&i.id)) {
            return Err(GoogleError::InvalidInput(format!(
                "{}: Must be a valid email address",
                item.id
            )));
        }

        self.client
            .post_json(&format!("{CALENDAR_API}/freeBusy"), request)
            .await
    }

    pub async fn colors(&self) -> GoogleResult<ColorPalette> {
        self.client
            .get_json(&format!("{CALENDAR_API}/colors"), &[])
            .await
    }
}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    }
}

fn events_url(calendar_id: &str) -> GoogleResult<String> {
    if calendar_id.is_empty() {
        return Err(GoogleError::InvalidInput("calendarId must not be empty".to_string()));
    }
    endpoint(CALENDAR_API, &["calendars", calendar_id, "events"])
}

fn validate_event_times(event: &EventRequest) -> GoogleResult<()> {
    for (field, time) in [("start", &event.start), ("end", &event.end)] {
        if let Some(value) = time.as_ref().and_then(|t| t.date_time.as_deref()) {
            validate_timestamp(field, value)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamps_need_timezone() {
        assert!(validate_timestamp("timeMin", "2024-01-01T00:00:00Z").is_ok());
        assert!(validate_timestamp("timeMin", "2024-01-01T00:00:00+02:00").is_ok());
        assert!(validate_timestamp("timeMin", "2024-01-01T00:00:00").is_err());
        assert!(validate_timestamp("timeMin", "tomorrow").is_err());
    }

    #[test]
    fn test_events_url_escapes_calendar_id() {
        let url = events_url("team@group.calendar.google.com").unwrap();
        assert_eq!(
            url,
            "https://www.googleapis.com/calendar/v3/calendars/team@group.calendar.google.com/events"
        );
        let url = events_url("a/b").unwrap();
        assert!(url.ends_with("/calendars/a%2Fb/events"));
        assert!(events_url("").is_err());
    }

    #[test]
    fn test_free_busy_window() {
        assert!(within_free_busy_window("2024-01-01T00:00:00Z", "2024-03-30T00:00:00Z").unwrap());
        assert!(!within_free_busy_window("2024-01-01T00:00:00Z", "2024-04-01T00:00:01Z").unwrap());
        assert!(within_free_busy_window("2024-01-01T00:00:00", "2024-01-02T00:00:00Z").is_err());
    }

    #[test]
    fn test_event_times_need_timezone() {
        let mut event = EventRequest {
            start: Some(crate::types::EventDateTime {
                date_time: Some("2024-08-15T10:00:00-07:00".into()),
                time_zone: Some("America/Los_Angeles".into()),
            }),
            ..Default::default()
        };
        assert!(validate_event_times(&event).is_ok());

        event.end = Some(crate::types::EventDateTime {
            date_time: Some("2024-08-15T11:00:00".into()),
            time_zone: None,
        });
        let err = validate_event_times(&event).unwrap_err();
        assert!(err.to_string().starts_with("Invalid input: end must be ISO format"));
    }

    #[test]
    fn test_email_shape() {
        assert!(looks_like_email("ada@example.com"));
        assert!(!looks_like_email("primary"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("ada@localhost"));
    }
}
