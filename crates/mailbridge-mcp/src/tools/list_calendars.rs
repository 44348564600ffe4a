//! Tool: list_calendars.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use mailbridge::{Calendar, CalendarSummary};

use crate::types::ToolDefinition;

use super::{Tool, ToolContext, ToolResult};

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "list_calendars".to_string(),
        description: Some("List all available calendars".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {}
        }),
    }
}

pub struct ListCalendars {
    calendar: Arc<Calendar>,
}

impl ListCalendars {
    pub fn new(calendar: Arc<Calendar>) -> Self {
        Self { calendar }
    }
}

fn render(calendars: &[CalendarSummary]) -> String {
    calendars
        .iter()
        .map(|c| {
            let title = if c.summary.is_empty() { "Untitled" } else { c.summary.as_str() };
            format!("{title} ({})", c.id)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl Tool for ListCalendars {
    fn definition(&self) -> ToolDefinition {
        definition()
    }

    async fn invoke(&self, _args: Value, _ctx: &ToolContext) -> ToolResult {
        let calendars = self.calendar.calendars().await?;
        Ok(Value::String(render(&calendars)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untitled_calendars() {
        let rows = vec![
            CalendarSummary {
                id: "primary".into(),
                summary: "Work".into(),
                time_zone: None,
                primary: true,
            },
            CalendarSummary {
                id: "x@group".into(),
                summary: String::new(),
                time_zone: None,
                primary: false,
            },
        ];
        assert_eq!(render(&rows), "Work (primary)\nUntitled (x@group)");
    }
}
