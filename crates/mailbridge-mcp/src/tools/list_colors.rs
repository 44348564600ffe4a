//! Tool: list_colors.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use mailbridge::{Calendar, ColorPalette};

use crate::types::ToolDefinition;

use super::{Tool, ToolContext, ToolResult};

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "list_colors".to_string(),
        description: Some(
            "List available color IDs and their meanings for calendar events".to_string(),
        ),
        input_schema: json!({"type": "object", "properties": {}, "required": []}),
    }
}

pub struct ListColors {
    calendar: Arc<Calendar>,
}

impl ListColors {
    pub fn new(calendar: Arc<Calendar>) -> Self {
        Self { calendar }
    }
}

/// Event colors, ordered by numeric id.
fn render(palette: &ColorPalette) -> String {
    let mut colors: Vec<_> = palette.event.iter().collect();
    colors.sort_by_key(|(id, _)| (id.parse::<u32>().unwrap_or(u32::MAX), id.to_string()));

    let mut text = String::from("Available event colors:\n");
    for (id, color) in colors {
        text.push_str(&format!(
            "Color ID: {id} - {} (background) / {} (foreground)\n",
            color.background, color.foreground
        ));
    }
    text.trim_end().to_string()
}

#[async_trait]
impl Tool for ListColors {
    fn definition(&self) -> ToolDefinition {
        definition()
    }

    async fn invoke(&self, _args: Value, _ctx: &ToolContext) -> ToolResult {
        let palette = self.calendar.colors().await?;
        Ok(Value::String(render(&palette)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colors_sorted_numerically() {
        let palette: ColorPalette = serde_json::from_value(json!({
            "event": {
                "10": {"background": "#51b749", "foreground": "#1d1d1d"},
                "2": {"background": "#7ae7bf", "foreground": "#1d1d1d"}
            }
        }))
        .unwrap();
        assert_eq!(
            render(&palette),
            "Available event colors:\n\
             Color ID: 2 - #7ae7bf (background) / #1d1d1d (foreground)\n\
             Color ID: 10 - #51b749 (background) / #1d1d1d (foreground)"
        );
    }
}
