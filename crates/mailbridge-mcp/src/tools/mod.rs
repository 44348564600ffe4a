//! MCP tool implementations.

pub mod batch_delete_emails;
pub mod batch_modify_emails;
pub mod chat_with_openai;
pub mod create_event;
pub mod create_label;
pub mod delete_email;
pub mod delete_event;
pub mod delete_label;
pub mod draft_email;
pub mod free_busy_event;
pub mod get_info;
pub mod get_or_create_label;
pub mod list_calendars;
pub mod list_colors;
pub mod list_email_labels;
pub mod list_events;
pub mod modify_email;
pub mod read_email;
pub mod registry;
pub mod say_hello;
pub mod search_emails;
pub mod search_events;
pub mod send_email;
pub mod update_event;
pub mod update_label;

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use mailbridge::{Calendar, Gmail, GoogleClient, GoogleError};

use crate::auth::AuthContext;
use crate::types::{GatewayError, GatewayResult, ToolDefinition};

pub use registry::{validate_arguments, ToolRegistry, ToolRegistryBuilder};

/// Per-call context handed to every tool.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    pub auth: AuthContext,
}

impl ToolContext {
    pub fn new(auth: AuthContext) -> Self {
        Self { auth }
    }
}

/// Failures reported by tool handlers.
#[derive(thiserror::Error, Debug)]
pub enum ToolError {
    #[error("{0}")]
    InvalidArguments(String),

    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Upstream(#[from] GoogleError),
}

impl From<reqwest::Error> for ToolError {
    fn from(e: reqwest::Error) -> Self {
        ToolError::Failed(e.to_string())
    }
}

impl From<ToolError> for GatewayError {
    fn from(e: ToolError) -> Self {
        match e {
            ToolError::InvalidArguments(msg) => GatewayError::InvalidParams(msg),
            ToolError::Upstream(GoogleError::InvalidInput(msg)) => GatewayError::InvalidParams(msg),
            other => GatewayError::Handler(other.to_string()),
        }
    }
}

pub type ToolResult = Result<Value, ToolError>;

/// A named operation exposed to clients.
#[async_trait]
pub trait Tool: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    async fn invoke(&self, args: Value, ctx: &ToolContext) -> ToolResult;
}

/// Deserialize tool arguments into their typed form.
pub(crate) fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ToolError> {
    serde_json::from_value(args).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

/// Build the registry served by the gateway. Google tools are registered only
/// when a client could be loaded.
pub fn standard_registry(
    http: reqwest::Client,
    google: Option<Arc<GoogleClient>>,
) -> GatewayResult<ToolRegistry> {
    let mut builder = ToolRegistry::builder()
        .register(say_hello::SayHello)
        .register(get_info::GetInfo::new(http.clone()))
        .register(chat_with_openai::ChatWithOpenAi::new(http));

    match google {
        Some(client) => {
            let gmail = Arc::new(Gmail::new(client.clone()));
            let calendar = Arc::new(Calendar::new(client));
            builder = builder
                .register(send_email::SendEmail::new(gmail.clone()))
                .register(draft_email::DraftEmail::new(gmail.clone()))
                .register(read_email::ReadEmail::new(gmail.clone()))
                .register(search_emails::SearchEmails::new(gmail.clone()))
                .register(modify_email::ModifyEmail::new(gmail.clone()))
                .register(delete_email::DeleteEmail::new(gmail.clone()))
                .register(list_email_labels::ListEmailLabels::new(gmail.clone()))
                .register(batch_modify_emails::BatchModifyEmails::new(gmail.clone()))
                .register(batch_delete_emails::BatchDeleteEmails::new(gmail.clone()))
                .register(create_label::CreateLabel::new(gmail.clone()))
                .register(update_label::UpdateLabel::new(gmail.clone()))
                .register(delete_label::DeleteLabel::new(gmail.clone()))
                .register(get_or_create_label::GetOrCreateLabel::new(gmail))
                .register(list_calendars::ListCalendars::new(calendar.clone()))
                .register(list_events::ListEvents::new(calendar.clone()))
                .register(search_events::SearchEvents::new(calendar.clone()))
                .register(create_event::CreateEvent::new(calendar.clone()))
                .register(update_event::UpdateEvent::new(calendar.clone()))
                .register(delete_event::DeleteEvent::new(calendar.clone()))
                .register(free_busy_event::FreeBusyEvent::new(calendar.clone()))
                .register(list_colors::ListColors::new(calendar));
        }
        None => tracing::info!("Google credentials unavailable; mail and calendar tools disabled"),
    }

    builder.build()
}

/// Descriptors of the tools that need Google credentials.
pub fn google_definitions() -> Vec<ToolDefinition> {
    vec![
        send_email::definition(),
        draft_email::definition(),
        read_email::definition(),
        search_emails::definition(),
        modify_email::definition(),
        delete_email::definition(),
        list_email_labels::definition(),
        batch_modify_emails::definition(),
        batch_delete_emails::definition(),
        create_label::definition(),
        update_label::definition(),
        delete_label::definition(),
        get_or_create_label::definition(),
        list_calendars::definition(),
        list_events::definition(),
        search_events::definition(),
        create_event::definition(),
        update_event::definition(),
        delete_event::definition(),
        free_busy_event::definition(),
        list_colors::definition(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_error_mapping() {
        let err: GatewayError = ToolError::Failed("boom".into()).into();
        assert_eq!(err.code(), crate::types::error_codes::INTERNAL_ERROR);
        assert_eq!(err.to_string(), "boom");

        let err: GatewayError = ToolError::InvalidArguments("bad".into()).into();
        assert_eq!(err.code(), crate::types::error_codes::INVALID_PARAMS);

        let err: GatewayError = ToolError::Upstream(GoogleError::NotInitialized).into();
        assert_eq!(err.code(), crate::types::error_codes::INTERNAL_ERROR);
    }

    #[test]
    fn test_registry_without_google() {
        let registry = standard_registry(reqwest::Client::new(), None).unwrap();
        let names: Vec<String> = registry.list().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["say_hello", "get_info", "chat_with_openai"]);
    }

    #[test]
    fn test_google_tools_cover_mail_and_calendar() {
        let defs = google_definitions();
        assert_eq!(defs.len(), 21);

        let mut names: Vec<&str> = defs.iter().map(|d| d.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 21);
        for name in ["batch_delete_emails", "get_or_create_label", "free_busy_event", "list_colors"] {
            assert!(names.contains(&name), "{name} missing");
        }
        for def in &defs {
            assert_eq!(def.input_schema["type"], "object", "{}", def.name);
        }
    }
}
