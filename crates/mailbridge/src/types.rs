//! Core data types for credentials, mail and calendar.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// OAuth client identity from the Google Cloud console.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthKeys {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Deserialize)]
struct KeysFile {
    installed: Option<OAuthKeys>,
    web: Option<OAuthKeys>,
}

impl OAuthKeys {
    /// Parse a downloaded keys file. Either an `installed` or a `web` section must be present.
    pub fn from_json(content: &str) -> GoogleResult<Self> {
        let file: KeysFile = serde_json::from_str(content)
            .map_err(|e| GoogleError::InvalidKeys(e.to_string()))?;
        file.installed.or(file.web).ok_or_else(|| {
            GoogleError::InvalidKeys(
                "file should contain either 'installed' or 'web' credentials".to_string(),
            )
        })
    }
}

/// Tokens persisted in the credentials file.
///
/// Field names follow the google-auth-library layout so files written by
/// other Gmail MCP servers can be reused.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredTokens {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// Expiry as milliseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<i64>,
}

/// Refresh window before the recorded expiry.
const EXPIRY_SKEW_MS: i64 = 60_000;

impl StoredTokens {
    /// Whether the access token must be refreshed. Unknown expiry counts as valid.
    pub fn is_expired(&self, now_ms: i64) -> bool {
        match (self.access_token.as_ref(), self.expiry_date) {
            (None, _) => true,
            (Some(_), Some(expiry)) => now_ms + EXPIRY_SKEW_MS >= expiry,
            (Some(_), None) => false,
        }
    }

    /// Apply a token endpoint response. The refresh token is kept when the response omits it.
    pub fn merged(&self, response: TokenResponse, now_ms: i64) -> Self {
        Self {
            access_token: Some(response.access_token),
            refresh_token: response.refresh_token.or_else(|| self.refresh_token.clone()),
            scope: response.scope.or_else(|| self.scope.clone()),
            token_type: response.token_type.or_else(|| self.token_type.clone()),
            expiry_date: response.expires_in.map(|secs| now_ms + secs * 1000),
        }
    }
}

/// Body returned by the OAuth token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// One row of a mailbox search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageSummary {
    pub id: String,
    pub subject: String,
    pub from: String,
    pub date: String,
}

/// A full message with its decoded text body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailContent {
    pub id: String,
    pub thread_id: String,
    pub subject: String,
    pub from: String,
    pub to: String,
    pub date: String,
    pub body: String,
}

/// A Gmail label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Label {
    pub id: String,
    pub name: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Where a label shows in the message list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageListVisibility {
    Show,
    Hide,
}

/// Where a label shows in the label list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LabelListVisibility {
    LabelShow,
    LabelShowIfUnread,
    LabelHide,
}

/// Body of a label create or update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_list_visibility: Option<MessageListVisibility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_list_visibility: Option<LabelListVisibility>,
}

/// Label changes applied to one or more messages. Absent lists are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelModification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_label_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove_label_ids: Option<Vec<String>>,
}

/// A message to be sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingEmail {
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub cc: Vec<String>,
    #[serde(default)]
    pub bcc: Vec<String>,
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub in_reply_to: Option<String>,
}

/// An entry of the user's calendar list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarSummary {
    pub id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(default)]
    pub primary: bool,
}

/// Start or end of an event: timed events carry `dateTime`, all-day events `date`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl EventTime {
    pub fn display(&self) -> &str {
        self.date_time
            .as_deref()
            .or(self.date.as_deref())
            .unwrap_or("unspecified")
    }
}

/// A calendar event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSummary {
    pub id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub start: EventTime,
    #[serde(default)]
    pub end: EventTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Start or end of an event being written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attendee {
    pub email: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderMethod {
    Email,
    #[default]
    Popup,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    #[serde(default)]
    pub method: ReminderMethod,
    pub minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminders {
    pub use_default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<Vec<Reminder>>,
}

/// Body of an event insert or patch. Absent fields are left untouched by a patch.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<EventDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<EventDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendees: Option<Vec<Attendee>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminders: Option<Reminders>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreeBusyItem {
    pub id: String,
}

/// Availability query over a set of calendars.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeBusyRequest {
    pub time_min: String,
    pub time_max: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_expansion_max: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_expansion_max: Option<u32>,
    pub items: Vec<FreeBusyItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusySlot {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreeBusyError {
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalendarBusy {
    #[serde(default)]
    pub errors: Vec<FreeBusyError>,
    #[serde(default)]
    pub busy: Vec<BusySlot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeBusyResponse {
    #[serde(default)]
    pub time_min: String,
    #[serde(default)]
    pub time_max: String,
    #[serde(default)]
    pub calendars: BTreeMap<String, CalendarBusy>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorDefinition {
    #[serde(default)]
    pub background: String,
    #[serde(default)]
    pub foreground: String,
}

/// Calendar and event color palettes keyed by color id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColorPalette {
    #[serde(default)]
    pub calendar: BTreeMap<String, ColorDefinition>,
    #[serde(default)]
    pub event: BTreeMap<String, ColorDefinition>,
}

/// Errors that can occur while talking to Google.
#[derive(thiserror::Error, Debug)]
pub enum GoogleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error(
        "OAuth keys file not found: {}. Place gcp-oauth.keys.json in the current directory or the config directory",
        .0.display()
    )]
    MissingKeys(PathBuf),

    #[error("Invalid OAuth keys file: {0}")]
    InvalidKeys(String),

    #[error("Google client is not initialized. Call load() before client()")]
    NotInitialized,

    #[error("Not authenticated. Run the `auth` command first")]
    NotAuthenticated,

    #[error("Google API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Convenience result type.
pub type GoogleResult<T> = Result<T, GoogleError>;
