//! Gmail REST helpers.

use std::future::Future;
use std::sync::Arc;

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::client::{endpoint, GoogleClient};
use crate::types::{
    EmailContent, GoogleError, GoogleResult, Label, LabelModification, LabelRequest,
    MessageSummary, OutgoingEmail,
};

const GMAIL_API: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

#[derive(Debug, Default, Deserialize)]
struct MessageList {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmailMessage {
    id: String,
    #[serde(default)]
    thread_id: String,
    #[serde(default)]
    payload: Option<MessagePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessagePart {
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    headers: Vec<Header>,
    #[serde(default)]
    body: Option<PartBody>,
    #[serde(default)]
    parts: Vec<MessagePart>,
}

#[derive(Debug, Deserialize)]
struct Header {
    name: String,
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct PartBody {
    #[serde(default)]
    data: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LabelList {
    #[serde(default)]
    labels: Vec<Label>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    id: String,
}

impl GmailMessage {
    fn header(&self, name: &str) -> String {
        self.payload
            .as_ref()
            .and_then(|p| p.headers.iter().find(|h| h.name.eq_ignore_ascii_case(name)))
            .map(|h| h.value.clone())
            .unwrap_or_default()
    }
}

impl MessagePart {
    /// First body of the given MIME type, depth first.
    fn find_body(&self, mime_type: &str) -> Option<String> {
        if self.mime_type.eq_ignore_ascii_case(mime_type) {
            if let Some(data) = self.body.as_ref().and_then(|b| b.data.as_deref()) {
                return decode_body(data);
            }
        }
        self.parts.iter().find_map(|p| p.find_body(mime_type))
    }
}

/// Gmail API bound to the authorized user (`users/me`).
pub struct Gmail {
    client: Arc<GoogleClient>,
}

impl Gmail {
    pub fn new(client: Arc<GoogleClient>) -> Self {
        Self { client }
    }

    /// Search with Gmail query syntax, returning subject/from/date per hit.
    pub async fn search(&self, query: &str, max_results: u32) -> GoogleResult<Vec<MessageSummary>> {
        let list: MessageList = self
            .client
            .get_json(
                &format!("{GMAIL_API}/messages"),
                &[("q", query.to_string()), ("maxResults", max_results.to_string())],
            )
            .await?;

        let mut results = Vec::with_capacity(list.messages.len());
        for message in list.messages {
            let detail: GmailMessage = self
                .client
                .get_json(
                    &format!("{GMAIL_API}/messages/{}", message.id),
                    &[
                        ("format", "metadata".to_string()),
                        ("metadataHeaders", "Subject".to_string()),
                        ("metadataHeaders", "From".to_string()),
                        ("metadataHeaders", "Date".to_string()),
                    ],
                )
                .await?;

            results.push(MessageSummary {
                subject: detail.header("Subject"),
                from: detail.header("From"),
                date: detail.header("Date"),
                id: detail.id,
            });
        }

        Ok(results)
    }

    /// Fetch a message with its plain-text body (HTML when no text part exists).
    pub async fn read(&self, message_id: &str) -> GoogleResult<EmailContent> {
        if message_id.trim().is_empty() {
            return Err(GoogleError::InvalidInput("message id must not be empty".to_string()));
        }

        let message: GmailMessage = self
            .client
            .get_json(
                &format!("{GMAIL_API}/messages/{message_id}"),
                &[("format", "full".to_string())],
            )
            .await?;

        let body = message
            .payload
            .as_ref()
            .and_then(|p| p.find_body("text/plain").or_else(|| p.find_body("text/html")))
            .unwrap_or_default();

        Ok(EmailContent {
            subject: message.header("Subject"),
            from: message.header("From"),
            to: message.header("To"),
            date: message.header("Date"),
            id: message.id,
            thread_id: message.thread_id,
            body,
        })
    }

    pub async fn labels(&self) -> GoogleResult<Vec<Label>> {
        let list: LabelList = self
            .client
            .get_json(&format!("{GMAIL_API}/labels"), &[])
            .await?;
        Ok(list.labels)
    }

    /// Send a message, returning the new message id.
    pub async fn send(&self, email: &OutgoingEmail) -> GoogleResult<String> {
        let sent: SentMessage = self
            .client
            .post_json(&format!("{GMAIL_API}/messages/send"), &raw_message(email)?)
            .await?;
        Ok(sent.id)
    }

    /// Store a message as a draft, returning the draft id.
    pub async fn draft(&self, email: &OutgoingEmail) -> GoogleResult<String> {
        let draft: SentMessage = self
            .client
            .post_json(
                &format!("{GMAIL_API}/drafts"),
                &json!({ "message": raw_message(email)? }),
            )
            .await?;
        Ok(draft.id)
    }

    pub async fn modify(&self, message_id: &str, changes: &LabelModification) -> GoogleResult<()> {
        let _: Value = self
            .client
            .post_json(&endpoint(GMAIL_API, &["messages", message_id, "modify"])?, changes)
            .await?;
        Ok(())
    }

    /// Permanently delete a message, bypassing the trash.
    pub async fn delete(&self, message_id: &str) -> GoogleResult<()> {
        self.client
            .delete(&endpoint(GMAIL_API, &["messages", message_id])?)
            .await
    }

    /// Apply `changes` to every message, `batch_size` requests at a time.
    pub async fn batch_modify(
        &self,
        message_ids: &[String],
        changes: &LabelModification,
        batch_size: usize,
    ) -> GoogleResult<usize> {
        in_batches(message_ids, batch_size, |id| self.modify(id, changes)).await
    }

    pub async fn batch_delete(&self, message_ids: &[String], batch_size: usize) -> GoogleResult<usize> {
        in_batches(message_ids, batch_size, |id| self.delete(id)).await
    }

    pub async fn create_label(&self, request: &LabelRequest) -> GoogleResult<Label> {
        if request.name.as_deref().map_or(true, str::is_empty) {
            return Err(GoogleError::InvalidInput("label name must not be empty".to_string()));
        }
        self.client
            .post_json(&format!("{GMAIL_API}/labels"), request)
            .await
    }

    pub async fn update_label(&self, label_id: &str, request: &LabelRequest) -> GoogleResult<Label> {
        self.client
            .put_json(&endpoint(GMAIL_API, &["labels", label_id])?, request)
            .await
    }

    pub async fn delete_label(&self, label_id: &str) -> GoogleResult<()> {
        self.client
            .delete(&endpoint(GMAIL_API, &["labels", label_id])?)
            .await
    }

    /// The label with exactly `request.name`, created when missing.
    /// The flag reports whether it was created.
    pub async fn get_or_create_label(&self, request: &LabelRequest) -> GoogleResult<(Label, bool)> {
        let name = request.name.as_deref().unwrap_or_default();
        if let Some(existing) = self.labels().await?.into_iter().find(|l| l.name == name) {
            return Ok((existing, false));
        }
        Ok((self.create_label(request).await?, true))
    }
}

/// Run `op` over `ids` in consecutive chunks, each chunk concurrently.
async fn in_batches<'a, F, Fut>(ids: &'a [String], batch_size: usize, op: F) -> GoogleResult<usize>
where
    F: Fn(&'a str) -> Fut,
    Fut: Future<Output = GoogleResult<()>>,
{
    if batch_size == 0 {
        return Err(GoogleError::InvalidInput("batchSize must be at least 1".to_string()));
    }
    for chunk in ids.chunks(batch_size) {
        futures::future::try_join_all(chunk.iter().map(|id| op(id.as_str()))).await?;
    }
    Ok(ids.len())
}

/// The `{raw, threadId}` message resource shared by send and draft.
fn raw_message(email: &OutgoingEmail) -> GoogleResult<Value> {
    if email.to.is_empty() {
        return Err(GoogleError::InvalidInput("at least one recipient is required".to_string()));
    }

    let mut message = json!({ "raw": URL_SAFE_NO_PAD.encode(email.to_rfc822()) });
    if let Some(thread_id) = &email.thread_id {
        message["threadId"] = json!(thread_id);
    }
    Ok(message)
}

impl OutgoingEmail {
    /// Render as an RFC 822 text/plain message.
    pub fn to_rfc822(&self) -> String {
        let mut lines = vec![format!("To: {}", self.to.join(", "))];
        if !self.cc.is_empty() {
            lines.push(format!("Cc: {}", self.cc.join(", ")));
        }
        if !self.bcc.is_empty() {
            lines.push(format!("Bcc: {}", self.bcc.join(", ")));
        }
        lines.push(format!("Subject: {}", encode_header(&self.subject)));
        if let Some(in_reply_to) = &self.in_reply_to {
            lines.push(format!("In-Reply-To: {in_reply_to}"));
            lines.push(format!("References: {in_reply_to}"));
        }
        lines.push("MIME-Version: 1.0".to_string());
        lines.push("Content-Type: text/plain; charset=UTF-8".to_string());
        lines.push("Content-Transfer-Encoding: 8bit".to_string());
        lines.push(String::new());
        lines.push(self.body.clone());
        lines.join("\r\n")
    }
}

/// RFC 2047 encoded-word for non-ASCII header values.
fn encode_header(value: &str) -> String {
    if value.is_ascii() {
        value.to_string()
    } else {
        format!(
            "=?UTF-8?B?{}?=",
            base64::engine::general_purpose::STANDARD.encode(value)
        )
    }
}

fn decode_body(data: &str) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD
        .decode(data.trim_end_matches('='))
        .or_else(|_| URL_SAFE.decode(data))
        .ok()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}
