//! Tool: chat_with_openai. Sends one user message to an OpenAI chat model.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::types::ToolDefinition;

use super::{parse_args, Tool, ToolContext, ToolError, ToolResult};

pub const CHAT_COMPLETIONS_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4";
const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

#[derive(Debug, Deserialize)]
struct ChatParams {
    #[serde(default = "default_model")]
    model: String,
    messages: String,
    #[serde(default)]
    temperature: Option<f64>,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "chat_with_openai".to_string(),
        description: Some(
            "chat with openai is a tool to talk with chatgpt open ai models of your choice. \
             You provide a message and the model will respond to you."
                .to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "model": {
                    "type": "string",
                    "description": "the model from openai to use; omit it to use the default",
                    "default": DEFAULT_MODEL
                },
                "messages": {
                    "type": "string",
                    "description": "the messages to send to the model"
                },
                "temperature": {
                    "type": "number",
                    "description": "the temperature to use for the model, optional"
                }
            },
            "required": ["messages"]
        }),
    }
}

pub struct ChatWithOpenAi {
    http: reqwest::Client,
    endpoint: String,
}

impl ChatWithOpenAi {
    pub fn new(http: reqwest::Client) -> Self {
        Self::with_endpoint(http, CHAT_COMPLETIONS_ENDPOINT)
    }

    pub fn with_endpoint(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }
}

/// The session's API key. The search token is never sent to OpenAI.
fn api_key(ctx: &ToolContext) -> Option<&str> {
    Some(ctx.auth.api_key.as_str()).filter(|k| !k.is_empty())
}

#[async_trait]
impl Tool for ChatWithOpenAi {
    fn definition(&self) -> ToolDefinition {
        definition()
    }

    async fn invoke(&self, args: Value, ctx: &ToolContext) -> ToolResult {
        let params: ChatParams = parse_args(args)?;
        let key = api_key(ctx)
            .ok_or_else(|| ToolError::Failed("Missing chatGptApiKey information".to_string()))?;

        let mut body = json!({
            "model": params.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": params.messages}
            ]
        });
        if let Some(temperature) = params.temperature {
            body["temperature"] = json!(temperature);
        }

        tracing::debug!(model = %params.model, "Sending chat completion request");
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::Failed(format!(
                "Error fetching data: {}",
                status.canonical_reason().unwrap_or(status.as_str())
            )));
        }

        Ok(response.json::<Value>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthContext;

    #[tokio::test]
    async fn test_requires_key() {
        let tool = ChatWithOpenAi::with_endpoint(reqwest::Client::new(), "http://127.0.0.1:9/unused");
        let err = tool
            .invoke(json!({"messages": "hi"}), &ToolContext::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing chatGptApiKey information");
    }

    #[test]
    fn test_api_key_only_from_api_key() {
        let ctx = ToolContext::new(AuthContext::new("tok", "key"));
        assert_eq!(api_key(&ctx), Some("key"));
        let ctx = ToolContext::new(AuthContext::new("tok", ""));
        assert_eq!(api_key(&ctx), None);
        assert_eq!(api_key(&ToolContext::default()), None);
    }

    #[tokio::test]
    async fn test_token_alone_is_not_a_chat_key() {
        let tool = ChatWithOpenAi::with_endpoint(reqwest::Client::new(), "http://127.0.0.1:9/unused");
        let err = tool
            .invoke(
                json!({"messages": "hi"}),
                &ToolContext::new(AuthContext::new("search-token", "")),
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing chatGptApiKey information");
    }

    #[test]
    fn test_model_defaults() {
        let params: ChatParams = serde_json::from_value(json!({"messages": "hi"})).unwrap();
        assert_eq!(params.model, "gpt-4");
        assert!(params.temperature.is_none());
    }
}
