//! Tool: get_info. Queries the custom search API on behalf of the caller.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::types::ToolDefinition;

use super::{parse_args, Tool, ToolContext, ToolError, ToolResult};

pub const CUSTOM_SEARCH_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetInfoParams {
    params_api: String,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "get_info".to_string(),
        description: Some(
            "Receives, processes, and manages all info through our APIs.".to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "paramsApi": {
                    "type": "string",
                    "description": "your param API, as a URL query string (e.g. 'q=rust&num=3')"
                }
            },
            "required": ["paramsApi"]
        }),
    }
}

pub struct GetInfo {
    http: reqwest::Client,
    endpoint: String,
}

impl GetInfo {
    pub fn new(http: reqwest::Client) -> Self {
        Self::with_endpoint(http, CUSTOM_SEARCH_ENDPOINT)
    }

    pub fn with_endpoint(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Tool for GetInfo {
    fn definition(&self) -> ToolDefinition {
        definition()
    }

    async fn invoke(&self, args: Value, ctx: &ToolContext) -> ToolResult {
        let params: GetInfoParams = parse_args(args)?;
        if !ctx.auth.has_token() {
            return Err(ToolError::Failed(
                "Missing authentication information".to_string(),
            ));
        }

        let query: Vec<(String, String)> =
            url::form_urlencoded::parse(params.params_api.trim_start_matches('?').as_bytes())
                .into_owned()
                .collect();

        let response = self
            .http
            .get(&self.endpoint)
            .bearer_auth(&ctx.auth.token)
            .query(&query)
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
