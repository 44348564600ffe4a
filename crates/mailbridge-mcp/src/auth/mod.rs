//! Per-request credentials derived from query parameters, headers and the request URL.
//!
//! Each field is resolved independently; the first non-empty value wins, in
//! this order:
//!
//! 1. the request's query parameters (`token`, `apiKey`),
//! 2. request headers (`token` or `Authorization: Bearer …`; `x-api-key`),
//! 3. parameters found after percent-decoding the whole request URL, which
//!    catches clients that encode their query string twice.
//!
//! Missing fields are empty strings.

use axum::http::{header, HeaderMap};

const TOKEN_PARAM: &str = "token";
const TOKEN_HEADER: &str = "token";
const API_KEY_PARAM: &str = "apiKey";
const API_KEY_HEADER: &str = "x-api-key";

/// Credentials attached to a request and captured by sessions at creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    pub token: String,
    pub api_key: String,
}

impl AuthContext {
    pub fn new(token: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_key: api_key.into(),
        }
    }

    /// Derive the context from the raw query string, headers and path-and-query of a request.
    pub fn extract(query: Option<&str>, headers: &HeaderMap, path_and_query: &str) -> Self {
        let query_params = parse_pairs(query.unwrap_or_default());
        let url_params = decoded_url_params(path_and_query);

        let token = lookup(&query_params, TOKEN_PARAM)
            .or_else(|| header_value(headers, TOKEN_HEADER))
            .or_else(|| bearer_token(headers))
            .or_else(|| lookup(&url_params, TOKEN_PARAM))
            .unwrap_or_default();

        let api_key = lookup(&query_params, API_KEY_PARAM)
            .or_else(|| header_value(headers, API_KEY_HEADER))
            .or_else(|| lookup(&url_params, API_KEY_PARAM))
            .unwrap_or_default();

        Self { token, api_key }
    }

    /// Fill an empty API key from server configuration.
    pub fn with_default_api_key(mut self, default: Option<&str>) -> Self {
        if self.api_key.is_empty() {
            if let Some(key) = default {
                self.api_key = key.to_string();
            }
        }
        self
    }

    pub fn has_token(&self) -> bool {
        !self.token.is_empty()
    }
}

fn parse_pairs(query: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

fn lookup(pairs: &[(String, String)], key: &str) -> Option<String> {
    pairs
        .iter()
        .find(|(k, v)| k == key && !v.is_empty())
        .map(|(_, v)| v.clone())
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn decoded_url_params(path_and_query: &str) -> Vec<(String, String)> {
    let Ok(decoded) = urlencoding::decode(path_and_query) else {
        return Vec::new();
    };
    let absolute = if decoded.starts_with('/') {
        format!("http://localhost{decoded}")
    } else {
        decoded.into_owned()
    };
    match url::Url::parse(&absolute) {
        Ok(url) => url.query_pairs().into_owned().collect(),
        Err(_) => Vec::new(),
    }
}
