//! Authorized HTTP client for Google APIs with token refresh.

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::types::{GoogleError, GoogleResult, OAuthKeys, StoredTokens, TokenResponse};

pub const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// Scopes requested by the consent flow.
pub const DEFAULT_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/gmail.modify",
    "https://www.googleapis.com/auth/calendar",
];

/// Google API client bound to one OAuth identity.
pub struct GoogleClient {
    http: reqwest::Client,
    keys: OAuthKeys,
    redirect_uri: String,
    tokens: RwLock<Option<StoredTokens>>,
    credentials_path: PathBuf,
}

impl GoogleClient {
    pub fn new(
        http: reqwest::Client,
        keys: OAuthKeys,
        redirect_uri: String,
        tokens: Option<StoredTokens>,
        credentials_path: PathBuf,
    ) -> Self {
        Self {
            http,
            keys,
            redirect_uri,
            tokens: RwLock::new(tokens),
            credentials_path,
        }
    }

    pub async fn has_tokens(&self) -> bool {
        self.tokens.read().await.is_some()
    }

    /// Consent URL for the interactive flow (offline access, so a refresh token is issued).
    pub fn authorization_url(&self, scopes: &[&str]) -> GoogleResult<String> {
        let url = url::Url::parse_with_params(
            AUTH_ENDPOINT,
            &[
                ("client_id", self.keys.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("scope", scopes.join(" ").as_str()),
            ],
        )?;
        Ok(url.into())
    }

    /// Trade an authorization code for tokens and persist them.
    pub async fn exchange_code(&self, code: &str) -> GoogleResult<StoredTokens> {
        let response = self
            .request_token(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .await?;

        let now = chrono::Utc::now().timestamp_millis();
        let tokens = StoredTokens::default().merged(response, now);
        *self.tokens.write().await = Some(tokens.clone());
        self.persist(&tokens).await?;
        Ok(tokens)
    }

    /// A valid access token, refreshing it first when it is about to expire.
    pub async fn access_token(&self) -> GoogleResult<String> {
        let now = chrono::Utc::now().timestamp_millis();

        {
            let guard = self.tokens.read().await;
            if let Some(tokens) = guard.as_ref().filter(|t| !t.is_expired(now)) {
                if let Some(access) = &tokens.access_token {
                    return Ok(access.clone());
                }
            }
        }

        let mut guard = self.tokens.write().await;
        let current = guard.clone().ok_or(GoogleError::NotAuthenticated)?;

        // Another task may have refreshed while we waited for the write lock.
        if !current.is_expired(now) {
            if let Some(access) = current.access_token.clone() {
                return Ok(access);
            }
        }

        let refresh = current
            .refresh_token
            .clone()
            .ok_or(GoogleError::NotAuthenticated)?;

        tracing::debug!("Refreshing Google access token");
        let response = self
            .request_token(&[("grant_type", "refresh_token"), ("refresh_token", refresh.as_str())])
            .await?;

        let updated = current.merged(response, now);
        let access = updated
            .access_token
            .clone()
            .ok_or(GoogleError::NotAuthenticated)?;
        *guard = Some(updated.clone());
        drop(guard);

        self.persist(&updated).await?;
        Ok(access)
    }

    async fn authorized(
        &self,
        method: reqwest::Method,
        url: &str,
    ) -> GoogleResult<reqwest::RequestBuilder> {
        let token = self.access_token().await?;
        Ok(self.http.request(method, url).bearer_auth(token))
    }

    /// Authorized GET returning JSON.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> GoogleResult<T> {
        let response = self
            .authorized(reqwest::Method::GET, url)
            .await?
            .query(query)
            .send()
            .await?;
        decode(response).await
    }

    /// Authorized POST of a JSON body returning JSON.
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> GoogleResult<T> {
        self.send_json(reqwest::Method::POST, url, body).await
    }

    /// Authorized PUT (full replacement) returning JSON.
    pub async fn put_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> GoogleResult<T> {
        self.send_json(reqwest::Method::PUT, url, body).await
    }

    /// Authorized PATCH (partial update) returning JSON.
    pub async fn patch_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> GoogleResult<T> {
        self.send_json(reqwest::Method::PATCH, url, body).await
    }

    /// Authorized DELETE. Google answers with an empty body.
    pub async fn delete(&self, url: &str) -> GoogleResult<()> {
        let response = self
            .authorized(reqwest::Method::DELETE, url)
            .await?
            .send()
            .await?;
        check_status(response).await.map(|_| ())
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        url: &str,
        body: &B,
    ) -> GoogleResult<T> {
        let response = self.authorized(method, url).await?.json(body).send().await?;
        decode(response).await
    }

    async fn request_token(&self, params: &[(&str, &str)]) -> GoogleResult<TokenResponse> {
        let mut form: Vec<(&str, &str)> = vec![
            ("client_id", self.keys.client_id.as_str()),
            ("client_secret", self.keys.client_secret.as_str()),
        ];
        form.extend_from_slice(params);

        let response = self.http.post(TOKEN_ENDPOINT).form(&form).send().await?;
        decode(response).await
    }

    async fn persist(&self, tokens: &StoredTokens) -> GoogleResult<()> {
        if let Some(parent) = self.credentials_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.credentials_path, serde_json::to_string(tokens)?).await?;
        tracing::debug!("Saved credentials: {}", self.credentials_path.display());
        Ok(())
    }
}

async fn check_status(response: reqwest::Response) -> GoogleResult<reqwest::Response> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(GoogleError::Api {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response)
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> GoogleResult<T> {
    Ok(check_status(response).await?.json::<T>().await?)
}

/// Join `segments` onto `base`, escaping each one as a single path segment.
pub fn endpoint(base: &str, segments: &[&str]) -> GoogleResult<String> {
    if segments.iter().any(|s| s.is_empty()) {
        return Err(GoogleError::InvalidInput("identifier must not be empty".to_string()));
    }
    let mut url = url::Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|_| GoogleError::InvalidInput(format!("{base} is not a path URL")))?
        .extend(segments);
    Ok(url.into())
}
