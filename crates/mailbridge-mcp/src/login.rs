//! Interactive OAuth consent flow behind `mailbridge-mcp auth`.

use std::sync::Arc;

use axum::{extract::Query, response::Html, routing::get, Router};
use parking_lot::Mutex;
use serde::Deserialize;
use tokio::sync::oneshot;

use mailbridge::client::DEFAULT_SCOPES;
use mailbridge::{Credentials, DEFAULT_REDIRECT_URI};

use crate::types::{GatewayError, GatewayResult};

#[derive(Debug, Deserialize)]
struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

type CodeSender = Arc<Mutex<Option<oneshot::Sender<Result<String, String>>>>>;

/// Print the consent URL, wait for Google's redirect on the callback address
/// and store the exchanged tokens in the credentials file.
pub async fn authenticate(credentials: &Credentials) -> GatewayResult<()> {
    let client = credentials.load().await?;

    let redirect = url::Url::parse(DEFAULT_REDIRECT_URI)
        .map_err(|e| GatewayError::InternalError(format!("Invalid redirect URI: {e}")))?;
    let port = redirect.port_or_known_default().unwrap_or(3000);
    let path = redirect.path().to_string();

    let (tx, rx) = oneshot::channel();
    let sender: CodeSender = Arc::new(Mutex::new(Some(tx)));

    let app = Router::new().route(
        &path,
        get(move |Query(params): Query<CallbackParams>| {
            let sender = sender.clone();
            async move {
                let outcome = match (params.code, params.error) {
                    (Some(code), _) => Ok(code),
                    (None, Some(error)) => Err(error),
                    (None, None) => Err("No code provided".to_string()),
                };
                let page = match &outcome {
                    Ok(_) => "Authentication completed successfully. You can close this window.",
                    Err(_) => "Authentication failed. Check the terminal for details.",
                };
                if let Some(tx) = sender.lock().take() {
                    let _ = tx.send(outcome);
                }
                Html(page)
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    let server = tokio::spawn(async move { axum::serve(listener, app).await });

    let url = client.authorization_url(DEFAULT_SCOPES)?;
    println!("Please visit this URL to authenticate:\n\n  {url}\n");
    tracing::info!("Waiting for OAuth callback on {DEFAULT_REDIRECT_URI}");

    let outcome = rx
        .await
        .map_err(|_| GatewayError::InternalError("OAuth callback server stopped".to_string()))?;
    server.abort();

    let code = outcome.map_err(|e| GatewayError::InvalidRequest(format!("Authorization failed: {e}")))?;
    client.exchange_code(&code).await?;

    println!(
        "Authentication completed. Credentials saved to {}",
        credentials.paths().credentials.display()
    );
    Ok(())
}
