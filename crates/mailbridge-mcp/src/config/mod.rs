//! Configuration loading and resolution.

use std::path::Path;
use std::sync::Arc;

use mailbridge::{CredentialPaths, Credentials, GoogleClient, GoogleResult};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5680;

/// Resolved settings of the HTTP server.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// Fills the API key of requests that do not carry one.
    pub default_api_key: Option<String>,
    pub credential_paths: CredentialPaths,
    pub google_enabled: bool,
}

impl Settings {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Treat empty strings from the environment as unset.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Resolve credential file locations: explicit values, then `~/.gmail-mcp`.
pub fn resolve_credential_paths(
    oauth_keys: Option<&str>,
    credentials: Option<&str>,
) -> CredentialPaths {
    CredentialPaths::resolve(oauth_keys, credentials)
}

/// Load Google credentials for the tool registry. With Google enabled, a
/// missing or unreadable keys file is a startup error; `enabled = false`
/// skips the disk entirely.
pub async fn load_google_client(
    credentials: &Credentials,
    enabled: bool,
) -> GoogleResult<Option<Arc<GoogleClient>>> {
    if !enabled {
        tracing::info!("Google disabled; mail and calendar tools are not registered");
        return Ok(None);
    }
    let client = credentials.load().await?;
    if !client.has_tokens().await {
        tracing::warn!("Google tools enabled but not yet authorized; run `mailbridge-mcp auth`");
    }
    Ok(Some(client))
}

/// Human-readable location for log lines.
pub fn display_path(path: &Path) -> String {
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("k".into())), Some("k".to_string()));
        assert_eq!(non_empty(Some("  ".into())), None);
        assert_eq!(non_empty(None), None);
    }

    #[test]
    fn test_explicit_credential_paths() {
        let paths = resolve_credential_paths(Some("/tmp/keys.json"), Some("/tmp/creds.json"));
        assert_eq!(display_path(&paths.oauth_keys), "/tmp/keys.json");
        assert_eq!(display_path(&paths.credentials), "/tmp/creds.json");
        assert!(paths.config_dir.ends_with(".gmail-mcp"));
    }

    #[test]
    fn test_bind_addr() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            default_api_key: None,
            credential_paths: CredentialPaths::in_dir(dir.path()),
            google_enabled: false,
        };
        assert_eq!(settings.bind_addr(), "0.0.0.0:5680");
    }

    #[tokio::test]
    async fn test_missing_keys_fail_startup() {
        let dir = tempfile::tempdir().unwrap();
        let credentials = Credentials::new(CredentialPaths::in_dir(dir.path()), None);
        let err = load_google_client(&credentials, true).await.err().unwrap();
        assert!(matches!(err, mailbridge::GoogleError::MissingKeys(_)));
        assert!(err.to_string().contains("gcp-oauth.keys.json"));
    }

    #[tokio::test]
    async fn test_disabled_google_skips_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let credentials = Credentials::new(CredentialPaths::in_dir(dir.path()), None);
        assert!(load_google_client(&credentials, false).await.unwrap().is_none());
        assert!(!dir.path().join("gcp-oauth.keys.json").exists());
    }
}
