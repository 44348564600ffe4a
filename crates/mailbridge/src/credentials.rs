//! Credential store. Locates OAuth key material and builds the shared Google client.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::client::GoogleClient;
use crate::types::{GoogleError, GoogleResult, OAuthKeys, StoredTokens};

/// Redirect target of the interactive consent flow.
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:3000/oauth2callback";

const KEYS_FILE_NAME: &str = "gcp-oauth.keys.json";
const CREDENTIALS_FILE_NAME: &str = "credentials.json";

/// Where key material and tokens live on disk.
#[derive(Debug, Clone)]
pub struct CredentialPaths {
    pub config_dir: PathBuf,
    pub oauth_keys: PathBuf,
    pub credentials: PathBuf,
    /// A keys file dropped next to the binary's working directory, copied
    /// into `oauth_keys` when that one does not exist yet.
    pub local_keys: Option<PathBuf>,
}

impl CredentialPaths {
    /// Resolve paths, with explicit overrides taking precedence over `~/.gmail-mcp`.
    pub fn resolve(oauth_keys: Option<&str>, credentials: Option<&str>) -> Self {
        let config_dir = default_config_dir();
        Self {
            oauth_keys: oauth_keys
                .map(PathBuf::from)
                .unwrap_or_else(|| config_dir.join(KEYS_FILE_NAME)),
            credentials: credentials
                .map(PathBuf::from)
                .unwrap_or_else(|| config_dir.join(CREDENTIALS_FILE_NAME)),
            local_keys: Some(PathBuf::from(KEYS_FILE_NAME)),
            config_dir,
        }
    }

    /// All files inside one directory, without the working-directory fallback.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            config_dir: dir.to_path_buf(),
            oauth_keys: dir.join(KEYS_FILE_NAME),
            credentials: dir.join(CREDENTIALS_FILE_NAME),
            local_keys: None,
        }
    }
}

fn default_config_dir() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());

    PathBuf::from(home).join(".gmail-mcp")
}

/// Lazily initialized credentials shared by every Google-backed tool.
pub struct Credentials {
    paths: CredentialPaths,
    redirect_uri: String,
    http: reqwest::Client,
    client: OnceCell<Arc<GoogleClient>>,
}

impl Credentials {
    pub fn new(paths: CredentialPaths, redirect_uri: Option<String>) -> Self {
        Self {
            paths,
            redirect_uri: redirect_uri.unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string()),
            http: reqwest::Client::new(),
            client: OnceCell::new(),
        }
    }

    pub fn paths(&self) -> &CredentialPaths {
        &self.paths
    }

    /// Load key material and stored tokens. Calling it again returns the same client.
    pub async fn load(&self) -> GoogleResult<Arc<GoogleClient>> {
        self.client
            .get_or_try_init(|| self.load_from_disk())
            .await
            .map(Arc::clone)
    }

    /// The client built by [`Credentials::load`].
    pub fn client(&self) -> GoogleResult<Arc<GoogleClient>> {
        self.client.get().cloned().ok_or(GoogleError::NotInitialized)
    }

    async fn load_from_disk(&self) -> GoogleResult<Arc<GoogleClient>> {
        tokio::fs::create_dir_all(&self.paths.config_dir).await?;

        let mut keys_present = tokio::fs::try_exists(&self.paths.oauth_keys).await?;
        if let Some(local) = self.paths.local_keys.as_ref().filter(|_| !keys_present) {
            if tokio::fs::try_exists(local).await? {
                tokio::fs::copy(local, &self.paths.oauth_keys).await?;
                tracing::info!(
                    "OAuth keys found in current directory, copied to {}",
                    self.paths.oauth_keys.display()
                );
                keys_present = true;
            }
        }

        if !keys_present {
            return Err(GoogleError::MissingKeys(self.paths.oauth_keys.clone()));
        }

        let keys = OAuthKeys::from_json(&tokio::fs::read_to_string(&self.paths.oauth_keys).await?)?;

        let tokens = if tokio::fs::try_exists(&self.paths.credentials).await? {
            let stored: StoredTokens =
                serde_json::from_str(&tokio::fs::read_to_string(&self.paths.credentials).await?)?;
            Some(stored)
        } else {
            tracing::warn!(
                "No stored credentials at {}; run the auth command to authorize",
                self.paths.credentials.display()
            );
            None
        };

        tracing::info!("Loaded OAuth keys from {}", self.paths.oauth_keys.display());

        Ok(Arc::new(GoogleClient::new(
            self.http.clone(),
            keys,
            self.redirect_uri.clone(),
            tokens,
            self.paths.credentials.clone(),
        )))
    }
}
