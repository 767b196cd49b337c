//! Client configuration: endpoints plus the credential pair.

use crate::error::ApiError;

pub const DEFAULT_API_URL: &str = "https://getpocket.com/v3";
pub const DEFAULT_AUTHORIZE_URL: &str = "https://getpocket.com/auth/authorize";

/// Endpoints and credentials for one `PocketClient`.
///
/// `access_token` may be empty while the authorization handshake is still
/// in progress; the service rejects data calls made without one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
    pub authorize_url: String,
    pub consumer_key: String,
    pub access_token: String,
}

impl ClientConfig {
    pub fn new(consumer_key: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            authorize_url: DEFAULT_AUTHORIZE_URL.to_string(),
            consumer_key: consumer_key.into(),
            access_token: access_token.into(),
        }
    }

    /// Read `POCKET_CONSUMER_KEY` (required), `POCKET_ACCESS_TOKEN`,
    /// `POCKET_API_URL` and `POCKET_AUTHORIZE_URL`.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let consumer_key = lookup("POCKET_CONSUMER_KEY")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::ConfigError("POCKET_CONSUMER_KEY is not set".to_string()))?;
        let access_token = lookup("POCKET_ACCESS_TOKEN").unwrap_or_default();

        let mut config = Self::new(consumer_key, access_token);
        if let Some(url) = lookup("POCKET_API_URL") {
            config = config.with_api_url(&url);
        }
        if let Some(url) = lookup("POCKET_AUTHORIZE_URL") {
            config = config.with_authorize_url(&url);
        }
        Ok(config)
    }

    pub fn with_api_url(mut self, url: &str) -> Self {
        self.api_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_authorize_url(mut self, url: &str) -> Self {
        self.authorize_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = access_token.into();
        self
    }
}
