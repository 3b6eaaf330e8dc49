//! Twitter client configuration.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::credentials::{AuthMode, Consumer, Credentials, Token};
use crate::error::{TwitterError, TwitterResult};

/// Default API subdomain (`api.twitter.com`).
pub const DEFAULT_SUBDOMAIN: &str = "api";

/// Default REST API version.
pub const DEFAULT_VERSION: &str = "1.1";

const TWITTER_HOST: &str = "twitter.com";

/// Configuration for the Twitter client.
#[derive(Clone, Serialize, Deserialize)]
pub struct TwitterConfig {
    /// OAuth 1.0a Consumer Key (API Key)
    pub consumer_key: String,

    /// OAuth 1.0a Consumer Secret (API Secret)
    pub consumer_secret: String,

    /// OAuth 1.0a Access Token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token_key: Option<String>,

    /// OAuth 1.0a Access Token Secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token_secret: Option<String>,

    /// OAuth 2.0 Bearer Token (for app-only auth)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<String>,

    /// Subdomain of twitter.com to talk to (`api`, `upload`, `stream`, ...)
    #[serde(default = "default_subdomain")]
    pub subdomain: String,

    /// REST API version path segment
    #[serde(default = "default_version")]
    pub version: String,

    /// Replaces `https://{subdomain}.twitter.com` when set (proxies, local servers)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,

    /// Request timeout
    #[serde(default = "default_timeout", with = "duration_secs")]
    pub timeout: Duration,
}

fn default_subdomain() -> String {
    DEFAULT_SUBDOMAIN.into()
}

fn default_version() -> String {
    DEFAULT_VERSION.into()
}

const fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            consumer_key: String::new(),
            consumer_secret: String::new(),
            access_token_key: None,
            access_token_secret: None,
            bearer_token: None,
            subdomain: default_subdomain(),
            version: default_version(),
            origin: None,
            timeout: default_timeout(),
        }
    }
}

impl fmt::Debug for TwitterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("TwitterConfig")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"[REDACTED]")
            .field("access_token_key", &self.access_token_key)
            .field("access_token_secret", &redacted(&self.access_token_secret))
            .field("bearer_token", &redacted(&self.bearer_token))
            .field("subdomain", &self.subdomain)
            .field("version", &self.version)
            .field("origin", &self.origin)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl TwitterConfig {
    /// Create a configuration holding only the consumer pair.
    #[must_use]
    pub fn new(consumer_key: impl Into<String>, consumer_secret: impl Into<String>) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            ..Default::default()
        }
    }

    /// Set the user access token pair.
    #[must_use]
    pub fn with_access_token(
        mut self,
        key: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        self.access_token_key = Some(key.into());
        self.access_token_secret = Some(secret.into());
        self
    }

    /// Set the app-only bearer token.
    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Set the subdomain.
    #[must_use]
    pub fn with_subdomain(mut self, subdomain: impl Into<String>) -> Self {
        self.subdomain = subdomain.into();
        self
    }

    /// Set the origin override.
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Check the parts of the configuration that can be checked locally.
    ///
    /// Mismatched or revoked credentials are only detected by the remote
    /// service.
    pub fn validate(&self) -> TwitterResult<()> {
        if self.consumer_key.is_empty() {
            return Err(TwitterError::Config("consumer_key is empty".into()));
        }
        if self.consumer_secret.is_empty() {
            return Err(TwitterError::Config("consumer_secret is empty".into()));
        }
        if self.subdomain.is_empty() {
            return Err(TwitterError::Config("subdomain is empty".into()));
        }
        if let Some(origin) = &self.origin {
            Url::parse(origin)
                .map_err(|e| TwitterError::Config(format!("invalid origin {origin:?}: {e}")))?;
        }
        Ok(())
    }

    /// Build the credential set.
    ///
    /// A bearer token takes precedence; an access token is only used when
    /// both its key and secret are present. Empty strings count as absent.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        let consumer = Consumer::new(&self.consumer_key, &self.consumer_secret);

        let mode = match (
            non_empty(self.bearer_token.as_deref()),
            non_empty(self.access_token_key.as_deref()),
            non_empty(self.access_token_secret.as_deref()),
        ) {
            (Some(bearer), _, _) => AuthMode::AppOnly {
                bearer_token: bearer.to_string(),
            },
            (None, Some(key), Some(secret)) => AuthMode::User(Token::new(key, secret)),
            _ => AuthMode::ConsumerOnly,
        };

        Credentials::new(consumer, mode)
    }

    /// `https://{subdomain}.twitter.com/{endpoint}`, honoring the origin override.
    #[must_use]
    pub fn twitter_url(&self, subdomain: &str, endpoint: &str) -> String {
        match &self.origin {
            Some(origin) => format!("{}/{endpoint}", origin.trim_end_matches('/')),
            None => format!("https://{subdomain}.{TWITTER_HOST}/{endpoint}"),
        }
    }

    /// Base URL for versioned REST calls.
    #[must_use]
    pub fn api_url(&self) -> String {
        self.twitter_url(&self.subdomain, &self.version)
    }

    /// Base URL for the OAuth 1.0a handshake calls.
    #[must_use]
    pub fn oauth_url(&self) -> String {
        self.twitter_url(&self.subdomain, "oauth")
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
