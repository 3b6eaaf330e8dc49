//! Credential selection.
//!
//! Every request carries the consumer pair; on top of that exactly one
//! [`AuthMode`] decides how the request is authorized.

use std::fmt;

/// OAuth 1.0a consumer (application) key pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Consumer {
    /// Consumer key (API key)
    pub key: String,
    /// Consumer secret (API secret)
    pub secret: String,
}

impl Consumer {
    #[must_use]
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Consumer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("key", &self.key)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// OAuth 1.0a token pair (access token, or request token mid-handshake).
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    /// `oauth_token`
    pub key: String,
    /// `oauth_token_secret`
    pub secret: String,
}

impl Token {
    #[must_use]
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("key", &self.key)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// How requests are authorized.
#[derive(Clone)]
pub enum AuthMode {
    /// OAuth 1.0a user context: signed with consumer and access token.
    User(Token),
    /// App-only context: `Authorization: Bearer <token>`, no signing.
    AppOnly { bearer_token: String },
    /// Signed with the consumer pair only (request-token step).
    ConsumerOnly,
}

impl fmt::Debug for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(token) => f.debug_tuple("User").field(token).finish(),
            Self::AppOnly { .. } => f.write_str("AppOnly { bearer_token: [REDACTED] }"),
            Self::ConsumerOnly => f.write_str("ConsumerOnly"),
        }
    }
}

/// Immutable credential set for a client instance.
#[derive(Debug, Clone)]
pub struct Credentials {
    consumer: Consumer,
    mode: AuthMode,
}

impl Credentials {
    #[must_use]
    pub const fn new(consumer: Consumer, mode: AuthMode) -> Self {
        Self { consumer, mode }
    }

    #[must_use]
    pub const fn consumer(&self) -> &Consumer {
        &self.consumer
    }

    #[must_use]
    pub const fn mode(&self) -> &AuthMode {
        &self.mode
    }

    /// The token to sign with, if any.
    #[must_use]
    pub const fn token(&self) -> Option<&Token> {
        match &self.mode {
            AuthMode::User(token) => Some(token),
            AuthMode::AppOnly { .. } | AuthMode::ConsumerOnly => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = Credentials::new(
            Consumer::new("ck", "consumer-secret"),
            AuthMode::User(Token::new("tk", "token-secret")),
        );
        let debug = format!("{creds:?}");
        assert!(debug.contains("ck"));
        assert!(debug.contains("tk"));
        assert!(!debug.contains("consumer-secret"));
        assert!(!debug.contains("token-secret"));

        let bearer = AuthMode::AppOnly {
            bearer_token: "AAAA-bearer".into(),
        };
        assert!(!format!("{bearer:?}").contains("AAAA-bearer"));
    }

    #[test]
    fn test_token_only_for_user_mode() {
        let consumer = Consumer::new("ck", "cs");
        let user = Credentials::new(consumer.clone(), AuthMode::User(Token::new("tk", "ts")));
        assert_eq!(user.token().map(|t| t.key.as_str()), Some("tk"));

        let consumer_only = Credentials::new(consumer, AuthMode::ConsumerOnly);
        assert!(consumer_only.token().is_none());
    }
}
