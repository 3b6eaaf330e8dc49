//! Combined entry point: handshake and REST clients from one configuration.

use crate::{
    auth::TwitterAuth,
    client::{TwitterApi, http_client},
    config::TwitterConfig,
    error::TwitterResult,
};

/// Handshake and REST clients for one consumer, sharing a connection pool.
#[derive(Debug, Clone)]
pub struct Twitter {
    /// OAuth handshake calls, always signed consumer-only.
    pub auth: TwitterAuth,
    /// Versioned REST calls with the configured credentials.
    pub api: TwitterApi,
}

impl Twitter {
    pub fn new(config: &TwitterConfig) -> TwitterResult<Self> {
        let http = http_client(config)?;
        Ok(Self {
            auth: TwitterAuth::with_http_client(config, http.clone())?,
            api: TwitterApi::with_http_client(config, http)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, method, path},
    };

    use super::*;
    use crate::credentials::AuthMode;
    use crate::error::TwitterError;

    #[test]
    fn test_default_subdomain() {
        let twitter = Twitter::new(&TwitterConfig::new("ck", "cs")).unwrap();
        assert_eq!(twitter.api.url(), "https://api.twitter.com/1.1");
        assert_eq!(twitter.auth.url(), "https://api.twitter.com/oauth");
    }

    #[test]
    fn test_stream_subdomain() {
        let config = TwitterConfig::new("ck", "cs").with_subdomain("stream");
        let twitter = Twitter::new(&config).unwrap();
        assert_eq!(twitter.api.url(), "https://stream.twitter.com/1.1");
    }

    #[test]
    fn test_rejects_invalid_config() {
        assert!(matches!(
            Twitter::new(&TwitterConfig::new("ck", "")),
            Err(TwitterError::Config(_))
        ));
    }

    #[test]
    fn test_api_keeps_user_context() {
        let config = TwitterConfig::new("ck", "cs").with_access_token("tk", "ts");
        let twitter = Twitter::new(&config).unwrap();
        assert!(matches!(twitter.api.credentials().mode(), AuthMode::User(_)));
    }

    #[tokio::test]
    async fn test_both_clients_reach_one_origin() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth/request_token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("oauth_token=rt&oauth_token_secret=rs"),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/1.1/account/verify_credentials.json"))
            .and(header("Accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id_str": "42" })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = TwitterConfig::new("ck", "cs")
            .with_access_token("tk", "ts")
            .with_origin(mock_server.uri());
        let twitter = Twitter::new(&config).unwrap();

        let token = twitter.auth.get_request_token("").await.unwrap();
        assert_eq!(token.data().unwrap().oauth_token, "rt");

        let me = twitter
            .api
            .get("account/verify_credentials", ())
            .await
            .unwrap();
        assert_eq!(me.data().unwrap()["id_str"], "42");
    }
}
