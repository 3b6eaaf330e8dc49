//! OAuth handshake calls.
//!
//! Supports the three-legged OAuth 1.0a flow (request token, user
//! authentication, access token) and the app-only bearer token exchange.
//! The OAuth 1.0a endpoints answer with URL-encoded text, so they are read
//! with [`ReadMode::TextOrJson`].

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::{
    client::{dispatch, http_client},
    config::{DEFAULT_SUBDOMAIN, TwitterConfig},
    credentials::{AuthMode, Credentials},
    error::{TwitterError, TwitterResult},
    oauth::{OAuthSigner, percent_encode},
    request::{PreparedRequest, RequestBuilder, header_value},
    response::{ReadMode, ResponseResult},
};

const BEARER_TOKEN_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=UTF-8";
const CLIENT_CREDENTIALS_BODY: &str = "grant_type=client_credentials";

/// Response of the request-token step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestTokenResponse {
    pub oauth_token: String,
    pub oauth_token_secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth_callback_confirmed: Option<String>,
}

impl RequestTokenResponse {
    /// Whether Twitter confirmed the callback URL.
    #[must_use]
    pub fn callback_confirmed(&self) -> bool {
        self.oauth_callback_confirmed.as_deref() == Some("true")
    }
}

/// Request token plus the URL the user must visit to authorize it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestTokenAndAuthenticateUrl {
    #[serde(flatten)]
    pub token: RequestTokenResponse,
    pub authenticate_url: String,
}

/// Optional parameters of the `oauth/authenticate` URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthenticateParams {
    /// Force the user to enter their credentials.
    pub force_login: Option<bool>,
    /// Prefill the username field.
    pub screen_name: Option<String>,
}

/// Inputs of the access-token step, as returned to the callback URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessTokenOptions {
    pub oauth_verifier: String,
    pub oauth_token: String,
}

/// Response of the access-token step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    pub oauth_token: String,
    pub oauth_token_secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen_name: Option<String>,
}

/// Response of the app-only bearer token exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BearerTokenResponse {
    pub token_type: String,
    pub access_token: String,
}

/// OAuth handshake client.
///
/// Always signs with the consumer pair only, whatever tokens the
/// configuration carries.
#[derive(Debug, Clone)]
pub struct TwitterAuth {
    http: Client,
    url: String,
    authenticate_url: String,
    bearer_token_url: String,
    credentials: Credentials,
    signer: OAuthSigner,
}

impl TwitterAuth {
    /// Create a new handshake client from configuration.
    pub fn new(config: &TwitterConfig) -> TwitterResult<Self> {
        Self::with_http_client(config, http_client(config)?)
    }

    /// Create with a custom HTTP client.
    pub fn with_http_client(config: &TwitterConfig, http: Client) -> TwitterResult<Self> {
        config.validate()?;
        let consumer = config.credentials().consumer().clone();

        Ok(Self {
            http,
            url: config.oauth_url(),
            authenticate_url: config.twitter_url(DEFAULT_SUBDOMAIN, "oauth/authenticate"),
            bearer_token_url: config.twitter_url(DEFAULT_SUBDOMAIN, "oauth2/token"),
            credentials: Credentials::new(consumer.clone(), AuthMode::ConsumerOnly),
            signer: OAuthSigner::new(consumer),
        })
    }

    /// Base URL of the OAuth 1.0a endpoints, e.g. `https://api.twitter.com/oauth`.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Step 1: obtain a request token. `callback` is a URL or `"oob"`; an
    /// empty callback sends no `oauth_callback` parameter.
    #[instrument(skip(self))]
    pub async fn get_request_token(
        &self,
        callback: &str,
    ) -> TwitterResult<ResponseResult<RequestTokenResponse>> {
        let mut params = Map::new();
        if !callback.is_empty() {
            params.insert("oauth_callback".into(), Value::String(callback.into()));
        }

        let url = format!("{}/request_token", self.url());
        self.token_call(&url, params).await
    }

    /// Step 1 plus the `oauth/authenticate` URL for the new request token.
    #[instrument(skip(self, params))]
    pub async fn get_request_token_and_authenticate_url(
        &self,
        callback: &str,
        params: &AuthenticateParams,
    ) -> TwitterResult<ResponseResult<RequestTokenAndAuthenticateUrl>> {
        let token = match self.get_request_token(callback).await? {
            ResponseResult::Data(token) => token,
            ResponseResult::Error(e) => return Ok(ResponseResult::Error(e)),
        };

        let authenticate_url = self.authenticate_url(&token.oauth_token, params)?;
        Ok(ResponseResult::Data(RequestTokenAndAuthenticateUrl {
            token,
            authenticate_url,
        }))
    }

    /// Step 2: the URL the user visits to authorize `oauth_token`.
    pub fn authenticate_url(
        &self,
        oauth_token: &str,
        params: &AuthenticateParams,
    ) -> TwitterResult<String> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(force_login) = params.force_login {
            query.push(("force_login", force_login.to_string()));
        }
        if let Some(screen_name) = &params.screen_name {
            query.push(("screen_name", screen_name.clone()));
        }
        query.push(("oauth_token", oauth_token.to_string()));

        let query = serde_urlencoded::to_string(&query)
            .map_err(|e| TwitterError::InvalidParameters(e.to_string()))?;

        Ok(format!("{}?{query}", self.authenticate_url))
    }

    /// Step 3: exchange the verified request token for an access token.
    /// The query is only sent when both verifier and token are present.
    #[instrument(skip(self, options))]
    pub async fn get_access_token(
        &self,
        options: &AccessTokenOptions,
    ) -> TwitterResult<ResponseResult<AccessTokenResponse>> {
        let mut params = Map::new();
        if !options.oauth_verifier.is_empty() && !options.oauth_token.is_empty() {
            params.insert(
                "oauth_verifier".into(),
                Value::String(options.oauth_verifier.clone()),
            );
            params.insert(
                "oauth_token".into(),
                Value::String(options.oauth_token.clone()),
            );
        }

        let url = format!("{}/access_token", self.url());
        self.token_call(&url, params).await
    }

    /// Exchange the consumer pair for an app-only bearer token.
    #[instrument(skip(self))]
    pub async fn get_bearer_token(&self) -> TwitterResult<ResponseResult<BearerTokenResponse>> {
        let consumer = self.credentials.consumer();
        let basic = BASE64.encode(format!(
            "{}:{}",
            percent_encode(&consumer.key),
            percent_encode(&consumer.secret)
        ));

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, header_value(&format!("Basic {basic}"))?);
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static(BEARER_TOKEN_CONTENT_TYPE),
        );

        let request = PreparedRequest {
            method: Method::POST,
            url: self.bearer_token_url.clone(),
            headers,
            body: Some(CLIENT_CREDENTIALS_BODY.to_string()),
            signed: None,
        };

        debug!(url = %request.url, "Requesting bearer token");
        dispatch(&self.http, request, ReadMode::Json).await?.decode()
    }

    async fn token_call<D: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        params: Map<String, Value>,
    ) -> TwitterResult<ResponseResult<D>> {
        let params = (!params.is_empty()).then_some(params);
        let request = RequestBuilder::new(&self.credentials, &self.signer)
            .post_with_query(url, params.as_ref())?;

        dispatch(&self.http, request, ReadMode::TextOrJson)
            .await?
            .decode()
    }
}
