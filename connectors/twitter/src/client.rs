//! Twitter REST API client.

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{Level, debug, instrument, trace};

use crate::{
    config::TwitterConfig,
    credentials::Credentials,
    error::TwitterResult,
    oauth::OAuthSigner,
    request::{Params, PreparedRequest, RequestBuilder, to_params},
    response::{RawResponse, ReadMode, ResponseResult, normalize},
    telemetry::{DEFAULT_REDACT_FIELDS, redact_sensitive},
};

/// Twitter REST API client.
///
/// Holds read-only state only; calls may run concurrently from one instance.
#[derive(Debug, Clone)]
pub struct TwitterApi {
    http: Client,
    url: String,
    credentials: Credentials,
    signer: OAuthSigner,
}

impl TwitterApi {
    /// Create a new API client from configuration.
    pub fn new(config: &TwitterConfig) -> TwitterResult<Self> {
        Self::with_http_client(config, http_client(config)?)
    }

    /// Create with a custom HTTP client.
    pub fn with_http_client(config: &TwitterConfig, http: Client) -> TwitterResult<Self> {
        config.validate()?;
        let credentials = config.credentials();

        Ok(Self {
            http,
            url: config.api_url(),
            signer: OAuthSigner::new(credentials.consumer().clone()),
            credentials,
        })
    }

    /// Base URL for versioned resources, e.g. `https://api.twitter.com/1.1`.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    fn builder(&self) -> RequestBuilder<'_> {
        RequestBuilder::new(&self.credentials, &self.signer)
    }

    fn resource_url(&self, resource: &str) -> String {
        format!("{}/{resource}.json", self.url)
    }

    /// Send a GET request, e.g. `api.get("statuses/user_timeline", json!({"count": 2}))`.
    ///
    /// Pass `()` for no parameters.
    #[instrument(skip(self, parameters))]
    pub async fn get(
        &self,
        resource: &str,
        parameters: impl Serialize,
    ) -> TwitterResult<ResponseResult> {
        let params = to_params(Some(&parameters))?;
        trace_params("query", params.as_ref());
        let request = self.builder().get(&self.resource_url(resource), params.as_ref())?;
        dispatch(&self.http, request, ReadMode::Json).await
    }

    /// Send a POST request. The body is form-encoded and signed, or sent as
    /// unsigned JSON for the endpoints that require it.
    #[instrument(skip(self, body))]
    pub async fn post(
        &self,
        resource: &str,
        body: impl Serialize,
    ) -> TwitterResult<ResponseResult> {
        let body = to_params(Some(&body))?;
        trace_params("body", body.as_ref());
        let request = self
            .builder()
            .post(resource, &self.resource_url(resource), body.as_ref())?;
        dispatch(&self.http, request, ReadMode::Json).await
    }

    /// Send a PUT request with signed query parameters and a JSON body.
    #[instrument(skip(self, parameters, body))]
    pub async fn put(
        &self,
        resource: &str,
        parameters: impl Serialize,
        body: impl Serialize,
    ) -> TwitterResult<ResponseResult> {
        let params = to_params(Some(&parameters))?;
        let body = to_params(Some(&body))?;
        trace_params("query", params.as_ref());
        trace_params("body", body.as_ref());
        let request = self
            .builder()
            .put(&self.resource_url(resource), params.as_ref(), body.as_ref())?;
        dispatch(&self.http, request, ReadMode::Json).await
    }

    /// Send a DELETE request with signed query parameters and a JSON body.
    #[instrument(skip(self, parameters, body))]
    pub async fn delete(
        &self,
        resource: &str,
        parameters: impl Serialize,
        body: impl Serialize,
    ) -> TwitterResult<ResponseResult> {
        let params = to_params(Some(&parameters))?;
        let body = to_params(Some(&body))?;
        trace_params("query", params.as_ref());
        trace_params("body", body.as_ref());
        let request = self
            .builder()
            .delete(&self.resource_url(resource), params.as_ref(), body.as_ref())?;
        dispatch(&self.http, request, ReadMode::Json).await
    }
}

fn trace_params(part: &str, params: Option<&Params>) {
    if let Some(params) = params {
        if tracing::enabled!(Level::TRACE) {
            let redacted = redact_sensitive(&Value::Object(params.clone()), DEFAULT_REDACT_FIELDS);
            trace!(part, params = %redacted, "Request parameters");
        }
    }
}

/// Build the shared `reqwest` client for a configuration.
pub(crate) fn http_client(config: &TwitterConfig) -> TwitterResult<Client> {
    Ok(Client::builder()
        .timeout(config.timeout)
        .user_agent(format!("twitter-lite/{}", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Send a prepared request and normalize the response. No retries.
pub(crate) async fn dispatch(
    http: &Client,
    request: PreparedRequest,
    mode: ReadMode,
) -> TwitterResult<ResponseResult> {
    let method = request.method.clone();
    let response = request.into_reqwest(http).send().await?;
    let raw = RawResponse::read(response).await?;

    debug!(
        %method,
        status = raw.status.as_u16(),
        bytes = raw.body.len(),
        "Twitter API response"
    );

    normalize(&raw, mode)
}
