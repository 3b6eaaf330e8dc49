//! OAuth 1.0a request signing.
//!
//! Twitter requires HMAC-SHA1 signatures for user-context and handshake
//! requests. This module turns a [`RequestDescriptor`] into an
//! `Authorization: OAuth ...` header value.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::Method;
use sha1::Sha1;
use url::Url;

use crate::credentials::{Consumer, Token};
use crate::error::{TwitterError, TwitterResult};

/// Characters that must be percent-encoded in OAuth signatures.
/// RFC 3986 unreserved characters: ALPHA / DIGIT / "-" / "." / "_" / "~"
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";

/// The request shape covered by a signature.
///
/// `parameters` is the signed parameter set only: query parameters and
/// form-encoded body parameters. JSON bodies never appear here.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: String,
    pub parameters: Vec<(String, String)>,
}

impl RequestDescriptor {
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            parameters: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_parameters(mut self, parameters: Vec<(String, String)>) -> Self {
        self.parameters = parameters;
        self
    }
}

/// Per-request nonce and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthNonce {
    pub nonce: String,
    pub timestamp: u64,
}

impl OAuthNonce {
    #[must_use]
    pub fn new(nonce: impl Into<String>, timestamp: u64) -> Self {
        Self {
            nonce: nonce.into(),
            timestamp,
        }
    }

    /// Fresh random nonce stamped with the current time.
    pub fn generate() -> TwitterResult<Self> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| TwitterError::OAuth(format!("Failed to get timestamp: {e}")))?
            .as_secs();

        Ok(Self {
            nonce: generate_nonce(),
            timestamp,
        })
    }
}

/// OAuth 1.0a signer for Twitter API requests.
#[derive(Debug, Clone)]
pub struct OAuthSigner {
    consumer: Consumer,
}

impl OAuthSigner {
    /// Create a new OAuth signer for a consumer.
    #[must_use]
    pub const fn new(consumer: Consumer) -> Self {
        Self { consumer }
    }

    /// Generate the OAuth 1.0a Authorization header value with a fresh
    /// nonce and timestamp.
    ///
    /// Without a token the request is signed with the consumer only and an
    /// empty token secret.
    pub fn sign(&self, request: &RequestDescriptor, token: Option<&Token>) -> TwitterResult<String> {
        self.sign_with(request, token, &OAuthNonce::generate()?)
    }

    /// Generate the Authorization header value for a fixed nonce/timestamp.
    pub fn sign_with(
        &self,
        request: &RequestDescriptor,
        token: Option<&Token>,
        nonce: &OAuthNonce,
    ) -> TwitterResult<String> {
        let mut oauth_params = self.protocol_params(token, nonce);
        let base_string = self.signature_base_string(request, token, nonce)?;

        let signing_key = format!(
            "{}&{}",
            percent_encode(&self.consumer.secret),
            percent_encode(token.map_or("", |t| t.secret.as_str()))
        );

        let signature = hmac_sha1(&signing_key, &base_string)?;
        oauth_params.insert("oauth_signature", signature);

        let header = oauth_params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(format!("OAuth {header}"))
    }

    /// Build the signature base string:
    /// `METHOD&enc(base_url)&enc(sorted, encoded parameters)`.
    ///
    /// Query parameters embedded in `request.url` are folded into the
    /// parameter set and stripped from the base URL.
    pub fn signature_base_string(
        &self,
        request: &RequestDescriptor,
        token: Option<&Token>,
        nonce: &OAuthNonce,
    ) -> TwitterResult<String> {
        let parsed = Url::parse(&request.url)
            .map_err(|e| TwitterError::OAuth(format!("invalid URL {}: {e}", request.url)))?;

        let mut base_url = format!(
            "{}://{}",
            parsed.scheme(),
            parsed.host_str().unwrap_or_default()
        );
        if let Some(port) = parsed.port() {
            base_url.push_str(&format!(":{port}"));
        }
        base_url.push_str(parsed.path());

        let mut encoded: Vec<(String, String)> = self
            .protocol_params(token, nonce)
            .into_iter()
            .map(|(k, v)| (percent_encode(k), percent_encode(&v)))
            .collect();
        encoded.extend(
            parsed
                .query_pairs()
                .map(|(k, v)| (percent_encode(&k), percent_encode(&v))),
        );
        encoded.extend(
            request
                .parameters
                .iter()
                .map(|(k, v)| (percent_encode(k), percent_encode(v))),
        );
        encoded.sort();

        let param_string = encoded
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");

        Ok(format!(
            "{}&{}&{}",
            request.method.as_str().to_uppercase(),
            percent_encode(&base_url),
            percent_encode(&param_string)
        ))
    }

    fn protocol_params(
        &self,
        token: Option<&Token>,
        nonce: &OAuthNonce,
    ) -> BTreeMap<&'static str, String> {
        let mut params = BTreeMap::new();
        params.insert("oauth_consumer_key", self.consumer.key.clone());
        params.insert("oauth_nonce", nonce.nonce.clone());
        params.insert("oauth_signature_method", SIGNATURE_METHOD.to_string());
        params.insert("oauth_timestamp", nonce.timestamp.to_string());
        params.insert("oauth_version", OAUTH_VERSION.to_string());
        if let Some(t) = token {
            params.insert("oauth_token", t.key.clone());
        }
        params
    }
}

/// Percent-encode a string according to RFC 3986.
pub(crate) fn percent_encode(s: &str) -> String {
    utf8_percent_encode(s, OAUTH_ENCODE_SET).to_string()
}

/// Generate a random nonce for OAuth.
fn generate_nonce() -> String {
    use rand::RngCore;
    let mut rng = rand::thread_rng();
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Compute HMAC-SHA1 and return base64-encoded result.
fn hmac_sha1(key: &str, data: &str) -> TwitterResult<String> {
    type HmacSha1 = Hmac<Sha1>;

    let mut mac =
        HmacSha1::new_from_slice(key.as_bytes()).map_err(|e| TwitterError::OAuth(e.to_string()))?;

    mac.update(data.as_bytes());
    let result = mac.finalize();
    Ok(BASE64.encode(result.into_bytes()))
}
