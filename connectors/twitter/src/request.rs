//! Request construction.
//!
//! Decides where parameters go (query string, signed form body, unsigned
//! JSON body), which of them are covered by the OAuth signature, and which
//! `Authorization` scheme applies. Produces a [`PreparedRequest`] that is
//! plain data until the client hands it to `reqwest`.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::Method;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::credentials::{AuthMode, Credentials};
use crate::endpoint::is_json_endpoint;
use crate::error::{TwitterError, TwitterResult};
use crate::oauth::{OAuthSigner, RequestDescriptor};

/// Parameter object: a JSON object keyed by parameter name.
pub type Params = Map<String, Value>;

pub(crate) const APPLICATION_JSON: &str = "application/json";
pub(crate) const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Query-string encoding: everything but `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// A fully formed HTTP request.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<String>,
    /// What the OAuth signature was computed over; `None` for bearer auth.
    pub signed: Option<RequestDescriptor>,
}

impl PreparedRequest {
    /// Header value as a string, if present and visible ASCII.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Turn this into a `reqwest` request on the given client.
    #[must_use]
    pub fn into_reqwest(self, client: &reqwest::Client) -> reqwest::RequestBuilder {
        let req = client.request(self.method, &self.url).headers(self.headers);
        match self.body {
            Some(body) => req.body(body),
            None => req,
        }
    }
}

/// Builds signed requests for one credential set.
#[derive(Debug, Clone, Copy)]
pub struct RequestBuilder<'a> {
    credentials: &'a Credentials,
    signer: &'a OAuthSigner,
}

impl<'a> RequestBuilder<'a> {
    #[must_use]
    pub const fn new(credentials: &'a Credentials, signer: &'a OAuthSigner) -> Self {
        Self {
            credentials,
            signer,
        }
    }

    /// GET: every parameter goes in the query string and is signed.
    pub fn get(&self, url: &str, params: Option<&Params>) -> TwitterResult<PreparedRequest> {
        let pairs = params.map(flatten).transpose()?.unwrap_or_default();
        let url = with_query(url, &pairs);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(APPLICATION_JSON));

        self.finish(Method::GET, url, pairs, headers, None)
    }

    /// POST: JSON endpoints get an unsigned JSON body, everything else a
    /// signed form body.
    pub fn post(
        &self,
        resource: &str,
        url: &str,
        body: Option<&Params>,
    ) -> TwitterResult<PreparedRequest> {
        let json = is_json_endpoint(resource);
        debug!(resource, json, "Classified POST endpoint");

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(APPLICATION_JSON));

        if json {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
            let body = body.map(serde_json::to_string).transpose()?;
            return self.finish(Method::POST, url.to_string(), Vec::new(), headers, body);
        }

        headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_URLENCODED));
        let pairs = body.map(flatten).transpose()?.unwrap_or_default();
        let form = (!pairs.is_empty()).then(|| escape_reserved(&stringify(&pairs)));

        self.finish(Method::POST, url.to_string(), pairs, headers, form)
    }

    /// POST with signed query parameters and no body (OAuth token endpoints).
    pub fn post_with_query(
        &self,
        url: &str,
        params: Option<&Params>,
    ) -> TwitterResult<PreparedRequest> {
        self.query_and_json(Method::POST, url, params, None)
    }

    /// PUT: signed query parameters plus an optional unsigned JSON body.
    pub fn put(
        &self,
        url: &str,
        params: Option<&Params>,
        body: Option<&Params>,
    ) -> TwitterResult<PreparedRequest> {
        self.query_and_json(Method::PUT, url, params, body)
    }

    /// DELETE: signed query parameters plus an optional unsigned JSON body.
    pub fn delete(
        &self,
        url: &str,
        params: Option<&Params>,
        body: Option<&Params>,
    ) -> TwitterResult<PreparedRequest> {
        self.query_and_json(Method::DELETE, url, params, body)
    }

    fn query_and_json(
        &self,
        method: Method,
        url: &str,
        params: Option<&Params>,
        body: Option<&Params>,
    ) -> TwitterResult<PreparedRequest> {
        let pairs = params.map(flatten).transpose()?.unwrap_or_default();
        let url = with_query(url, &pairs);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        headers.insert(ACCEPT, HeaderValue::from_static(APPLICATION_JSON));

        let body = body.map(serde_json::to_string).transpose()?;
        self.finish(method, url, pairs, headers, body)
    }

    /// Attach the `Authorization` header and assemble the request.
    ///
    /// `url` may carry a query string; the signed URL never does, the query
    /// pairs are passed separately in `signed_params`.
    fn finish(
        &self,
        method: Method,
        url: String,
        signed_params: Vec<(String, String)>,
        mut headers: HeaderMap,
        body: Option<String>,
    ) -> TwitterResult<PreparedRequest> {
        let (authorization, signed) = match self.credentials.mode() {
            AuthMode::AppOnly { bearer_token } => {
                debug!(%method, "Using bearer authorization");
                (format!("Bearer {bearer_token}"), None)
            }
            AuthMode::User(_) | AuthMode::ConsumerOnly => {
                let base_url = url.split_once('?').map_or(url.as_str(), |(base, _)| base);
                let descriptor =
                    RequestDescriptor::new(method.clone(), base_url).with_parameters(signed_params);
                debug!(
                    %method,
                    url = base_url,
                    signed_params = descriptor.parameters.len(),
                    user_context = self.credentials.token().is_some(),
                    "Signing request"
                );
                let header = self.signer.sign(&descriptor, self.credentials.token())?;
                (header, Some(descriptor))
            }
        };

        headers.insert(AUTHORIZATION, header_value(&authorization)?);

        Ok(PreparedRequest {
            method,
            url,
            headers,
            body,
            signed,
        })
    }
}

/// Serialize a caller value into a parameter object.
///
/// `None`, `null` and `{}` all mean "no parameters".
pub fn to_params<T: Serialize + ?Sized>(value: Option<&T>) -> TwitterResult<Option<Params>> {
    let Some(value) = value else {
        return Ok(None);
    };

    match serde_json::to_value(value)? {
        Value::Null => Ok(None),
        Value::Object(map) if map.is_empty() => Ok(None),
        Value::Object(map) => Ok(Some(map)),
        other => Err(TwitterError::InvalidParameters(format!(
            "expected an object, got {other}"
        ))),
    }
}

/// Flatten a parameter object into string pairs.
///
/// Scalars are stringified, `null` becomes an empty value and arrays repeat
/// the key. Nested objects have no flat representation.
pub fn flatten(params: &Params) -> TwitterResult<Vec<(String, String)>> {
    let mut pairs = Vec::with_capacity(params.len());
    for (key, value) in params {
        match value {
            Value::Array(items) => {
                for item in items {
                    pairs.push((key.clone(), scalar(key, item)?));
                }
            }
            other => pairs.push((key.clone(), scalar(key, other)?)),
        }
    }
    Ok(pairs)
}

fn scalar(key: &str, value: &Value) -> TwitterResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        Value::Array(_) | Value::Object(_) => Err(TwitterError::InvalidParameters(format!(
            "parameter {key:?} is nested and cannot be URL-encoded"
        ))),
    }
}

/// Encode pairs as `k=v&k=v` with query-string escaping.
#[must_use]
pub fn stringify(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                utf8_percent_encode(k, QUERY_ENCODE_SET),
                utf8_percent_encode(v, QUERY_ENCODE_SET)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Escape the characters query-string encoding leaves alone but the API
/// requires escaped in form bodies.
#[must_use]
pub fn escape_reserved(encoded: &str) -> String {
    let mut out = String::with_capacity(encoded.len());
    for c in encoded.chars() {
        match c {
            '!' => out.push_str("%21"),
            '*' => out.push_str("%2A"),
            '\'' => out.push_str("%27"),
            '(' => out.push_str("%28"),
            ')' => out.push_str("%29"),
            other => out.push(other),
        }
    }
    out
}

fn with_query(url: &str, pairs: &[(String, String)]) -> String {
    if pairs.is_empty() {
        url.to_string()
    } else {
        format!("{url}?{}", stringify(pairs))
    }
}

pub(crate) fn header_value(value: &str) -> TwitterResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| TwitterError::Config(format!("invalid header value: {e}")))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::credentials::{Consumer, Token};
    use crate::oauth::{OAuthNonce, percent_encode};

    const URL: &str = "https://api.twitter.com/1.1/statuses/update.json";

    fn user_credentials() -> Credentials {
        Credentials::new(
            Consumer::new("ck", "cs"),
            AuthMode::User(Token::new("tk", "ts")),
        )
    }

    fn params(value: Value) -> Params {
        to_params(Some(&value)).unwrap().unwrap()
    }

    fn base_string(signer: &OAuthSigner, request: &PreparedRequest) -> String {
        signer
            .signature_base_string(
                request.signed.as_ref().unwrap(),
                Some(&Token::new("tk", "ts")),
                &OAuthNonce::new("n", 1),
            )
            .unwrap()
    }

    #[test]
    fn test_escape_reserved() {
        assert_eq!(escape_reserved("a!b*c'd(e)f"), "a%21b%2Ac%27d%28e%29f");
        assert_eq!(escape_reserved("already%20encoded%2C"), "already%20encoded%2C");
        assert_eq!(escape_reserved("plain"), "plain");
    }

    #[test]
    fn test_stringify_matches_querystring() {
        let pairs = vec![
            ("status".to_string(), "Hello Ladies + Gentlemen!".to_string()),
            ("a b".to_string(), "~*'()".to_string()),
        ];
        assert_eq!(
            stringify(&pairs),
            "status=Hello%20Ladies%20%2B%20Gentlemen!&a%20b=~*'()"
        );
    }

    #[test]
    fn test_to_params_treats_empty_as_absent() {
        assert!(to_params::<Value>(None).unwrap().is_none());
        assert!(to_params(Some(&json!({}))).unwrap().is_none());
        assert!(to_params(Some(&json!(null))).unwrap().is_none());
        assert!(matches!(
            to_params(Some(&json!([1, 2]))),
            Err(TwitterError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_flatten() {
        let pairs = flatten(&params(json!({
            "count": 2,
            "ids": ["1", "2"],
            "skip": null,
            "trim_user": true,
        })))
        .unwrap();

        assert_eq!(
            pairs,
            vec![
                ("count".to_string(), "2".to_string()),
                ("ids".to_string(), "1".to_string()),
                ("ids".to_string(), "2".to_string()),
                ("skip".to_string(), String::new()),
                ("trim_user".to_string(), "true".to_string()),
            ]
        );

        assert!(matches!(
            flatten(&params(json!({ "alt_text": { "text": "x" } }))),
            Err(TwitterError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_get_puts_params_in_query_and_signature() {
        let creds = user_credentials();
        let signer = OAuthSigner::new(creds.consumer().clone());
        let builder = RequestBuilder::new(&creds, &signer);

        let req = builder
            .get(URL, Some(&params(json!({ "count": 2, "screen_name": "twitterapi" }))))
            .unwrap();

        assert_eq!(req.method, Method::GET);
        assert_eq!(req.url, format!("{URL}?count=2&screen_name=twitterapi"));
        assert!(req.body.is_none());
        let signed = req.signed.as_ref().unwrap();
        assert_eq!(signed.url, URL);
        assert_eq!(signed.parameters.len(), 2);
        assert!(req.header("authorization").unwrap().starts_with("OAuth "));
    }

    #[test]
    fn test_empty_params_produce_no_query_or_body() {
        let creds = user_credentials();
        let signer = OAuthSigner::new(creds.consumer().clone());
        let builder = RequestBuilder::new(&creds, &signer);
        let empty = to_params(Some(&json!({}))).unwrap();

        let get = builder.get(URL, empty.as_ref()).unwrap();
        assert_eq!(get.url, URL);
        assert!(get.body.is_none());

        let post = builder.post("statuses/update", URL, empty.as_ref()).unwrap();
        assert_eq!(post.url, URL);
        assert!(post.body.is_none());

        let json_post = builder
            .post("direct_messages/events/new", URL, None)
            .unwrap();
        assert!(json_post.body.is_none());

        let put = builder.put(URL, empty.as_ref(), empty.as_ref()).unwrap();
        assert_eq!(put.url, URL);
        assert!(put.body.is_none());

        let delete = builder.delete(URL, None, None).unwrap();
        assert_eq!(delete.url, URL);
        assert!(delete.body.is_none());
    }

    #[test]
    fn test_form_post_is_signed_and_escaped() {
        let creds = user_credentials();
        let signer = OAuthSigner::new(creds.consumer().clone());
        let builder = RequestBuilder::new(&creds, &signer);

        let req = builder
            .post(
                "statuses/update",
                URL,
                Some(&params(json!({ "status": "Hi (there)! it's *me*" }))),
            )
            .unwrap();

        assert_eq!(req.url, URL);
        assert_eq!(req.header("content-type"), Some(FORM_URLENCODED));
        assert_eq!(
            req.body.as_deref(),
            Some("status=Hi%20%28there%29%21%20it%27s%20%2Ame%2A")
        );
        assert!(base_string(&signer, &req).contains("status%3D"));
    }

    #[test]
    fn test_form_body_matches_signed_parameters() {
        let creds = user_credentials();
        let signer = OAuthSigner::new(creds.consumer().clone());
        let builder = RequestBuilder::new(&creds, &signer);

        let req = builder
            .post(
                "statuses/update",
                URL,
                Some(&params(json!({
                    "media_ids": ["1", "2"],
                    "status": "a+b (c)! it's *✓*"
                }))),
            )
            .unwrap();

        let body = req.body.as_deref().unwrap();
        let signed = &req.signed.as_ref().unwrap().parameters;

        let decoded: Vec<(String, String)> = url::form_urlencoded::parse(body.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(&decoded, signed);

        // the bytes on the wire are exactly the RFC 3986 form that was signed
        let sent: Vec<&str> = body.split('&').collect();
        let expected: Vec<String> = signed
            .iter()
            .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
            .collect();
        assert_eq!(sent, expected);
        assert!(body.contains("status=a%2Bb%20%28c%29%21%20it%27s%20%2A%E2%9C%93%2A"));
    }

    #[test]
    fn test_json_post_body_is_not_signed() {
        let creds = user_credentials();
        let signer = OAuthSigner::new(creds.consumer().clone());
        let builder = RequestBuilder::new(&creds, &signer);

        let body = params(json!({
            "event": {
                "type": "message_create",
                "message_create": { "message_data": { "text": "hello" } }
            }
        }));
        let req = builder
            .post("direct_messages/events/new", URL, Some(&body))
            .unwrap();

        assert_eq!(req.header("content-type"), Some(APPLICATION_JSON));
        let sent: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(sent["event"]["type"], "message_create");

        assert!(req.signed.as_ref().unwrap().parameters.is_empty());
        let base = base_string(&signer, &req);
        assert!(!base.contains("event"));
        assert!(!base.contains("message_create"));
    }

    #[test]
    fn test_put_signs_query_but_not_body() {
        let creds = user_credentials();
        let signer = OAuthSigner::new(creds.consumer().clone());
        let builder = RequestBuilder::new(&creds, &signer);

        let req = builder
            .put(
                "https://api.twitter.com/1.1/direct_messages/welcome_messages/update.json",
                Some(&params(json!({ "id": "123" }))),
                Some(&params(json!({ "message_data": { "text": "Welcome!!!" } }))),
            )
            .unwrap();

        assert_eq!(req.method, Method::PUT);
        assert!(req.url.ends_with("update.json?id=123"));
        assert_eq!(req.header("content-type"), Some(APPLICATION_JSON));
        assert_eq!(
            req.body.as_deref(),
            Some(r#"{"message_data":{"text":"Welcome!!!"}}"#)
        );

        let base = base_string(&signer, &req);
        assert!(base.contains("id%3D123"));
        assert!(!base.contains("message_data"));
    }

    #[test]
    fn test_bearer_skips_signing() {
        let creds = Credentials::new(
            Consumer::new("ck", "cs"),
            AuthMode::AppOnly {
                bearer_token: "AAAA".into(),
            },
        );
        let signer = OAuthSigner::new(creds.consumer().clone());
        let builder = RequestBuilder::new(&creds, &signer);

        let req = builder
            .get(URL, Some(&params(json!({ "resources": "statuses" }))))
            .unwrap();

        assert_eq!(req.header("authorization"), Some("Bearer AAAA"));
        assert!(req.signed.is_none());
        assert!(req.url.ends_with("?resources=statuses"));
    }

    #[test]
    fn test_consumer_only_signs_without_token() {
        let creds = Credentials::new(Consumer::new("ck", "cs"), AuthMode::ConsumerOnly);
        let signer = OAuthSigner::new(creds.consumer().clone());
        let builder = RequestBuilder::new(&creds, &signer);

        let req = builder.get(URL, None).unwrap();
        let auth = req.header("authorization").unwrap();
        assert!(auth.contains("oauth_consumer_key=\"ck\""));
        assert!(!auth.contains("oauth_token="));
    }

    #[test]
    fn test_caller_params_are_not_mutated() {
        let creds = user_credentials();
        let signer = OAuthSigner::new(creds.consumer().clone());
        let builder = RequestBuilder::new(&creds, &signer);

        let body = params(json!({ "status": "hello" }));
        let before = body.clone();
        builder.post("statuses/update", URL, Some(&body)).unwrap();
        assert_eq!(body, before);
    }
}
