//! Twitter v1.1 REST client with OAuth 1.0a request signing.
//!
//! [`Twitter`] bundles both clients below, built from one configuration:
//! - [`TwitterApi`]: `get`/`post`/`put`/`delete` against versioned resources
//!   such as `statuses/update`, signed with OAuth 1.0a or sent with a bearer
//!   token.
//! - [`TwitterAuth`]: the OAuth handshake (request token, authenticate URL,
//!   access token, bearer token).
//!
//! Every call resolves to a [`ResponseResult`]: `Data` on success, `Error`
//! with the remote error payload otherwise. Transport failures are returned
//! as [`TwitterError::Http`]. Nothing is retried.
//!
//! ## Request encoding
//!
//! | Verb | Parameters | Signed | Body |
//! |------|------------|--------|------|
//! | GET | query string | yes | none |
//! | POST (form endpoint) | form body | yes | `application/x-www-form-urlencoded` |
//! | POST (JSON endpoint) | JSON body | no | `application/json` |
//! | PUT / DELETE | query string | yes | optional unsigned JSON |
//!
//! JSON endpoints are listed in [`JSON_ENDPOINTS`].
//!
//! ```rust,ignore
//! use serde_json::json;
//! use twitter_lite::{Twitter, TwitterConfig};
//!
//! let config = TwitterConfig::new("consumer_key", "consumer_secret")
//!     .with_access_token("access_token", "access_token_secret");
//! let Twitter { api, .. } = Twitter::new(&config)?;
//!
//! let result = api.post("statuses/update", json!({ "status": "Hello!" })).await?;
//! match result.into_result() {
//!     Ok(tweet) => println!("posted {}", tweet["id_str"]),
//!     Err(error) => eprintln!("rejected: {error}"),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod auth;
mod client;
mod config;
mod credentials;
mod endpoint;
mod error;
mod oauth;
mod request;
mod response;
pub mod telemetry;
mod twitter;

pub use auth::{
    AccessTokenOptions, AccessTokenResponse, AuthenticateParams, BearerTokenResponse,
    RequestTokenAndAuthenticateUrl, RequestTokenResponse, TwitterAuth,
};
pub use client::TwitterApi;
pub use config::{DEFAULT_SUBDOMAIN, DEFAULT_VERSION, TwitterConfig};
pub use credentials::{AuthMode, Consumer, Credentials, Token};
pub use endpoint::{JSON_ENDPOINTS, is_json_endpoint};
pub use error::{TwitterError, TwitterResult};
pub use oauth::{OAuthNonce, OAuthSigner, RequestDescriptor};
pub use request::{
    Params, PreparedRequest, RequestBuilder, escape_reserved, flatten, stringify, to_params,
};
pub use response::{RawResponse, ReadMode, ResponseResult, normalize};
pub use twitter::Twitter;
