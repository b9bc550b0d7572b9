//! HTTP seam of the verification client

use std::time::Duration;

use bytes::Bytes;
use serde_json::Value;
use url::Url;

use crate::error::HttpError;

/// Status and body of an HTTP reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    /// HTTP status code
    pub status: u16,
    /// Raw reply body
    pub body: Bytes,
}

impl HttpReply {
    /// Create a reply
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Minimal blocking HTTP client
///
/// A connection is acquired per request and released once the body has been
/// read.
pub trait HttpClient {
    /// POST `body` as `application/json` and return the full reply
    ///
    /// Non-success statuses are returned as replies, not errors.
    fn post_json(&self, url: &Url, body: &Value) -> Result<HttpReply, HttpError>;
}

/// [`HttpClient`] backed by a blocking `reqwest` client
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::blocking::Client,
}

impl ReqwestHttpClient {
    /// Build a client; `None` disables the request timeout
    pub fn new(timeout: Option<Duration>) -> Result<Self, HttpError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("chipscan/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// Wrap an existing `reqwest` client
    pub const fn from_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl HttpClient for ReqwestHttpClient {
    fn post_json(&self, url: &Url, body: &Value) -> Result<HttpReply, HttpError> {
        let response = self.client.post(url.clone()).json(body).send()?;
        let status = response.status().as_u16();
        let body = response.bytes()?;
        Ok(HttpReply { status, body })
    }
}
