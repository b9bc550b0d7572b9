//! JSON protocol of the verification service

use std::time::Duration;

use serde_json::{Value, json};
use tracing::{debug, trace};
use url::Url;

use super::http::{HttpClient, ReqwestHttpClient};
use super::{Endpoint, Verdict, VerificationService};
use crate::error::{Error, Result};

/// Production verification service
pub const DEFAULT_BASE_URL: &str = "https://api2.vivokey.com/v1/";

/// Connection settings for [`VerificationClient`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL the endpoint paths are resolved against
    pub base_url: String,
    /// Per-request timeout, `None` for no timeout
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }
}

impl ClientConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the request timeout
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Resolve the URL of `endpoint`
    ///
    /// A missing trailing slash on the base URL is added so the last path
    /// segment is kept.
    pub fn endpoint_url(&self, endpoint: Endpoint) -> Result<Url> {
        let mut base = Url::parse(&self.base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(base.join(endpoint.path())?)
    }
}

/// [`VerificationService`] over HTTPS and JSON
#[derive(Debug, Clone)]
pub struct VerificationClient<C = ReqwestHttpClient> {
    http: C,
    get_challenge: Url,
    pcd_challenge: Url,
    check_response: Url,
}

impl VerificationClient<ReqwestHttpClient> {
    /// Create a client using `reqwest`
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = ReqwestHttpClient::new(config.timeout).map_err(Error::HttpClient)?;
        Self::with_http_client(config, http)
    }
}

impl<C: HttpClient> VerificationClient<C> {
    /// Create a client over a custom [`HttpClient`]
    pub fn with_http_client(config: &ClientConfig, http: C) -> Result<Self> {
        Ok(Self {
            http,
            get_challenge: config.endpoint_url(Endpoint::GetChallenge)?,
            pcd_challenge: config.endpoint_url(Endpoint::PcdChallenge)?,
            check_response: config.endpoint_url(Endpoint::CheckResponse)?,
        })
    }

    /// The underlying HTTP client
    pub const fn http_client(&self) -> &C {
        &self.http
    }

    const fn url(&self, endpoint: Endpoint) -> &Url {
        match endpoint {
            Endpoint::GetChallenge => &self.get_challenge,
            Endpoint::PcdChallenge => &self.pcd_challenge,
            Endpoint::CheckResponse => &self.check_response,
        }
    }

    /// POST `body` and parse the reply as a JSON object
    ///
    /// A body that is not JSON is treated as an empty object, so the caller
    /// reports the first field it cannot find.
    fn post(&self, endpoint: Endpoint, body: &Value) -> Result<Value> {
        let url = self.url(endpoint);
        debug!(%endpoint, "Calling verification service");

        let reply = self
            .http
            .post_json(url, body)
            .map_err(|source| Error::Network { endpoint, source })?;

        if !reply.is_success() {
            return Err(Error::Server {
                endpoint,
                status: reply.status,
            });
        }

        trace!(%endpoint, body = %String::from_utf8_lossy(&reply.body), "Reply received");
        Ok(serde_json::from_slice(&reply.body).unwrap_or_else(|e| {
            debug!(%endpoint, error = %e, "Reply is not JSON");
            Value::Null
        }))
    }
}

/// Extract a string field from a reply object
fn string_field(reply: &Value, endpoint: Endpoint, field: &'static str) -> Result<String> {
    reply
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(Error::MalformedResponse { endpoint, field })
}

impl<C: HttpClient> VerificationService for VerificationClient<C> {
    fn fetch_challenge(&self, api_key: &str) -> Result<String> {
        let endpoint = Endpoint::GetChallenge;
        let reply = self.post(endpoint, &json!({ "api-key": api_key }))?;
        string_field(&reply, endpoint, "picc-challenge")
    }

    fn submit_device_challenge(
        &self,
        uid: &str,
        picc_challenge: &str,
        pcd_challenge: &str,
    ) -> Result<String> {
        let endpoint = Endpoint::PcdChallenge;
        let body = json!({
            "picc-uid": uid,
            "picc-challenge": picc_challenge,
            "pcd-challenge": pcd_challenge,
        });
        let reply = self.post(endpoint, &body)?;
        string_field(&reply, endpoint, "pcd-response")
    }

    fn check_result(
        &self,
        uid: &str,
        picc_challenge: &str,
        picc_response: &str,
    ) -> Result<Verdict> {
        let endpoint = Endpoint::CheckResponse;
        let body = json!({
            "picc-uid": uid,
            "picc-challenge": picc_challenge,
            "picc-response": picc_response,
        });
        let reply = self.post(endpoint, &body)?;
        Ok(Verdict {
            check_result: string_field(&reply, endpoint, "check-result")?,
            result_data: string_field(&reply, endpoint, "result-data")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HttpError;
    use crate::verify::HttpReply;
    use std::cell::RefCell;

    /// Replies with a fixed status and body and records every request
    #[derive(Debug)]
    struct FixedReply {
        status: u16,
        body: &'static str,
        requests: RefCell<Vec<(Url, Value)>>,
    }

    impl FixedReply {
        fn new(status: u16, body: &'static str) -> Self {
            Self {
                status,
                body,
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    impl HttpClient for FixedReply {
        fn post_json(&self, url: &Url, body: &Value) -> std::result::Result<HttpReply, HttpError> {
            self.requests.borrow_mut().push((url.clone(), body.clone()));
            Ok(HttpReply::new(self.status, self.body))
        }
    }

    struct Unreachable;

    impl HttpClient for Unreachable {
        fn post_json(&self, _: &Url, _: &Value) -> std::result::Result<HttpReply, HttpError> {
            Err("connection refused".into())
        }
    }

    fn client<C: HttpClient>(http: C) -> VerificationClient<C> {
        VerificationClient::with_http_client(&ClientConfig::default(), http).unwrap()
    }

    #[test]
    fn test_endpoint_urls() {
        let config = ClientConfig::default();
        assert_eq!(
            config.endpoint_url(Endpoint::GetChallenge).unwrap().as_str(),
            "https://api2.vivokey.com/v1/get-challenge"
        );

        let config = ClientConfig::new().with_base_url("http://localhost:8080/api");
        assert_eq!(
            config.endpoint_url(Endpoint::CheckResponse).unwrap().as_str(),
            "http://localhost:8080/api/check-response"
        );

        let config = ClientConfig::new().with_base_url("not a url");
        assert!(matches!(
            config.endpoint_url(Endpoint::PcdChallenge),
            Err(Error::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_fetch_challenge_request() {
        let client = client(FixedReply::new(200, r#"{"picc-challenge":"00112233"}"#));
        assert_eq!(client.fetch_challenge("secret").unwrap(), "00112233");

        let requests = client.http_client().requests.borrow();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0.path(), "/v1/get-challenge");
        assert_eq!(requests[0].1, json!({ "api-key": "secret" }));
    }

    #[test]
    fn test_submit_device_challenge_request() {
        let client = client(FixedReply::new(200, r#"{"pcd-response":"C0FFEE"}"#));
        let response = client
            .submit_device_challenge("04A1B2C3D4E5F6", "0011", "AABB")
            .unwrap();
        assert_eq!(response, "C0FFEE");

        let requests = client.http_client().requests.borrow();
        assert_eq!(
            requests[0].1,
            json!({
                "picc-uid": "04A1B2C3D4E5F6",
                "picc-challenge": "0011",
                "pcd-challenge": "AABB",
            })
        );
    }

    #[test]
    fn test_check_result_fields() {
        let client = client(FixedReply::new(
            200,
            r#"{"check-result":"pass","result-data":"member 42","extra":1}"#,
        ));
        let verdict = client.check_result("04", "0011", "1234").unwrap();
        assert_eq!(verdict.check_result, "pass");
        assert_eq!(verdict.result_data, "member 42");
    }

    #[test]
    fn test_server_error() {
        let client = client(FixedReply::new(500, "internal error"));
        let err = client.fetch_challenge("secret").unwrap_err();
        assert!(matches!(
            err,
            Error::Server {
                endpoint: Endpoint::GetChallenge,
                status: 500
            }
        ));
    }

    #[test]
    fn test_network_error() {
        let err = client(Unreachable).fetch_challenge("secret").unwrap_err();
        assert!(matches!(
            err,
            Error::Network {
                endpoint: Endpoint::GetChallenge,
                ..
            }
        ));
    }

    #[test]
    fn test_missing_or_non_string_field() {
        let err = client(FixedReply::new(200, r#"{"pcd-response":42}"#))
            .submit_device_challenge("04", "00", "AA")
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedResponse {
                endpoint: Endpoint::PcdChallenge,
                field: "pcd-response"
            }
        ));

        let err = client(FixedReply::new(200, r#"{"check-result":"pass"}"#))
            .check_result("04", "00", "AA")
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedResponse {
                field: "result-data",
                ..
            }
        ));

        let err = client(FixedReply::new(200, "<html>"))
            .fetch_challenge("secret")
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedResponse {
                field: "picc-challenge",
                ..
            }
        ));
    }
}
