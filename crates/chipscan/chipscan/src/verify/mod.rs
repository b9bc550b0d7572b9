//! Client for the remote verification service
//!
//! The service exposes three POST endpoints taking and returning flat JSON
//! objects with string fields. [`VerificationClient`] speaks that protocol over
//! any [`HttpClient`]; the scan engine only depends on the
//! [`VerificationService`] trait.

mod client;
mod http;

pub use client::{ClientConfig, DEFAULT_BASE_URL, VerificationClient};
pub use http::{HttpClient, HttpReply, ReqwestHttpClient};

use std::fmt;

use crate::error::Result;

/// Endpoints of the verification service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Issues a fresh server challenge
    GetChallenge,
    /// Answers the card's challenge
    PcdChallenge,
    /// Checks the card's final response
    CheckResponse,
}

impl Endpoint {
    /// Path relative to the service base URL
    pub const fn path(&self) -> &'static str {
        match self {
            Self::GetChallenge => "get-challenge",
            Self::PcdChallenge => "pcd-challenge",
            Self::CheckResponse => "check-response",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Final answer of the verification service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Value of `check-result`
    pub check_result: String,
    /// Value of `result-data`
    pub result_data: String,
}

/// The three operations of the verification protocol
///
/// None of them retries. Hex arguments are uppercase without separators.
pub trait VerificationService {
    /// Obtain a server challenge for this API key
    fn fetch_challenge(&self, api_key: &str) -> Result<String>;

    /// Submit the card's challenge and obtain the response to send back to it
    fn submit_device_challenge(
        &self,
        uid: &str,
        picc_challenge: &str,
        pcd_challenge: &str,
    ) -> Result<String>;

    /// Submit the card's final response and obtain the verdict
    fn check_result(&self, uid: &str, picc_challenge: &str, picc_response: &str)
    -> Result<Verdict>;
}

impl<T: VerificationService + ?Sized> VerificationService for &T {
    fn fetch_challenge(&self, api_key: &str) -> Result<String> {
        (**self).fetch_challenge(api_key)
    }

    fn submit_device_challenge(
        &self,
        uid: &str,
        picc_challenge: &str,
        pcd_challenge: &str,
    ) -> Result<String> {
        (**self).submit_device_challenge(uid, picc_challenge, pcd_challenge)
    }

    fn check_result(
        &self,
        uid: &str,
        picc_challenge: &str,
        picc_response: &str,
    ) -> Result<Verdict> {
        (**self).check_result(uid, picc_challenge, picc_response)
    }
}
