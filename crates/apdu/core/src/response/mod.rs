//! APDU response definitions
//!
//! This module provides the response type for APDU exchanges
//! according to ISO/IEC 7816-4.

pub mod error;
pub mod status;

use bytes::Bytes;
use tracing::trace;

use error::ResponseError;
use status::StatusWord;

/// Basic APDU response structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Response payload data (without the status word)
    payload: Bytes,
    /// Status word
    status: StatusWord,
}

impl Response {
    /// Create a new response with payload and status
    pub fn new(payload: impl Into<Bytes>, status: impl Into<StatusWord>) -> Self {
        Self {
            payload: payload.into(),
            status: status.into(),
        }
    }

    /// Parse response from raw bytes (including status word)
    pub fn from_bytes(data: &Bytes) -> Result<Self, ResponseError> {
        let len = data.len();
        if len < 2 {
            return Err(ResponseError::Incomplete(len));
        }

        let status = StatusWord::new(data[len - 2], data[len - 1]);
        let payload = data.slice(..len - 2);

        trace!(
            sw1 = format_args!("{:#04x}", status.sw1),
            sw2 = format_args!("{:#04x}", status.sw2),
            payload_len = payload.len(),
            "Parsed APDU response"
        );

        Ok(Self { payload, status })
    }

    /// Get the response payload data
    pub const fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Get the status word
    pub const fn status(&self) -> StatusWord {
        self.status
    }

    /// Check if the response indicates success (90 00)
    pub const fn is_success(&self) -> bool {
        self.status.is_success()
    }
}
