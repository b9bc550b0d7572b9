//! Error types for the scan engine

use chipscan_apdu_core::{StatusWord, TransportError};

use crate::verify::Endpoint;

/// Result type for scan operations
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error returned by an [`HttpClient`](crate::verify::HttpClient)
pub type HttpError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that abort a scan
///
/// An unrecognized device is not an error; it is reported through
/// [`ScanResult::recognized`](crate::ScanResult::recognized).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Reader or card communication failed
    #[error("Card error: {0}")]
    Transport(#[from] chipscan_apdu_core::Error),

    /// The card answered a command with an unexpected status word
    #[error("{command} returned status {status} ({})", .status.description())]
    Status {
        /// Name of the command that failed
        command: &'static str,
        /// Status word returned by the card
        status: StatusWord,
    },

    /// The verification service could not be reached
    #[error("Network error on {endpoint}: {source}")]
    Network {
        /// Endpoint being called
        endpoint: Endpoint,
        /// Underlying HTTP client error
        #[source]
        source: HttpError,
    },

    /// The verification service replied with a non-success HTTP status
    #[error("Server error on {endpoint}: HTTP {status}")]
    Server {
        /// Endpoint being called
        endpoint: Endpoint,
        /// HTTP status code
        status: u16,
    },

    /// A reply did not contain the expected string field
    #[error("Malformed response from {endpoint}: missing string field `{field}`")]
    MalformedResponse {
        /// Endpoint being called
        endpoint: Endpoint,
        /// Name of the missing field
        field: &'static str,
    },

    /// A hex string had odd length or non-hex characters
    #[error("Malformed hex {input:?}: {source}")]
    MalformedHex {
        /// The rejected input
        input: String,
        /// Decoder error
        #[source]
        source: hex::FromHexError,
    },

    /// The device registry violates its invariants
    #[error("Invalid device registry: {0}")]
    InvalidRegistry(String),

    /// The service base URL could not be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] HttpError),
}

impl From<TransportError> for Error {
    fn from(error: TransportError) -> Self {
        Self::Transport(error.into())
    }
}

impl Error {
    /// The card transport error at the root of this error, if any
    pub fn transport_error(&self) -> Option<&TransportError> {
        match self {
            Self::Transport(e) => e.transport_error(),
            _ => None,
        }
    }

    /// Whether the error came from the verification service rather than the card
    pub const fn is_service_error(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Server { .. } | Self::MalformedResponse { .. }
        )
    }
}
