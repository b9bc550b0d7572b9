//! Core error type for APDU operations
//!
//! Transport and response errors are kept in their own modules and bubble up
//! through this type, so callers only need to match on one enum.

use crate::response::error::ResponseError;
use crate::transport::error::TransportError;

/// Result type for APDU operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type that encompasses all possible errors in the crate
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport related errors
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Response related errors
    #[error(transparent)]
    Response(#[from] ResponseError),

    /// Command data does not fit in a short APDU
    #[error("Command data too long: {0} bytes (max {1})")]
    DataTooLong(usize, usize),

    /// Context error with message and source error
    #[error("{context}: {source}")]
    Context {
        /// Contextual message
        context: String,
        /// Source error
        source: Box<Self>,
    },
}

impl Error {
    /// Create a new error with context information
    pub fn with_context<S: Into<String>>(self, context: S) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The transport error at the root of this error, if any
    pub fn transport_error(&self) -> Option<&TransportError> {
        match self {
            Self::Transport(e) => Some(e),
            Self::Context { source, .. } => source.transport_error(),
            _ => None,
        }
    }
}

/// Extension trait for Result with APDU Errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context<S: Into<String>>(self, context: S) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context<S: Into<String>>(self, context: S) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_display() {
        let err: Result<()> = Err(TransportError::Transmission).context("Failed to read UID");
        let err = err.unwrap_err();
        assert_eq!(err.to_string(), "Failed to read UID: Failed to transmit data");
        assert!(matches!(
            err.transport_error(),
            Some(TransportError::Transmission)
        ));
    }
}
