//! Error types specific to APDU responses

/// Error for APDU response processing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResponseError {
    /// Incomplete response (less than 2 bytes)
    #[error("Incomplete response: {0} bytes")]
    Incomplete(usize),
}
