//! Error types specific to card transport

/// Transport error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Connection error
    #[error("Failed to connect to device")]
    Connection,

    /// Transmission error
    #[error("Failed to transmit data")]
    Transmission,

    /// Reader not found
    #[error("Reader not found: {0}")]
    ReaderNotFound(String),

    /// No card present in the reader
    #[error("No card present in reader: {0}")]
    NoCard(String),

    /// Card was removed during the exchange
    #[error("Card was removed")]
    CardRemoved,

    /// Buffer too small
    #[error("Buffer too small")]
    BufferTooSmall,

    /// Driver error (with code)
    #[error("Driver error code: {0}")]
    Driver(i32),

    /// Other error with message
    #[error("{0}")]
    Other(String),
}
