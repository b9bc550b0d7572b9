//! Error types for PC/SC transport

use chipscan_apdu_core::TransportError;

/// PC/SC-specific errors
#[derive(Debug, thiserror::Error)]
pub enum PcscError {
    /// PC/SC error
    #[error("PC/SC error: {0}")]
    Pcsc(#[from] pcsc::Error),

    /// No readers available
    #[error("No readers available")]
    NoReadersAvailable,

    /// Reader not found
    #[error("Reader not found: {0}")]
    ReaderNotFound(String),

    /// No card present in reader
    #[error("No card present in reader: {0}")]
    NoCard(String),
}

impl From<PcscError> for TransportError {
    fn from(error: PcscError) -> Self {
        match error {
            PcscError::Pcsc(pcsc::Error::NoSmartcard) => Self::NoCard(String::new()),
            PcscError::Pcsc(pcsc::Error::RemovedCard) => Self::CardRemoved,
            PcscError::Pcsc(pcsc::Error::ResetCard) => Self::Transmission,
            PcscError::Pcsc(pcsc::Error::InsufficientBuffer) => Self::BufferTooSmall,
            PcscError::Pcsc(pcsc::Error::UnknownReader) => Self::ReaderNotFound(String::new()),
            PcscError::Pcsc(e) => Self::Driver(e as i32),
            PcscError::NoReadersAvailable => Self::Connection,
            PcscError::ReaderNotFound(reader) => Self::ReaderNotFound(reader),
            PcscError::NoCard(reader) => Self::NoCard(reader),
        }
    }
}
