//! Event types for PC/SC card monitoring

/// Events related to card insertion/removal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardEvent {
    /// Card was inserted into a reader
    Inserted {
        /// Reader name
        reader: String,
        /// ATR of the inserted card
        atr: Vec<u8>,
    },
    /// Card was removed from a reader
    Removed {
        /// Reader name
        reader: String,
    },
}

impl CardEvent {
    /// Name of the reader the event happened on
    pub fn reader(&self) -> &str {
        match self {
            Self::Inserted { reader, .. } | Self::Removed { reader } => reader,
        }
    }
}
