//! Configuration options for PC/SC transport

use pcsc::{Protocols as PcscProtocols, ShareMode as PcscShareMode};

/// Sharing mode for card connections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShareMode {
    /// Exclusive access to the card
    Exclusive,
    /// Shared access to the card (default)
    #[default]
    Shared,
    /// Direct connection to the reader
    Direct,
}

impl From<ShareMode> for PcscShareMode {
    fn from(mode: ShareMode) -> Self {
        match mode {
            ShareMode::Exclusive => Self::Exclusive,
            ShareMode::Shared => Self::Shared,
            ShareMode::Direct => Self::Direct,
        }
    }
}

/// Configuration options for PC/SC transport
#[derive(Debug, Clone)]
pub struct PcscConfig {
    /// Sharing mode for card connections
    pub share_mode: ShareMode,

    /// Preferred protocols for card communication
    pub protocols: PcscProtocols,
}

impl Default for PcscConfig {
    fn default() -> Self {
        Self {
            share_mode: ShareMode::Shared,
            protocols: PcscProtocols::ANY,
        }
    }
}

impl PcscConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sharing mode
    pub const fn with_share_mode(mut self, mode: ShareMode) -> Self {
        self.share_mode = mode;
        self
    }

    /// Set the preferred protocols
    pub const fn with_protocols(mut self, protocols: PcscProtocols) -> Self {
        self.protocols = protocols;
        self
    }
}
