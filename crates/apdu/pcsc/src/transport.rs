//! PC/SC transport implementation

use chipscan_apdu_core::{Bytes, CardTransport, TransportError};

use pcsc::{Card, Context, Disposition, MAX_BUFFER_SIZE};
use std::{ffi::CString, fmt};
use tracing::debug;

use crate::{config::PcscConfig, error::PcscError};

/// Transport implementation using PC/SC
pub struct PcscTransport {
    /// PC/SC context
    context: Context,
    /// Card connection, if established
    card: Option<Card>,
    /// Reader name
    reader_name: String,
    /// Configuration
    config: PcscConfig,
}

impl fmt::Debug for PcscTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PcscTransport")
            .field("reader_name", &self.reader_name)
            .field("has_card", &self.card.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl PcscTransport {
    /// Create a new PC/SC transport for the specified reader
    ///
    /// The card connection is attempted immediately; if no card is present
    /// yet, connecting is retried on the first transmission.
    pub(crate) fn new(context: Context, reader_name: &str, config: PcscConfig) -> Self {
        let mut transport = Self {
            context,
            card: None,
            reader_name: reader_name.to_string(),
            config,
        };

        if let Err(e) = transport.connect_card() {
            debug!(reader = %transport.reader_name, error = %e, "Deferred card connection");
        }

        transport
    }

    /// Try to connect to the card
    fn connect_card(&mut self) -> Result<(), PcscError> {
        if self.card.is_some() {
            return Ok(());
        }

        let reader_cstr = CString::new(self.reader_name.clone())
            .map_err(|_| PcscError::ReaderNotFound(self.reader_name.clone()))?;

        match self.context.connect(
            &reader_cstr,
            self.config.share_mode.into(),
            self.config.protocols,
        ) {
            Ok(card) => {
                self.card = Some(card);
                Ok(())
            }
            Err(pcsc::Error::NoSmartcard) => Err(PcscError::NoCard(self.reader_name.clone())),
            Err(pcsc::Error::UnknownReader) => {
                Err(PcscError::ReaderNotFound(self.reader_name.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Transmit a command to the card
    fn transmit_command(&mut self, command: &[u8]) -> Result<Bytes, PcscError> {
        self.connect_card()?;

        let card = match &mut self.card {
            Some(card) => card,
            None => return Err(PcscError::NoCard(self.reader_name.clone())),
        };

        let mut response_buffer = [0u8; MAX_BUFFER_SIZE];

        match card.transmit(command, &mut response_buffer) {
            Ok(response) => Ok(Bytes::copy_from_slice(response)),
            Err(e) => {
                // If card was reset or removed, clear our reference
                if matches!(e, pcsc::Error::ResetCard | pcsc::Error::RemovedCard) {
                    self.card = None;
                }
                Err(e.into())
            }
        }
    }
}

impl CardTransport for PcscTransport {
    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        self.transmit_command(command).map_err(TransportError::from)
    }

    fn is_connected(&self) -> bool {
        self.card.is_some()
    }

    fn reset(&mut self) -> Result<(), TransportError> {
        if let Some(card) = self.card.take() {
            if let Err((_, e)) = card.disconnect(Disposition::ResetCard) {
                debug!(error = %e, "Failed to reset card on disconnect");
            }
        }

        self.connect_card().map_err(Into::into)
    }
}

impl Drop for PcscTransport {
    fn drop(&mut self) {
        if let Some(card) = self.card.take() {
            if let Err((_, e)) = card.disconnect(Disposition::LeaveCard) {
                debug!(reader = %self.reader_name, error = %e, "Failed to disconnect card");
            }
        }
    }
}
