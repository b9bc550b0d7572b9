//! Device manager for PC/SC operations

use chipscan_apdu_core::{CardTransportFactory, TransportError};
use pcsc::{Context, Scope};

use crate::config::PcscConfig;
use crate::error::PcscError;
use crate::monitor::PcscMonitor;
use crate::reader::PcscReader;
use crate::transport::PcscTransport;

/// Manager for PC/SC device operations
#[allow(missing_debug_implementations)]
pub struct PcscDeviceManager {
    /// PC/SC context
    context: Context,
    /// Configuration applied to every opened transport
    config: PcscConfig,
}

impl PcscDeviceManager {
    /// Create a new PC/SC device manager
    pub fn new() -> Result<Self, PcscError> {
        Self::with_config(PcscConfig::default())
    }

    /// Create a new PC/SC device manager opening transports with the given configuration
    pub fn with_config(config: PcscConfig) -> Result<Self, PcscError> {
        let context = Context::establish(Scope::User)?;
        Ok(Self { context, config })
    }

    /// List all available card readers
    pub fn list_readers(&self) -> Result<Vec<PcscReader>, PcscError> {
        let readers = match self.context.list_readers_owned() {
            Ok(readers) => readers,
            Err(pcsc::Error::NoReadersAvailable) => return Err(PcscError::NoReadersAvailable),
            Err(e) => return Err(e.into()),
        };
        if readers.is_empty() {
            return Err(PcscError::NoReadersAvailable);
        }

        let mut result = Vec::with_capacity(readers.len());

        for reader_name in readers {
            let mut reader_states = vec![pcsc::ReaderState::new(
                reader_name.as_c_str(),
                pcsc::State::UNAWARE,
            )];

            match self.context.get_status_change(None, &mut reader_states) {
                Ok(()) => result.push(PcscReader::from_reader_state(&reader_states[0])),
                Err(_) => {
                    // If we can't get status, assume no card
                    result.push(PcscReader::new(
                        reader_name.to_string_lossy().into_owned(),
                        false,
                        None,
                    ));
                }
            }
        }

        Ok(result)
    }

    /// Find a reader by exact name
    pub fn find_reader(&self, reader_name: &str) -> Result<PcscReader, PcscError> {
        self.list_readers()?
            .into_iter()
            .find(|r| r.name() == reader_name)
            .ok_or_else(|| PcscError::ReaderNotFound(reader_name.to_string()))
    }

    /// Find the first reader with a card present
    pub fn find_reader_with_card(&self) -> Result<PcscReader, PcscError> {
        self.list_readers()?
            .into_iter()
            .find(PcscReader::has_card)
            .ok_or_else(|| PcscError::NoCard("any reader".to_string()))
    }

    /// Open a connection to a specific reader
    pub fn open_reader(&self, reader_name: &str) -> Result<PcscTransport, PcscError> {
        Ok(PcscTransport::new(
            self.context.clone(),
            reader_name,
            self.config.clone(),
        ))
    }

    /// Create a monitor for card events
    pub fn monitor(&self) -> PcscMonitor {
        PcscMonitor::new(self.context.clone())
    }
}

impl CardTransportFactory for PcscDeviceManager {
    type Transport = PcscTransport;

    fn open(&self, reader: &str) -> Result<PcscTransport, TransportError> {
        self.open_reader(reader).map_err(Into::into)
    }
}
