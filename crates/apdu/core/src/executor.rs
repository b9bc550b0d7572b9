//! Card executor implementation
//!
//! This module provides the [`Executor`] trait and the [`CardExecutor`]
//! implementation, which wraps a card transport to exchange structured
//! [`Command`]s for [`Response`]s.

use std::fmt;

use bytes::Bytes;
use tracing::{debug, event_enabled, Level};

use crate::command::Command;
use crate::error::{Error, ResultExt};
use crate::response::Response;
use crate::transport::CardTransport;

/// Trait for exchanging APDU commands with a card
pub trait Executor {
    /// Send raw command bytes and return the raw response bytes
    fn transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, Error>;

    /// Send a command and parse the response into payload and status word
    ///
    /// The status word is not interpreted; callers decide which statuses
    /// are acceptable for the command they sent.
    fn transmit(&mut self, command: &Command) -> Result<Response, Error> {
        let command_bytes = command.to_bytes()?;
        let response_bytes = self.transmit_raw(&command_bytes)?;
        let response = Response::from_bytes(&response_bytes)
            .map_err(|e| Error::from(e).with_context("Failed to parse response bytes"))?;

        if event_enabled!(Level::DEBUG) {
            debug!(
                command = %command,
                status = %response.status(),
                description = response.status().description(),
                "APDU exchanged"
            );
        }

        Ok(response)
    }

    /// Reset the underlying connection
    fn reset(&mut self) -> Result<(), Error>;
}

/// Card executor owning a transport for its whole lifetime
///
/// The transport (and with it the reader session) is released when the
/// executor is dropped.
pub struct CardExecutor<T>
where
    T: CardTransport,
{
    /// The transport used for communication
    transport: T,
}

impl<T> fmt::Debug for CardExecutor<T>
where
    T: CardTransport,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardExecutor")
            .field("transport", &self.transport)
            .finish()
    }
}

impl<T> CardExecutor<T>
where
    T: CardTransport,
{
    /// Create a new card executor with the given transport
    pub const fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Get a reference to the transport
    pub const fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T> Executor for CardExecutor<T>
where
    T: CardTransport,
{
    fn transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, Error> {
        self.transport.transmit_raw(command).context("Transport error")
    }

    fn reset(&mut self) -> Result<(), Error> {
        self.transport.reset().context("Failed to reset transport")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use crate::{StatusWord, TransportError};

    #[test]
    fn test_executor_basic_transmit() {
        let transport = MockTransport::with_response(Bytes::from_static(&[0x90, 0x00]));
        let mut executor = CardExecutor::new(transport);

        let response = executor.transmit_raw(&[0x00, 0xA4, 0x04, 0x00]).unwrap();
        assert_eq!(response.as_ref(), &[0x90, 0x00]);
        assert_eq!(executor.transport().commands.len(), 1);
    }

    #[test]
    fn test_executor_transmit_command() {
        let transport = MockTransport::with_response(Bytes::from_static(&[0xAA, 0xBB, 0x91, 0xAF]));
        let mut executor = CardExecutor::new(transport);

        let command = Command::new_with_data_and_le(0x90, 0x71, 0x00, 0x00, vec![0x02, 0x00], 0x00);
        let response = executor.transmit(&command).unwrap();
        assert_eq!(response.payload().as_ref(), &[0xAA, 0xBB]);
        assert_eq!(response.status(), StatusWord::new(0x91, 0xAF));

        let sent = &executor.transport().commands[0];
        assert_eq!(sent.as_ref(), &[0x90, 0x71, 0x00, 0x00, 0x02, 0x02, 0x00, 0x00]);
    }

    #[test]
    fn test_executor_transport_failure() {
        let mut executor = CardExecutor::new(MockTransport::new(vec![]));
        let err = executor.transmit(&Command::new(0x00, 0xA4, 0x04, 0x00)).unwrap_err();
        assert_eq!(err.transport_error(), Some(&TransportError::Transmission));
    }

    #[test]
    fn test_executor_short_response() {
        let transport = MockTransport::with_response(Bytes::from_static(&[0x90]));
        let mut executor = CardExecutor::new(transport);
        let err = executor.transmit(&Command::new(0x00, 0xA4, 0x04, 0x00)).unwrap_err();
        assert!(matches!(err, Error::Context { .. }));
    }
}
