//! Transport traits for APDU communication with cards
//!
//! This module provides abstractions for communicating with smart cards through
//! different transport mechanisms.

pub mod error;

use std::fmt;

use bytes::Bytes;
pub use error::TransportError;
use tracing::{debug, trace};

/// Trait for basic card transports
///
/// A transport is responsible for sending and receiving raw APDU bytes.
/// It has no knowledge of command structure or protocol details.
pub trait CardTransport: Send + Sync + fmt::Debug {
    /// Send raw APDU bytes to card and return response bytes
    fn transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        trace!(command = %hex::encode_upper(command), "Transmitting raw command");
        let result = self.do_transmit_raw(command);
        match &result {
            Ok(response) => {
                trace!(response = %hex::encode_upper(response), "Received raw response");
            }
            Err(e) => {
                debug!(error = %e, "Transport error during transmission");
            }
        }
        result
    }

    /// Internal implementation of transmit_raw
    /// This is the method that concrete implementations should override
    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError>;

    /// Check if the transport is connected to a physical card
    fn is_connected(&self) -> bool;

    /// Reset the transport connection
    fn reset(&mut self) -> Result<(), TransportError>;
}

impl<T: CardTransport + ?Sized> CardTransport for Box<T> {
    fn transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        (**self).transmit_raw(command)
    }

    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        (**self).do_transmit_raw(command)
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn reset(&mut self) -> Result<(), TransportError> {
        (**self).reset()
    }
}

/// Opens card transports for a named reader
///
/// A factory is the "card transport" capability handed to protocol engines:
/// each call to [`open`](Self::open) acquires a fresh session with the
/// reader, which is released when the returned transport is dropped.
pub trait CardTransportFactory {
    /// Transport type produced by this factory
    type Transport: CardTransport;

    /// Open a transport to the card in the given reader
    fn open(&self, reader: &str) -> Result<Self::Transport, TransportError>;
}

impl<F, T> CardTransportFactory for F
where
    F: Fn(&str) -> Result<T, TransportError>,
    T: CardTransport,
{
    type Transport = T;

    fn open(&self, reader: &str) -> Result<T, TransportError> {
        self(reader)
    }
}

#[cfg(test)]
pub(crate) use mock::MockTransport;

#[cfg(test)]
mod mock {
    use super::*;

    /// Mock transport for testing
    #[derive(Debug, Clone)]
    pub(crate) struct MockTransport {
        /// Mock responses to return
        pub(crate) responses: Vec<Bytes>,
        /// Commands that were sent
        pub(crate) commands: Vec<Bytes>,
        /// Whether the transport is connected
        pub(crate) connected: bool,
    }

    impl MockTransport {
        /// Create a new mock transport with the given responses
        pub(crate) const fn new(responses: Vec<Bytes>) -> Self {
            Self {
                responses,
                commands: Vec::new(),
                connected: true,
            }
        }

        /// Create a new mock transport that always returns the given response
        pub(crate) fn with_response(response: Bytes) -> Self {
            Self::new(vec![response])
        }
    }

    impl CardTransport for MockTransport {
        fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
            if !self.connected {
                return Err(TransportError::Connection);
            }

            self.commands.push(Bytes::copy_from_slice(command));

            if self.responses.is_empty() {
                return Err(TransportError::Transmission);
            }

            // Either clone the single response or take the next one
            if self.responses.len() == 1 {
                Ok(self.responses[0].clone())
            } else {
                Ok(self.responses.remove(0))
            }
        }

        fn is_connected(&self) -> bool {
            self.connected
        }

        fn reset(&mut self) -> Result<(), TransportError> {
            self.connected = true;
            self.commands.clear();
            Ok(())
        }
    }
}
