//! Core traits and types for APDU (Application Protocol Data Unit) exchanges
//!
//! This crate provides the foundational types and traits for talking to smart
//! cards and NFC tags with APDU commands and responses according to ISO/IEC 7816-4.
//!
//! ## Overview
//!
//! - [`Command`] builds short APDUs for the four ISO7816 cases
//! - [`Response`] splits raw response bytes into payload and [`StatusWord`]
//! - [`CardTransport`] is the raw byte channel to a card
//! - [`CardTransportFactory`] opens a transport for a named reader
//! - [`CardExecutor`] owns a transport for the duration of one session and
//!   exchanges [`Command`]s for [`Response`]s
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

// Re-export bytes for convenience
pub use bytes::{Bytes, BytesMut};

pub mod command;
pub mod error;
pub mod executor;
pub mod response;
pub mod transport;

pub use command::{Command, IsoCase};
pub use error::{Error, Result, ResultExt};
pub use executor::{CardExecutor, Executor};
pub use response::Response;
pub use response::error::ResponseError;
pub use response::status::StatusWord;
pub use transport::error::TransportError;
pub use transport::{CardTransport, CardTransportFactory};

/// Prelude module containing commonly used traits and types
pub mod prelude {
    pub use crate::{
        Bytes, BytesMut, CardExecutor, CardTransport, CardTransportFactory, Command, Error,
        Executor, IsoCase, Response, ResponseError, Result, StatusWord, TransportError,
        response::status::common as status,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::status::common as status;

    // Test the basic types are re-exported correctly
    #[test]
    fn test_reexports() {
        let cmd = Command::new(0x00, 0xA4, 0x04, 0x0C);
        assert_eq!(cmd.cla, 0x00);
        assert_eq!(cmd.ins, 0xA4);
        assert_eq!(cmd.p1, 0x04);
        assert_eq!(cmd.p2, 0x0C);

        let resp = Response::new(Bytes::from_static(&[0x01, 0x02, 0x03]), status::SUCCESS);
        assert!(resp.is_success());
        assert_eq!(resp.payload().as_ref(), &[0x01, 0x02, 0x03]);
        assert_eq!(resp.status(), StatusWord::new(0x90, 0x00));
    }
}
