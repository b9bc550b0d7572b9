//! PC/SC transport implementation for APDU exchanges
//!
//! This crate provides an implementation of the `CardTransport` and
//! `CardTransportFactory` traits from `chipscan-apdu-core` using the PC/SC API
//! for communication with contactless readers, plus a blocking monitor for card
//! insertion and removal events.
//!
//! # Examples
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use chipscan_apdu_core::prelude::*;
//! use chipscan_apdu_transport_pcsc::PcscDeviceManager;
//!
//! let manager = PcscDeviceManager::new()?;
//!
//! let readers = manager.list_readers()?;
//! let reader = &readers[0];
//! println!("Connecting to reader: {}", reader.name());
//!
//! let transport = manager.open_reader(reader.name())?;
//! let mut executor = CardExecutor::new(transport);
//!
//! // GET DATA (UID) through the reader's pseudo-APDU
//! let response = executor.transmit(&Command::new_with_le(0xFF, 0xCA, 0x00, 0x00, 0x00))?;
//! println!("UID: {:02X?}", response.payload());
//! # Ok(())
//! # }
//! ```
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![warn(missing_docs)]

mod config;
mod error;
mod event;
mod manager;
mod monitor;
mod reader;
mod transport;

pub use config::{PcscConfig, ShareMode};
pub use error::PcscError;
pub use event::CardEvent;
pub use manager::PcscDeviceManager;
pub use monitor::PcscMonitor;
pub use reader::PcscReader;
pub use transport::PcscTransport;

// Re-export some pcsc types for convenience
pub use pcsc::{Protocol, Protocols};
