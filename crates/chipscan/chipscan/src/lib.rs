//! Challenge-response authentication of NFC implants
//!
//! A [`Scanner`] identifies the implant on a reader by probing known
//! application identifiers, then relays a three-way challenge between the
//! card and a remote verification service and returns the service's verdict.
//!
//! ```no_run
//! # fn run<F: chipscan_apdu_core::CardTransportFactory>(factory: F) -> chipscan::Result<()> {
//! use chipscan::Scanner;
//!
//! let scanner = Scanner::new("my-api-key", "ACS ACR122U PICC Interface", factory)?;
//! let result = scanner.scan()?;
//! if result.recognized() {
//!     println!("{} ({})", result, result.device_family());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Scans are blocking and define no timeout of their own. Only one scan may
//! run against a reader at a time; see [`Scanner`].
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

pub mod auth;
pub mod codec;
pub mod error;
pub mod identify;
pub mod registry;
pub mod scanner;
pub mod verify;

pub use codec::{from_hex, reverse_byte_order, to_hex};
pub use error::{Error, HttpError, Result};
pub use identify::{Identified, TagIdentifier};
pub use registry::{DeviceEntry, DeviceFamily, DeviceRegistry};
pub use scanner::{ScanResult, ScanState, Scanner};
pub use verify::{
    ClientConfig, Endpoint, HttpClient, HttpReply, ReqwestHttpClient, Verdict,
    VerificationClient, VerificationService,
};
