//! Scan orchestration
//!
//! A scan walks a fixed sequence of states:
//!
//! ```text
//! Start -> ChallengeFetched -> UidRead -> TagIdentified -> NotRecognized
//!                                                        | DeviceChallengeObtained
//!                                                          -> DeviceResponseObtained
//!                                                          -> DeviceResponseSubmitted
//!                                                          -> ResultChecked
//! ```
//!
//! Every failure aborts the scan with an [`Error`]. An unrecognized device
//! ends the scan normally with [`ScanResult::recognized`] set to `false`.

use std::fmt;

use chipscan_apdu_core::command::MAX_SHORT_DATA_LEN;
use chipscan_apdu_core::{CardExecutor, CardTransportFactory, Executor, ResultExt};
use tracing::{debug, info, instrument};

use crate::auth;
use crate::codec::{from_hex, reverse_byte_order, to_hex};
use crate::error::{Error, Result};
use crate::identify::TagIdentifier;
use crate::registry::{DeviceFamily, DeviceRegistry};
use crate::verify::{ClientConfig, Endpoint, VerificationClient, VerificationService};

/// Protocol state of a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum ScanState {
    /// Nothing done yet
    #[default]
    Start,
    /// Server challenge received
    ChallengeFetched,
    /// Card UID read
    UidRead,
    /// Registry of known devices
    TagIdentified,
    /// No registered AID answered (terminal)
    NotRecognized,
    /// Card challenge received
    DeviceChallengeObtained,
    /// Server response to the card challenge received
    DeviceResponseObtained,
    /// Server response passed to the card
    DeviceResponseSubmitted,
    /// Verdict received (terminal)
    ResultChecked,
}

/// Working state of one scan
///
/// Created empty at the start of every scan and dropped when it ends.
#[derive(Debug, Default)]
struct ScanSession {
    state: ScanState,
    uid: String,
    picc_challenge: String,
    pcd_challenge: String,
    pcd_response: String,
    picc_response: String,
    device_family: DeviceFamily,
}

impl ScanSession {
    fn advance(&mut self, next: ScanState) {
        debug_assert!(next > self.state, "scan state moved from {:?} to {next:?}", self.state);
        debug!(from = ?self.state, to = ?next, "Scan state");
        self.state = next;
    }
}

/// Outcome of a completed scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    recognized: bool,
    verdict: String,
    result_data: String,
    device_family: DeviceFamily,
    uid: String,
}

impl ScanResult {
    fn unrecognized(uid: String) -> Self {
        Self {
            recognized: false,
            verdict: String::new(),
            result_data: String::new(),
            device_family: DeviceFamily::Unrecognized,
            uid,
        }
    }

    /// Whether a registered AID answered and the protocol ran to completion
    pub const fn recognized(&self) -> bool {
        self.recognized
    }

    /// The service's `check-result`, only for recognized devices
    pub fn verdict(&self) -> Option<&str> {
        self.recognized.then_some(self.verdict.as_str())
    }

    /// The service's `result-data`, only for recognized devices
    pub fn result_data(&self) -> Option<&str> {
        self.recognized.then_some(self.result_data.as_str())
    }

    /// Family of the device
    pub const fn device_family(&self) -> DeviceFamily {
        self.device_family
    }

    /// Card UID, uppercase hex, most significant byte first
    pub fn uid(&self) -> &str {
        &self.uid
    }
}

impl fmt::Display for ScanResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.recognized {
            write!(f, "{}: {}", self.verdict, self.result_data)
        } else {
            f.write_str("not a recognized device")
        }
    }
}

/// Runs scans against one reader
///
/// `Scanner` holds no lock between scans. Callers must not start a scan on a
/// reader while another scan on the same reader is still running; a card
/// insertion handler should ignore insertions until the running scan returns.
pub struct Scanner<F, S = VerificationClient> {
    api_key: String,
    reader: String,
    factory: F,
    service: S,
    registry: DeviceRegistry,
}

impl<F, S> fmt::Debug for Scanner<F, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scanner")
            .field("reader", &self.reader)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl<F: CardTransportFactory> Scanner<F> {
    /// Create a scanner talking to the production verification service
    pub fn new(
        api_key: impl Into<String>,
        reader: impl Into<String>,
        factory: F,
    ) -> Result<Self> {
        let service = VerificationClient::new(&ClientConfig::default())?;
        Ok(Self::with_service(api_key, reader, factory, service))
    }
}

impl<F, S> Scanner<F, S>
where
    F: CardTransportFactory,
    S: VerificationService,
{
    /// Create a scanner with a custom verification service
    pub fn with_service(
        api_key: impl Into<String>,
        reader: impl Into<String>,
        factory: F,
        service: S,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            reader: reader.into(),
            factory,
            service,
            registry: DeviceRegistry::default(),
        }
    }

    /// Replace the device registry
    pub fn with_registry(mut self, registry: DeviceRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Reader this scanner opens
    pub fn reader(&self) -> &str {
        &self.reader
    }

    /// Device registry used for identification
    pub const fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Verification service used by this scanner
    pub const fn service(&self) -> &S {
        &self.service
    }

    /// Transport factory used by this scanner
    pub const fn factory(&self) -> &F {
        &self.factory
    }

    /// Run one scan of the card currently on the reader
    ///
    /// The reader is opened after the server challenge has been fetched and is
    /// released before the final verdict is requested, or on any earlier
    /// failure.
    #[instrument(skip(self), fields(reader = %self.reader), err)]
    pub fn scan(&self) -> Result<ScanResult> {
        let mut session = ScanSession::default();

        session.picc_challenge = self.service.fetch_challenge(&self.api_key)?;
        session.advance(ScanState::ChallengeFetched);

        let transport = self.factory.open(&self.reader)?;
        let mut executor = CardExecutor::new(transport);

        session.uid = read_uid(&mut executor)?;
        session.advance(ScanState::UidRead);

        let identifier = TagIdentifier::new(&self.registry);
        let family = identifier
            .select_device(&mut executor)
            .map_or(DeviceFamily::Unrecognized, |entry| entry.family());
        session.device_family = family;
        session.advance(ScanState::TagIdentified);

        let Some(pcd_challenge) = identifier.first_authentication(&mut executor, family)? else {
            session.advance(ScanState::NotRecognized);
            info!(uid = %session.uid, "Not a recognized device");
            return Ok(ScanResult::unrecognized(session.uid));
        };
        session.pcd_challenge = pcd_challenge;
        session.advance(ScanState::DeviceChallengeObtained);

        session.pcd_response = self.service.submit_device_challenge(
            &session.uid,
            &session.picc_challenge,
            &session.pcd_challenge,
        )?;
        session.advance(ScanState::DeviceResponseObtained);

        let pcd_response = from_hex(&session.pcd_response)?;
        if pcd_response.len() > MAX_SHORT_DATA_LEN {
            return Err(Error::MalformedResponse {
                endpoint: Endpoint::PcdChallenge,
                field: "pcd-response",
            });
        }
        let response = executor
            .transmit(&auth::second_auth(&pcd_response))
            .context("Second authentication failed")?;
        debug!(status = %response.status(), "Second authentication answered");
        session.picc_response = to_hex(response.payload());
        session.advance(ScanState::DeviceResponseSubmitted);
        drop(executor);

        let verdict = self.service.check_result(
            &session.uid,
            &session.picc_challenge,
            &session.picc_response,
        )?;
        session.advance(ScanState::ResultChecked);

        info!(
            uid = %session.uid,
            family = %session.device_family,
            verdict = %verdict.check_result,
            "Scan complete"
        );

        Ok(ScanResult {
            recognized: true,
            verdict: verdict.check_result,
            result_data: verdict.result_data,
            device_family: session.device_family,
            uid: session.uid,
        })
    }
}

/// Read the UID and return it as canonical hex
fn read_uid<E: Executor>(executor: &mut E) -> Result<String> {
    let response = executor
        .transmit(&auth::get_uid())
        .context("Failed to read UID")?;
    if !response.is_success() {
        return Err(Error::Status {
            command: "GET DATA",
            status: response.status(),
        });
    }
    Ok(to_hex(reverse_byte_order(response.payload())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcomes_render_differently() {
        let unrecognized = ScanResult::unrecognized("04A1".to_string());
        assert_eq!(unrecognized.to_string(), "not a recognized device");
        assert_eq!(unrecognized.verdict(), None);
        assert_eq!(unrecognized.result_data(), None);

        let recognized = ScanResult {
            recognized: true,
            verdict: "pass".to_string(),
            result_data: "member".to_string(),
            device_family: DeviceFamily::Apex,
            uid: "04A1".to_string(),
        };
        assert_eq!(recognized.to_string(), "pass: member");
        assert_eq!(recognized.verdict(), Some("pass"));
    }

    #[test]
    fn test_states_are_ordered() {
        assert!(ScanState::Start < ScanState::ChallengeFetched);
        assert!(ScanState::TagIdentified < ScanState::NotRecognized);
        assert!(ScanState::NotRecognized < ScanState::DeviceChallengeObtained);
        assert!(ScanState::DeviceResponseSubmitted < ScanState::ResultChecked);
    }
}
