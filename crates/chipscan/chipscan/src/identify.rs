//! Tag identification by probing registered AIDs

use chipscan_apdu_core::response::status::common::{ADDITIONAL_FRAME, FILE_NOT_FOUND, SUCCESS};
use chipscan_apdu_core::{Executor, ResultExt};
use tracing::{debug, warn};

use crate::auth::{self, AuthTemplate};
use crate::codec::to_hex;
use crate::error::Result;
use crate::registry::{DeviceEntry, DeviceFamily, DeviceRegistry};

/// A device that answered one of the registered AIDs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identified {
    /// Family of the matching entry
    pub family: DeviceFamily,
    /// Device-originated challenge, hex encoded
    pub pcd_challenge: String,
}

/// Identifies a card against a [`DeviceRegistry`]
#[derive(Debug, Clone, Copy)]
pub struct TagIdentifier<'a> {
    registry: &'a DeviceRegistry,
}

impl<'a> TagIdentifier<'a> {
    /// Create an identifier over `registry`
    pub const fn new(registry: &'a DeviceRegistry) -> Self {
        Self { registry }
    }

    /// Select each AID in registry order and return the first entry that answers
    ///
    /// `90 00` and `90 AF` count as a match. Any other status, or a failure
    /// while exchanging a single SELECT, moves on to the next entry.
    pub fn select_device<E: Executor>(&self, executor: &mut E) -> Option<&'a DeviceEntry> {
        for entry in self.registry {
            let aid = to_hex(entry.aid());
            match executor.transmit(&auth::select(entry.aid())) {
                Ok(response) => {
                    let status = response.status();
                    if status == SUCCESS || status == ADDITIONAL_FRAME {
                        debug!(aid = %aid, family = %entry.family(), "AID selected");
                        return Some(entry);
                    }
                    if status == FILE_NOT_FOUND {
                        debug!(aid = %aid, "AID not present");
                    } else {
                        debug!(aid = %aid, status = %status, "AID rejected");
                    }
                }
                Err(e) => warn!(aid = %aid, error = %e, "SELECT failed, trying next AID"),
            }
        }
        None
    }

    /// Send the family's first authentication command and return the card challenge as hex
    ///
    /// The status word is family specific and only logged. Transport failures
    /// are returned to the caller.
    pub fn first_authentication<E: Executor>(
        &self,
        executor: &mut E,
        family: DeviceFamily,
    ) -> Result<Option<String>> {
        let Some(template) = AuthTemplate::for_family(family) else {
            return Ok(None);
        };

        let response = executor
            .transmit(&template.first_auth())
            .context("First authentication failed")?;
        debug!(family = %family, status = %response.status(), "First authentication answered");

        Ok(Some(to_hex(response.payload())))
    }

    /// Select the card's AID and, on a match, obtain the device challenge
    ///
    /// Returns `Ok(None)` when no registered AID answered.
    pub fn identify<E: Executor>(&self, executor: &mut E) -> Result<Option<Identified>> {
        let Some(entry) = self.select_device(executor) else {
            return Ok(None);
        };
        let family = entry.family();
        Ok(self
            .first_authentication(executor, family)?
            .map(|pcd_challenge| Identified {
                family,
                pcd_challenge,
            }))
    }
}
