//! Command templates for the on-card side of the authentication
//!
//! The first authentication command depends on the device family and is
//! looked up in [`AUTH_TEMPLATES`]. Selection, UID read and the second
//! authentication step are shared by every family.

use bytes::Bytes;
use chipscan_apdu_core::Command;

use crate::registry::DeviceFamily;

/// Header and fixed data of a family's first authentication command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthTemplate {
    /// Class byte
    pub cla: u8,
    /// Instruction byte
    pub ins: u8,
    /// Parameter 1
    pub p1: u8,
    /// Parameter 2
    pub p2: u8,
    /// Fixed command data, if any
    pub data: Option<&'static [u8]>,
}

impl AuthTemplate {
    /// Spark 2: native AuthenticateEV2First with key number 2
    pub const SPARK2: Self = Self {
        cla: 0x90,
        ins: 0x71,
        p1: 0x00,
        p2: 0x00,
        data: Some(&[0x02, 0x00]),
    };

    /// Apex: authentication applet challenge
    pub const APEX: Self = Self {
        cla: 0x00,
        ins: 0xA9,
        p1: 0xA3,
        p2: 0x00,
        data: None,
    };

    /// Template registered for `family`
    pub fn for_family(family: DeviceFamily) -> Option<&'static Self> {
        AUTH_TEMPLATES
            .iter()
            .find(|(f, _)| *f == family)
            .map(|(_, template)| template)
    }

    /// First authentication command, always expecting response data
    pub fn first_auth(&self) -> Command {
        let command = Command::new_with_le(self.cla, self.ins, self.p1, self.p2, 0x00);
        match self.data {
            Some(data) => command.with_data(Bytes::from_static(data)),
            None => command,
        }
    }
}

/// First authentication template per device family
pub const AUTH_TEMPLATES: &[(DeviceFamily, AuthTemplate)] = &[
    (DeviceFamily::Spark2, AuthTemplate::SPARK2),
    (DeviceFamily::Apex, AuthTemplate::APEX),
];

/// SELECT by AID, first or only occurrence, no response data
pub fn select(aid: &[u8]) -> Command {
    Command::new_with_data(0x00, 0xA4, 0x04, 0x0C, Bytes::copy_from_slice(aid))
}

/// Reader pseudo-APDU returning the card UID
pub const fn get_uid() -> Command {
    Command::new_with_le(0xFF, 0xCA, 0x00, 0x00, 0x00)
}

/// Second authentication step carrying the server-computed response
pub fn second_auth(pcd_response: &[u8]) -> Command {
    Command::new_with_data_and_le(
        0x90,
        0xAF,
        0x00,
        0x00,
        Bytes::copy_from_slice(pcd_response),
        0x00,
    )
}
