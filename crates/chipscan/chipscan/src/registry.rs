//! Known device families and the application identifiers that select them

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum AID length allowed by ISO/IEC 7816-4
pub const MAX_AID_LEN: usize = 16;

/// Spark 2 application, current version
pub const SPARK2_AID: &[u8] = &[0xD2, 0x76, 0x00, 0x00, 0x85, 0x01, 0x01];
/// Spark 2 application, legacy version
pub const SPARK2_LEGACY_AID: &[u8] = &[0xD2, 0x76, 0x00, 0x00, 0x85, 0x01, 0x00];
/// Apex authentication applet
pub const APEX_AID: &[u8] = &[
    0xA0, 0x00, 0x00, 0x07, 0x47, 0x00, 0xCC, 0x68, 0xE8, 0x8C, 0x01,
];

/// Family of implant, which decides the on-card authentication command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceFamily {
    /// Spark 2 (DESFire-style authentication)
    Spark2,
    /// Apex (JavaCard applet)
    Apex,
    /// No registered application answered
    #[default]
    Unrecognized,
}

impl DeviceFamily {
    /// Lowercase name as used in configuration files
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Spark2 => "spark2",
            Self::Apex => "apex",
            Self::Unrecognized => "unrecognized",
        }
    }
}

impl fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DeviceFamily {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "spark2" => Ok(Self::Spark2),
            "apex" => Ok(Self::Apex),
            _ => Err(Error::InvalidRegistry(format!("unknown device family {s:?}"))),
        }
    }
}

/// One registry row: an AID and the family it identifies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEntry {
    family: DeviceFamily,
    aid: Bytes,
}

impl DeviceEntry {
    /// Create a new entry
    pub fn new(family: DeviceFamily, aid: impl Into<Bytes>) -> Self {
        Self {
            family,
            aid: aid.into(),
        }
    }

    /// Device family selected by this AID
    pub const fn family(&self) -> DeviceFamily {
        self.family
    }

    /// Application identifier bytes
    pub const fn aid(&self) -> &Bytes {
        &self.aid
    }
}

/// Ordered table of known AIDs
///
/// Entries are selected in order and the first match wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRegistry {
    entries: Vec<DeviceEntry>,
}

impl DeviceRegistry {
    /// Build a registry, rejecting empty, oversized or duplicate AIDs
    pub fn new(entries: Vec<DeviceEntry>) -> Result<Self> {
        let mut seen = HashSet::new();
        for entry in &entries {
            let aid_hex = hex::encode_upper(entry.aid());
            if entry.family == DeviceFamily::Unrecognized {
                return Err(Error::InvalidRegistry(format!(
                    "AID {aid_hex} has no device family"
                )));
            }
            if entry.aid.is_empty() || entry.aid.len() > MAX_AID_LEN {
                return Err(Error::InvalidRegistry(format!(
                    "AID {aid_hex:?} must be 1 to {MAX_AID_LEN} bytes"
                )));
            }
            if !seen.insert(entry.aid.clone()) {
                return Err(Error::InvalidRegistry(format!("duplicate AID {aid_hex}")));
            }
        }
        Ok(Self { entries })
    }

    /// Append entries after the existing ones, revalidating the whole table
    pub fn extended(self, extra: impl IntoIterator<Item = DeviceEntry>) -> Result<Self> {
        let mut entries = self.entries;
        entries.extend(extra);
        Self::new(entries)
    }

    /// Entries in selection order
    pub fn entries(&self) -> &[DeviceEntry] {
        &self.entries
    }

    /// Iterate entries in selection order
    pub fn iter(&self) -> std::slice::Iter<'_, DeviceEntry> {
        self.entries.iter()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Family registered for an exact AID
    pub fn lookup(&self, aid: &[u8]) -> Option<DeviceFamily> {
        self.entries
            .iter()
            .find(|entry| entry.aid.as_ref() == aid)
            .map(DeviceEntry::family)
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self {
            entries: vec![
                DeviceEntry::new(DeviceFamily::Spark2, Bytes::from_static(SPARK2_AID)),
                DeviceEntry::new(DeviceFamily::Spark2, Bytes::from_static(SPARK2_LEGACY_AID)),
                DeviceEntry::new(DeviceFamily::Apex, Bytes::from_static(APEX_AID)),
            ],
        }
    }
}

impl<'a> IntoIterator for &'a DeviceRegistry {
    type Item = &'a DeviceEntry;
    type IntoIter = std::slice::Iter<'a, DeviceEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
