//! APDU command definitions
//!
//! This module provides the short APDU command structure according to
//! ISO/IEC 7816-4. Which of the optional `data` and `le` fields are present
//! determines the ISO case of the command.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use crate::Error;

/// Maximum command data length for a short APDU
pub const MAX_SHORT_DATA_LEN: usize = 255;

/// ISO7816 command case, derived from the presence of command data and Le
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsoCase {
    /// No command data, no response data expected
    Case1,
    /// No command data, response data expected
    Case2,
    /// Command data, no response data expected
    Case3,
    /// Command data and response data expected
    Case4,
}

/// Generic APDU command structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Command class byte
    pub cla: u8,
    /// Instruction byte
    pub ins: u8,
    /// Parameter 1
    pub p1: u8,
    /// Parameter 2
    pub p2: u8,
    /// Command data (optional)
    pub data: Option<Bytes>,
    /// Expected length (optional, `0x00` means "as much as available")
    pub le: Option<u8>,
}

impl Command {
    /// Create a new command with just the header bytes
    pub const fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: None,
            le: None,
        }
    }

    /// Create a new command with expected response length (Le)
    pub const fn new_with_le(cla: u8, ins: u8, p1: u8, p2: u8, le: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: None,
            le: Some(le),
        }
    }

    /// Create a new command with data payload
    pub fn new_with_data<T: Into<Bytes>>(cla: u8, ins: u8, p1: u8, p2: u8, data: T) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: Some(data.into()),
            le: None,
        }
    }

    /// Create a new command with both data and expected length
    pub fn new_with_data_and_le<T: Into<Bytes>>(
        cla: u8,
        ins: u8,
        p1: u8,
        p2: u8,
        data: T,
        le: u8,
    ) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: Some(data.into()),
            le: Some(le),
        }
    }

    /// Set the data field
    pub fn with_data<T: Into<Bytes>>(mut self, data: T) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Set the expected length field
    pub const fn with_le(mut self, le: u8) -> Self {
        self.le = Some(le);
        self
    }

    /// Command data as sent on the wire; an empty data field has no Lc
    fn command_data(&self) -> Option<&Bytes> {
        self.data.as_ref().filter(|data| !data.is_empty())
    }

    /// ISO7816 case of this command
    pub fn case(&self) -> IsoCase {
        match (self.command_data().is_some(), self.le.is_some()) {
            (false, false) => IsoCase::Case1,
            (false, true) => IsoCase::Case2,
            (true, false) => IsoCase::Case3,
            (true, true) => IsoCase::Case4,
        }
    }

    /// Calculate length of serialized command
    pub fn command_length(&self) -> usize {
        // Header (CLA, INS, P1, P2) is always 4 bytes
        let mut length = 4;
        if let Some(data) = self.command_data() {
            length += 1 + data.len();
        }
        if self.le.is_some() {
            length += 1;
        }
        length
    }

    /// Convert to raw short APDU bytes
    ///
    /// Fails if the command data does not fit in a short APDU.
    pub fn to_bytes(&self) -> Result<Bytes, Error> {
        let mut buffer = BytesMut::with_capacity(self.command_length());

        buffer.put_u8(self.cla);
        buffer.put_u8(self.ins);
        buffer.put_u8(self.p1);
        buffer.put_u8(self.p2);

        if let Some(data) = self.command_data() {
            let lc = u8::try_from(data.len())
                .map_err(|_| Error::DataTooLong(data.len(), MAX_SHORT_DATA_LEN))?;
            buffer.put_u8(lc);
            buffer.put_slice(data);
        }

        if let Some(le) = self.le {
            buffer.put_u8(le);
        }

        Ok(buffer.freeze())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CLA={:02X} INS={:02X} P1={:02X} P2={:02X}",
            self.cla, self.ins, self.p1, self.p2
        )?;
        if let Some(data) = self.command_data() {
            write!(f, " Lc={:02X} DATA={}", data.len(), hex::encode_upper(data))?;
        }
        if let Some(le) = self.le {
            write!(f, " Le={le:02X}")?;
        }
        Ok(())
    }
}
