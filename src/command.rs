//! Run control messages understood by the acquisition software.

use std::str::FromStr;

use crate::Error;

/// Trailer closing every message; spells `AERA` in little-endian byte order.
pub const TRAILER: [u16; 2] = [0x4541, 0x4152];

const MESSAGE_LENGTH: u16 = 4;
const MESSAGE_TYPE: u16 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum RunCommand {
    /// Load the configuration into the detector units.
    Initialize = 402,
    Start = 403,
    Stop = 404,
}

impl RunCommand {
    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn payload(self) -> [u16; 5] {
        [MESSAGE_LENGTH, MESSAGE_TYPE, self.code(), TRAILER[0], TRAILER[1]]
    }

    /// The payload as sent on the wire, in host byte order.
    pub fn to_bytes(self) -> [u8; 10] {
        bytemuck::cast(self.payload())
    }
}

impl FromStr for RunCommand {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "init" | "initialize" => Ok(RunCommand::Initialize),
            "start" => Ok(RunCommand::Start),
            "stop" => Ok(RunCommand::Stop),
            _ => Err(Error::UnknownCommand(name.to_owned())),
        }
    }
}
