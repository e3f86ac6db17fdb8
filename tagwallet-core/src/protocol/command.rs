// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tag Commands
//!
//! Wire encoding of the four NTAG21x commands used here and decoding of
//! their responses.

use std::fmt;

use super::error::ProtocolError;

pub const GET_VERSION: u8 = 0x60;
pub const FAST_READ: u8 = 0x3A;
pub const WRITE: u8 = 0xA2;
pub const PWD_AUTH: u8 = 0x1B;

/// PWD_AUTH response expected from a tag personalized by this crate.
pub const PACK_SENTINEL: [u8; 2] = [0x80, 0x80];

/// Length of a GET_VERSION response.
pub const VERSION_RESPONSE_SIZE: usize = 8;

const NTAG215_PRODUCT_TYPE: u8 = 0x04;
const NTAG215_STORAGE_SIZE: u8 = 0x11;

/// A single device command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    GetVersion,
    /// Reads pages `start..=end`.
    FastRead { start: u8, end: u8 },
    Write { page: u8, data: [u8; 4] },
    PwdAuth { password: [u8; 4] },
}

impl Command {
    /// Encodes the command into the bytes sent to the tag.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Command::GetVersion => vec![GET_VERSION],
            Command::FastRead { start, end } => vec![FAST_READ, *start, *end],
            Command::Write { page, data } => {
                let mut bytes = Vec::with_capacity(6);
                bytes.push(WRITE);
                bytes.push(*page);
                bytes.extend_from_slice(data);
                bytes
            }
            Command::PwdAuth { password } => {
                let mut bytes = Vec::with_capacity(5);
                bytes.push(PWD_AUTH);
                bytes.extend_from_slice(password);
                bytes
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::GetVersion => "GET_VERSION",
            Command::FastRead { .. } => "FAST_READ",
            Command::Write { .. } => "WRITE",
            Command::PwdAuth { .. } => "PWD_AUTH",
        }
    }
}

/// Decoded GET_VERSION response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionInfo {
    pub header: u8,
    pub vendor_id: u8,
    pub product_type: u8,
    pub product_subtype: u8,
    pub major_version: u8,
    pub minor_version: u8,
    pub storage_size: u8,
    pub protocol_type: u8,
}

impl VersionInfo {
    /// Decodes an 8-byte GET_VERSION response.
    pub fn parse(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() != VERSION_RESPONSE_SIZE {
            return Err(ProtocolError::UnexpectedResponse {
                command: Command::GetVersion.name(),
                expected: VERSION_RESPONSE_SIZE,
                actual: bytes.len(),
            });
        }
        Ok(VersionInfo {
            header: bytes[0],
            vendor_id: bytes[1],
            product_type: bytes[2],
            product_subtype: bytes[3],
            major_version: bytes[4],
            minor_version: bytes[5],
            storage_size: bytes[6],
            protocol_type: bytes[7],
        })
    }

    pub fn is_ntag215(&self) -> bool {
        self.product_type == NTAG215_PRODUCT_TYPE && self.storage_size == NTAG215_STORAGE_SIZE
    }
}

/// WRITE acknowledgement reported by the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteAck {
    Ack,
    InvalidArgument,
    CrcError,
    InvalidAuthentication,
    EepromWriteError,
    Unknown(u8),
}

impl WriteAck {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0x0A => WriteAck::Ack,
            0x00 => WriteAck::InvalidArgument,
            0x01 => WriteAck::CrcError,
            0x04 => WriteAck::InvalidAuthentication,
            0x05 => WriteAck::EepromWriteError,
            other => WriteAck::Unknown(other),
        }
    }

    pub fn is_ack(&self) -> bool {
        matches!(self, WriteAck::Ack)
    }
}

impl fmt::Display for WriteAck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteAck::Ack => write!(f, "acknowledged"),
            WriteAck::InvalidArgument => write!(f, "invalid argument"),
            WriteAck::CrcError => write!(f, "CRC error"),
            WriteAck::InvalidAuthentication => write!(f, "invalid authentication"),
            WriteAck::EepromWriteError => write!(f, "EEPROM write error"),
            WriteAck::Unknown(code) => write!(f, "unknown error (0x{:02X})", code),
        }
    }
}

/// Result of a PWD_AUTH exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// The tag answered with the expected PACK.
    Unlocked { pack: [u8; 2] },
    /// Any other answer: nothing protected to unlock.
    NotUnlocked { response: Vec<u8> },
}

impl AuthOutcome {
    pub fn from_response(response: Vec<u8>) -> Self {
        if response.as_slice() == PACK_SENTINEL {
            AuthOutcome::Unlocked {
                pack: PACK_SENTINEL,
            }
        } else {
            AuthOutcome::NotUnlocked { response }
        }
    }

    pub fn is_unlocked(&self) -> bool {
        matches!(self, AuthOutcome::Unlocked { .. })
    }
}
