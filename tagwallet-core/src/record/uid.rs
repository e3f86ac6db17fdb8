// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tag Identifier
//!
//! The 9-byte UID stored at the start of every tag image: the 7-byte
//! ISO 14443 UID interleaved with its two check bytes.

use std::fmt;

use super::RecordError;

/// Length of a full UID.
pub const UID_SIZE: usize = 9;

/// Length of the PWD_AUTH password.
pub const PASSWORD_SIZE: usize = 4;

/// Nine-byte tag identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Uid([u8; UID_SIZE]);

impl Uid {
    pub fn new(bytes: [u8; UID_SIZE]) -> Self {
        Uid(bytes)
    }

    /// Parses a UID from hex, ignoring spaces and colons.
    pub fn from_hex(s: &str) -> Result<Self, RecordError> {
        let cleaned: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != ':')
            .collect();
        let bytes = hex::decode(&cleaned).map_err(|_| RecordError::InvalidUid(cleaned.len() / 2))?;
        Uid::try_from(bytes.as_slice())
    }

    pub fn as_bytes(&self) -> &[u8; UID_SIZE] {
        &self.0
    }

    /// Password the tag expects before protected pages can be written.
    pub fn password(&self) -> [u8; PASSWORD_SIZE] {
        let u = &self.0;
        [
            0xAA ^ (u[1] ^ u[4]),
            0x55 ^ (u[2] ^ u[5]),
            0xAA ^ (u[4] ^ u[6]),
            0x55 ^ (u[5] ^ u[7]),
        ]
    }
}

impl TryFrom<&[u8]> for Uid {
    type Error = RecordError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; UID_SIZE] = bytes
            .try_into()
            .map_err(|_| RecordError::InvalidUid(bytes.len()))?;
        Ok(Uid(arr))
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(self.0))
    }
}

impl fmt::Debug for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uid({})", self)
    }
}

/// Computes the PWD_AUTH password for a raw UID.
///
/// Fails with [`RecordError::InvalidUid`] unless `uid` is exactly 9 bytes.
pub fn password(uid: &[u8]) -> Result<[u8; PASSWORD_SIZE], RecordError> {
    Ok(Uid::try_from(uid)?.password())
}
