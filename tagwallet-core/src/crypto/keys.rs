// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Master Keys
//!
//! An 80-byte master key holds everything needed to derive per-tag keys:
//!
//! ```text
//! 0..16   HMAC key
//! 16..30  type string
//! 30      reserved
//! 31      magic byte count (<= 16)
//! 32..48  magic bytes
//! 48..80  XOR pad
//! ```
//!
//! Two instances exist: the *static* key (signs the tag HMAC region) and
//! the *data* key (encrypts the payload and signs the data HMAC region).
//! Both use the same type and the same derivation.

use std::path::Path;

use ring::digest;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of a single master key in bytes.
pub const MASTER_KEY_SIZE: usize = 80;

/// Size of a combined key file (data key followed by static key).
pub const COMBINED_KEY_SIZE: usize = 2 * MASTER_KEY_SIZE;

/// Upper bound of the magic byte count field.
pub const MAX_MAGIC_BYTES: u8 = 16;

/// Master key errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("Invalid key material length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Magic byte count {0} exceeds 16")]
    MagicBytesTooLong(u8),

    #[error("Failed to read key file {path}: {message}")]
    Io { path: String, message: String },
}

/// Master key material from which per-tag keys are derived.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    hmac_key: [u8; 16],
    type_string: [u8; 14],
    reserved: u8,
    magic_bytes_len: u8,
    magic_bytes: [u8; 16],
    xor_pad: [u8; 32],
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Don't expose key bytes in debug output
        f.debug_struct("MasterKey")
            .field("type_string", &String::from_utf8_lossy(self.type_string()))
            .field("magic_bytes_len", &self.magic_bytes_len)
            .field("hmac_key", &"[REDACTED]")
            .finish()
    }
}

impl MasterKey {
    /// Parses an 80-byte master key.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != MASTER_KEY_SIZE {
            return Err(KeyError::InvalidLength {
                expected: MASTER_KEY_SIZE,
                actual: bytes.len(),
            });
        }
        let magic_bytes_len = bytes[31];
        if magic_bytes_len > MAX_MAGIC_BYTES {
            return Err(KeyError::MagicBytesTooLong(magic_bytes_len));
        }

        let mut key = MasterKey {
            hmac_key: [0; 16],
            type_string: [0; 14],
            reserved: bytes[30],
            magic_bytes_len,
            magic_bytes: [0; 16],
            xor_pad: [0; 32],
        };
        key.hmac_key.copy_from_slice(&bytes[0..16]);
        key.type_string.copy_from_slice(&bytes[16..30]);
        key.magic_bytes.copy_from_slice(&bytes[32..48]);
        key.xor_pad.copy_from_slice(&bytes[48..80]);
        Ok(key)
    }

    /// Serializes the key back to its 80-byte form.
    pub fn to_bytes(&self) -> [u8; MASTER_KEY_SIZE] {
        let mut out = [0u8; MASTER_KEY_SIZE];
        out[0..16].copy_from_slice(&self.hmac_key);
        out[16..30].copy_from_slice(&self.type_string);
        out[30] = self.reserved;
        out[31] = self.magic_bytes_len;
        out[32..48].copy_from_slice(&self.magic_bytes);
        out[48..80].copy_from_slice(&self.xor_pad);
        out
    }

    pub(crate) fn hmac_key(&self) -> &[u8; 16] {
        &self.hmac_key
    }

    /// The 14-byte type string (NUL padded).
    pub fn type_string(&self) -> &[u8] {
        &self.type_string
    }

    /// The significant magic bytes (`magic_bytes_len` of them).
    pub fn magic_bytes(&self) -> &[u8] {
        &self.magic_bytes[..self.magic_bytes_len as usize]
    }

    pub(crate) fn xor_pad(&self) -> &[u8; 32] {
        &self.xor_pad
    }

    /// SHA-256 of the serialized key, hex encoded.
    pub fn fingerprint(&self) -> String {
        let mut bytes = self.to_bytes();
        let hash = digest::digest(&digest::SHA256, &bytes);
        bytes.zeroize();
        hex::encode(hash.as_ref())
    }
}

/// The pair of master keys needed to patch a record.
#[derive(Clone, Debug)]
pub struct KeySet {
    /// Signs the tag HMAC region ("locked secret").
    pub static_key: MasterKey,
    /// Encrypts the payload and signs the data HMAC region ("unfixed infos").
    pub data_key: MasterKey,
}

impl KeySet {
    pub fn new(static_key: MasterKey, data_key: MasterKey) -> Self {
        KeySet {
            static_key,
            data_key,
        }
    }

    /// Parses a combined 160-byte key file: data key first, static key second.
    pub fn from_combined(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != COMBINED_KEY_SIZE {
            return Err(KeyError::InvalidLength {
                expected: COMBINED_KEY_SIZE,
                actual: bytes.len(),
            });
        }
        let data_key = MasterKey::from_bytes(&bytes[..MASTER_KEY_SIZE])?;
        let static_key = MasterKey::from_bytes(&bytes[MASTER_KEY_SIZE..])?;
        Ok(KeySet::new(static_key, data_key))
    }

    /// Parses two separate 80-byte keys.
    pub fn from_separate(data_key: &[u8], static_key: &[u8]) -> Result<Self, KeyError> {
        Ok(KeySet::new(
            MasterKey::from_bytes(static_key)?,
            MasterKey::from_bytes(data_key)?,
        ))
    }

    /// Loads a combined key file from disk.
    pub fn load_combined(path: impl AsRef<Path>) -> Result<Self, KeyError> {
        let mut bytes = read_key_file(path.as_ref())?;
        let result = Self::from_combined(&bytes);
        bytes.zeroize();
        result
    }

    /// Loads the data key and static key from two files.
    pub fn load_separate(
        data_key_path: impl AsRef<Path>,
        static_key_path: impl AsRef<Path>,
    ) -> Result<Self, KeyError> {
        let mut data = read_key_file(data_key_path.as_ref())?;
        let mut stat = read_key_file(static_key_path.as_ref())?;
        let result = Self::from_separate(&data, &stat);
        data.zeroize();
        stat.zeroize();
        result
    }
}

fn read_key_file(path: &Path) -> Result<Vec<u8>, KeyError> {
    std::fs::read(path).map_err(|e| KeyError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

// INLINE_TEST_REQUIRED: Tests crate-private hmac_key and xor_pad accessors for field splitting
#[cfg(test)]
mod tests {
    use super::*;

    fn key_bytes(magic_len: u8) -> Vec<u8> {
        let mut bytes: Vec<u8> = (0..MASTER_KEY_SIZE as u8).collect();
        bytes[31] = magic_len;
        bytes
    }

    #[test]
    fn test_from_bytes_splits_fields() {
        let key = MasterKey::from_bytes(&key_bytes(14)).unwrap();
        assert_eq!(&key.hmac_key()[..], &(0u8..16).collect::<Vec<_>>()[..]);
        assert_eq!(key.type_string(), &(16u8..30).collect::<Vec<_>>()[..]);
        assert_eq!(key.magic_bytes(), &(32u8..46).collect::<Vec<_>>()[..]);
        assert_eq!(key.xor_pad()[0], 48);
        assert_eq!(key.xor_pad()[31], 79);
    }

    #[test]
    fn test_to_bytes_round_trips() {
        let bytes = key_bytes(16);
        let key = MasterKey::from_bytes(&bytes).unwrap();
        assert_eq!(key.to_bytes().to_vec(), bytes);
    }

    #[test]
    fn test_rejects_magic_count_over_16() {
        assert_eq!(
            MasterKey::from_bytes(&key_bytes(17)).unwrap_err(),
            KeyError::MagicBytesTooLong(17)
        );
    }

    #[test]
    fn test_debug_redacts_hmac_key() {
        let key = MasterKey::from_bytes(&key_bytes(14)).unwrap();
        let debug = format!("{:?}", key);
        assert!(debug.contains("REDACTED"));
    }
}
