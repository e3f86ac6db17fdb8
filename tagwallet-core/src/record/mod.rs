// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tag Records
//!
//! A [`TagRecord`] is the flat memory image of an NTAG215 tag as read page
//! by page. It is immutable: patching produces a new record.
//!
//! ```text
//! 0..9      UID (7-byte ISO UID + 2 check bytes)
//! 10..12    static lock bytes
//! 12..16    capability container
//! 16        format marker (0xA5)
//! 17..19    write counter (big endian)
//! 20..52    encrypted payload, part 1
//! 52..84    tag HMAC over 0..8 || 84..128
//! 84..92    head / tail identifier
//! 96..128   keygen salt
//! 128..160  data HMAC over 17..52 || 160..520 || 52..84 || 0..8 || 84..128
//! 160..520  encrypted payload, part 2
//! 520..     configuration pages, originality signature (opaque)
//! ```

mod error;
pub mod patch;
mod uid;

use std::fmt;

use ring::digest;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use error::RecordError;
pub use patch::{
    compute_data_hmac, compute_tag_hmac, decrypt, patch, random_salt, verify, PatchOptions,
    SignatureCheck,
};
pub use uid::{password, Uid, PASSWORD_SIZE, UID_SIZE};

/// Size of the keygen salt.
pub const SALT_SIZE: usize = 32;

/// Size of one tag page.
pub const PAGE_SIZE: usize = 4;

/// Byte offsets inside a tag image.
pub mod layout {
    use std::ops::Range;

    pub const UID: Range<usize> = 0..9;
    /// The part of the UID that feeds key derivation and the HMACs.
    pub const UID_PREFIX: Range<usize> = 0..8;
    pub const STATIC_LOCK: Range<usize> = 10..12;
    pub const CAPABILITY_CONTAINER: Range<usize> = 12..16;
    pub const FORMAT_MARKER: usize = 16;
    pub const WRITE_COUNTER: Range<usize> = 17..19;
    pub const PAYLOAD_HEAD: Range<usize> = 20..52;
    pub const TAG_HMAC: Range<usize> = 52..84;
    pub const HEAD: Range<usize> = 84..88;
    pub const TAIL: Range<usize> = 88..92;
    /// Head, tail and the four bytes after them; fixed for a character.
    pub const IDENTIFIER_BLOCK: Range<usize> = 84..96;
    /// Identifier block and salt; covered by both HMACs.
    pub const TAG_INFO: Range<usize> = 84..128;
    pub const SALT: Range<usize> = 96..128;
    pub const DATA_HMAC: Range<usize> = 128..160;
    pub const PAYLOAD_TAIL: Range<usize> = 160..520;
    /// Write counter plus the first payload part, as covered by the data HMAC.
    pub const DATA_HEAD: Range<usize> = 17..52;

    /// Total payload size: 32 + 360 bytes.
    pub const PAYLOAD_SIZE: usize = 392;

    pub const FORMAT_MARKER_VALUE: u8 = 0xA5;
    pub const CAPABILITY_CONTAINER_VALUE: [u8; 4] = [0xF1, 0x10, 0xFF, 0xEE];
}

/// Supported tag image sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    /// Pages 0..133 only.
    Ntag532,
    /// Full 135-page NTAG215 image.
    Ntag540,
    /// Full image followed by a 32-byte originality signature.
    Ntag572,
}

impl RecordFormat {
    pub fn from_len(len: usize) -> Option<Self> {
        match len {
            532 => Some(RecordFormat::Ntag532),
            540 => Some(RecordFormat::Ntag540),
            572 => Some(RecordFormat::Ntag572),
            _ => None,
        }
    }

    pub fn len(self) -> usize {
        match self {
            RecordFormat::Ntag532 => 532,
            RecordFormat::Ntag540 => 540,
            RecordFormat::Ntag572 => 572,
        }
    }
}

/// Immutable NTAG215 memory image.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TagRecord {
    data: Vec<u8>,
}

impl TagRecord {
    /// Wraps a buffer of exactly 532, 540 or 572 bytes.
    ///
    /// Other lengths are rejected; nothing is truncated or padded.
    pub fn new(data: Vec<u8>) -> Result<Self, RecordError> {
        if RecordFormat::from_len(data.len()).is_none() {
            return Err(RecordError::MalformedRecord(data.len()));
        }
        Ok(TagRecord { data })
    }

    pub fn from_slice(data: &[u8]) -> Result<Self, RecordError> {
        Self::new(data.to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn format(&self) -> RecordFormat {
        match RecordFormat::from_len(self.data.len()) {
            Some(format) => format,
            None => unreachable!("length validated at construction"),
        }
    }

    pub fn uid(&self) -> Uid {
        let mut bytes = [0u8; UID_SIZE];
        bytes.copy_from_slice(&self.data[layout::UID]);
        Uid::new(bytes)
    }

    /// Whether byte 16 carries the format marker that gates the write counter.
    pub fn has_format_marker(&self) -> bool {
        self.data[layout::FORMAT_MARKER] == layout::FORMAT_MARKER_VALUE
    }

    /// Write counter, or zero when the format marker is absent.
    pub fn write_counter(&self) -> u16 {
        if !self.has_format_marker() {
            return 0;
        }
        u16::from_be_bytes(self.write_counter_bytes())
    }

    /// Raw write counter bytes as fed into key derivation.
    pub fn write_counter_bytes(&self) -> [u8; 2] {
        [
            self.data[layout::WRITE_COUNTER.start],
            self.data[layout::WRITE_COUNTER.start + 1],
        ]
    }

    pub fn salt(&self) -> [u8; SALT_SIZE] {
        let mut salt = [0u8; SALT_SIZE];
        salt.copy_from_slice(&self.data[layout::SALT]);
        salt
    }

    pub fn tag_hmac(&self) -> &[u8] {
        &self.data[layout::TAG_HMAC]
    }

    pub fn data_hmac(&self) -> &[u8] {
        &self.data[layout::DATA_HMAC]
    }

    /// Hex of the 4-byte head identifier, used for catalog matching.
    pub fn head_hex(&self) -> String {
        hex::encode(&self.data[layout::HEAD])
    }

    /// Hex of the 4-byte tail identifier, used for catalog matching.
    pub fn tail_hex(&self) -> String {
        hex::encode(&self.data[layout::TAIL])
    }

    /// The two payload ranges concatenated, as stored.
    pub fn encrypted_payload(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(layout::PAYLOAD_SIZE);
        payload.extend_from_slice(&self.data[layout::PAYLOAD_HEAD]);
        payload.extend_from_slice(&self.data[layout::PAYLOAD_TAIL]);
        payload
    }

    /// Both static lock bytes are set.
    pub fn is_locked(&self) -> bool {
        let lock = &self.data[layout::STATIC_LOCK];
        lock[0] != 0 && lock[1] != 0
    }

    /// Carries the capability container and format marker of a signed record.
    pub fn is_signed_record(&self) -> bool {
        self.data[layout::CAPABILITY_CONTAINER] == layout::CAPABILITY_CONTAINER_VALUE
            && self.has_format_marker()
    }

    /// SHA-256 of the whole image, hex encoded.
    pub fn fingerprint(&self) -> String {
        hex::encode(digest::digest(&digest::SHA256, &self.data).as_ref())
    }

    /// Number of complete pages in the image.
    pub fn page_count(&self) -> usize {
        self.data.len() / PAGE_SIZE
    }

    /// The 4 bytes of page `n`.
    pub fn page(&self, n: usize) -> Option<[u8; PAGE_SIZE]> {
        let start = n.checked_mul(PAGE_SIZE)?;
        let bytes = self.data.get(start..start + PAGE_SIZE)?;
        let mut page = [0u8; PAGE_SIZE];
        page.copy_from_slice(bytes);
        Some(page)
    }

    /// Iterates over `(page number, bytes)`.
    pub fn pages(&self) -> impl Iterator<Item = (usize, &[u8])> {
        self.data.chunks(PAGE_SIZE).enumerate()
    }

    /// One line per page: `Page #n: b0 b1 b2 b3`.
    pub fn page_listing(&self) -> String {
        let mut out = String::with_capacity(self.page_count() * 24);
        for (n, bytes) in self.pages() {
            let hex: Vec<String> = bytes.iter().map(|b| format!("{:02X}", b)).collect();
            out.push_str(&format!("Page #{:3}: {}\n", n, hex.join(" ")));
        }
        out
    }
}

impl fmt::Debug for TagRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagRecord")
            .field("uid", &self.uid())
            .field("len", &self.data.len())
            .field("head", &self.head_hex())
            .field("tail", &self.tail_hex())
            .finish()
    }
}

impl TryFrom<Vec<u8>> for TagRecord {
    type Error = RecordError;

    fn try_from(data: Vec<u8>) -> Result<Self, Self::Error> {
        TagRecord::new(data)
    }
}

impl AsRef<[u8]> for TagRecord {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl Serialize for TagRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(&self.data))
    }
}

impl<'de> Deserialize<'de> for TagRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        TagRecord::new(bytes).map_err(serde::de::Error::custom)
    }
}
