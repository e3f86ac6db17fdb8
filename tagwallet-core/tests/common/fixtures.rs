// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Test Fixtures
//!
//! Synthetic master keys and tag images. The keys are not real retail
//! keys; they only exercise the same layout.

use tagwallet_core::crypto::{KeySet, MasterKey, MASTER_KEY_SIZE};
use tagwallet_core::record::{patch, PatchOptions, TagRecord};

/// UID with a known PWD_AUTH password of `DF 02 88 30`.
pub const SOURCE_UID: [u8; 9] = [0x04, 0xA1, 0xB2, 0xC3, 0xD4, 0xE5, 0xF6, 0x80, 0x00];

/// UID of the blank tag the fixtures write to.
pub const BLANK_UID: [u8; 9] = [0x04, 0x3C, 0x5A, 0x92, 0x7E, 0x11, 0x2B, 0x80, 0xCE];

pub const HEAD: [u8; 4] = [0x01, 0x00, 0x00, 0x00];
pub const TAIL: [u8; 4] = [0x00, 0x34, 0x01, 0x02];

/// 80 bytes of master key material derived from `seed`.
pub fn master_key_bytes(seed: u8, magic_len: u8) -> Vec<u8> {
    let mut bytes: Vec<u8> = (0..MASTER_KEY_SIZE)
        .map(|i| seed.wrapping_mul(31).wrapping_add(i as u8))
        .collect();
    bytes[16..30].copy_from_slice(b"unfixed infos\0");
    bytes[30] = 0;
    bytes[31] = magic_len;
    bytes
}

pub fn master_key(seed: u8, magic_len: u8) -> MasterKey {
    MasterKey::from_bytes(&master_key_bytes(seed, magic_len)).unwrap()
}

/// Static key with 16 magic bytes, data key with 14.
pub fn test_keys() -> KeySet {
    KeySet::new(master_key(0x5A, 16), master_key(0xC3, 14))
}

/// An unsigned image of `len` bytes carrying `uid` and the usual markers.
pub fn raw_image(uid: &[u8; 9], len: usize) -> Vec<u8> {
    let mut bytes: Vec<u8> = (0..len).map(|i| (i * 13 % 251) as u8).collect();
    bytes[0..9].copy_from_slice(uid);
    bytes[9] = 0x48;
    bytes[10] = 0x00;
    bytes[11] = 0x00;
    bytes[12..16].copy_from_slice(&[0xF1, 0x10, 0xFF, 0xEE]);
    bytes[16] = 0xA5;
    bytes[17] = 0x00;
    bytes[18] = 0x07;
    bytes[84..88].copy_from_slice(&HEAD);
    bytes[88..92].copy_from_slice(&TAIL);
    bytes
}

/// A correctly signed 540-byte record for `SOURCE_UID`.
pub fn signed_record() -> TagRecord {
    let keys = test_keys();
    let raw = TagRecord::new(raw_image(&SOURCE_UID, 540)).unwrap();
    // Signing the raw image under its own UID treats the stored bytes as
    // ciphertext; the result verifies under the same keys.
    patch(
        &raw,
        &SOURCE_UID,
        &keys.static_key,
        &keys.data_key,
        &PatchOptions::default(),
    )
    .unwrap()
}

/// Memory of a blank, unlocked NTAG215 as returned by a full FAST_READ.
pub fn blank_tag_memory(uid: &[u8; 9]) -> Vec<u8> {
    let mut memory = vec![0u8; 540];
    memory[0..9].copy_from_slice(uid);
    memory[9] = 0x48;
    memory[12..16].copy_from_slice(&[0xE1, 0x10, 0x3E, 0x00]);
    memory[16..20].copy_from_slice(&[0x03, 0x00, 0xFE, 0x00]);
    memory[520..524].copy_from_slice(&[0x00, 0x00, 0x00, 0xBD]);
    memory[524..528].copy_from_slice(&[0x04, 0x00, 0x00, 0xFF]);
    memory
}

/// Memory of a tag already personalized with `record`.
pub fn personalized_tag_memory(record: &TagRecord) -> Vec<u8> {
    let mut memory = record.as_bytes()[..540].to_vec();
    memory[10] = 0x0F;
    memory[11] = 0xE0;
    memory
}
