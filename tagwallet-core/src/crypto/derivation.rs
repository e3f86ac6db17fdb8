// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Per-Tag Key Derivation
//!
//! Derives an AES-128 key, AES IV and HMAC key for one
//! (UID, write counter, salt) triple:
//!
//! ```text
//! seed = type_string(14)
//!     || (write_counter || 0x00 * 14)[..16 - magic_len]
//!     || magic_bytes[..magic_len]
//!     || uid[..8] || uid[..8]
//!     || salt XOR xor_pad
//! out  = HMAC-SHA256(hmac_key, be16(0) || seed)
//!     || HMAC-SHA256(hmac_key, be16(1) || seed)[..16]
//! ```
//!
//! Any deviation in the seed silently produces keys a verifier rejects,
//! so the layout is tested byte for byte.

use aes::cipher::{KeyIvInit, StreamCipher};
use ring::hmac;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::MasterKey;
use crate::record::{Uid, SALT_SIZE};

/// Size of each derived key component.
pub const DERIVED_KEY_SIZE: usize = 16;

/// Size of an HMAC-SHA256 tag as stored in a record.
pub const TAG_HMAC_SIZE: usize = 32;

/// Bytes produced by the derivation before splitting.
const DERIVED_OUTPUT_SIZE: usize = 3 * DERIVED_KEY_SIZE;

/// The first IV half stays fixed; the second is a 64-bit big-endian counter.
type Aes128Ctr = ctr::Ctr64BE<aes::Aes128>;

/// Ephemeral keys for one tag. Never persisted.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedTagKey {
    aes_key: [u8; DERIVED_KEY_SIZE],
    aes_iv: [u8; DERIVED_KEY_SIZE],
    hmac_key: [u8; DERIVED_KEY_SIZE],
}

impl std::fmt::Debug for DerivedTagKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedTagKey")
            .field("aes_key", &"[REDACTED]")
            .field("aes_iv", &"[REDACTED]")
            .field("hmac_key", &"[REDACTED]")
            .finish()
    }
}

impl MasterKey {
    /// Builds the derivation seed for a tag.
    pub fn derivation_seed(
        &self,
        uid: &Uid,
        write_counter: [u8; 2],
        salt: &[u8; SALT_SIZE],
    ) -> Vec<u8> {
        let lead_len = DERIVED_KEY_SIZE - self.magic_bytes().len();
        let mut counter = [0u8; DERIVED_KEY_SIZE];
        counter[..2].copy_from_slice(&write_counter);

        let uid_prefix = &uid.as_bytes()[..8];
        let mut seed = Vec::with_capacity(14 + DERIVED_KEY_SIZE + 16 + SALT_SIZE);
        seed.extend_from_slice(self.type_string());
        seed.extend_from_slice(&counter[..lead_len]);
        seed.extend_from_slice(self.magic_bytes());
        seed.extend_from_slice(uid_prefix);
        seed.extend_from_slice(uid_prefix);
        seed.extend(salt.iter().zip(self.xor_pad()).map(|(s, p)| s ^ p));
        seed
    }

    /// Derives the per-tag keys for a (UID, write counter, salt) triple.
    pub fn derive(
        &self,
        uid: &Uid,
        write_counter: [u8; 2],
        salt: &[u8; SALT_SIZE],
    ) -> DerivedTagKey {
        let mut seed = self.derivation_seed(uid, write_counter, salt);
        let key = hmac::Key::new(hmac::HMAC_SHA256, self.hmac_key());

        let mut output = [0u8; DERIVED_OUTPUT_SIZE];
        let mut filled = 0;
        let mut iteration: u16 = 0;
        while filled < DERIVED_OUTPUT_SIZE {
            let mut ctx = hmac::Context::with_key(&key);
            ctx.update(&iteration.to_be_bytes());
            ctx.update(&seed);
            let tag = ctx.sign();
            let take = (DERIVED_OUTPUT_SIZE - filled).min(tag.as_ref().len());
            output[filled..filled + take].copy_from_slice(&tag.as_ref()[..take]);
            filled += take;
            iteration += 1;
        }
        seed.zeroize();

        let mut derived = DerivedTagKey {
            aes_key: [0; DERIVED_KEY_SIZE],
            aes_iv: [0; DERIVED_KEY_SIZE],
            hmac_key: [0; DERIVED_KEY_SIZE],
        };
        derived.aes_key.copy_from_slice(&output[0..16]);
        derived.aes_iv.copy_from_slice(&output[16..32]);
        derived.hmac_key.copy_from_slice(&output[32..48]);
        output.zeroize();
        derived
    }
}

impl DerivedTagKey {
    pub fn aes_key(&self) -> &[u8; DERIVED_KEY_SIZE] {
        &self.aes_key
    }

    pub fn aes_iv(&self) -> &[u8; DERIVED_KEY_SIZE] {
        &self.aes_iv
    }

    pub fn hmac_key(&self) -> &[u8; DERIVED_KEY_SIZE] {
        &self.hmac_key
    }

    /// HMAC-SHA256 over the concatenation of `parts`.
    pub fn hmac(&self, parts: &[&[u8]]) -> [u8; TAG_HMAC_SIZE] {
        let key = hmac::Key::new(hmac::HMAC_SHA256, &self.hmac_key);
        let mut ctx = hmac::Context::with_key(&key);
        for part in parts {
            ctx.update(part);
        }
        let mut out = [0u8; TAG_HMAC_SIZE];
        out.copy_from_slice(ctx.sign().as_ref());
        out
    }

    /// Constant-time check of `expected` against the HMAC over `parts`.
    pub fn verify_hmac(&self, parts: &[&[u8]], expected: &[u8]) -> bool {
        let key = hmac::Key::new(hmac::HMAC_SHA256, &self.hmac_key);
        hmac::verify(&key, &parts.concat(), expected).is_ok()
    }

    /// XORs the AES-128-CTR keystream into `buf`.
    ///
    /// The keystream always starts at the IV, so applying it twice restores
    /// the input.
    pub fn apply_keystream(&self, buf: &mut [u8]) {
        let mut cipher = Aes128Ctr::new(&self.aes_key.into(), &self.aes_iv.into());
        cipher.apply_keystream(buf);
    }
}
