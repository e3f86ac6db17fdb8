// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Record Patching
//!
//! Re-personalizes a captured record under a new UID (and optionally a new
//! salt), regenerating both HMACs and re-encrypting the payload.
//!
//! The steps run in a fixed order. The data HMAC covers the tag HMAC, so
//! the tag HMAC must be written first, and both HMACs are computed over the
//! plaintext payload before it is re-encrypted.

use ring::rand::{SecureRandom, SystemRandom};
use tracing::debug;

use super::{layout, RecordError, TagRecord, Uid, SALT_SIZE};
use crate::crypto::{DerivedTagKey, MasterKey, TAG_HMAC_SIZE};

/// Minimum buffer length covered by the HMAC regions.
const SIGNED_REGION_END: usize = layout::PAYLOAD_TAIL.end;

/// Options controlling [`patch`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchOptions {
    /// Treat the stored payload as plaintext instead of decrypting it.
    pub skip_decrypt: bool,
    /// Replacement keygen salt; must be 32 bytes.
    pub new_salt: Option<Vec<u8>>,
}

impl PatchOptions {
    pub fn with_salt(mut self, salt: impl Into<Vec<u8>>) -> Self {
        self.new_salt = Some(salt.into());
        self
    }

    pub fn skip_decrypt(mut self) -> Self {
        self.skip_decrypt = true;
        self
    }
}

/// Outcome of [`verify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureCheck {
    pub tag_hmac_valid: bool,
    pub data_hmac_valid: bool,
}

impl SignatureCheck {
    pub fn is_valid(&self) -> bool {
        self.tag_hmac_valid && self.data_hmac_valid
    }
}

/// Generates a fresh keygen salt from the system CSPRNG.
pub fn random_salt() -> Result<[u8; SALT_SIZE], RecordError> {
    let mut salt = [0u8; SALT_SIZE];
    SystemRandom::new()
        .fill(&mut salt)
        .map_err(|_| RecordError::Invariant("system random source unavailable"))?;
    Ok(salt)
}

/// Tag HMAC over `uid[..8] || bytes[84..128]`.
pub fn compute_tag_hmac(
    bytes: &[u8],
    keys: &DerivedTagKey,
) -> Result<[u8; TAG_HMAC_SIZE], RecordError> {
    ensure_signed_region(bytes)?;
    Ok(keys.hmac(&[&bytes[layout::UID_PREFIX], &bytes[layout::TAG_INFO]]))
}

/// Data HMAC over
/// `bytes[17..52] || bytes[160..520] || bytes[52..84] || uid[..8] || bytes[84..128]`.
///
/// `bytes` must hold the plaintext payload and the final tag HMAC.
pub fn compute_data_hmac(
    bytes: &[u8],
    keys: &DerivedTagKey,
) -> Result<[u8; TAG_HMAC_SIZE], RecordError> {
    ensure_signed_region(bytes)?;
    Ok(keys.hmac(&data_hmac_parts(bytes)))
}

fn data_hmac_parts(bytes: &[u8]) -> [&[u8]; 5] {
    [
        &bytes[layout::DATA_HEAD],
        &bytes[layout::PAYLOAD_TAIL],
        &bytes[layout::TAG_HMAC],
        &bytes[layout::UID_PREFIX],
        &bytes[layout::TAG_INFO],
    ]
}

fn ensure_signed_region(bytes: &[u8]) -> Result<(), RecordError> {
    if bytes.len() < SIGNED_REGION_END {
        return Err(RecordError::MalformedRecord(bytes.len()));
    }
    Ok(())
}

fn read_payload(buf: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(layout::PAYLOAD_SIZE);
    payload.extend_from_slice(&buf[layout::PAYLOAD_HEAD]);
    payload.extend_from_slice(&buf[layout::PAYLOAD_TAIL]);
    payload
}

fn write_payload(buf: &mut [u8], payload: &[u8]) -> Result<(), RecordError> {
    if payload.len() != layout::PAYLOAD_SIZE {
        return Err(RecordError::Invariant("payload length changed by cipher"));
    }
    let (head, tail) = payload.split_at(layout::PAYLOAD_HEAD.len());
    buf[layout::PAYLOAD_HEAD].copy_from_slice(head);
    buf[layout::PAYLOAD_TAIL].copy_from_slice(tail);
    Ok(())
}

/// Re-personalizes `record` under `new_uid`.
///
/// The input is never modified. Fails with [`RecordError::InvalidUid`] if
/// `new_uid` is not 9 bytes and [`RecordError::InvalidSalt`] if a supplied
/// salt is not 32 bytes.
pub fn patch(
    record: &TagRecord,
    new_uid: &[u8],
    static_key: &MasterKey,
    data_key: &MasterKey,
    options: &PatchOptions,
) -> Result<TagRecord, RecordError> {
    let new_uid = Uid::try_from(new_uid)?;
    let new_salt: Option<[u8; SALT_SIZE]> = match &options.new_salt {
        Some(salt) => Some(
            salt.as_slice()
                .try_into()
                .map_err(|_| RecordError::InvalidSalt(salt.len()))?,
        ),
        None => None,
    };

    let old_uid = record.uid();
    let write_counter = record.write_counter_bytes();
    let old_salt = record.salt();
    debug!(
        old_uid = %old_uid,
        new_uid = %new_uid,
        rotate_salt = new_salt.is_some(),
        skip_decrypt = options.skip_decrypt,
        "Patching record"
    );

    // 1-2: decrypt under the original identity
    let mut plaintext = record.encrypted_payload();
    if !options.skip_decrypt {
        let data_keys = data_key.derive(&old_uid, write_counter, &old_salt);
        data_keys.apply_keystream(&mut plaintext);
    }

    // 3: substitute identity and plaintext
    let mut buf = record.as_bytes().to_vec();
    buf[layout::UID].copy_from_slice(new_uid.as_bytes());
    write_payload(&mut buf, &plaintext)?;
    if let Some(salt) = &new_salt {
        buf[layout::SALT].copy_from_slice(salt);
    }
    let salt = new_salt.unwrap_or(old_salt);

    // 4: tag HMAC
    let tag_keys = static_key.derive(&new_uid, write_counter, &salt);
    let tag_hmac = compute_tag_hmac(&buf, &tag_keys)?;
    buf[layout::TAG_HMAC].copy_from_slice(&tag_hmac);

    // 5: data HMAC, covering the tag HMAC just written
    let encrypt_keys = data_key.derive(&new_uid, write_counter, &salt);
    let data_hmac = compute_data_hmac(&buf, &encrypt_keys)?;
    buf[layout::DATA_HMAC].copy_from_slice(&data_hmac);

    // 6: re-encrypt
    encrypt_keys.apply_keystream(&mut plaintext);
    write_payload(&mut buf, &plaintext)?;

    // 7
    TagRecord::new(buf).map_err(|_| RecordError::Invariant("patched record length changed"))
}

fn decrypted_bytes(record: &TagRecord, data_keys: &DerivedTagKey) -> Vec<u8> {
    let mut plain = record.as_bytes().to_vec();
    let mut payload = record.encrypted_payload();
    data_keys.apply_keystream(&mut payload);
    let (head, tail) = payload.split_at(layout::PAYLOAD_HEAD.len());
    plain[layout::PAYLOAD_HEAD].copy_from_slice(head);
    plain[layout::PAYLOAD_TAIL].copy_from_slice(tail);
    plain
}

/// Returns a copy of `record` with its payload decrypted under its own UID,
/// write counter and salt. The HMACs are left as stored.
pub fn decrypt(record: &TagRecord, data_key: &MasterKey) -> TagRecord {
    let data_keys = data_key.derive(&record.uid(), record.write_counter_bytes(), &record.salt());
    TagRecord {
        data: decrypted_bytes(record, &data_keys),
    }
}

/// Recomputes both HMACs of `record` under its own UID, write counter and
/// salt and compares them with the stored values.
pub fn verify(record: &TagRecord, static_key: &MasterKey, data_key: &MasterKey) -> SignatureCheck {
    let uid = record.uid();
    let write_counter = record.write_counter_bytes();
    let salt = record.salt();

    let tag_keys = static_key.derive(&uid, write_counter, &salt);
    let bytes = record.as_bytes();
    let tag_hmac_valid = tag_keys.verify_hmac(
        &[&bytes[layout::UID_PREFIX], &bytes[layout::TAG_INFO]],
        record.tag_hmac(),
    );

    let data_keys = data_key.derive(&uid, write_counter, &salt);
    let plain = decrypted_bytes(record, &data_keys);
    let data_hmac_valid = data_keys.verify_hmac(&data_hmac_parts(&plain), record.data_hmac());

    debug!(uid = %uid, tag_hmac_valid, data_hmac_valid, "Verified record signatures");
    SignatureCheck {
        tag_hmac_valid,
        data_hmac_valid,
    }
}
