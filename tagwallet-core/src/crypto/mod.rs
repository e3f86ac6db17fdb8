// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tag Cryptography
//!
//! Master key material and the per-tag key derivation used to decrypt,
//! re-sign and re-encrypt a tag record.

pub mod derivation;
pub mod keys;

pub use derivation::{DerivedTagKey, DERIVED_KEY_SIZE, TAG_HMAC_SIZE};
pub use keys::{KeyError, KeySet, MasterKey, MASTER_KEY_SIZE};
