// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! TagWallet Core Library
//!
//! Re-personalizes captured NTAG215 figure records onto blank tags.
//! HMAC and digests use the audited `ring` crate; the payload cipher is
//! AES-128-CTR from RustCrypto.
//!
//! - [`crypto`]: master keys and per-tag key derivation
//! - [`record`]: the tag memory image and the patch engine
//! - [`protocol`]: page commands over an abstract tag transport
//! - [`session`]: the read/classify/write state machine

pub mod crypto;
pub mod protocol;
pub mod record;
pub mod session;

pub use crypto::{DerivedTagKey, KeyError, KeySet, MasterKey};
pub use protocol::{
    AuthOutcome, BatchWriteError, CancellationToken, MockTagTransport, PageClient, PageWrite,
    ProtocolConfig, ProtocolError, TagTransport, TransportError, VersionInfo, WriteAck,
};
pub use record::{
    password, patch, verify, PatchOptions, RecordError, RecordFormat, SignatureCheck, TagRecord,
    Uid,
};
pub use session::{AppDataOutcome, SessionError, SessionState, TagClassification, TagSession};
