// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Record Error Types

use thiserror::Error;

/// Errors raised while building, reading or patching a tag record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("Invalid UID: expected 9 bytes, got {0}")]
    InvalidUid(usize),

    #[error("Malformed record: {0} bytes is not a valid tag image length (532, 540 or 572)")]
    MalformedRecord(usize),

    #[error("Invalid salt: expected 32 bytes, got {0}")]
    InvalidSalt(usize),

    #[error("Record invariant violated: {0}")]
    Invariant(&'static str),
}
