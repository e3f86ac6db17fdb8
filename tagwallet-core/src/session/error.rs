// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Session Error Types

use thiserror::Error;

use crate::protocol::{BatchWriteError, ProtocolError};
use crate::record::RecordError;

/// Errors that can occur during a tag session.
#[derive(Error, Debug, Clone)]
pub enum SessionError {
    #[error(
        "Not an NTAG215 (product type 0x{product_type:02X}, storage size 0x{storage_size:02X})"
    )]
    InvalidTagType { product_type: u8, storage_size: u8 },

    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Write failed: {0}")]
    Write(#[from] BatchWriteError),

    #[error("Tag is already locked")]
    TagLocked,

    #[error("Record {found} does not match the tag ({expected})")]
    CharacterMismatch { expected: String, found: String },

    #[error("Invalid session state: {0}")]
    InvalidState(String),
}
