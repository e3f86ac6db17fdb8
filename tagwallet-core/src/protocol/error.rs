// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Protocol Error Types

use thiserror::Error;

use super::command::WriteAck;
use super::transport::TransportError;

/// Errors raised by the page protocol.
#[derive(Error, Debug, Clone)]
pub enum ProtocolError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Write to page {page} rejected: {ack}")]
    WriteRejected { page: u8, ack: WriteAck },

    #[error("Invalid write: {0}")]
    InvalidWrite(String),

    #[error("Invalid page range {start}..={end} with batch size {batch_size}")]
    InvalidRange { start: u8, end: u8, batch_size: u8 },

    #[error("Unexpected response to {command}: expected {expected} bytes, got {actual}")]
    UnexpectedResponse {
        command: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Session was cancelled")]
    Cancelled,
}

impl ProtocolError {
    /// The device acknowledgement behind a rejected write, if any.
    pub fn write_ack(&self) -> Option<WriteAck> {
        match self {
            ProtocolError::WriteRejected { ack, .. } => Some(*ack),
            _ => None,
        }
    }
}

/// A batch write stopped at its first failure.
///
/// Pages before `failed_page` were written; later pages were never
/// attempted. The tag is left in a mixed old/new state.
#[derive(Error, Debug, Clone)]
#[error("Batch write aborted at page {failed_page} after {completed} successful writes: {source}")]
pub struct BatchWriteError {
    pub failed_page: u8,
    pub completed: usize,
    pub source: ProtocolError,
}
