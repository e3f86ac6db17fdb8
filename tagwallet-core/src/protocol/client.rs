// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Page Client
//!
//! Page-level operations on top of a [`TagTransport`]. Every operation is
//! a sequential chain of single commands; nothing is retried.

use tracing::{debug, warn};

use super::command::{AuthOutcome, Command, VersionInfo, WriteAck};
use super::error::{BatchWriteError, ProtocolError};
use super::transport::{CancellationToken, TagTransport};
use crate::record::PAGE_SIZE;

/// Default number of pages per FAST_READ command.
pub const DEFAULT_FAST_READ_BATCH: u8 = 0x20;

/// Last page of an NTAG215.
pub const NTAG215_LAST_PAGE: u8 = 0x86;

/// Tunables for the page protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolConfig {
    /// Pages requested per FAST_READ; large ranges time out on some readers.
    pub fast_read_batch_size: u8,
    /// Last page read when dumping a tag.
    pub last_page: u8,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        ProtocolConfig {
            fast_read_batch_size: DEFAULT_FAST_READ_BATCH,
            last_page: NTAG215_LAST_PAGE,
        }
    }
}

/// One page to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWrite {
    pub page: u8,
    pub data: [u8; 4],
}

impl PageWrite {
    pub fn new(page: u8, data: [u8; 4]) -> Self {
        PageWrite { page, data }
    }
}

/// Client issuing page commands to a single tag.
pub struct PageClient<T: TagTransport> {
    transport: T,
    cancel: CancellationToken,
}

impl<T: TagTransport> PageClient<T> {
    pub fn new(transport: T) -> Self {
        Self::with_cancellation(transport, CancellationToken::new())
    }

    pub fn with_cancellation(transport: T, cancel: CancellationToken) -> Self {
        PageClient { transport, cancel }
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    fn send(&mut self, command: Command) -> Result<Vec<u8>, ProtocolError> {
        if self.cancel.is_cancelled() {
            return Err(ProtocolError::Cancelled);
        }
        debug!(command = command.name(), "Sending tag command");
        let response = self.transport.transceive(&command.encode())?;
        Ok(response)
    }

    /// Sends GET_VERSION and decodes the 8-byte answer.
    pub fn get_version(&mut self) -> Result<VersionInfo, ProtocolError> {
        let response = self.send(Command::GetVersion)?;
        VersionInfo::parse(&response)
    }

    /// Reads pages `start..=end`, `batch_size` pages per command.
    ///
    /// Batches are concatenated in page order. Each batch must return
    /// exactly four bytes per requested page.
    pub fn fast_read(
        &mut self,
        start: u8,
        end: u8,
        batch_size: u8,
    ) -> Result<Vec<u8>, ProtocolError> {
        if start > end || batch_size == 0 {
            return Err(ProtocolError::InvalidRange {
                start,
                end,
                batch_size,
            });
        }

        let total_pages = (end - start) as usize + 1;
        let mut out = Vec::with_capacity(total_pages * PAGE_SIZE);
        let mut batch_start = start;
        loop {
            let batch_end = batch_start.saturating_add(batch_size - 1).min(end);
            let command = Command::FastRead {
                start: batch_start,
                end: batch_end,
            };
            let response = self.send(command)?;

            let expected = (batch_end - batch_start) as usize * PAGE_SIZE + PAGE_SIZE;
            if response.len() != expected {
                return Err(ProtocolError::UnexpectedResponse {
                    command: command.name(),
                    expected,
                    actual: response.len(),
                });
            }
            out.extend_from_slice(&response);
            debug!(start = batch_start, end = batch_end, "Read page batch");

            if batch_end >= end {
                break;
            }
            batch_start = batch_end + 1;
        }
        Ok(out)
    }

    /// Writes four bytes to `page`.
    ///
    /// Page 255 and data that is not exactly four bytes are rejected
    /// before anything is sent.
    pub fn write(&mut self, page: u8, data: &[u8]) -> Result<(), ProtocolError> {
        if page == u8::MAX {
            return Err(ProtocolError::InvalidWrite(format!("page {} out of range", page)));
        }
        let data: [u8; 4] = data.try_into().map_err(|_| {
            ProtocolError::InvalidWrite(format!("expected 4 data bytes, got {}", data.len()))
        })?;

        let command = Command::Write { page, data };
        let response = self.send(command)?;
        let [byte] = response.as_slice() else {
            return Err(ProtocolError::UnexpectedResponse {
                command: command.name(),
                expected: 1,
                actual: response.len(),
            });
        };
        match WriteAck::from_byte(*byte) {
            WriteAck::Ack => Ok(()),
            ack => Err(ProtocolError::WriteRejected { page, ack }),
        }
    }

    /// Writes pages strictly in order and stops at the first failure.
    ///
    /// There is no rollback; on error the tag holds a torn write.
    pub fn write_batch(&mut self, writes: &[PageWrite]) -> Result<(), BatchWriteError> {
        for (completed, write) in writes.iter().enumerate() {
            if let Err(source) = self.write(write.page, &write.data) {
                warn!(
                    page = write.page,
                    completed,
                    remaining = writes.len() - completed,
                    error = %source,
                    "Batch write aborted, tag left partially written"
                );
                return Err(BatchWriteError {
                    failed_page: write.page,
                    completed,
                    source,
                });
            }
        }
        debug!(pages = writes.len(), "Batch write complete");
        Ok(())
    }

    /// Sends PWD_AUTH.
    ///
    /// A transport failure is an error; an unexpected answer is reported
    /// as [`AuthOutcome::NotUnlocked`].
    pub fn authenticate(&mut self, password: [u8; 4]) -> Result<AuthOutcome, ProtocolError> {
        let response = self.send(Command::PwdAuth { password })?;
        Ok(AuthOutcome::from_response(response))
    }
}
