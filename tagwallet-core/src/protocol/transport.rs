// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tag Transport Trait
//!
//! Platform-agnostic abstraction over a connected tag.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::command::{FAST_READ, GET_VERSION, PWD_AUTH, WRITE};

/// Opaque transport failure, passed through unmodified.
#[derive(Clone)]
pub struct TransportError(Arc<dyn std::error::Error + Send + Sync>);

impl TransportError {
    pub fn new<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        TransportError(Arc::new(error))
    }

    /// Builds an error from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        TransportError(Arc::new(MessageError(message.into())))
    }

    /// The underlying platform error.
    pub fn inner(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.0.as_ref()
    }
}

impl fmt::Debug for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TransportError").field(&self.0).finish()
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

#[derive(Debug)]
struct MessageError(String);

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for MessageError {}

/// Transport trait for tag communication.
///
/// Sends one opaque command to the connected tag and returns its raw
/// response. Implementations exist per platform (PC/SC readers, phone NFC
/// stacks) and [`MockTagTransport`] covers tests.
///
/// # Synchronous Interface
///
/// This trait uses a blocking method. Platform implementations may run an
/// async runtime internally but must not return before the tag answered
/// or the exchange failed. Taking `&mut self` keeps a single command in
/// flight per tag.
pub trait TagTransport {
    /// Sends `command` and waits for the response.
    fn transceive(&mut self, command: &[u8]) -> Result<Vec<u8>, TransportError>;
}

impl<T: TagTransport + ?Sized> TagTransport for &mut T {
    fn transceive(&mut self, command: &[u8]) -> Result<Vec<u8>, TransportError> {
        (**self).transceive(command)
    }
}

impl<T: TagTransport + ?Sized> TagTransport for Box<T> {
    fn transceive(&mut self, command: &[u8]) -> Result<Vec<u8>, TransportError> {
        (**self).transceive(command)
    }
}

/// Shared cancellation flag for a tag session.
///
/// Once cancelled, no further commands are issued. A batch write in
/// progress stops where it is.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// GET_VERSION response of an NTAG215.
pub const NTAG215_VERSION: [u8; 8] = [0x00, 0x04, 0x04, 0x02, 0x01, 0x00, 0x11, 0x03];

/// Mock transport for testing.
///
/// Scripted responses are returned first, in order. Once the script is
/// exhausted and a memory image is loaded, the mock emulates an NTAG215:
/// GET_VERSION, FAST_READ, WRITE and PWD_AUTH act on the image.
#[derive(Debug, Default)]
pub struct MockTagTransport {
    script: VecDeque<Result<Vec<u8>, TransportError>>,
    sent: Vec<Vec<u8>>,
    memory: Option<Vec<u8>>,
    max_read_pages: Option<usize>,
    auth_response: Option<Vec<u8>>,
    write_failures: Vec<(u8, u8)>,
}

impl MockTagTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emulates a tag holding `memory`.
    pub fn with_memory(memory: Vec<u8>) -> Self {
        MockTagTransport {
            memory: Some(memory),
            ..Default::default()
        }
    }

    /// FAST_READ ranges above `pages` fail like a reader timeout.
    pub fn with_read_limit(mut self, pages: usize) -> Self {
        self.max_read_pages = Some(pages);
        self
    }

    /// Response returned to PWD_AUTH by the emulated tag.
    pub fn with_auth_response(mut self, response: Vec<u8>) -> Self {
        self.auth_response = Some(response);
        self
    }

    /// Makes the emulated tag answer writes to `page` with `ack`.
    pub fn with_write_failure(mut self, page: u8, ack: u8) -> Self {
        self.write_failures.push((page, ack));
        self
    }

    pub fn push_response(&mut self, response: Vec<u8>) {
        self.script.push_back(Ok(response));
    }

    pub fn push_error(&mut self, error: TransportError) {
        self.script.push_back(Err(error));
    }

    /// Every command received, in order.
    pub fn sent_commands(&self) -> &[Vec<u8>] {
        &self.sent
    }

    /// Page numbers of the WRITE commands received, in order.
    pub fn written_pages(&self) -> Vec<u8> {
        self.sent
            .iter()
            .filter(|c| c.first() == Some(&WRITE) && c.len() > 1)
            .map(|c| c[1])
            .collect()
    }

    pub fn memory(&self) -> Option<&[u8]> {
        self.memory.as_deref()
    }

    fn emulate(&mut self, command: &[u8]) -> Result<Vec<u8>, TransportError> {
        let memory = self
            .memory
            .as_mut()
            .ok_or_else(|| TransportError::msg("mock script exhausted"))?;

        match command {
            [GET_VERSION] => Ok(NTAG215_VERSION.to_vec()),
            [FAST_READ, start, end] => {
                let (start, end) = (*start as usize, *end as usize);
                if end < start {
                    return Err(TransportError::msg("mock: inverted read range"));
                }
                let pages = end - start + 1;
                if let Some(limit) = self.max_read_pages {
                    if pages > limit {
                        return Err(TransportError::msg("mock: read range timed out"));
                    }
                }
                memory
                    .get(start * 4..(end + 1) * 4)
                    .map(<[u8]>::to_vec)
                    .ok_or_else(|| TransportError::msg("mock: read past end of memory"))
            }
            [WRITE, page, data @ ..] if data.len() == 4 => {
                if let Some((_, ack)) = self.write_failures.iter().find(|(p, _)| p == page) {
                    return Ok(vec![*ack]);
                }
                let offset = *page as usize * 4;
                match memory.get_mut(offset..offset + 4) {
                    Some(slot) => {
                        slot.copy_from_slice(data);
                        Ok(vec![0x0A])
                    }
                    None => Ok(vec![0x00]),
                }
            }
            [PWD_AUTH, ..] => Ok(self
                .auth_response
                .clone()
                .unwrap_or_else(|| vec![0x80, 0x80])),
            _ => Err(TransportError::msg("mock: unsupported command")),
        }
    }
}

impl TagTransport for MockTagTransport {
    fn transceive(&mut self, command: &[u8]) -> Result<Vec<u8>, TransportError> {
        self.sent.push(command.to_vec());
        match self.script.pop_front() {
            Some(response) => response,
            None => self.emulate(command),
        }
    }
}
