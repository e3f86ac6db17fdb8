// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Page Protocol
//!
//! Talks to an NTAG215 through an abstract [`TagTransport`].
//!
//! # Architecture
//!
//! - **Commands**: wire encoding of GET_VERSION, FAST_READ, WRITE, PWD_AUTH
//! - **Transport trait**: one blocking request/response exchange
//! - **Page client**: batched reads, ordered batch writes, authentication
//!
//! The protocol is half-duplex: exactly one command is in flight per tag.
//!
//! # Example
//!
//! ```ignore
//! use tagwallet_core::protocol::{MockTagTransport, PageClient, ProtocolConfig};
//!
//! let mut client = PageClient::new(MockTagTransport::with_memory(image));
//! let version = client.get_version()?;
//! let config = ProtocolConfig::default();
//! let dump = client.fast_read(0, config.last_page, config.fast_read_batch_size)?;
//! ```

mod client;
mod command;
mod error;
mod transport;

pub use client::{PageClient, PageWrite, ProtocolConfig, DEFAULT_FAST_READ_BATCH, NTAG215_LAST_PAGE};
pub use command::{AuthOutcome, Command, VersionInfo, WriteAck, PACK_SENTINEL};
pub use error::{BatchWriteError, ProtocolError};
pub use transport::{
    CancellationToken, MockTagTransport, TagTransport, TransportError, NTAG215_VERSION,
};
