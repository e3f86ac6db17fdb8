// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Reader Commands
//!
//! Talks to a tag through a PC/SC reader with a PN53x front end. NTAG
//! commands are tunnelled with InCommunicateThru inside a pseudo-APDU.

use std::ffi::CStr;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use pcsc::{Card, Protocols, Scope, ShareMode, MAX_BUFFER_SIZE};
use tagwallet_core::{AppDataOutcome, TagSession, TagTransport, TransportError};
use tracing::debug;

use crate::config::{read_dump, write_dump, CliConfig};
use crate::display;

/// Pseudo-APDU header for direct PN53x commands.
const DIRECT_TRANSMIT: [u8; 4] = [0xFF, 0x00, 0x00, 0x00];
const IN_COMMUNICATE_THRU: [u8; 2] = [0xD4, 0x42];
const IN_COMMUNICATE_THRU_RESPONSE: [u8; 2] = [0xD5, 0x43];
const STATUS_OK: [u8; 2] = [0x90, 0x00];

/// PC/SC card handle speaking raw NTAG commands.
pub struct PcscTransport {
    card: Card,
}

impl PcscTransport {
    pub fn new(card: Card) -> Self {
        PcscTransport { card }
    }
}

fn wrap(command: &[u8]) -> Result<Vec<u8>, TransportError> {
    let len = u8::try_from(command.len() + IN_COMMUNICATE_THRU.len())
        .map_err(|_| TransportError::msg("command too long for a short APDU"))?;
    let mut apdu = Vec::with_capacity(DIRECT_TRANSMIT.len() + 1 + len as usize);
    apdu.extend_from_slice(&DIRECT_TRANSMIT);
    apdu.push(len);
    apdu.extend_from_slice(&IN_COMMUNICATE_THRU);
    apdu.extend_from_slice(command);
    Ok(apdu)
}

fn unwrap_response(response: &[u8]) -> Result<Vec<u8>, TransportError> {
    let Some((body, status)) = response.split_last_chunk::<2>() else {
        return Err(TransportError::msg("reader response too short"));
    };
    if *status != STATUS_OK {
        return Err(TransportError::msg(format!(
            "reader status {:02X}{:02X}",
            status[0], status[1]
        )));
    }
    match body {
        [0xD5, 0x43, 0x00, data @ ..] => Ok(data.to_vec()),
        [0xD5, 0x43, code, ..] => Err(TransportError::msg(format!(
            "InCommunicateThru failed with status {code:02X}"
        ))),
        _ => Err(TransportError::msg(format!(
            "expected {} response, got {}",
            hex::encode_upper(IN_COMMUNICATE_THRU_RESPONSE),
            hex::encode_upper(body)
        ))),
    }
}

impl TagTransport for PcscTransport {
    fn transceive(&mut self, command: &[u8]) -> Result<Vec<u8>, TransportError> {
        let apdu = wrap(command)?;
        let mut buf = [0u8; MAX_BUFFER_SIZE];
        let response = self.card.transmit(&apdu, &mut buf).map_err(TransportError::new)?;
        unwrap_response(response)
    }
}

/// Connects to the first reader whose name contains the configured filter.
fn connect(config: &CliConfig) -> Result<PcscTransport> {
    let ctx = pcsc::Context::establish(Scope::User).context("Failed to establish PC/SC context")?;

    let mut readers_buf = [0u8; 2048];
    let readers: Vec<&CStr> = ctx
        .list_readers(&mut readers_buf)
        .context("Failed to list readers")?
        .collect();

    let reader = match &config.reader {
        Some(filter) => readers
            .iter()
            .find(|name| name.to_string_lossy().contains(filter.as_str()))
            .ok_or_else(|| anyhow!("No reader matching '{}'", filter))?,
        None => readers.first().ok_or_else(|| anyhow!("No readers are connected"))?,
    };
    debug!(reader = %reader.to_string_lossy(), "connecting");

    let card = ctx
        .connect(reader, ShareMode::Shared, Protocols::ANY)
        .context("No tag on the reader")?;
    Ok(PcscTransport::new(card))
}

fn open_session(config: &CliConfig) -> Result<TagSession<PcscTransport>> {
    let transport = connect(config)?;
    let mut session = TagSession::new(transport, config.protocol);
    session.establish().context("Failed to read the tag")?;
    Ok(session)
}

/// Dumps the tag on the reader to `output`.
pub fn read(output: &Path, config: &CliConfig) -> Result<()> {
    let session = open_session(config)?;
    let record = session
        .record()
        .ok_or_else(|| anyhow!("Session has no snapshot"))?;

    write_dump(output, record)?;
    display::success(&format!("Tag {} dumped to {}", record.uid(), output.display()));
    Ok(())
}

/// Patches `dump` for the tag on the reader and writes it.
pub fn write(dump: &Path, config: &CliConfig) -> Result<()> {
    let source = read_dump(dump)?;
    let keys = config.load_keys()?;
    let mut session = open_session(config)?;

    if let Some(classification) = session.classification() {
        if classification.locked {
            bail!("Tag is already locked; use `restore` to rewrite its application data");
        }
    }

    let written = session
        .write_patched(&source, &keys)
        .context("Failed to write the tag")?;
    display::success(&format!("Wrote {} to tag {}", dump.display(), written.uid()));
    Ok(())
}

/// Rewrites the application data of a tag written earlier.
pub fn restore(dump: &Path, config: &CliConfig) -> Result<()> {
    let source = read_dump(dump)?;
    let keys = config.load_keys()?;
    let mut session = open_session(config)?;

    match session
        .write_app_data(&source, &keys)
        .context("Failed to restore application data")?
    {
        AppDataOutcome::Written { pages } => {
            display::success(&format!("Restored {} pages of application data", pages));
        }
        AppDataOutcome::NothingToUnlock => {
            display::warning("Tag did not accept the derived password; nothing was written");
        }
    }
    Ok(())
}
