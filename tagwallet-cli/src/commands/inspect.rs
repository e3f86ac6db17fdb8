// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Inspect Command
//!
//! Summarizes a tag dump and, when keys are configured, checks its HMACs.

use std::path::Path;

use anyhow::Result;
use tagwallet_core::verify;

use crate::config::{read_dump, CliConfig};
use crate::display::{self, RecordReport};

/// Prints a summary of `dump`.
pub fn run(dump: &Path, pages: bool, json: bool, config: &CliConfig) -> Result<()> {
    let record = read_dump(dump)?;

    let check = if config.has_keys() {
        let keys = config.load_keys()?;
        Some(verify(&record, &keys.static_key, &keys.data_key))
    } else {
        None
    };
    let report = RecordReport::new(&record, check);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    display::display_record(&report);
    if pages {
        print!("{}", record.page_listing());
    }
    if check.is_none() {
        display::info("Pass --keys to check the record signatures");
    }
    Ok(())
}
