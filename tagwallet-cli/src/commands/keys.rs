// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Keys Command
//!
//! Shows which master keys are configured without revealing them.

use anyhow::Result;

use crate::config::CliConfig;
use crate::display;

pub fn run(config: &CliConfig) -> Result<()> {
    let keys = config.load_keys()?;

    display::success("Master keys loaded");
    println!();
    println!("  Data key:   {}", keys.data_key.fingerprint());
    println!("  Static key: {}", keys.static_key.fingerprint());
    println!();
    Ok(())
}
