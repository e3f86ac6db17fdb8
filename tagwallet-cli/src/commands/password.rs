// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Password Command

use anyhow::{Context, Result};
use tagwallet_core::Uid;

/// Prints the PWD_AUTH password for `uid`.
pub fn run(uid: &str) -> Result<()> {
    let uid = Uid::from_hex(uid).context("Invalid UID")?;
    println!("{}", hex::encode_upper(uid.password()));
    Ok(())
}
