// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Patch Command
//!
//! Re-personalizes a dump for another UID and writes the result to disk.

use std::path::Path;

use anyhow::{Context, Result};
use tagwallet_core::record::random_salt;
use tagwallet_core::{patch, verify, PatchOptions, Uid};

use crate::config::{read_dump, write_dump, CliConfig};
use crate::display;

/// How the keygen salt is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaltChoice {
    Keep,
    Hex(String),
    Random,
}

impl SaltChoice {
    pub fn from_args(salt: Option<String>, random: bool) -> Self {
        match (salt, random) {
            (Some(hex), _) => SaltChoice::Hex(hex),
            (None, true) => SaltChoice::Random,
            (None, false) => SaltChoice::Keep,
        }
    }

    fn resolve(&self) -> Result<Option<Vec<u8>>> {
        match self {
            SaltChoice::Keep => Ok(None),
            SaltChoice::Hex(s) => Ok(Some(hex::decode(s.trim()).context("Salt is not valid hex")?)),
            SaltChoice::Random => Ok(Some(random_salt()?.to_vec())),
        }
    }
}

pub fn run(
    dump: &Path,
    uid: &str,
    salt: SaltChoice,
    skip_decrypt: bool,
    output: &Path,
    config: &CliConfig,
) -> Result<()> {
    let record = read_dump(dump)?;
    let uid = Uid::from_hex(uid).context("Invalid target UID")?;
    let keys = config.load_keys()?;

    let options = PatchOptions {
        skip_decrypt,
        new_salt: salt.resolve()?,
    };
    let patched = patch(
        &record,
        uid.as_bytes(),
        &keys.static_key,
        &keys.data_key,
        &options,
    )
    .context("Failed to patch record")?;

    if !verify(&patched, &keys.static_key, &keys.data_key).is_valid() {
        anyhow::bail!("Patched record does not verify; refusing to write it");
    }
    write_dump(output, &patched)?;

    display::success(&format!("Patched record for {} written to {}", uid, output.display()));
    if skip_decrypt {
        display::warning("Payload was taken as plaintext; the source dump must be decrypted");
    }
    println!("  Password: {}", hex::encode_upper(uid.password()));
    Ok(())
}

// INLINE_TEST_REQUIRED: Tests private SaltChoice::resolve; binary crate without lib.rs
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_salt_choice_from_args() {
        assert_eq!(SaltChoice::from_args(None, false), SaltChoice::Keep);
        assert_eq!(SaltChoice::from_args(None, true), SaltChoice::Random);
        assert_eq!(
            SaltChoice::from_args(Some("00".into()), false),
            SaltChoice::Hex("00".into())
        );
    }

    #[test]
    fn test_random_salt_resolves_to_32_bytes() {
        let salt = SaltChoice::Random.resolve().unwrap().unwrap();
        assert_eq!(salt.len(), 32);
    }
}
