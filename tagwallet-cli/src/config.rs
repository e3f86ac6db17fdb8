// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! CLI Configuration

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tagwallet_core::{KeySet, ProtocolConfig, TagRecord};

/// Where the master keys come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    /// No keys configured.
    None,
    /// One 160-byte file, data key first.
    Combined(PathBuf),
    /// Two 80-byte files.
    Separate { data_key: PathBuf, tag_key: PathBuf },
}

/// CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Master key files.
    pub keys: KeySource,
    /// PC/SC reader name filter.
    #[cfg_attr(not(feature = "pcsc"), allow(dead_code))]
    pub reader: Option<String>,
    /// Page protocol tunables.
    #[cfg_attr(not(feature = "pcsc"), allow(dead_code))]
    pub protocol: ProtocolConfig,
}

impl CliConfig {
    /// Builds the configuration from parsed arguments.
    ///
    /// A combined key file wins over separate files.
    pub fn from_args(
        keys: Option<PathBuf>,
        data_key: Option<PathBuf>,
        tag_key: Option<PathBuf>,
        reader: Option<String>,
        batch_size: u8,
    ) -> Self {
        let keys = match (keys, data_key, tag_key) {
            (Some(combined), _, _) => KeySource::Combined(combined),
            (None, Some(data_key), Some(tag_key)) => KeySource::Separate { data_key, tag_key },
            _ => KeySource::None,
        };
        CliConfig {
            keys,
            reader,
            protocol: ProtocolConfig {
                fast_read_batch_size: batch_size,
                ..ProtocolConfig::default()
            },
        }
    }

    /// Returns true if master keys are configured.
    pub fn has_keys(&self) -> bool {
        self.keys != KeySource::None
    }

    /// Loads the configured master keys.
    pub fn load_keys(&self) -> Result<KeySet> {
        match &self.keys {
            KeySource::Combined(path) => KeySet::load_combined(path)
                .with_context(|| format!("Failed to load key file {}", path.display())),
            KeySource::Separate { data_key, tag_key } => KeySet::load_separate(data_key, tag_key)
                .context("Failed to load master keys"),
            KeySource::None => {
                bail!("No master keys configured. Pass --keys or set TAGWALLET_KEYS.")
            }
        }
    }
}

/// Reads a tag dump from disk.
pub fn read_dump(path: &Path) -> Result<TagRecord> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    TagRecord::new(bytes).with_context(|| format!("{} is not a tag dump", path.display()))
}

/// Writes a tag dump to disk.
pub fn write_dump(path: &Path, record: &TagRecord) -> Result<()> {
    fs::write(path, record.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))
}

// INLINE_TEST_REQUIRED: Binary crate without lib.rs - tests cannot be external
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn key_file_bytes() -> Vec<u8> {
        let mut bytes: Vec<u8> = (0..160u32).map(|i| i as u8).collect();
        bytes[31] = 14;
        bytes[80 + 31] = 16;
        bytes
    }

    #[test]
    fn test_combined_key_file_wins() {
        let config = CliConfig::from_args(
            Some(PathBuf::from("keys.bin")),
            Some(PathBuf::from("data.bin")),
            Some(PathBuf::from("tag.bin")),
            None,
            0x20,
        );
        assert_eq!(config.keys, KeySource::Combined(PathBuf::from("keys.bin")));
    }

    #[test]
    fn test_separate_keys_need_both_files() {
        let config = CliConfig::from_args(None, Some(PathBuf::from("data.bin")), None, None, 0x20);
        assert!(!config.has_keys());
        assert!(config.load_keys().is_err());
    }

    #[test]
    fn test_batch_size_reaches_protocol_config() {
        let config = CliConfig::from_args(None, None, None, None, 0x10);
        assert_eq!(config.protocol.fast_read_batch_size, 0x10);
        assert_eq!(config.protocol.last_page, 0x86);
    }

    #[test]
    fn test_load_combined_keys() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("key_retail.bin");
        fs::write(&path, key_file_bytes()).unwrap();

        let config = CliConfig::from_args(Some(path), None, None, None, 0x20);
        let keys = config.load_keys().expect("should load keys");
        assert_eq!(keys.data_key.magic_bytes().len(), 14);
        assert_eq!(keys.static_key.magic_bytes().len(), 16);
    }

    #[test]
    fn test_read_dump_rejects_wrong_length() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("short.bin");
        fs::write(&path, vec![0u8; 531]).unwrap();
        let err = read_dump(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("531"));
    }
}
