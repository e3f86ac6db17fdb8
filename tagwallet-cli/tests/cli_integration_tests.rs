// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! CLI Integration Tests
//!
//! Runs the `tagwallet` binary against synthetic dumps and key files.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

const SOURCE_UID: &str = "04A1B2C3D4E5F68000";
const TARGET_UID: &str = "043C5A927E112B80CE";

/// Helper to run CLI commands against files in an isolated directory
struct CliTestContext {
    dir: TempDir,
}

impl CliTestContext {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn path_str(&self, name: &str) -> String {
        self.path(name).to_string_lossy().into_owned()
    }

    /// Run a CLI command and return the output
    fn run(&self, args: &[&str]) -> Output {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_tagwallet"));
        for var in [
            "TAGWALLET_KEYS",
            "TAGWALLET_DATA_KEY",
            "TAGWALLET_TAG_KEY",
            "TAGWALLET_READER",
            "TAGWALLET_BATCH_SIZE",
        ] {
            cmd.env_remove(var);
        }
        cmd.args(args);
        cmd.output().expect("Failed to execute command")
    }

    /// Run a command and assert success
    fn run_success(&self, args: &[&str]) -> String {
        let output = self.run(args);
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        assert!(
            output.status.success(),
            "Command {:?} failed.\nStdout: {}\nStderr: {}",
            args,
            stdout,
            stderr
        );
        stdout
    }

    /// Run a command and assert failure
    fn run_failure(&self, args: &[&str]) -> String {
        let output = self.run(args);
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        assert!(
            !output.status.success(),
            "Command {:?} should have failed but succeeded",
            args
        );
        stderr
    }

    /// Writes a combined key file (data key first) and returns its path.
    fn write_keys(&self) -> String {
        let mut bytes = key_bytes(0xC3, 14);
        bytes.extend(key_bytes(0x5A, 16));
        fs::write(self.path("keys.bin"), bytes).unwrap();
        self.path_str("keys.bin")
    }

    /// Writes a 540-byte dump for `SOURCE_UID` and returns its path.
    fn write_dump(&self, name: &str, len: usize) -> String {
        let mut bytes: Vec<u8> = (0..len).map(|i| (i * 13 % 251) as u8).collect();
        bytes[0..9].copy_from_slice(&hex::decode(SOURCE_UID).unwrap());
        bytes[10] = 0;
        bytes[11] = 0;
        bytes[12..16].copy_from_slice(&[0xF1, 0x10, 0xFF, 0xEE]);
        bytes[16] = 0xA5;
        bytes[17..19].copy_from_slice(&[0x00, 0x07]);
        fs::write(self.path(name), bytes).unwrap();
        self.path_str(name)
    }
}

fn key_bytes(seed: u8, magic_len: u8) -> Vec<u8> {
    let mut bytes: Vec<u8> = (0..80u8)
        .map(|i| seed.wrapping_mul(31).wrapping_add(i))
        .collect();
    bytes[16..30].copy_from_slice(b"unfixed infos\0");
    bytes[30] = 0;
    bytes[31] = magic_len;
    bytes
}

// ===========================================================================
// Password
// ===========================================================================

#[test]
fn test_password_for_known_uid() {
    let ctx = CliTestContext::new();
    let stdout = ctx.run_success(&["password", SOURCE_UID]);
    assert_eq!(stdout.trim(), "DF028830");
}

#[test]
fn test_password_accepts_separators() {
    let ctx = CliTestContext::new();
    let stdout = ctx.run_success(&["password", "00:00:00:00:00:00:00:00:00"]);
    assert_eq!(stdout.trim(), "AA55AA55");
}

#[test]
fn test_password_rejects_short_uid() {
    let ctx = CliTestContext::new();
    let stderr = ctx.run_failure(&["password", "04A1B2"]);
    assert!(stderr.contains("Invalid UID"), "stderr: {}", stderr);
}

// ===========================================================================
// Inspect
// ===========================================================================

#[test]
fn test_inspect_without_keys() {
    let ctx = CliTestContext::new();
    let dump = ctx.write_dump("figure.bin", 540);

    let stdout = ctx.run_success(&["inspect", &dump]);
    assert!(stdout.contains(SOURCE_UID));
    assert!(stdout.contains("540 bytes"));
    assert!(!stdout.contains("Tag HMAC"));
}

#[test]
fn test_inspect_json_report() {
    let ctx = CliTestContext::new();
    let dump = ctx.write_dump("figure.bin", 572);

    let stdout = ctx.run_success(&["inspect", &dump, "--json"]);
    let report: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    assert_eq!(report["uid"], SOURCE_UID);
    assert_eq!(report["length"], 572);
    assert_eq!(report["write_counter"], 7);
    assert_eq!(report["locked"], false);
    assert_eq!(report["signed_record"], true);
    assert!(report.get("tag_hmac_valid").is_none());
}

#[test]
fn test_inspect_page_listing() {
    let ctx = CliTestContext::new();
    let dump = ctx.write_dump("figure.bin", 532);

    let stdout = ctx.run_success(&["inspect", &dump, "--pages"]);
    assert!(stdout.contains("Page #  0: 04 A1 B2 C3"));
    assert!(stdout.contains("Page #132:"));
}

#[test]
fn test_inspect_rejects_wrong_length() {
    let ctx = CliTestContext::new();
    let dump = ctx.write_dump("short.bin", 531);

    let stderr = ctx.run_failure(&["inspect", &dump]);
    assert!(stderr.contains("531"), "stderr: {}", stderr);
}

// ===========================================================================
// Keys
// ===========================================================================

#[test]
fn test_keys_prints_fingerprints() {
    let ctx = CliTestContext::new();
    let keys = ctx.write_keys();

    let stdout = ctx.run_success(&["--keys", &keys, "keys"]);
    assert!(stdout.contains("Data key:"));
    assert!(stdout.contains("Static key:"));
}

#[test]
fn test_keys_without_configuration_fails() {
    let ctx = CliTestContext::new();
    let stderr = ctx.run_failure(&["keys"]);
    assert!(stderr.contains("No master keys configured"));
}

#[test]
fn test_truncated_key_file_fails() {
    let ctx = CliTestContext::new();
    fs::write(ctx.path("keys.bin"), vec![0u8; 159]).unwrap();
    let keys = ctx.path_str("keys.bin");

    ctx.run_failure(&["--keys", &keys, "keys"]);
}

// ===========================================================================
// Patch
// ===========================================================================

#[test]
fn test_patch_then_inspect_verifies() {
    let ctx = CliTestContext::new();
    let keys = ctx.write_keys();
    let dump = ctx.write_dump("figure.bin", 540);
    let output = ctx.path_str("patched.bin");

    let stdout = ctx.run_success(&[
        "--keys", &keys, "patch", &dump, "--uid", TARGET_UID, "-o", &output,
    ]);
    assert!(stdout.contains(TARGET_UID));

    let patched = fs::read(&output).unwrap();
    assert_eq!(patched.len(), 540);
    assert_eq!(hex::encode_upper(&patched[0..9]), TARGET_UID);

    let report = ctx.run_success(&["--keys", &keys, "inspect", &output, "--json"]);
    let report: serde_json::Value = serde_json::from_str(&report).unwrap();
    assert_eq!(report["tag_hmac_valid"], true);
    assert_eq!(report["data_hmac_valid"], true);
}

#[test]
fn test_patch_with_random_salt_changes_salt() {
    let ctx = CliTestContext::new();
    let keys = ctx.write_keys();
    let dump = ctx.write_dump("figure.bin", 540);
    let output = ctx.path_str("patched.bin");

    ctx.run_success(&[
        "--keys", &keys, "patch", &dump, "--uid", TARGET_UID, "--random-salt", "-o", &output,
    ]);

    let source = fs::read(&dump).unwrap();
    let patched = fs::read(&output).unwrap();
    assert_ne!(source[96..128], patched[96..128]);
}

#[test]
fn test_patch_rejects_short_salt() {
    let ctx = CliTestContext::new();
    let keys = ctx.write_keys();
    let dump = ctx.write_dump("figure.bin", 540);
    let output = ctx.path_str("patched.bin");

    ctx.run_failure(&[
        "--keys", &keys, "patch", &dump, "--uid", TARGET_UID, "--salt", "0011", "-o", &output,
    ]);
    assert!(!ctx.path("patched.bin").exists());
}

#[test]
fn test_patch_salt_options_conflict() {
    let ctx = CliTestContext::new();
    let dump = ctx.write_dump("figure.bin", 540);

    ctx.run_failure(&[
        "patch", &dump, "--uid", TARGET_UID, "--salt", "00", "--random-salt", "-o", "out.bin",
    ]);
}

#[test]
fn test_patch_requires_keys() {
    let ctx = CliTestContext::new();
    let dump = ctx.write_dump("figure.bin", 540);
    let output = ctx.path_str("patched.bin");

    let stderr = ctx.run_failure(&["patch", &dump, "--uid", TARGET_UID, "-o", &output]);
    assert!(stderr.contains("No master keys configured"));
}

// ===========================================================================
// Completions
// ===========================================================================

#[test]
fn test_bash_completions() {
    let ctx = CliTestContext::new();
    let stdout = ctx.run_success(&["completions", "bash"]);
    assert!(stdout.contains("tagwallet"));
    assert!(stdout.contains("inspect"));
}
