// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Display Helpers
//!
//! Terminal output formatting and styling.

use console::style;
use serde::Serialize;
use tagwallet_core::{RecordFormat, SignatureCheck, TagRecord};

/// Prints a success message.
pub fn success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Prints a warning message.
pub fn warning(msg: &str) {
    println!("{} {}", style("⚠").yellow().bold(), msg);
}

/// Prints an info message.
pub fn info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Machine-readable summary of a record.
#[derive(Debug, Serialize)]
pub struct RecordReport {
    pub uid: String,
    pub length: usize,
    pub format: &'static str,
    pub write_counter: u16,
    pub head: String,
    pub tail: String,
    pub locked: bool,
    pub signed_record: bool,
    pub fingerprint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_hmac_valid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_hmac_valid: Option<bool>,
}

impl RecordReport {
    pub fn new(record: &TagRecord, check: Option<SignatureCheck>) -> Self {
        RecordReport {
            uid: record.uid().to_string(),
            length: record.len(),
            format: format_name(record.format()),
            write_counter: record.write_counter(),
            head: record.head_hex(),
            tail: record.tail_hex(),
            locked: record.is_locked(),
            signed_record: record.is_signed_record(),
            fingerprint: record.fingerprint(),
            tag_hmac_valid: check.map(|c| c.tag_hmac_valid),
            data_hmac_valid: check.map(|c| c.data_hmac_valid),
        }
    }
}

fn format_name(format: RecordFormat) -> &'static str {
    match format {
        RecordFormat::Ntag532 => "532",
        RecordFormat::Ntag540 => "540",
        RecordFormat::Ntag572 => "572",
    }
}

fn yes_no(value: bool) -> console::StyledObject<&'static str> {
    if value {
        style("yes").green()
    } else {
        style("no").dim()
    }
}

fn valid(value: bool) -> console::StyledObject<&'static str> {
    if value {
        style("valid").green()
    } else {
        style("INVALID").red().bold()
    }
}

/// Displays a record summary in a formatted box.
pub fn display_record(report: &RecordReport) {
    let width = 48;

    println!("{}", "─".repeat(width));
    println!("  {}", style(&report.uid).bold().cyan());
    println!("{}", "─".repeat(width));

    println!("  {:16} {} bytes", style("Length").dim(), report.length);
    println!("  {:16} {}", style("Write counter").dim(), report.write_counter);
    println!("  {:16} {} {}", style("Character").dim(), report.head, report.tail);
    println!("  {:16} {}", style("Signed record").dim(), yes_no(report.signed_record));
    println!("  {:16} {}", style("Locked").dim(), yes_no(report.locked));
    if let (Some(tag), Some(data)) = (report.tag_hmac_valid, report.data_hmac_valid) {
        println!("  {:16} {}", style("Tag HMAC").dim(), valid(tag));
        println!("  {:16} {}", style("Data HMAC").dim(), valid(data));
    }
    println!("  {:16} {}", style("SHA-256").dim(), &report.fingerprint[..16]);

    println!("{}", "─".repeat(width));
}
