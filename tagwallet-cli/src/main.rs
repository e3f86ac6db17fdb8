// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! TagWallet CLI
//!
//! Command-line interface for TagWallet - inspect, patch and write NTAG215
//! figure records.

mod commands;
mod config;
mod display;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::EnvFilter;

use config::CliConfig;

#[derive(Parser)]
#[command(name = "tagwallet")]
#[command(version, about = "Re-personalize NTAG215 figure records")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Combined 160-byte key file (data key followed by static key)
    #[arg(long, global = true, env = "TAGWALLET_KEYS")]
    keys: Option<PathBuf>,

    /// Separate 80-byte data key ("unfixed infos")
    #[arg(long, global = true, env = "TAGWALLET_DATA_KEY", requires = "tag_key")]
    data_key: Option<PathBuf>,

    /// Separate 80-byte static key ("locked secret")
    #[arg(long, global = true, env = "TAGWALLET_TAG_KEY", requires = "data_key")]
    tag_key: Option<PathBuf>,

    /// PC/SC reader to use (substring of the reader name)
    #[arg(long, global = true, env = "TAGWALLET_READER")]
    reader: Option<String>,

    /// Pages per FAST_READ command
    #[arg(long, global = true, env = "TAGWALLET_BATCH_SIZE", default_value_t = 0x20,
          value_parser = clap::value_parser!(u8).range(1..))]
    batch_size: u8,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show what a tag dump contains
    Inspect {
        /// Dump file (532, 540 or 572 bytes)
        dump: PathBuf,

        /// Print every page
        #[arg(long)]
        pages: bool,

        /// Print a JSON report instead of text
        #[arg(long)]
        json: bool,
    },

    /// Re-personalize a dump for another tag UID
    Patch {
        /// Source dump file
        dump: PathBuf,

        /// Target UID, 9 bytes of hex
        #[arg(long)]
        uid: String,

        /// Replacement keygen salt, 32 bytes of hex
        #[arg(long, conflicts_with = "random_salt")]
        salt: Option<String>,

        /// Replace the keygen salt with random bytes
        #[arg(long)]
        random_salt: bool,

        /// Treat the stored payload as already decrypted
        #[arg(long)]
        skip_decrypt: bool,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Print the PWD_AUTH password for a UID
    Password {
        /// UID, 9 bytes of hex
        uid: String,
    },

    /// Show fingerprints of the configured master keys
    Keys,

    /// Dump the tag on the reader
    #[cfg(feature = "pcsc")]
    Read {
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Patch a dump for the blank tag on the reader and write it
    #[cfg(feature = "pcsc")]
    Write {
        /// Source dump file
        dump: PathBuf,
    },

    /// Rewrite the application data of a tag written earlier
    #[cfg(feature = "pcsc")]
    Restore {
        /// Dump holding the application data to restore
        dump: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(verbose: bool) -> Result<()> {
    let directive = if verbose {
        "tagwallet=debug"
    } else {
        "tagwallet=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive.parse()?))
        .with_writer(io::stderr)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let config = CliConfig::from_args(
        cli.keys,
        cli.data_key,
        cli.tag_key,
        cli.reader,
        cli.batch_size,
    );

    match cli.command {
        Commands::Inspect { dump, pages, json } => {
            commands::inspect::run(&dump, pages, json, &config)?;
        }
        Commands::Patch {
            dump,
            uid,
            salt,
            random_salt,
            skip_decrypt,
            output,
        } => {
            let salt = commands::patch::SaltChoice::from_args(salt, random_salt);
            commands::patch::run(&dump, &uid, salt, skip_decrypt, &output, &config)?;
        }
        Commands::Password { uid } => {
            commands::password::run(&uid)?;
        }
        Commands::Keys => {
            commands::keys::run(&config)?;
        }
        #[cfg(feature = "pcsc")]
        Commands::Read { output } => {
            commands::reader::read(&output, &config)?;
        }
        #[cfg(feature = "pcsc")]
        Commands::Write { dump } => {
            commands::reader::write(&dump, &config)?;
        }
        #[cfg(feature = "pcsc")]
        Commands::Restore { dump } => {
            commands::reader::restore(&dump, &config)?;
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "tagwallet", &mut io::stdout());
        }
    }

    Ok(())
}
