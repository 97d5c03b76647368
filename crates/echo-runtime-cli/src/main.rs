// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Echo core runtime demo: a small CLI that wires the hash registry,
//! message bus, resource factory, and scene graph together end to end,
//! so the four subsystems' integration can be exercised without a full
//! engine host.
#![deny(rust_2018_idioms)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]
#![allow(clippy::print_stdout, clippy::print_stderr, clippy::multiple_crate_versions)]

mod demo;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Echo core runtime demo CLI.
#[derive(Parser)]
#[command(name = "echo-runtime", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Runs the wired demo: loads a resource, posts a message, and
    /// advances a scene by one frame, printing what each subsystem did.
    Demo {
        /// Directory the demo writes its fixture resource into (a
        /// temporary directory is used if omitted).
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// Hashes `text` with `echo-hashreg`'s MurmurHash2A and prints the
    /// 32- and 64-bit results.
    Hash {
        /// The text to hash.
        text: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Demo { root } => demo::run(root),
        Command::Hash { text } => {
            println!("hash32: {:#010x}", echo_hashreg::hash_str32(&text));
            println!("hash64: {:#018x}", echo_hashreg::hash_str64(&text));
            Ok(())
        }
    }
}
