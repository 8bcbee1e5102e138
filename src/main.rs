// Copyright © 2024 SiteForge. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # SiteForge CLI
//!
//! Main entry point for the `siteforge` binary. It initialises the logger
//! from the `-v` count (or `RUST_LOG`) and runs the selected subcommand.

use anyhow::Context;
use log::info;
use siteforge::cli;

/// Initialises logging and runs the command line.
fn run() -> anyhow::Result<()> {
    let matches = cli::build().get_matches();

    let level = match matches.get_count("verbose") {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(level),
    )
    .init();

    info!("Starting SiteForge v{}", cli::VERSION);
    cli::run(&matches).context("SiteForge command failed")?;
    Ok(())
}

/// The main entry point for the SiteForge CLI.
fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
