//! phurple: inspect account strings and manage binding profiles.
//!
//! Profiles live under the platform data directory and hold the UI id,
//! the protocol list and the log filter a session is built with.

#![allow(
    missing_docs,
    missing_debug_implementations,
    clippy::print_stderr,
    clippy::print_stdout
)]

mod cmd;

use std::process;

use clap::Parser;

use crate::cmd::config::{self, ProfileConfig};
use crate::cmd::{Cli, Command, account, profile};

fn main() {
    if let Err(e) = run() {
        eprintln!("fatal: {e}");
        process::exit(1);
    }
}

fn run() -> phurple::Result<()> {
    let cli = Cli::parse();
    let name = cli.profile.clone().unwrap_or_else(config::default_profile);

    // `new` creates the config it would otherwise load.
    if let Command::New(ref args) = cli.command {
        phurple::init_logger(cli.log_level.as_deref())?;
        return profile::create(args).map(drop);
    }

    let cfg = ProfileConfig::load_or_default(&name)?;
    phurple::init_logger(Some(cli.log_level.as_deref().unwrap_or(&cfg.log_level)))?;
    tracing::debug!(profile = %name, ui_id = %cfg.ui_id, "profile loaded");

    match cli.command {
        Command::Parse { dsn } => account::parse(&dsn),
        Command::Protocols => {
            account::protocols(&cfg);
            Ok(())
        }
        Command::Add { dsn } => account::add(&cfg, &dsn),
        Command::List => profile::list(),
        Command::Remove { name } => profile::remove(&name),
        Command::Config { set } => profile::configure(&name, cfg, &set),
        Command::Default { name } => profile::default(name.as_deref()),
        Command::New(_) => Ok(()),
    }
}
