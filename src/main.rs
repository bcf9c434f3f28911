mod cmd;

use std::panic;
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cmd::Cmd;

/// Stack for the interpreter thread, deep enough that the interpreter's own
/// recursion limit is always reached first.
const STACK_SIZE: usize = 256 * 1024 * 1024;

fn main() -> Result<()> {
    human_panic::setup_panic!();
    install_tracing();

    let cmd = Cmd::parse();
    let handle = thread::Builder::new()
        .name("fimpp".to_string())
        .stack_size(STACK_SIZE)
        .spawn(move || cmd.run())
        .context("could not start the interpreter thread")?;
    match handle.join() {
        Ok(result) => result,
        Err(payload) => panic::resume_unwind(payload),
    }
}

fn install_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
