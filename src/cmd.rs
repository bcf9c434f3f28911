use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use fim_common::error::report_err;
use termcolor::{ColorChoice, StandardStream};

#[derive(Debug, Parser)]
#[clap(about, author, disable_help_subcommand = true, propagate_version = true, version)]
pub enum Cmd {
    /// Run a program.
    Run {
        path: PathBuf,
        /// Directory searched for imported modules [default: the program's
        /// directory]
        #[clap(long)]
        base_dir: Option<PathBuf>,
    },
}

impl Cmd {
    pub fn run(&self) -> Result<()> {
        match self {
            Cmd::Run { path, base_dir } => run(path, base_dir.as_deref()),
        }
    }
}

fn run(path: &Path, base_dir: Option<&Path>) -> Result<()> {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            println!("File not found");
            return Ok(());
        }
        Err(e) => return Err(e).with_context(|| format!("could not read {}", path.display())),
    };
    let base_dir = match base_dir {
        Some(base_dir) => base_dir,
        None => path.parent().filter(|dir| !dir.as_os_str().is_empty()).unwrap_or_else(|| Path::new(".")),
    };
    tracing::debug!(path = %path.display(), base_dir = %base_dir.display(), "running program");

    let mut stdout = io::stdout().lock();
    let mut stdin = io::stdin().lock();
    if let Err(e) = fim_interpreter::interpret(&source, base_dir, &mut stdout, &mut stdin) {
        writeln!(stdout, "{e}")?;
        stdout.flush()?;
        let mut stderr = StandardStream::stderr(ColorChoice::Auto);
        report_err(&mut stderr, &path.display().to_string(), &source, &e)
            .context("could not render the error report")?;
    }
    Ok(())
}
