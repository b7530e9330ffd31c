//! cdeps CLI - build dependencies for C/C++ source trees.
//!
//! Usage:
//!   cdeps make [ENTRY] [-o Makefile]   # Makefile for ENTRY's closure
//!   cdeps dot [ENTRY] [--collapse]     # Graphviz graph
//!   cdeps deps [ENTRY]                 # Dependency tables as JSON
//!   cdeps list [ENTRY]                 # Reachable files
//!   cdeps cycles [ENTRY]               # Include cycles
//!   cdeps stats                        # Scan statistics

use anyhow::{Context, Result};
use cdeps::cli::{render, Cli};
use clap::Parser;
use std::io::Write;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    // stdout carries only the rendered artifact
    let default_filter = if cli.verbose { "warn,cdeps=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.load_config()?;
    debug!(config = %cli.config_path().display(), "configuration ready");

    let rendered = render(&cli.command, &cli.root, &config)?;

    match rendered.output {
        Some(path) => {
            std::fs::write(&path, &rendered.text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), bytes = rendered.text.len(), "wrote output");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(rendered.text.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}
