//! Declarative convergence CLI.
//!
//! Reads a playbook of declared actions, runs each one only when the system has
//! not converged yet, and prints one JSON result per action on stdout.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use converge::apply::run_apply;
use converge::core::result::ActionResult;
use converge::exit_codes;
use converge::io::config::DEFAULT_CONFIG_PATH;
use converge::io::playbook::load_playbook;
use converge::logging::{self, LogLevel};

#[derive(Parser)]
#[command(
    name = "converge",
    version,
    about = "Idempotent check-then-act runner for declared system state"
)]
struct Cli {
    /// Logging level; overrides `RUST_LOG`.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Converge every action in the playbook and print one JSON result per line.
    Apply {
        /// Playbook file (TOML, or JSON with a `.json` extension).
        playbook: PathBuf,

        /// Engine config file; defaults apply if it does not exist.
        #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },
    /// Check the playbook structure and decode every action without running any.
    Validate {
        /// Playbook file (TOML, or JSON with a `.json` extension).
        playbook: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.log_level);
    match run(cli.command) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run(command: Command) -> Result<i32> {
    match command {
        Command::Apply { playbook, config } => cmd_apply(&playbook, &config),
        Command::Validate { playbook } => cmd_validate(&playbook),
    }
}

fn cmd_apply(playbook: &Path, config: &Path) -> Result<i32> {
    let report = run_apply(playbook, config)?;
    let mut stdout = io::stdout().lock();
    for result in &report.results {
        write_result(&mut stdout, result)?;
    }
    stdout.flush().context("flush stdout")?;
    Ok(report.exit_code())
}

fn cmd_validate(playbook: &Path) -> Result<i32> {
    let loaded = load_playbook(playbook)?;
    let errors: Vec<String> = loaded
        .decode_errors()
        .map(|(entry, err)| format!("action[{}] ({}): {}", entry.index, entry.module_name(), err))
        .collect();
    if !errors.is_empty() {
        eprintln!("invalid playbook:\n- {}", errors.join("\n- "));
        return Ok(exit_codes::INVALID);
    }
    println!("{} action(s) ok", loaded.entries.len());
    Ok(exit_codes::OK)
}

fn write_result<W: Write>(out: &mut W, result: &ActionResult) -> Result<()> {
    let line = serde_json::to_string(result).context("serialize result")?;
    writeln!(out, "{line}").context("write result")
}
