//! keymuxctl - multi-keyboard command-line tool
//!
//! Lists attached keyboards, watches them come and go, and prints key
//! presses tagged with the keyboard that produced them.

#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod commands;
mod error;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use keymux_engine::KeyboardId;

use crate::commands::GlobalOptions;

#[derive(Parser, Debug)]
#[command(name = "keymuxctl")]
#[command(about = "List, monitor and listen to several keyboards at once")]
#[command(version)]
#[command(long_about = "
keymuxctl enumerates HID keyboards, reports them as they are plugged in and
removed, and prints every key press tagged with the keyboard it came from.

Use --json for one JSON document per line, suitable for piping.
")]
struct Cli {
    #[arg(long, global = true, help = "Output in JSON format for machine parsing")]
    json: bool,

    /// Verbose logging (repeat for more)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file (defaults to the per-user config)
    #[arg(long, global = true, env = "KEYMUX_CONFIG")]
    config: Option<PathBuf>,

    /// Override the enumeration interval in milliseconds
    #[arg(long, global = true)]
    interval_ms: Option<u64>,

    /// Use this many simulated keyboards instead of hardware (for testing)
    #[arg(long, global = true, env = "KEYMUXCTL_MOCK_KEYBOARDS", hide = true)]
    mock_keyboards: Option<u8>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List attached keyboards
    List {
        /// Show every HID collection, not only keyboards
        #[arg(short, long)]
        all: bool,
    },

    /// Print keyboard connect and disconnect events until Ctrl-C
    Monitor,

    /// Print key presses from several keyboards
    Listen {
        /// Stop after this many seconds
        #[arg(short, long)]
        duration: Option<u64>,

        /// Keyboard id to listen to (repeatable; defaults to all connected)
        #[arg(short, long = "keyboard", value_name = "ID")]
        keyboards: Vec<KeyboardId>,
    },
}

impl Cli {
    fn global_options(&self) -> GlobalOptions {
        GlobalOptions {
            json: self.json,
            config: self.config.clone(),
            interval_ms: self.interval_ms,
            mock_keyboards: self.mock_keyboards,
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "keymuxctl={level},keymux_engine={level},keymux_hid={level}"
            ))
        }))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match execute_command(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                output::print_error_json(&e);
            } else {
                output::print_error_human(&e);
            }
            ExitCode::from(error::exit_code_for(&e))
        }
    }
}

async fn execute_command(cli: &Cli) -> Result<()> {
    let opts = cli.global_options();
    match &cli.command {
        Commands::List { all } => commands::list::execute(&opts, *all).await,
        Commands::Monitor => commands::monitor::execute(&opts).await,
        Commands::Listen {
            duration,
            keyboards,
        } => {
            let duration = duration.map(Duration::from_secs);
            commands::listen::execute(&opts, duration, keyboards).await
        }
    }
}
