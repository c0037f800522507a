//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "catscale", version, about = "Cat-scale event pipeline")]
pub struct Cli {
    /// Path to config TOML (typed); defaults are used when the file is absent
    #[arg(long, value_name = "FILE", default_value = "etc/catscale.toml")]
    pub config: PathBuf,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Drive the live pipeline against a synthetic load cell
    Run {
        /// Stop after this many seconds (0 = run until Ctrl-C)
        #[arg(long, default_value_t = 60)]
        duration_s: u64,

        /// Synthetic cat weight in grams
        #[arg(long, default_value_t = 4200.0)]
        cat_grams: f64,

        /// RNG seed for the synthetic signal
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Write event records to this file instead of stdout
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Replay a recorded weight trace through the cascade offline
    Simulate {
        /// CSV trace with headers: timestamp,raw
        #[arg(long, value_name = "FILE")]
        input: PathBuf,

        /// Write event records to this file instead of stdout
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}
