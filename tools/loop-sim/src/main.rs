//! Loop Sim - headless driver for chronoloop levels
//!
//! # Commands
//!
//! - `loop-sim run <level.toml>` - Simulate a level and report every rewind
//! - `loop-sim check <level.toml>` - Validate a level file
//!
//! # Usage
//!
//! ```bash
//! # Stand still until the first loop expires
//! loop-sim run demos/corridor.toml --seconds 70
//!
//! # Replay a scripted run with debug logging
//! loop-sim run demos/corridor.toml --script demos/dash-through.toml --verbose
//! ```
//!
//! # Input script
//!
//! ```toml
//! [[segment]]
//! duration = 0.5
//! move_x = 1.0
//!
//! [[segment]]
//! duration = 0.02
//! move_x = 1.0
//! dash = true
//! ```
//!
//! Level paths that do not exist relative to the working directory are
//! looked up in the per-user levels directory.

mod check;
mod levels;
mod run;
mod script;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Loop Sim - headless driver for chronoloop levels
#[derive(Parser)]
#[command(name = "loop-sim")]
#[command(about = "Headless driver for chronoloop levels")]
#[command(version)]
struct Cli {
    /// Log at debug level regardless of RUST_LOG
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a level and report every rewind
    Run(run::RunArgs),

    /// Parse and validate a level file
    Check(check::CheckArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Run(args) => run::execute(args),
        Commands::Check(args) => check::execute(args),
    }
}
