//! Check command - validate a level file

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::levels;

/// Arguments for the check command
#[derive(Args)]
pub struct CheckArgs {
    /// Level TOML file
    pub level: PathBuf,
}

/// Execute the check command
pub fn execute(args: CheckArgs) -> Result<()> {
    let (config, warnings) = levels::load(&args.level)?;

    println!("Level {} is valid", args.level.display());
    if !warnings.is_empty() {
        println!("  {} value(s) clamped:", warnings.len());
        for warning in &warnings {
            println!("    - {warning}");
        }
    }
    println!("  Snapshot capacity: {}", config.recorder.max_snapshots());
    println!(
        "  Loop budget: {:.1}s (floor {:.1}s)",
        config.loop_timer.max_time, config.loop_timer.min_time
    );
    println!(
        "  Fixed step: {} Hz, frames clamped to {} ms",
        config.sim.tick_rate, config.sim.max_delta_ms
    );
    println!(
        "  Geometry: {} platform(s), {} hazard(s), {} pickup(s)",
        config.platforms.len(),
        config.hazards.len(),
        config.pickups.len()
    );

    Ok(())
}
