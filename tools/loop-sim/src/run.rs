//! Run command - simulate a level headlessly
//!
//! Frames are fed at the level's fixed step, so one frame runs exactly one
//! fixed tick. Every rewind is reported as it starts.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chronoloop_core::{GaugeFractions, Level, LevelBuilder};
use chronoloop_shared::{AudioCue, LevelConfig};
use clap::Args;
use glam::Vec2;

use crate::levels;
use crate::script::InputScript;

/// Simulated time when neither `--seconds` nor a script says otherwise
const DEFAULT_SECONDS: f32 = 30.0;

/// Arguments for the run command
#[derive(Args)]
pub struct RunArgs {
    /// Level TOML file
    pub level: PathBuf,

    /// Input script TOML (idle controller when omitted)
    #[arg(short, long)]
    pub script: Option<PathBuf>,

    /// Seconds to simulate (defaults to the script length)
    #[arg(long)]
    pub seconds: Option<f32>,
}

/// State of the level at the start of one rewind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewindReport {
    pub index: u32,
    /// Simulated seconds since the level started
    pub time: f32,
    pub position: Vec2,
    /// Budget of the next loop, after shrinking
    pub time_available: f32,
    pub deaths: u32,
}

/// Outcome of a whole simulation
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub rewinds: Vec<RewindReport>,
    pub gauges: GaugeFractions,
    pub deaths: u32,
    pub cues: Vec<AudioCue>,
    pub seconds: f32,
}

/// Execute the run command
pub fn execute(args: RunArgs) -> Result<()> {
    let (config, _warnings) = levels::load(&args.level)?;
    let script = match &args.script {
        Some(path) => InputScript::load(path)?,
        None => InputScript::default(),
    };
    let seconds = args.seconds.unwrap_or_else(|| {
        if script.segments.is_empty() {
            DEFAULT_SECONDS
        } else {
            script.total_duration()
        }
    });
    check_seconds(seconds)?;

    let summary = simulate(config, &script, seconds)
        .with_context(|| format!("Failed to build level {}", args.level.display()))?;

    for report in &summary.rewinds {
        println!(
            "rewind {:>3} at {:>7.2}s  pos ({:>6.2}, {:>6.2})  deaths {:>2}  next loop {:>6.2}s",
            report.index,
            report.time,
            report.position.x,
            report.position.y,
            report.deaths,
            report.time_available
        );
    }
    println!(
        "{:.2}s simulated, {} rewind(s), {} death(s), {} cue(s)",
        summary.seconds,
        summary.rewinds.len(),
        summary.deaths,
        summary.cues.len()
    );
    println!(
        "gauges: available {:.3}  remaining {:.3}  removed {:.3}",
        summary.gauges.available, summary.gauges.remaining, summary.gauges.removed
    );

    Ok(())
}

fn check_seconds(seconds: f32) -> Result<()> {
    if !seconds.is_finite() || seconds <= 0.0 {
        anyhow::bail!("--seconds must be a positive finite number, got {seconds}");
    }
    Ok(())
}

/// Run `config` for `seconds` of simulated time under `script`
pub fn simulate(config: LevelConfig, script: &InputScript, seconds: f32) -> Result<Summary> {
    check_seconds(seconds)?;
    let mut level = LevelBuilder::from_config(config).build()?;
    level.initialize();

    let fixed_dt = level.fixed_dt();
    let frame = level.tick_duration();
    let frames = (seconds / fixed_dt).round().max(1.0) as u64;

    let mut rewinds = Vec::new();
    let mut cues = Vec::new();
    for index in 0..frames {
        let time = index as f32 * fixed_dt;
        let before = level.rewind_count();
        level.frame(frame, script.input_at(time));

        if level.rewind_count() > before {
            let report = report(&level, time + fixed_dt);
            tracing::debug!(?report, "rewind observed");
            rewinds.push(report);
        }
        for cue in level.drain_cues() {
            tracing::trace!(%cue, time, "cue");
            cues.push(cue);
        }
    }

    let summary = Summary {
        rewinds,
        gauges: level.gauges(),
        deaths: level.controller().deaths(),
        cues,
        seconds: frames as f32 * fixed_dt,
    };
    level.teardown();
    Ok(summary)
}

fn report(level: &Level, time: f32) -> RewindReport {
    RewindReport {
        index: level.rewind_count(),
        time,
        position: level.player_position(),
        time_available: level.loop_timer().budget().time_available,
        deaths: level.controller().deaths(),
    }
}
