//! Scripted controller input
//!
//! A script is an ordered list of segments, each holding one input state for
//! a number of seconds. Past the last segment the controller is idle.

use std::path::Path;

use anyhow::{Context, Result};
use chronoloop_core::ControllerInput;
use serde::Deserialize;

/// One held input state
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Segment {
    pub duration: f32,
    #[serde(default)]
    pub move_x: f32,
    #[serde(default)]
    pub jump: bool,
    #[serde(default)]
    pub dash: bool,
    #[serde(default)]
    pub crouch: bool,
}

impl Segment {
    fn input(&self) -> ControllerInput {
        ControllerInput {
            move_x: self.move_x,
            jump: self.jump,
            dash: self.dash,
            crouch: self.crouch,
        }
    }
}

/// Input script loaded from TOML
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InputScript {
    #[serde(default, rename = "segment")]
    pub segments: Vec<Segment>,
}

impl InputScript {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let script: Self = toml::from_str(content).context("Failed to parse input script")?;
        let invalid = script
            .segments
            .iter()
            .find(|segment| segment.duration < 0.0 || segment.duration.is_nan());
        if let Some(segment) = invalid {
            anyhow::bail!("Segment duration must be non-negative, got {}", segment.duration);
        }
        Ok(script)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input script {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid input script {}", path.display()))
    }

    /// Sum of all segment durations
    pub fn total_duration(&self) -> f32 {
        self.segments.iter().map(|segment| segment.duration).sum()
    }

    /// Input held at `time` seconds into the script
    pub fn input_at(&self, time: f32) -> ControllerInput {
        let mut start = 0.0;
        for segment in &self.segments {
            let end = start + segment.duration;
            if time < end {
                return segment.input();
            }
            start = end;
        }
        ControllerInput::idle()
    }
}
