//! Level tuning (`level.toml`)
//!
//! Every tunable of the rewind core, grouped per component. Missing keys fall
//! back to the defaults the game ships with, so an empty file is a valid
//! level (flat, no hazards, default feel).

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Complete configuration for one level load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LevelConfig {
    /// Snapshot recorder settings
    #[serde(default)]
    pub recorder: RecorderTuning,
    /// Loop budget settings
    #[serde(default, rename = "loop")]
    pub loop_timer: LoopTuning,
    /// Player movement feel
    #[serde(default)]
    pub movement: MovementTuning,
    /// Rewind overlay fade
    #[serde(default)]
    pub overlay: OverlayTuning,
    /// Squash and stretch of the player visual
    #[serde(default)]
    pub squash: SquashTuning,
    /// Fixed-step scheduler
    #[serde(default)]
    pub sim: SimTuning,
    /// Player body at spawn
    #[serde(default)]
    pub body: BodyTuning,
    /// Where the player reappears after a rewind (defaults to the spawn point)
    #[serde(default)]
    pub respawn_anchor: Option<Vec2>,
    /// Solid ground boxes
    #[serde(default, rename = "platform")]
    pub platforms: Vec<PlatformDef>,
    /// Hazard boxes, optionally switching on and off
    #[serde(default, rename = "hazard")]
    pub hazards: Vec<HazardDef>,
    /// Collectible pickups
    #[serde(default, rename = "pickup")]
    pub pickups: Vec<PickupDef>,
}

/// Snapshot recorder configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecorderTuning {
    /// Longest stretch of history kept, in seconds (default: 1200)
    #[serde(default = "default_max_record_duration")]
    pub max_record_duration: f32,
    /// Seconds between two snapshots (default: 0.2)
    #[serde(default = "default_record_interval")]
    pub record_interval: f32,
    /// Wall time of the whole backward walk, whatever the history length (default: 3)
    #[serde(default = "default_rewind_total_duration")]
    pub rewind_total_duration: f32,
    /// Freeze before the walk starts (default: 0.4)
    #[serde(default = "default_rewind_delay")]
    pub rewind_delay: f32,
    /// Hold on the oldest snapshot before control returns (default: 0.2)
    #[serde(default = "default_settle_delay")]
    pub settle_delay: f32,
}

/// Loop budget configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopTuning {
    /// Budget at level start, in seconds (default: 60)
    #[serde(default = "default_max_time")]
    pub max_time: f32,
    /// Floor the budget never shrinks below (default: 5)
    #[serde(default = "default_min_time")]
    pub min_time: f32,
    /// Fraction of the consumed time removed from the next budget (default: 0.5)
    #[serde(default = "default_remove_time_mult")]
    pub remove_time_mult: f32,
}

/// Player movement configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementTuning {
    pub move_speed: f32,
    pub acceleration: f32,
    pub deceleration: f32,
    pub max_horizontal_speed: f32,

    pub jump_force: f32,
    pub fall_gravity_multiplier: f32,
    pub low_jump_multiplier: f32,
    pub coyote_time: f32,
    pub jump_buffer_time: f32,

    pub dash_added_speed: f32,
    pub dash_duration: f32,
    pub dash_cooldown: f32,
    /// Invulnerability granted by a dash, never longer than the dash itself
    pub dash_invincibility: f32,

    pub slide_added_speed: f32,
    pub slide_duration: f32,
    pub slide_deceleration: f32,
    /// Horizontal speed a crouch needs to turn into a slide
    pub slide_min_speed: f32,

    pub crouch_size: Vec2,
    pub crouch_offset: Vec2,
    pub crouch_speed: f32,

    pub ground_check_radius: f32,
    /// Ground probe position relative to the body origin
    pub ground_check_offset: Vec2,

    /// Seconds between footstep cues while running
    pub footstep_interval: f32,
    /// World gravity along y (negative is down)
    pub gravity: f32,
}

/// Rewind overlay fade configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayTuning {
    #[serde(default = "default_fade_in")]
    pub fade_in_duration: f32,
    #[serde(default = "default_fade_out")]
    pub fade_out_duration: f32,
    #[serde(default = "default_max_glitch")]
    pub max_glitch: f32,
    #[serde(default = "default_max_grain")]
    pub max_grain: f32,
    #[serde(default = "default_max_scanline")]
    pub max_scanline: f32,
}

/// Squash and stretch configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SquashTuning {
    /// Vertical speed at which the airborne stretch/squash saturates
    pub max_velocity_y: f32,
    pub max_stretch_y: f32,
    pub max_squash_y: f32,
    pub air_lerp_speed: f32,

    pub land_squash_y: f32,
    pub land_squash_duration: f32,
    pub land_recover_duration: f32,

    /// Run speed at which the running lean saturates
    pub run_speed_reference: f32,

    pub jump_anticipate_squash: f32,
    pub jump_anticipate_stretch: f32,
    pub jump_anticipate_time: f32,

    pub dash_stretch_x: f32,
    pub dash_squash_y: f32,
    pub dash_lerp_speed: f32,

    pub slide_squash_y: f32,
    pub slide_lerp_speed: f32,

    pub return_lerp_speed: f32,
}

/// Fixed-step scheduler configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimTuning {
    /// Fixed steps per second (default: 50)
    #[serde(default = "default_tick_rate")]
    pub tick_rate: u32,
    /// Frame delta clamp in milliseconds (default: 100)
    #[serde(default = "default_max_delta_ms")]
    pub max_delta_ms: u32,
}

/// Player body at spawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyTuning {
    #[serde(default)]
    pub spawn: Vec2,
    #[serde(default = "default_collider_size")]
    pub collider_size: Vec2,
    #[serde(default)]
    pub collider_offset: Vec2,
}

/// Solid axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlatformDef {
    pub min: Vec2,
    pub max: Vec2,
}

/// Hazard box. With `switch_period` set it toggles on and off.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HazardDef {
    pub min: Vec2,
    pub max: Vec2,
    #[serde(default)]
    pub switch_period: Option<f32>,
}

/// Collectible placed in the level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PickupDef {
    pub position: Vec2,
    #[serde(default = "default_pickup_radius")]
    pub radius: f32,
    #[serde(flatten)]
    pub kind: PickupKind,
}

/// What a pickup does to the loop budget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PickupKind {
    /// Grant extra seconds to the current budget
    AddTime { seconds: f32 },
    /// Slow the loop countdown for a while
    SlowMotion { factor: f32, duration: f32 },
}

fn default_max_record_duration() -> f32 {
    1200.0
}
fn default_record_interval() -> f32 {
    0.2
}
fn default_rewind_total_duration() -> f32 {
    3.0
}
fn default_rewind_delay() -> f32 {
    0.4
}
fn default_settle_delay() -> f32 {
    0.2
}

fn default_max_time() -> f32 {
    60.0
}
fn default_min_time() -> f32 {
    5.0
}
fn default_remove_time_mult() -> f32 {
    0.5
}

fn default_fade_in() -> f32 {
    0.3
}
fn default_fade_out() -> f32 {
    0.4
}
fn default_max_glitch() -> f32 {
    0.6
}
fn default_max_grain() -> f32 {
    0.35
}
fn default_max_scanline() -> f32 {
    0.4
}

fn default_tick_rate() -> u32 {
    50
}
fn default_max_delta_ms() -> u32 {
    100
}

fn default_collider_size() -> Vec2 {
    Vec2::new(0.8, 1.6)
}
fn default_pickup_radius() -> f32 {
    0.5
}

impl Default for RecorderTuning {
    fn default() -> Self {
        Self {
            max_record_duration: default_max_record_duration(),
            record_interval: default_record_interval(),
            rewind_total_duration: default_rewind_total_duration(),
            rewind_delay: default_rewind_delay(),
            settle_delay: default_settle_delay(),
        }
    }
}

impl RecorderTuning {
    /// Capacity of the history ring: `ceil(max_record_duration / record_interval)`.
    ///
    /// Both values are taken at their shortest decimal form in `f64`, so an
    /// exact ratio such as `10 / 0.2` does not round up to 51.
    pub fn max_snapshots(&self) -> usize {
        let ratio = decimal(self.max_record_duration) / decimal(self.record_interval);
        let nearest = ratio.round();
        let snapshots = if (ratio - nearest).abs() <= nearest * 1e-9 {
            nearest
        } else {
            ratio.ceil()
        };
        snapshots.max(1.0) as usize
    }
}

impl Default for LoopTuning {
    fn default() -> Self {
        Self {
            max_time: default_max_time(),
            min_time: default_min_time(),
            remove_time_mult: default_remove_time_mult(),
        }
    }
}

impl Default for MovementTuning {
    fn default() -> Self {
        Self {
            move_speed: 8.0,
            acceleration: 20.0,
            deceleration: 25.0,
            max_horizontal_speed: 28.0,
            jump_force: 16.0,
            fall_gravity_multiplier: 2.5,
            low_jump_multiplier: 2.0,
            coyote_time: 0.12,
            jump_buffer_time: 0.1,
            dash_added_speed: 12.0,
            dash_duration: 0.18,
            dash_cooldown: 0.6,
            dash_invincibility: 0.18,
            slide_added_speed: 8.0,
            slide_duration: 0.4,
            slide_deceleration: 18.0,
            slide_min_speed: 0.5,
            crouch_size: Vec2::new(0.8, 0.8),
            crouch_offset: Vec2::new(0.0, -0.4),
            crouch_speed: 4.0,
            ground_check_radius: 0.15,
            ground_check_offset: Vec2::new(0.0, -0.8),
            footstep_interval: 0.3,
            gravity: -9.81,
        }
    }
}

impl Default for OverlayTuning {
    fn default() -> Self {
        Self {
            fade_in_duration: default_fade_in(),
            fade_out_duration: default_fade_out(),
            max_glitch: default_max_glitch(),
            max_grain: default_max_grain(),
            max_scanline: default_max_scanline(),
        }
    }
}

impl Default for SquashTuning {
    fn default() -> Self {
        Self {
            max_velocity_y: 16.0,
            max_stretch_y: 1.35,
            max_squash_y: 0.7,
            air_lerp_speed: 8.0,
            land_squash_y: 0.55,
            land_squash_duration: 0.08,
            land_recover_duration: 0.18,
            run_speed_reference: 8.0,
            jump_anticipate_squash: 0.75,
            jump_anticipate_stretch: 1.3,
            jump_anticipate_time: 0.06,
            dash_stretch_x: 1.4,
            dash_squash_y: 0.7,
            dash_lerp_speed: 20.0,
            slide_squash_y: 0.65,
            slide_lerp_speed: 12.0,
            return_lerp_speed: 10.0,
        }
    }
}

impl Default for SimTuning {
    fn default() -> Self {
        Self {
            tick_rate: default_tick_rate(),
            max_delta_ms: default_max_delta_ms(),
        }
    }
}

impl SimTuning {
    /// Seconds per fixed step
    pub fn fixed_dt(&self) -> f32 {
        1.0 / self.tick_rate as f32
    }

    /// Frame delta clamp in seconds
    pub fn max_delta(&self) -> f32 {
        self.max_delta_ms as f32 / 1000.0
    }
}

impl Default for BodyTuning {
    fn default() -> Self {
        Self {
            spawn: Vec2::ZERO,
            collider_size: default_collider_size(),
            collider_offset: Vec2::ZERO,
        }
    }
}

impl LevelConfig {
    /// Parses a level from TOML text and validates it.
    ///
    /// Returns the config together with warnings for values that were
    /// clamped into range.
    pub fn from_toml_str(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut config: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: "<inline>".into(),
            source,
        })?;
        let warnings = config.validate()?;
        Ok((config, warnings))
    }

    /// Loads and validates a level file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read, is not valid TOML, or holds a
    /// value outside its valid range.
    pub fn load(path: &Path) -> Result<(Self, Vec<String>), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let warnings = config.validate()?;
        Ok((config, warnings))
    }

    /// Respawn point, falling back to the spawn position.
    pub fn respawn_point(&self) -> Vec2 {
        self.respawn_anchor.unwrap_or(self.body.spawn)
    }

    /// Checks every tunable, clamping the recoverable ones.
    ///
    /// Returns a list of warning messages for values that were adjusted.
    pub fn validate(&mut self) -> Result<Vec<String>, ConfigError> {
        let mut warnings = Vec::new();

        let r = &self.recorder;
        require_positive("recorder.max_record_duration", r.max_record_duration)?;
        require_positive("recorder.record_interval", r.record_interval)?;
        require_positive("recorder.rewind_total_duration", r.rewind_total_duration)?;
        require_non_negative("recorder.rewind_delay", r.rewind_delay)?;
        require_non_negative("recorder.settle_delay", r.settle_delay)?;

        let l = &self.loop_timer;
        require_positive("loop.max_time", l.max_time)?;
        require_non_negative("loop.min_time", l.min_time)?;
        require_non_negative("loop.remove_time_mult", l.remove_time_mult)?;
        if l.min_time > l.max_time {
            return Err(ConfigError::invalid(
                "loop.min_time",
                format!("{} exceeds loop.max_time {}", l.min_time, l.max_time),
            ));
        }

        let m = &mut self.movement;
        require_positive("movement.coyote_time", m.coyote_time)?;
        require_positive("movement.jump_buffer_time", m.jump_buffer_time)?;
        require_positive("movement.dash_duration", m.dash_duration)?;
        require_non_negative("movement.dash_cooldown", m.dash_cooldown)?;
        require_positive("movement.slide_duration", m.slide_duration)?;
        require_positive("movement.footstep_interval", m.footstep_interval)?;
        if m.dash_invincibility > m.dash_duration {
            warnings.push(format!(
                "movement.dash_invincibility {} clamped to dash_duration {}",
                m.dash_invincibility, m.dash_duration
            ));
            m.dash_invincibility = m.dash_duration;
        }
        if m.dash_invincibility < 0.0 {
            warnings.push(format!(
                "movement.dash_invincibility {} clamped to 0",
                m.dash_invincibility
            ));
            m.dash_invincibility = 0.0;
        }

        require_positive("overlay.fade_in_duration", self.overlay.fade_in_duration)?;
        require_positive("overlay.fade_out_duration", self.overlay.fade_out_duration)?;

        if self.sim.tick_rate == 0 {
            return Err(ConfigError::invalid("sim.tick_rate", "must be at least 1"));
        }
        if self.sim.max_delta_ms == 0 {
            return Err(ConfigError::invalid(
                "sim.max_delta_ms",
                "0 would clamp every frame to nothing",
            ));
        }
        if self.sim.max_delta() < self.sim.fixed_dt() {
            warnings.push(format!(
                "sim.max_delta_ms {} is shorter than one fixed step, the level runs slower than real time",
                self.sim.max_delta_ms
            ));
        }

        for hazard in &mut self.hazards {
            if let Some(period) = hazard.switch_period
                && period <= 0.0
            {
                warnings.push(format!(
                    "hazard switch_period {} is not positive, hazard stays on",
                    period
                ));
                hazard.switch_period = None;
            }
        }

        for pickup in &self.pickups {
            if let PickupKind::SlowMotion { factor, duration } = pickup.kind {
                require_non_negative("pickup.factor", factor)?;
                require_positive("pickup.duration", duration)?;
            }
        }

        Ok(warnings)
    }
}

/// Widen to `f64` through the shortest decimal that round-trips the `f32`
fn decimal(value: f32) -> f64 {
    value.to_string().parse().unwrap_or(f64::from(value))
}

fn require_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("{} must be > 0", value)))
    }
}

fn require_non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("{} must be >= 0", value)))
    }
}
