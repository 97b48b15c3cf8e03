//! Shared test utilities for integration and unit tests

use std::cell::RefCell;
use std::rc::Rc;

use chronoloop_shared::{LevelConfig, RecorderTuning};
use glam::Vec2;

use crate::level::{Level, LevelBuilder};
use crate::physics::{Aabb, KinematicBody, SharedBody, StaticWorld};

/// Tick used by unit tests, matching the default 50 Hz scheduler
pub const DT: f32 = 0.02;

/// Standing collider used throughout the tests
pub const STANDING: Vec2 = Vec2::new(0.8, 1.6);

// ============================================================================
// Bodies and worlds
// ============================================================================

/// A player body standing with its feet at `feet`
pub fn body_at(feet: Vec2) -> Rc<RefCell<KinematicBody>> {
    Rc::new(RefCell::new(KinematicBody::new(
        feet + Vec2::new(0.0, STANDING.y * 0.5),
        STANDING,
        Vec2::ZERO,
    )))
}

/// Type-erased handle onto a concrete test body
pub fn shared(body: &Rc<RefCell<KinematicBody>>) -> SharedBody {
    body.clone()
}

/// Ground slab whose top surface is `y = 0`, spanning `x` in `[-100, 100]`
pub fn flat_world() -> StaticWorld {
    StaticWorld::new(Vec2::new(0.0, -9.81))
        .with_platform(Aabb::new(Vec2::new(-100.0, -1.0), Vec2::new(100.0, 0.0)))
}

/// Flat ground with a low ceiling slab whose underside sits at `height`
pub fn world_with_ceiling(height: f32) -> StaticWorld {
    flat_world().with_platform(Aabb::new(
        Vec2::new(-100.0, height),
        Vec2::new(100.0, height + 1.0),
    ))
}

pub fn recorder_tuning(max_record_duration: f32, record_interval: f32) -> RecorderTuning {
    RecorderTuning {
        max_record_duration,
        record_interval,
        ..RecorderTuning::default()
    }
}

// ============================================================================
// Levels
// ============================================================================

/// Level config parsed from `toml`, plus a flat floor appended after it
pub fn config(toml: &str) -> LevelConfig {
    let base = r#"
        [[platform]]
        min = [-100.0, -1.0]
        max = [100.0, 0.0]
    "#;
    let (config, _warnings) = LevelConfig::from_toml_str(&format!("{toml}\n{base}"))
        .expect("test level config should parse");
    config
}

/// Initialized level built from [`config`]
pub fn level(toml: &str) -> Level {
    let mut level = LevelBuilder::from_config(config(toml))
        .build()
        .expect("test level should build");
    level.initialize();
    level
}
