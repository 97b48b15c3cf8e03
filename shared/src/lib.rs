//! Shared types for the chronoloop rewind core.
//!
//! Everything in here is plain data: tuning structs loaded from level
//! TOML files, the named audio cues fired by gameplay transitions, and the
//! configuration error type. Simulation logic lives in `chronoloop-core`.

pub mod cues;
pub mod error;
pub mod tuning;

pub use cues::AudioCue;
pub use error::ConfigError;
pub use tuning::{
    BodyTuning, HazardDef, LevelConfig, LoopTuning, MovementTuning, OverlayTuning, PickupDef,
    PickupKind, PlatformDef, RecorderTuning, SimTuning, SquashTuning,
};
