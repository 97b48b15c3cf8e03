//! Chronoloop Core - rewind loop simulation
//!
//! Each attempt at a level runs against a shrinking time budget. When the
//! budget runs out, or the player dies, the player's recent trajectory is
//! played back in reverse and the next attempt starts with less time.
//!
//! # Architecture
//!
//! - [`RewindBus`] - Broadcast channel every rewind-aware component listens on
//! - [`Recorder`] - Periodic snapshots of the player body and reverse playback
//! - [`LoopTimer`] - Per-loop countdown, budget shrinking and gauges
//! - [`MovementController`] - Run, jump, dash, crouch and slide state machine
//! - [`Level`] - Fixed-timestep scheduler that wires the components together

pub mod bus;
pub mod effects;
#[cfg(test)]
mod integration;
pub mod level;
pub mod loop_timer;
pub mod movement;
pub mod physics;
pub mod recorder;
pub mod task;
#[cfg(test)]
pub mod test_utils;

// Re-export the component types
pub use bus::{RewindBus, RewindListener, SubscriptionHandle};
pub use level::{FrameStats, Level, LevelBuilder, LevelState};
pub use loop_timer::{GaugeFractions, LoopBudget, LoopTimer, Pickup};
pub use movement::{
    ControlGate, ControllerInput, MovementController, MovementEvent, MovementFlags,
    MovementTimers,
};
pub use recorder::{
    HistoryBuffer, PlaybackPhase, Recorder, RecorderBuilder, RecorderEvent, RecorderPhase,
    RewindPlayback, Snapshot,
};

// Re-export physics seams
pub use physics::{
    Aabb, BodyMode, Contact, Hazard, KinematicBody, PhysicsBody, SharedBody, StaticWorld,
    SurfaceTag, WorldProbe,
};

// Re-export task primitives
pub use task::{Delay, Step, Task, TaskSlot};

// Re-export presentation state
pub use effects::{OverlayIntensities, RewindOverlay, SquashStretch};

// Re-export shared configuration types for convenience
pub use chronoloop_shared::{AudioCue, ConfigError, LevelConfig};
