//! Backward walk through the recorded history
//!
//! The walk always lasts `rewind_total_duration` whatever the history length:
//! each snapshot is held for `total / max(1, len)` seconds, and the current
//! snapshot is derived from the accumulated walk time rather than stepped
//! once per tick. A long history is therefore compressed (several snapshots
//! may be passed in one tick) and a short one expanded.

use chronoloop_shared::RecorderTuning;

use crate::physics::PhysicsBody;
use crate::task::{Delay, Step, Task};

use super::history::Snapshot;

/// Where a playback currently is
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackPhase {
    /// Frozen before the walk starts
    Pause,
    /// Walking from newest to oldest
    Walk,
    /// Holding the oldest snapshot before control returns
    Settle,
}

/// Resumable rewind playback
#[derive(Debug, Clone)]
pub struct RewindPlayback {
    /// Newest first
    snapshots: Vec<Snapshot>,
    phase: PlaybackPhase,
    pause: Delay,
    settle: Delay,
    walk_duration: f32,
    time_per_step: f32,
    walk_elapsed: f32,
    /// Index of the snapshot last applied to the body
    applied: Option<usize>,
}

impl RewindPlayback {
    /// Build a playback over `snapshots`, ordered newest first
    pub fn new(snapshots: Vec<Snapshot>, tuning: &RecorderTuning) -> Self {
        let steps = snapshots.len().max(1) as f32;
        Self {
            time_per_step: tuning.rewind_total_duration / steps,
            snapshots,
            phase: PlaybackPhase::Pause,
            pause: Delay::new(tuning.rewind_delay),
            settle: Delay::new(tuning.settle_delay),
            walk_duration: tuning.rewind_total_duration,
            walk_elapsed: 0.0,
            applied: None,
        }
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    pub fn time_per_step(&self) -> f32 {
        self.time_per_step
    }

    /// Time spent in the walk phase so far
    pub fn walk_elapsed(&self) -> f32 {
        self.walk_elapsed
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Snapshot index (newest = 0) most recently applied
    pub fn applied_index(&self) -> Option<usize> {
        self.applied
    }

    fn apply(&mut self, index: usize, body: &mut dyn PhysicsBody) {
        if self.applied == Some(index) {
            return;
        }
        if let Some(snapshot) = self.snapshots.get(index) {
            snapshot.apply(body);
            self.applied = Some(index);
        }
    }

    fn begin_walk(&mut self, body: &mut dyn PhysicsBody) {
        if self.snapshots.is_empty() {
            self.phase = PlaybackPhase::Settle;
            return;
        }
        self.phase = PlaybackPhase::Walk;
        self.apply(0, body);
    }
}

impl Task for RewindPlayback {
    type Target = dyn PhysicsBody;

    fn step(&mut self, body: &mut Self::Target, dt: f32) -> Step {
        match self.phase {
            PlaybackPhase::Pause => {
                if self.pause.tick(dt) {
                    self.begin_walk(body);
                }
                Step::Running
            }
            PlaybackPhase::Walk => {
                self.walk_elapsed += dt;
                let last = self.snapshots.len() - 1;
                if self.walk_elapsed >= self.walk_duration {
                    self.apply(last, body);
                    self.phase = PlaybackPhase::Settle;
                } else {
                    let index = ((self.walk_elapsed / self.time_per_step) as usize).min(last);
                    self.apply(index, body);
                }
                Step::Running
            }
            PlaybackPhase::Settle => {
                if self.settle.tick(dt) {
                    Step::Finished
                } else {
                    Step::Running
                }
            }
        }
    }

    fn cancel(&mut self, body: &mut Self::Target) {
        // Jump to the end of the walk so the body rests on a recorded state
        if let Some(last) = self.snapshots.len().checked_sub(1) {
            self.apply(last, body);
        }
        self.phase = PlaybackPhase::Settle;
    }
}
