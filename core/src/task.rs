//! Resumable multi-tick sequences
//!
//! Rewind playback, overlay fades and squash/stretch animations span several
//! ticks. Each is a [`Task`] that holds its own progress and is advanced once
//! per tick. A [`TaskSlot`] owns at most one in-flight task of a kind:
//! starting a new one cancels the old one first.

/// Result of advancing a task by one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Running,
    Finished,
}

/// A sequence that spans several ticks and mutates a target
pub trait Task {
    type Target: ?Sized;

    /// Advance by `dt` seconds
    fn step(&mut self, target: &mut Self::Target, dt: f32) -> Step;

    /// Stop early. `target` must be left in a resting configuration.
    fn cancel(&mut self, target: &mut Self::Target);
}

/// Holds at most one running instance of a task kind
#[derive(Debug)]
pub struct TaskSlot<T: Task> {
    active: Option<T>,
}

impl<T: Task> TaskSlot<T> {
    pub const fn new() -> Self {
        Self { active: None }
    }

    /// Start `task`, cancelling any instance already in flight
    pub fn start(&mut self, task: T, target: &mut T::Target) {
        self.cancel(target);
        self.active = Some(task);
    }

    /// Step the running task, if any. Returns `true` on the tick it finishes.
    pub fn advance(&mut self, target: &mut T::Target, dt: f32) -> bool {
        let Some(task) = self.active.as_mut() else {
            return false;
        };
        match task.step(target, dt) {
            Step::Running => false,
            Step::Finished => {
                self.active = None;
                true
            }
        }
    }

    /// Cancel the running task, if any
    pub fn cancel(&mut self, target: &mut T::Target) {
        if let Some(mut task) = self.active.take() {
            task.cancel(target);
        }
    }

    /// Drop the running task without touching the target
    pub fn clear(&mut self) {
        self.active = None;
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    pub fn get(&self) -> Option<&T> {
        self.active.as_ref()
    }
}

impl<T: Task> Default for TaskSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Countdown that finishes once `duration` seconds have been stepped
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Delay {
    remaining: f32,
}

impl Delay {
    pub fn new(duration: f32) -> Self {
        Self {
            remaining: duration.max(0.0),
        }
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    /// Returns `true` once the delay has fully elapsed
    pub fn tick(&mut self, dt: f32) -> bool {
        self.remaining -= dt;
        self.remaining <= 0.0
    }
}
