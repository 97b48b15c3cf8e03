//! Snapshot recorder
//!
//! Samples the player body at a fixed cadence into a bounded history and,
//! when a rewind is requested, takes the body away from the movement
//! controller and walks it backward through that history.
//!
//! # States
//!
//! - `Recording` (initial): a snapshot is captured every `record_interval`
//!   seconds.
//! - `Rewinding`: control gate closed, body kinematic, playback running.
//!   Further rewind requests are ignored.
//!
//! Finishing a playback clears the history, restores the body, reopens the
//! gate, returns to `Recording` and fires the completion callback once.

use chronoloop_shared::RecorderTuning;
use glam::Vec2;
use smallvec::SmallVec;

use crate::bus::{RewindBus, RewindListener, SubscriptionHandle};
use crate::movement::ControlGate;
use crate::physics::{BodyMode, SharedBody};
use crate::task::TaskSlot;

mod builder;
mod history;
mod playback;

#[cfg(test)]
mod tests;

pub use builder::RecorderBuilder;
pub use history::{HistoryBuffer, Snapshot};
pub use playback::{PlaybackPhase, RewindPlayback};

/// Recorder state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecorderPhase {
    #[default]
    Recording,
    Rewinding,
}

/// Edges consumed by cosmetic layers (overlay, audio)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderEvent {
    RewindStarted,
    RewindCompleted,
}

/// Bounded-history recorder and rewind playback engine
pub struct Recorder {
    tuning: RecorderTuning,
    body: SharedBody,
    control: ControlGate,
    history: HistoryBuffer,
    phase: RecorderPhase,
    /// Sampling switch, independent from the rewind state
    recording: bool,
    record_timer: f32,
    /// Recorder clock used for snapshot timestamps
    clock: f32,
    playback: TaskSlot<RewindPlayback>,
    events: SmallVec<[RecorderEvent; 2]>,
    on_complete: Option<Box<dyn FnMut()>>,
    subscription: Option<(RewindBus, SubscriptionHandle)>,
}

impl Recorder {
    pub(crate) fn new(tuning: RecorderTuning, body: SharedBody, control: ControlGate) -> Self {
        let history = HistoryBuffer::new(tuning.max_snapshots());
        Self {
            tuning,
            body,
            control,
            history,
            phase: RecorderPhase::Recording,
            recording: true,
            record_timer: 0.0,
            clock: 0.0,
            playback: TaskSlot::new(),
            events: SmallVec::new(),
            on_complete: None,
            subscription: None,
        }
    }

    /// Subscribe `recorder` to the bus so every rewind triggers a playback
    pub fn attach(recorder: &std::rc::Rc<std::cell::RefCell<Self>>, bus: &RewindBus) {
        let handle = bus.subscribe_listener(recorder);
        recorder.borrow_mut().subscription = Some((bus.clone(), handle));
    }

    /// Unsubscribe from the bus and hand the body back if a playback is in flight
    pub fn teardown(&mut self) {
        if let Some((bus, handle)) = self.subscription.take() {
            bus.unsubscribe(handle);
        }
        if self.phase == RecorderPhase::Rewinding {
            let mut body = self.body.borrow_mut();
            self.playback.cancel(&mut *body);
            body.set_mode(BodyMode::Dynamic);
            drop(body);
            self.control.enable();
            self.history.clear();
            self.phase = RecorderPhase::Recording;
        }
    }

    /// Callback fired once each time a playback finishes
    pub fn set_on_complete(&mut self, callback: impl FnMut() + 'static) {
        self.on_complete = Some(Box::new(callback));
    }

    /// Advance the recorder by one variable step
    pub fn tick(&mut self, dt: f32) {
        self.clock += dt;

        if self.phase == RecorderPhase::Rewinding {
            let finished = {
                let mut body = self.body.borrow_mut();
                self.playback.advance(&mut *body, dt)
            };
            if finished {
                self.finish_rewind();
            }
            return;
        }

        if !self.recording {
            return;
        }
        self.record_timer += dt;
        if self.record_timer >= self.tuning.record_interval {
            self.record_timer -= self.tuning.record_interval;
            self.record();
        }
    }

    /// Capture one snapshot. No-op while rewinding or with sampling switched off.
    pub fn record(&mut self) {
        if self.phase == RecorderPhase::Rewinding || !self.recording {
            return;
        }
        let snapshot = history::Snapshot::capture(&*self.body.borrow(), self.clock);
        if let Some(evicted) = self.history.push(snapshot) {
            tracing::debug!(timestamp = evicted.timestamp, "history full, evicted oldest");
        }
    }

    /// Start a playback. Returns `false` if one is already running.
    pub fn trigger_rewind(&mut self) -> bool {
        if self.phase == RecorderPhase::Rewinding {
            tracing::debug!("rewind requested while rewinding, ignored");
            return false;
        }

        self.phase = RecorderPhase::Rewinding;
        self.recording = false;
        self.control.disable();
        self.events.push(RecorderEvent::RewindStarted);

        let playback = RewindPlayback::new(self.history.drain_newest_first(), &self.tuning);
        tracing::info!(
            snapshots = playback.len(),
            time_per_step = playback.time_per_step(),
            "rewind started"
        );

        let mut body = self.body.borrow_mut();
        body.set_velocity(Vec2::ZERO);
        body.set_mode(BodyMode::Kinematic);
        self.playback.start(playback, &mut *body);
        true
    }

    fn finish_rewind(&mut self) {
        self.history.clear();
        self.body.borrow_mut().set_mode(BodyMode::Dynamic);
        self.control.enable();
        self.phase = RecorderPhase::Recording;
        self.recording = true;
        self.record_timer = 0.0;
        self.events.push(RecorderEvent::RewindCompleted);
        tracing::info!("rewind finished");

        if let Some(callback) = self.on_complete.as_mut() {
            callback();
        }
    }

    /// Drop the history and resume sampling
    pub fn reset_recording(&mut self) {
        self.history.clear();
        self.recording = true;
        self.record_timer = 0.0;
    }

    /// Pause or resume sampling without touching the history
    pub fn set_recording(&mut self, active: bool) {
        self.recording = active;
    }

    /// Take the start/complete edges raised since the last call
    pub fn drain_events(&mut self) -> SmallVec<[RecorderEvent; 2]> {
        std::mem::take(&mut self.events)
    }

    pub fn phase(&self) -> RecorderPhase {
        self.phase
    }

    pub fn is_rewinding(&self) -> bool {
        self.phase == RecorderPhase::Rewinding
    }

    pub fn is_recording(&self) -> bool {
        self.recording && self.phase == RecorderPhase::Recording
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn max_snapshots(&self) -> usize {
        self.history.capacity()
    }

    /// Current playback, while rewinding
    pub fn playback(&self) -> Option<&RewindPlayback> {
        self.playback.get()
    }

    pub fn tuning(&self) -> &RecorderTuning {
        &self.tuning
    }
}

impl RewindListener for Recorder {
    fn on_rewind(&mut self) {
        self.trigger_rewind();
    }
}

impl std::fmt::Debug for Recorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recorder")
            .field("phase", &self.phase)
            .field("recording", &self.recording)
            .field("history", &self.history.len())
            .field("capacity", &self.history.capacity())
            .finish()
    }
}
