//! Level context and scheduler
//!
//! A [`Level`] owns one of everything: the rewind bus, the player body, the
//! world, the recorder, the loop timer, the movement controller and the
//! cosmetic state. Components receive the bus handle at construction; there
//! is no global instance.
//!
//! # Lifecycle
//!
//! construct ([`LevelBuilder`]) → [`Level::initialize`] → [`Level::frame`]
//! repeatedly → [`Level::teardown`].
//!
//! # Frame order
//!
//! Each frame runs one variable step (input, discrete transitions, recorder,
//! cosmetics) and then as many fixed steps as the accumulator holds
//! (velocity shaping, integration, contacts, loop countdown). The bus is
//! flushed after every component step, so a rewind raised anywhere is
//! delivered within the same tick.

use std::cell::{Ref, RefCell};
use std::rc::Rc;
use std::time::Duration;

use chronoloop_shared::{AudioCue, LevelConfig, SimTuning};
use glam::Vec2;

use crate::bus::RewindBus;
use crate::effects::{RewindOverlay, SquashStretch};
use crate::loop_timer::{GaugeFractions, LoopTimer, Pickup};
use crate::movement::{ControllerInput, MovementController, MovementEvent};
use crate::physics::{SharedBody, StaticWorld, SurfaceTag};
use crate::recorder::{Recorder, RecorderEvent};

mod builder;


pub use builder::LevelBuilder;

/// Where the level is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelState {
    Built,
    Running,
    TornDown,
}

/// What one call to [`Level::frame`] did
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameStats {
    /// Fixed steps run this frame
    pub ticks: u32,
    /// Leftover accumulator as a fraction of a fixed step, for interpolation
    pub alpha: f32,
}

/// Fixed-timestep accumulator
#[derive(Debug, Clone)]
struct Scheduler {
    tick_duration: Duration,
    max_delta: Duration,
    accumulator: Duration,
    elapsed: Duration,
    ticks: u64,
}

impl Scheduler {
    fn new(sim: &SimTuning) -> Self {
        Self {
            tick_duration: Duration::from_secs_f64(1.0 / f64::from(sim.tick_rate.max(1))),
            max_delta: Duration::from_millis(u64::from(sim.max_delta_ms)),
            accumulator: Duration::ZERO,
            elapsed: Duration::ZERO,
            ticks: 0,
        }
    }

    /// Clamp and accumulate a frame delta; returns the clamped delta
    fn accumulate(&mut self, delta: Duration) -> Duration {
        let delta = delta.min(self.max_delta);
        self.accumulator += delta;
        self.elapsed += delta;
        delta
    }

    /// Take one fixed step out of the accumulator, if there is one
    fn take_tick(&mut self) -> bool {
        if self.accumulator < self.tick_duration {
            return false;
        }
        self.accumulator -= self.tick_duration;
        self.ticks += 1;
        true
    }

    fn alpha(&self) -> f32 {
        self.accumulator.as_secs_f32() / self.tick_duration.as_secs_f32()
    }
}

/// One loaded level and everything simulated in it
pub struct Level {
    config: LevelConfig,
    state: LevelState,
    scheduler: Scheduler,

    bus: RewindBus,
    body: SharedBody,
    world: StaticWorld,
    recorder: Rc<RefCell<Recorder>>,
    loop_timer: Rc<RefCell<LoopTimer>>,
    controller: Rc<RefCell<MovementController>>,
    overlay: RewindOverlay,
    squash: SquashStretch,
    pickups: Vec<Pickup>,

    rewinds: u32,
    completed_rewinds: u32,
    cues: Vec<AudioCue>,
    death_markers: Vec<Vec2>,
}

impl Level {
    /// Wire bus subscriptions and start the loop countdown
    pub fn initialize(&mut self) {
        if self.state != LevelState::Built {
            tracing::debug!(state = ?self.state, "initialize called twice, ignored");
            return;
        }

        Recorder::attach(&self.recorder, &self.bus);
        LoopTimer::attach(&self.loop_timer);
        MovementController::attach(&self.controller);

        self.loop_timer.borrow_mut().start();
        self.controller.borrow_mut().initialize(&self.world);
        self.squash.set_grounded(self.controller.borrow().is_grounded());

        self.state = LevelState::Running;
        tracing::info!(
            subscribers = self.bus.subscriber_count(),
            time_available = self.loop_timer.borrow().budget().time_available,
            "level initialized"
        );
    }

    /// Unsubscribe every component and stop running sequences
    pub fn teardown(&mut self) {
        if self.state == LevelState::TornDown {
            return;
        }
        self.recorder.borrow_mut().teardown();
        self.loop_timer.borrow_mut().teardown();
        self.controller.borrow_mut().teardown();
        self.overlay.reset();
        self.squash.cancel_sequences();

        debug_assert_eq!(self.bus.subscriber_count(), 0);
        self.state = LevelState::TornDown;
        tracing::info!(rewinds = self.rewinds, "level torn down");
    }

    /// Advance by one rendered frame
    pub fn frame(&mut self, delta: Duration, input: ControllerInput) -> FrameStats {
        if self.state != LevelState::Running {
            return FrameStats::default();
        }

        let delta = self.scheduler.accumulate(delta);
        self.variable_step(input, delta.as_secs_f32());

        let fixed_dt = self.scheduler.tick_duration.as_secs_f32();
        let mut ticks = 0;
        while self.scheduler.take_tick() {
            self.fixed_step(fixed_dt);
            ticks += 1;
        }

        FrameStats {
            ticks,
            alpha: self.scheduler.alpha(),
        }
    }

    fn variable_step(&mut self, input: ControllerInput, dt: f32) {
        self.controller
            .borrow_mut()
            .update(input, &self.world, dt);
        self.bus.flush();

        self.recorder.borrow_mut().tick(dt);
        self.bus.flush();
        self.handle_recorder_events();

        self.overlay.tick(dt);

        let (flags, velocity, events, cues) = {
            let mut controller = self.controller.borrow_mut();
            (
                controller.flags(),
                controller.velocity(),
                controller.drain_events(),
                controller.drain_cues(),
            )
        };
        for event in events {
            match event {
                MovementEvent::Jumped => self.squash.on_jump(),
                MovementEvent::DeathMarker { position } => self.death_markers.push(position),
            }
        }
        self.cues.extend(cues);
        self.squash.update(flags, velocity, dt);
    }

    fn fixed_step(&mut self, dt: f32) {
        self.controller.borrow_mut().fixed_update(&self.world, dt);
        self.bus.flush();

        self.world.advance_hazards(dt);
        let contacts = self.world.step_body(&mut *self.body.borrow_mut(), dt);
        for contact in contacts {
            if contact.tag == SurfaceTag::Hazard {
                self.controller.borrow_mut().on_hazard_contact();
                self.bus.flush();
            }
        }

        let rewinding = self.recorder.borrow().is_rewinding();
        if !rewinding {
            self.collect_pickups();
            self.loop_timer.borrow_mut().tick(dt);
            self.bus.flush();
        }
    }

    fn collect_pickups(&mut self) {
        let bounds = self.body.borrow().bounds();
        for pickup in &mut self.pickups {
            if let Some(kind) = pickup.try_collect(&bounds) {
                self.loop_timer.borrow_mut().collect(kind);
            }
        }
    }

    fn handle_recorder_events(&mut self) {
        let events = self.recorder.borrow_mut().drain_events();
        for event in events {
            match event {
                RecorderEvent::RewindStarted => {
                    self.rewinds += 1;
                    self.overlay.on_rewind_start();
                    self.squash.cancel_sequences();
                    self.cues.push(AudioCue::Rewind);
                }
                RecorderEvent::RewindCompleted => {
                    self.completed_rewinds += 1;
                    self.overlay.on_rewind_complete();
                    self.controller.borrow_mut().stop_being_invincible();
                }
            }
        }
    }

    /// Raise a rewind from outside the core (lever, scripted event)
    pub fn rewind(&mut self) {
        self.bus.publish();
        self.handle_recorder_events();
    }

    /// Switch the loop off for the rest of the level
    pub fn remove_time_machine(&mut self) {
        self.loop_timer.borrow_mut().remove_time_machine();
        self.controller.borrow_mut().set_time_machine(false);
        self.cues.push(AudioCue::TimeMachineStopped);
    }

    pub fn gauges(&self) -> GaugeFractions {
        self.loop_timer.borrow().compute_gauge_fractions()
    }

    /// Rewinds started since the level was initialized
    pub fn rewind_count(&self) -> u32 {
        self.rewinds
    }

    pub fn completed_rewinds(&self) -> u32 {
        self.completed_rewinds
    }

    /// Take the audio cues queued since the last call
    pub fn drain_cues(&mut self) -> Vec<AudioCue> {
        std::mem::take(&mut self.cues)
    }

    /// Where the player died, oldest first
    pub fn death_markers(&self) -> &[Vec2] {
        &self.death_markers
    }

    pub fn state(&self) -> LevelState {
        self.state
    }

    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    pub fn bus(&self) -> &RewindBus {
        &self.bus
    }

    pub fn body(&self) -> &SharedBody {
        &self.body
    }

    pub fn player_position(&self) -> Vec2 {
        self.body.borrow().position()
    }

    pub fn world(&self) -> &StaticWorld {
        &self.world
    }

    pub fn recorder(&self) -> Ref<'_, Recorder> {
        self.recorder.borrow()
    }

    pub fn loop_timer(&self) -> Ref<'_, LoopTimer> {
        self.loop_timer.borrow()
    }

    pub fn controller(&self) -> Ref<'_, MovementController> {
        self.controller.borrow()
    }

    pub fn overlay(&self) -> &RewindOverlay {
        &self.overlay
    }

    pub fn squash(&self) -> &SquashStretch {
        &self.squash
    }

    pub fn pickups(&self) -> &[Pickup] {
        &self.pickups
    }

    /// Simulated time since construction, after delta clamping
    pub fn elapsed(&self) -> Duration {
        self.scheduler.elapsed
    }

    pub fn fixed_ticks(&self) -> u64 {
        self.scheduler.ticks
    }

    /// Length of one fixed step
    pub fn tick_duration(&self) -> Duration {
        self.scheduler.tick_duration
    }

    pub fn fixed_dt(&self) -> f32 {
        self.scheduler.tick_duration.as_secs_f32()
    }
}

impl Drop for Level {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Level")
            .field("state", &self.state)
            .field("rewinds", &self.rewinds)
            .field("elapsed", &self.scheduler.elapsed)
            .finish()
    }
}
