//! Level construction

use std::cell::RefCell;
use std::rc::Rc;

use chronoloop_shared::{ConfigError, LevelConfig};

use crate::bus::RewindBus;
use crate::effects::{RewindOverlay, SquashStretch};
use crate::loop_timer::{LoopTimer, Pickup};
use crate::movement::{ControlGate, MovementController};
use crate::physics::{KinematicBody, SharedBody, StaticWorld};
use crate::recorder::RecorderBuilder;

use super::{Level, LevelState, Scheduler};

/// Builds a [`Level`] from its configuration
pub struct LevelBuilder {
    config: LevelConfig,
    body: Option<SharedBody>,
    world: Option<StaticWorld>,
}

impl LevelBuilder {
    pub fn from_config(config: LevelConfig) -> Self {
        Self {
            config,
            body: None,
            world: None,
        }
    }

    /// Use an existing body instead of spawning one from `config.body`
    pub fn body(mut self, body: SharedBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Use existing geometry instead of the config's platforms and hazards
    pub fn world(mut self, world: StaticWorld) -> Self {
        self.world = Some(world);
        self
    }

    pub fn build(self) -> Result<Level, ConfigError> {
        let mut config = self.config;
        for warning in config.validate()? {
            tracing::warn!("{warning}");
        }

        let body = match self.body {
            Some(body) => body,
            None => Rc::new(RefCell::new(KinematicBody::new(
                config.body.spawn,
                config.body.collider_size,
                config.body.collider_offset,
            ))),
        };
        let world = self
            .world
            .unwrap_or_else(|| StaticWorld::from_config(&config));

        let bus = RewindBus::new();
        let gate = ControlGate::new();

        let recorder = RecorderBuilder::new(config.recorder.clone())
            .body(body.clone())
            .control(gate.clone())
            .build()?;
        let loop_timer = LoopTimer::new(&config.loop_timer, bus.clone());
        let controller = MovementController::new(
            config.movement.clone(),
            body.clone(),
            gate,
            bus.clone(),
            config.respawn_point(),
        );
        let pickups = config.pickups.iter().copied().map(Pickup::from).collect();

        tracing::debug!(
            platforms = world.platforms().len(),
            hazards = world.hazards().len(),
            max_snapshots = recorder.max_snapshots(),
            "level built"
        );

        Ok(Level {
            scheduler: Scheduler::new(&config.sim),
            overlay: RewindOverlay::new(config.overlay.clone()),
            squash: SquashStretch::new(config.squash.clone()),
            recorder: Rc::new(RefCell::new(recorder)),
            loop_timer: Rc::new(RefCell::new(loop_timer)),
            controller: Rc::new(RefCell::new(controller)),
            state: LevelState::Built,
            config,
            bus,
            body,
            world,
            pickups,
            rewinds: 0,
            completed_rewinds: 0,
            cues: Vec::new(),
            death_markers: Vec::new(),
        })
    }
}
