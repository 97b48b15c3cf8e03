//! Collectibles that act on the loop budget

use chronoloop_shared::{PickupDef, PickupKind};
use glam::Vec2;

use crate::physics::Aabb;
use crate::task::{Delay, Step, Task};

/// A pickup placed in the level. Collected at most once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pickup {
    pub position: Vec2,
    pub radius: f32,
    pub kind: PickupKind,
    collected: bool,
}

impl Pickup {
    pub fn new(position: Vec2, radius: f32, kind: PickupKind) -> Self {
        Self {
            position,
            radius,
            kind,
            collected: false,
        }
    }

    pub fn is_collected(&self) -> bool {
        self.collected
    }

    /// Collect the pickup if `bounds` touches it
    pub fn try_collect(&mut self, bounds: &Aabb) -> Option<PickupKind> {
        if self.collected || !bounds.intersects_circle(self.position, self.radius) {
            return None;
        }
        self.collected = true;
        Some(self.kind)
    }
}

impl From<PickupDef> for Pickup {
    fn from(def: PickupDef) -> Self {
        Self::new(def.position, def.radius, def.kind)
    }
}

/// Restores the loop time scale once the slow-motion effect runs out
#[derive(Debug, Clone, Copy)]
pub struct SlowMotion {
    remaining: Delay,
}

impl SlowMotion {
    pub fn new(duration: f32) -> Self {
        Self {
            remaining: Delay::new(duration),
        }
    }
}

impl Task for SlowMotion {
    type Target = f32;

    fn step(&mut self, time_scale: &mut f32, dt: f32) -> Step {
        if self.remaining.tick(dt) {
            *time_scale = 1.0;
            Step::Finished
        } else {
            Step::Running
        }
    }

    fn cancel(&mut self, time_scale: &mut f32) {
        *time_scale = 1.0;
    }
}
