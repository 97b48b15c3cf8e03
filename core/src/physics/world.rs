//! Static level geometry

use chronoloop_shared::{HazardDef, LevelConfig, PlatformDef};
use glam::Vec2;
use smallvec::SmallVec;

use super::{BodyMode, PhysicsBody, SurfaceTag, WorldProbe};

/// Penetration below this depth is treated as resting contact
const SKIN: f32 = 1e-4;

/// Axis-aligned box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        let half = size.abs() * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Strict overlap: boxes that only share an edge do not overlap
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    /// Overlap deeper than the contact skin on both axes
    fn penetrates(&self, other: &Aabb) -> bool {
        self.min.x + SKIN < other.max.x
            && self.max.x - SKIN > other.min.x
            && self.min.y + SKIN < other.max.y
            && self.max.y - SKIN > other.min.y
    }

    pub fn intersects_circle(&self, center: Vec2, radius: f32) -> bool {
        let closest = center.clamp(self.min, self.max);
        closest.distance_squared(center) <= radius * radius
    }
}

impl From<PlatformDef> for Aabb {
    fn from(def: PlatformDef) -> Self {
        Aabb::new(def.min, def.max)
    }
}

/// Hazard region, optionally toggling on and off on a fixed period
#[derive(Debug, Clone, PartialEq)]
pub struct Hazard {
    pub bounds: Aabb,
    switch_period: Option<f32>,
    switch_timer: f32,
    active: bool,
    touching: bool,
}

impl Hazard {
    /// Hazard that is always on
    pub fn fixed(bounds: Aabb) -> Self {
        Self {
            bounds,
            switch_period: None,
            switch_timer: 0.0,
            active: true,
            touching: false,
        }
    }

    /// Hazard that flips on/off every `period` seconds, starting off
    pub fn switching(bounds: Aabb, period: f32) -> Self {
        Self {
            bounds,
            switch_period: Some(period),
            switch_timer: period,
            active: false,
            touching: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    fn advance(&mut self, dt: f32) {
        let Some(period) = self.switch_period else {
            return;
        };
        self.switch_timer -= dt;
        if self.switch_timer <= 0.0 {
            self.active = !self.active;
            self.switch_timer = period;
        }
    }
}

impl From<HazardDef> for Hazard {
    fn from(def: HazardDef) -> Self {
        let bounds = Aabb::new(def.min, def.max);
        match def.switch_period {
            Some(period) => Hazard::switching(bounds, period),
            None => Hazard::fixed(bounds),
        }
    }
}

/// A collider the body started touching this step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub tag: SurfaceTag,
    pub index: usize,
}

/// Axis-aligned platforms and hazards under constant gravity
#[derive(Debug, Clone)]
pub struct StaticWorld {
    gravity: Vec2,
    platforms: Vec<Aabb>,
    hazards: Vec<Hazard>,
}

impl StaticWorld {
    pub fn new(gravity: Vec2) -> Self {
        Self {
            gravity,
            platforms: Vec::new(),
            hazards: Vec::new(),
        }
    }

    /// Build the geometry described by a level config
    pub fn from_config(config: &LevelConfig) -> Self {
        let mut world = Self::new(Vec2::new(0.0, config.movement.gravity));
        world.platforms = config.platforms.iter().copied().map(Aabb::from).collect();
        world.hazards = config.hazards.iter().copied().map(Hazard::from).collect();
        world
    }

    pub fn with_platform(mut self, platform: Aabb) -> Self {
        self.platforms.push(platform);
        self
    }

    pub fn with_hazard(mut self, hazard: Hazard) -> Self {
        self.hazards.push(hazard);
        self
    }

    pub fn platforms(&self) -> &[Aabb] {
        &self.platforms
    }

    pub fn hazards(&self) -> &[Hazard] {
        &self.hazards
    }

    /// Toggle switching hazards (fixed step)
    pub fn advance_hazards(&mut self, dt: f32) {
        for hazard in &mut self.hazards {
            hazard.advance(dt);
        }
    }

    /// Integrate a dynamic body for one fixed step and resolve platform contacts
    ///
    /// Returns the hazards the body started touching during this step. A
    /// hazard stays silent while the body remains inside it.
    pub fn step_body(&mut self, body: &mut dyn PhysicsBody, dt: f32) -> SmallVec<[Contact; 2]> {
        if body.mode() == BodyMode::Dynamic {
            let mut velocity = body.velocity() + self.gravity * body.gravity_scale() * dt;

            let mut position = body.position();
            position.x += velocity.x * dt;
            body.set_position(position);
            if velocity.x != 0.0 {
                for platform in &self.platforms {
                    let bounds = body.bounds();
                    if !bounds.penetrates(platform) {
                        continue;
                    }
                    if velocity.x > 0.0 {
                        position.x -= bounds.max.x - platform.min.x;
                    } else {
                        position.x += platform.max.x - bounds.min.x;
                    }
                    velocity.x = 0.0;
                    body.set_position(position);
                }
            }

            position.y += velocity.y * dt;
            body.set_position(position);
            for platform in &self.platforms {
                let bounds = body.bounds();
                if !bounds.penetrates(platform) {
                    continue;
                }
                if velocity.y <= 0.0 {
                    position.y += platform.max.y - bounds.min.y;
                } else {
                    position.y -= bounds.max.y - platform.min.y;
                }
                velocity.y = 0.0;
                body.set_position(position);
            }

            body.set_velocity(velocity);
        }

        let bounds = body.bounds();
        let mut contacts = SmallVec::new();
        for (index, hazard) in self.hazards.iter_mut().enumerate() {
            let touching = hazard.active && bounds.overlaps(&hazard.bounds);
            if touching && !hazard.touching {
                contacts.push(Contact {
                    tag: SurfaceTag::Hazard,
                    index,
                });
            }
            hazard.touching = touching;
        }
        contacts
    }
}

impl WorldProbe for StaticWorld {
    fn gravity(&self) -> Vec2 {
        self.gravity
    }

    fn overlaps_ground(&self, center: Vec2, radius: f32) -> bool {
        self.platforms
            .iter()
            .any(|platform| platform.intersects_circle(center, radius))
    }

    fn box_cast_up(&self, center: Vec2, size: Vec2, distance: f32) -> bool {
        let start = Aabb::from_center_size(center, size);
        let swept = Aabb::new(start.min, start.max + Vec2::new(0.0, distance.max(0.0)));
        self.platforms.iter().any(|platform| swept.overlaps(platform))
    }
}
