//! Plain data body

use glam::Vec2;

use super::{BodyMode, PhysicsBody};

/// Kinematic 2D body: the world integrates it, nothing else
#[derive(Debug, Clone, PartialEq)]
pub struct KinematicBody {
    pub position: Vec2,
    pub velocity: Vec2,
    pub scale: Vec2,
    pub mode: BodyMode,
    pub gravity_scale: f32,
    pub collider_size: Vec2,
    pub collider_offset: Vec2,
}

impl KinematicBody {
    pub fn new(position: Vec2, collider_size: Vec2, collider_offset: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            scale: Vec2::ONE,
            mode: BodyMode::Dynamic,
            gravity_scale: 1.0,
            collider_size,
            collider_offset,
        }
    }
}

impl PhysicsBody for KinematicBody {
    fn position(&self) -> Vec2 {
        self.position
    }
    fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    fn velocity(&self) -> Vec2 {
        self.velocity
    }
    fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    fn scale(&self) -> Vec2 {
        self.scale
    }
    fn set_scale(&mut self, scale: Vec2) {
        self.scale = scale;
    }

    fn mode(&self) -> BodyMode {
        self.mode
    }
    fn set_mode(&mut self, mode: BodyMode) {
        self.mode = mode;
    }

    fn gravity_scale(&self) -> f32 {
        self.gravity_scale
    }
    fn set_gravity_scale(&mut self, gravity_scale: f32) {
        self.gravity_scale = gravity_scale;
    }

    fn collider_size(&self) -> Vec2 {
        self.collider_size
    }
    fn set_collider_size(&mut self, size: Vec2) {
        self.collider_size = size;
    }

    fn collider_offset(&self) -> Vec2 {
        self.collider_offset
    }
    fn set_collider_offset(&mut self, offset: Vec2) {
        self.collider_offset = offset;
    }
}
