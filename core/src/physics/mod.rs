//! Physics collaborator
//!
//! The recorder and the movement controller only see the body and the world
//! through the two traits below. [`KinematicBody`] and [`StaticWorld`] are a
//! minimal 2D implementation (velocity integration, axis-aligned platforms)
//! used by the headless simulator and the tests.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;

mod body;
mod world;

pub use body::KinematicBody;
pub use world::{Aabb, Contact, Hazard, StaticWorld};

/// Whether the body is simulated or positioned from outside
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyMode {
    /// Integrates velocity and gravity
    #[default]
    Dynamic,
    /// Not simulated; position is set externally
    Kinematic,
}

/// Category a collider is tagged with. Gameplay queries the tag, never the identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceTag {
    Ground,
    Hazard,
}

/// Rigid body plus capsule collider of the player
pub trait PhysicsBody {
    fn position(&self) -> Vec2;
    fn set_position(&mut self, position: Vec2);

    fn velocity(&self) -> Vec2;
    fn set_velocity(&mut self, velocity: Vec2);

    /// Transform scale; the sign of `x` is the facing direction
    fn scale(&self) -> Vec2;
    fn set_scale(&mut self, scale: Vec2);

    fn mode(&self) -> BodyMode;
    fn set_mode(&mut self, mode: BodyMode);

    fn gravity_scale(&self) -> f32;
    fn set_gravity_scale(&mut self, gravity_scale: f32);

    fn collider_size(&self) -> Vec2;
    fn set_collider_size(&mut self, size: Vec2);

    fn collider_offset(&self) -> Vec2;
    fn set_collider_offset(&mut self, offset: Vec2);

    /// World-space collider box
    fn bounds(&self) -> Aabb {
        Aabb::from_center_size(self.position() + self.collider_offset(), self.collider_size())
    }
}

/// Body shared between the recorder, the controller and the physics step
pub type SharedBody = Rc<RefCell<dyn PhysicsBody>>;

/// Spatial queries the movement controller needs
pub trait WorldProbe {
    /// Base gravity applied to dynamic bodies
    fn gravity(&self) -> Vec2;

    /// Whether a circle touches solid ground
    fn overlaps_ground(&self, center: Vec2, radius: f32) -> bool;

    /// Whether a box swept `distance` upward from `center` hits solid ground
    fn box_cast_up(&self, center: Vec2, size: Vec2, distance: f32) -> bool;
}

#[cfg(test)]
mod tests;
