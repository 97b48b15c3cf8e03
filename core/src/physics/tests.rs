//! Physics collaborator tests

use glam::Vec2;

use super::*;

fn floor_world() -> StaticWorld {
    StaticWorld::new(Vec2::new(0.0, -10.0))
        .with_platform(Aabb::new(Vec2::new(-50.0, -1.0), Vec2::new(50.0, 0.0)))
}

fn body_at(position: Vec2) -> KinematicBody {
    KinematicBody::new(position, Vec2::new(0.8, 1.6), Vec2::ZERO)
}

// ============================================================================
// Aabb
// ============================================================================

#[test]
fn test_aabb_edge_contact_is_not_overlap() {
    let a = Aabb::new(Vec2::ZERO, Vec2::ONE);
    let b = Aabb::new(Vec2::new(1.0, 0.0), Vec2::new(2.0, 1.0));
    assert!(!a.overlaps(&b));
    assert!(a.overlaps(&Aabb::new(Vec2::splat(0.5), Vec2::splat(1.5))));
}

#[test]
fn test_aabb_normalizes_corners() {
    let a = Aabb::new(Vec2::ONE, Vec2::ZERO);
    assert_eq!(a.min, Vec2::ZERO);
    assert_eq!(a.max, Vec2::ONE);
}

#[test]
fn test_circle_intersection() {
    let a = Aabb::new(Vec2::ZERO, Vec2::ONE);
    assert!(a.intersects_circle(Vec2::new(0.5, 1.1), 0.15));
    assert!(!a.intersects_circle(Vec2::new(0.5, 1.5), 0.15));
}

// ============================================================================
// Body integration
// ============================================================================

#[test]
fn test_dynamic_body_falls_and_lands() {
    let mut world = floor_world();
    let mut body = body_at(Vec2::new(0.0, 3.0));

    for _ in 0..200 {
        world.step_body(&mut body, 0.02);
    }

    // Feet (0.8 below the origin) rest on the floor top at y = 0
    assert!((body.position.y - 0.8).abs() < 1e-3);
    assert_eq!(body.velocity.y, 0.0);
    assert!(world.overlaps_ground(body.position + Vec2::new(0.0, -0.8), 0.15));
}

#[test]
fn test_kinematic_body_is_not_integrated() {
    let mut world = floor_world();
    let mut body = body_at(Vec2::new(0.0, 3.0));
    body.mode = BodyMode::Kinematic;
    body.velocity = Vec2::new(5.0, 5.0);

    world.step_body(&mut body, 0.1);

    assert_eq!(body.position, Vec2::new(0.0, 3.0));
}

#[test]
fn test_zero_gravity_scale_keeps_vertical_velocity() {
    let mut world = StaticWorld::new(Vec2::new(0.0, -10.0));
    let mut body = body_at(Vec2::ZERO);
    body.gravity_scale = 0.0;
    body.velocity = Vec2::new(3.0, 0.0);

    world.step_body(&mut body, 0.5);

    assert_eq!(body.velocity, Vec2::new(3.0, 0.0));
    assert_eq!(body.position, Vec2::new(1.5, 0.0));
}

#[test]
fn test_wall_stops_horizontal_motion() {
    let mut world = floor_world().with_platform(Aabb::new(
        Vec2::new(2.0, 0.0),
        Vec2::new(3.0, 5.0),
    ));
    let mut body = body_at(Vec2::new(0.0, 0.8));
    body.velocity = Vec2::new(10.0, 0.0);

    for _ in 0..20 {
        world.step_body(&mut body, 0.02);
    }

    assert!(body.bounds().max.x <= 2.0 + 1e-3);
}

// ============================================================================
// Probes
// ============================================================================

#[test]
fn test_box_cast_up_detects_ceiling() {
    let world = floor_world().with_platform(Aabb::new(
        Vec2::new(-1.0, 1.2),
        Vec2::new(1.0, 2.0),
    ));
    assert!(world.box_cast_up(Vec2::new(0.0, 0.8), Vec2::new(0.72, 1.44), 0.05));
    assert!(!world.box_cast_up(Vec2::new(5.0, 0.8), Vec2::new(0.72, 1.44), 0.05));
}

// ============================================================================
// Hazards
// ============================================================================

#[test]
fn test_hazard_contact_is_edge_triggered() {
    let mut world = StaticWorld::new(Vec2::ZERO).with_hazard(Hazard::fixed(Aabb::new(
        Vec2::new(-1.0, -1.0),
        Vec2::new(1.0, 1.0),
    )));
    let mut body = body_at(Vec2::ZERO);

    assert_eq!(world.step_body(&mut body, 0.02).len(), 1);
    assert!(world.step_body(&mut body, 0.02).is_empty());

    body.position = Vec2::new(10.0, 0.0);
    world.step_body(&mut body, 0.02);
    body.position = Vec2::ZERO;
    let contacts = world.step_body(&mut body, 0.02);
    assert_eq!(
        contacts.as_slice(),
        &[Contact {
            tag: SurfaceTag::Hazard,
            index: 0
        }]
    );
}

#[test]
fn test_switching_hazard_toggles() {
    let bounds = Aabb::new(Vec2::splat(-1.0), Vec2::splat(1.0));
    let mut world = StaticWorld::new(Vec2::ZERO).with_hazard(Hazard::switching(bounds, 1.0));
    let mut body = body_at(Vec2::ZERO);

    assert!(!world.hazards()[0].is_active());
    assert!(world.step_body(&mut body, 0.1).is_empty());

    for _ in 0..11 {
        world.advance_hazards(0.1);
    }
    assert!(world.hazards()[0].is_active());
    assert_eq!(world.step_body(&mut body, 0.1).len(), 1);
}
