//! Loop timer tests

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use chronoloop_shared::{LoopTuning, PickupKind};
use glam::Vec2;

use super::*;
use crate::bus::RewindBus;
use crate::physics::Aabb;
use crate::test_utils::DT;

fn tuning(max_time: f32, min_time: f32, remove_time_mult: f32) -> LoopTuning {
    LoopTuning {
        max_time,
        min_time,
        remove_time_mult,
    }
}

fn rewind_counter(bus: &RewindBus) -> Rc<Cell<u32>> {
    let count = Rc::new(Cell::new(0));
    let c = count.clone();
    bus.subscribe(move || c.set(c.get() + 1));
    count
}

fn ticks(timer: &mut LoopTimer, seconds: f32) {
    let steps = (seconds / DT).round() as usize;
    for _ in 0..steps {
        timer.tick(DT);
    }
}

// ============================================================================
// Budget
// ============================================================================

#[test]
fn test_start_fills_budget() {
    let mut timer = LoopTimer::new(&tuning(60.0, 5.0, 0.5), RewindBus::new());
    ticks(&mut timer, 3.0);

    timer.start();

    let budget = timer.budget();
    assert_eq!(budget.time_available, 60.0);
    assert_eq!(budget.in_game_timer, 60.0);
    assert_eq!(budget.removed_time, 0.0);
}

#[test]
fn test_full_loop_halves_budget() {
    let mut timer = LoopTimer::new(&tuning(20.0, 5.0, 0.5), RewindBus::new());

    timer.tick(20.0);
    timer.on_rewind();

    let budget = timer.budget();
    assert_eq!(budget.time_available, 10.0);
    assert_eq!(budget.in_game_timer, 10.0);
    assert_eq!(budget.removed_time, 10.0);
    assert_eq!(budget.elapsed_since_last_rewind, 0.0);
}

#[test]
fn test_full_loop_halves_budget_with_fixed_steps() {
    let mut timer = LoopTimer::new(&tuning(20.0, 5.0, 0.5), RewindBus::new());

    ticks(&mut timer, 20.0);
    timer.on_rewind();

    assert!((timer.budget().time_available - 10.0).abs() < 1e-3);
}

#[test]
fn test_partial_loop_shrinks_less() {
    let mut timer = LoopTimer::new(&tuning(60.0, 5.0, 0.5), RewindBus::new());

    timer.tick(10.0);
    timer.on_rewind();

    assert_eq!(timer.budget().time_available, 55.0);
}

#[test]
fn test_repeated_full_loops_shrink_to_floor() {
    let mut timer = LoopTimer::new(&tuning(60.0, 5.0, 0.5), RewindBus::new());
    let mut previous = timer.budget().time_available;

    for _ in 0..20 {
        let available = timer.budget().time_available;
        timer.tick(available);
        timer.on_rewind();

        let next = timer.budget().time_available;
        assert!(next <= previous);
        assert!(next >= 5.0);
        previous = next;
    }

    assert_eq!(previous, 5.0);
}

#[test]
fn test_immediate_rewind_keeps_budget() {
    let mut timer = LoopTimer::new(&tuning(60.0, 5.0, 0.5), RewindBus::new());
    timer.on_rewind();
    assert_eq!(timer.budget().time_available, 60.0);
    assert_eq!(timer.rewind_count(), 1);
}

#[test]
fn test_add_time_has_no_ceiling() {
    let mut timer = LoopTimer::new(&tuning(60.0, 5.0, 0.5), RewindBus::new());

    timer.add_time(100.0);

    assert_eq!(timer.budget().time_available, 160.0);
    assert!(timer.compute_gauge_fractions().available > 1.0);
}

// ============================================================================
// Expiry
// ============================================================================

#[test]
fn test_expiry_raises_once_per_crossing() {
    let bus = RewindBus::new();
    let rewinds = rewind_counter(&bus);
    let mut timer = LoopTimer::new(&tuning(1.0, 0.5, 0.5), bus.clone());

    ticks(&mut timer, 2.0);
    bus.flush();

    assert_eq!(rewinds.get(), 1);
    assert_eq!(timer.in_loop_remaining(), 0.0);
}

#[test]
fn test_expiry_rearms_after_rewind() {
    let bus = RewindBus::new();
    let rewinds = rewind_counter(&bus);
    let timer = Rc::new(RefCell::new(LoopTimer::new(&tuning(1.0, 0.5, 0.5), bus.clone())));
    LoopTimer::attach(&timer);

    // Exact binary step so every crossing lands on zero
    for _ in 0..32 {
        timer.borrow_mut().tick(0.125);
        bus.flush();
    }

    // 1.0s loop, then 0.5s loops at the floor: 1.0 + 6 * 0.5 = 4.0s
    assert_eq!(rewinds.get(), 7);
    assert_eq!(timer.borrow().rewind_count(), 7);
    assert_eq!(timer.borrow().budget().time_available, 0.5);
}

#[test]
fn test_teardown_unsubscribes() {
    let bus = RewindBus::new();
    let timer = Rc::new(RefCell::new(LoopTimer::new(&LoopTuning::default(), bus.clone())));
    LoopTimer::attach(&timer);
    assert_eq!(bus.subscriber_count(), 1);

    timer.borrow_mut().teardown();

    assert_eq!(bus.subscriber_count(), 0);
}

// ============================================================================
// Gauges
// ============================================================================

#[test]
fn test_gauge_fractions() {
    let mut timer = LoopTimer::new(&tuning(60.0, 5.0, 0.5), RewindBus::new());
    timer.tick(15.0);

    let gauges = timer.compute_gauge_fractions();

    assert_eq!(gauges.available, 1.0);
    assert_eq!(gauges.remaining, 0.75);
    assert_eq!(gauges.removed, 0.0);
}

#[test]
fn test_gauge_fractions_after_rewind() {
    let mut timer = LoopTimer::new(&tuning(20.0, 5.0, 0.5), RewindBus::new());
    timer.tick(20.0);
    timer.on_rewind();

    let gauges = timer.compute_gauge_fractions();

    assert_eq!(gauges.available, 0.5);
    assert_eq!(gauges.remaining, 1.0);
    assert_eq!(gauges.removed, 0.5);
}

#[test]
fn test_gauge_fractions_zero_denominators() {
    let mut timer = LoopTimer::new(&tuning(0.0, 0.0, 0.5), RewindBus::new());
    timer.tick(DT);

    let gauges = timer.compute_gauge_fractions();

    assert_eq!(gauges, GaugeFractions::default());
    assert!(gauges.available.is_finite());
    assert!(gauges.remaining.is_finite());
    assert!(gauges.removed.is_finite());
}

// ============================================================================
// Time scale and pickups
// ============================================================================

#[test]
fn test_slow_motion_scales_countdown_then_restores() {
    let mut timer = LoopTimer::new(&tuning(60.0, 5.0, 0.5), RewindBus::new());

    timer.collect(PickupKind::SlowMotion {
        factor: 0.5,
        duration: 2.0,
    });
    timer.tick(1.0);
    assert_eq!(timer.budget().in_game_timer, 59.5);
    assert_eq!(timer.time_scale(), 0.5);

    timer.tick(1.0);
    timer.tick(1.0);
    assert_eq!(timer.time_scale(), 1.0);
}

#[test]
fn test_slow_motion_recollect_restarts() {
    let mut timer = LoopTimer::new(&tuning(60.0, 5.0, 0.5), RewindBus::new());
    let slow = PickupKind::SlowMotion {
        factor: 0.25,
        duration: 2.0,
    };

    timer.collect(slow);
    timer.tick(1.5);
    timer.collect(slow);
    timer.tick(1.5);
    assert_eq!(timer.time_scale(), 0.25);

    timer.tick(0.75);
    assert_eq!(timer.time_scale(), 1.0);
}

#[test]
fn test_negative_time_scale_clamped() {
    let mut timer = LoopTimer::new(&LoopTuning::default(), RewindBus::new());
    timer.set_time_scale(-2.0);
    assert_eq!(timer.time_scale(), 0.0);
}

#[test]
fn test_add_time_pickup() {
    let mut timer = LoopTimer::new(&tuning(60.0, 5.0, 0.5), RewindBus::new());
    timer.collect(PickupKind::AddTime { seconds: 5.0 });
    assert_eq!(timer.budget().time_available, 65.0);
}

#[test]
fn test_pickup_collected_once() {
    let mut pickup = Pickup::new(Vec2::new(2.0, 1.0), 0.5, PickupKind::AddTime { seconds: 5.0 });
    let far = Aabb::from_center_size(Vec2::new(-5.0, 0.8), Vec2::new(0.8, 1.6));
    let near = Aabb::from_center_size(Vec2::new(1.8, 0.8), Vec2::new(0.8, 1.6));

    assert_eq!(pickup.try_collect(&far), None);
    assert_eq!(pickup.try_collect(&near), Some(PickupKind::AddTime { seconds: 5.0 }));
    assert_eq!(pickup.try_collect(&near), None);
    assert!(pickup.is_collected());
}

// ============================================================================
// Time machine removal
// ============================================================================

#[test]
fn test_removed_time_machine_stops_loop() {
    let bus = RewindBus::new();
    let rewinds = rewind_counter(&bus);
    let mut timer = LoopTimer::new(&tuning(1.0, 0.5, 0.5), bus.clone());

    timer.remove_time_machine();
    ticks(&mut timer, 3.0);
    bus.flush();
    timer.on_rewind();

    assert_eq!(rewinds.get(), 0);
    assert!(!timer.has_time_machine());
    assert_eq!(timer.budget().time_available, 1.0);
    assert_eq!(timer.compute_gauge_fractions().remaining, 1.0);
}
