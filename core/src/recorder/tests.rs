//! Recorder tests

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use chronoloop_shared::{ConfigError, RecorderTuning};
use glam::Vec2;

use super::*;
use crate::bus::RewindBus;
use crate::movement::ControlGate;
use crate::physics::{BodyMode, KinematicBody};
use crate::test_utils::{body_at, recorder_tuning, shared, DT};

fn recorder(tuning: RecorderTuning) -> (Recorder, Rc<RefCell<KinematicBody>>, ControlGate) {
    let body = body_at(Vec2::ZERO);
    let gate = ControlGate::new();
    let recorder = RecorderBuilder::new(tuning)
        .body(shared(&body))
        .control(gate.clone())
        .build()
        .expect("recorder should build");
    (recorder, body, gate)
}

/// Record `count` snapshots, moving the body one unit right before each
fn record_walk(recorder: &mut Recorder, body: &Rc<RefCell<KinematicBody>>, count: usize) {
    for i in 0..count {
        body.borrow_mut().position = Vec2::new(i as f32, 0.8);
        recorder.record();
    }
}

/// Tick until the playback finishes, returning the simulated time it took
fn run_rewind(recorder: &mut Recorder) -> f32 {
    let mut elapsed = 0.0;
    for _ in 0..10_000 {
        if !recorder.is_rewinding() {
            return elapsed;
        }
        recorder.tick(DT);
        elapsed += DT;
    }
    panic!("rewind never finished");
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_builder_requires_body() {
    let result = RecorderBuilder::new(RecorderTuning::default())
        .control(ControlGate::new())
        .build();

    assert!(matches!(
        result,
        Err(ConfigError::MissingCollaborator {
            collaborator: "physics body",
            ..
        })
    ));
}

#[test]
fn test_builder_requires_control_gate() {
    let body = body_at(Vec2::ZERO);
    let result = RecorderBuilder::new(RecorderTuning::default())
        .body(shared(&body))
        .build();

    assert!(matches!(
        result,
        Err(ConfigError::MissingCollaborator {
            collaborator: "control gate",
            ..
        })
    ));
}

#[test]
fn test_builder_rejects_zero_interval() {
    let body = body_at(Vec2::ZERO);
    let result = RecorderBuilder::new(recorder_tuning(10.0, 0.0))
        .body(shared(&body))
        .control(ControlGate::new())
        .build();

    assert!(matches!(result, Err(ConfigError::Invalid { .. })));
}

// ============================================================================
// Recording
// ============================================================================

#[test]
fn test_history_keeps_last_max_snapshots_in_order() {
    let (mut recorder, body, _gate) = recorder(recorder_tuning(10.0, 0.2));
    assert_eq!(recorder.max_snapshots(), 50);

    record_walk(&mut recorder, &body, 60);

    assert_eq!(recorder.history_len(), 50);
    let xs: Vec<f32> = recorder.history().iter().map(|s| s.position.x).collect();
    let expected: Vec<f32> = (10..60).map(|i| i as f32).collect();
    assert_eq!(xs, expected);
}

#[test]
fn test_twelve_seconds_of_recording_caps_at_fifty() {
    let (mut recorder, _body, _gate) = recorder(recorder_tuning(10.0, 0.2));

    for _ in 0..600 {
        recorder.tick(DT);
        assert!(recorder.history_len() <= 50);
    }

    assert_eq!(recorder.history_len(), 50);
    let timestamps: Vec<f32> = recorder.history().iter().map(|s| s.timestamp).collect();
    assert!(timestamps.windows(2).all(|w| w[0] < w[1]));
    let newest = recorder.history().newest().map(|s| s.timestamp).unwrap_or(0.0);
    assert!((newest - 12.0).abs() < 0.25, "newest at {newest}");
}

#[test]
fn test_tick_records_at_interval() {
    let (mut recorder, _body, _gate) = recorder(recorder_tuning(10.0, 0.25));

    for _ in 0..8 {
        recorder.tick(0.125);
    }

    assert_eq!(recorder.history_len(), 4);
}

#[test]
fn test_set_recording_pauses_sampling() {
    let (mut recorder, body, _gate) = recorder(recorder_tuning(10.0, 0.2));
    record_walk(&mut recorder, &body, 3);

    recorder.set_recording(false);
    record_walk(&mut recorder, &body, 3);
    assert_eq!(recorder.history_len(), 3);

    recorder.set_recording(true);
    recorder.record();
    assert_eq!(recorder.history_len(), 4);
}

#[test]
fn test_reset_recording_clears_history() {
    let (mut recorder, body, _gate) = recorder(recorder_tuning(10.0, 0.2));
    record_walk(&mut recorder, &body, 5);
    recorder.set_recording(false);

    recorder.reset_recording();

    assert_eq!(recorder.history_len(), 0);
    assert!(recorder.is_recording());
}

#[test]
fn test_snapshot_captures_collider() {
    let (mut recorder, body, _gate) = recorder(recorder_tuning(10.0, 0.2));
    {
        let mut body = body.borrow_mut();
        body.collider_size = Vec2::new(0.8, 0.8);
        body.collider_offset = Vec2::new(0.0, -0.4);
        body.scale = Vec2::new(-1.0, 1.0);
    }

    recorder.record();

    let snapshot = recorder.history().newest().copied().expect("one snapshot");
    assert_eq!(snapshot.collider_size, Vec2::new(0.8, 0.8));
    assert_eq!(snapshot.collider_offset, Vec2::new(0.0, -0.4));
    assert_eq!(snapshot.scale, Vec2::new(-1.0, 1.0));
}

// ============================================================================
// Rewind
// ============================================================================

#[test]
fn test_trigger_rewind_takes_control_away() {
    let (mut recorder, body, gate) = recorder(RecorderTuning::default());
    body.borrow_mut().velocity = Vec2::new(5.0, -3.0);
    record_walk(&mut recorder, &body, 3);

    assert!(recorder.trigger_rewind());

    assert!(recorder.is_rewinding());
    assert!(!gate.is_enabled());
    assert_eq!(body.borrow().mode, BodyMode::Kinematic);
    assert_eq!(body.borrow().velocity, Vec2::ZERO);
    assert_eq!(
        recorder.drain_events().as_slice(),
        &[RecorderEvent::RewindStarted]
    );
}

#[test]
fn test_trigger_rewind_is_idempotent() {
    let (mut recorder, body, _gate) = recorder(RecorderTuning::default());
    record_walk(&mut recorder, &body, 3);

    assert!(recorder.trigger_rewind());
    recorder.tick(DT);
    assert!(!recorder.trigger_rewind());

    assert_eq!(recorder.drain_events().len(), 1);
    assert_eq!(recorder.playback().map(|p| p.len()), Some(3));
}

#[test]
fn test_record_is_noop_while_rewinding() {
    let (mut recorder, body, _gate) = recorder(RecorderTuning::default());
    record_walk(&mut recorder, &body, 3);
    recorder.trigger_rewind();

    recorder.record();
    recorder.tick(1.0);

    assert_eq!(recorder.history_len(), 0);
}

#[test]
fn test_walk_duration_independent_of_history_length() {
    let tuning = RecorderTuning::default();
    let expected = tuning.rewind_delay + tuning.rewind_total_duration + tuning.settle_delay;

    for count in [1, 10, 1000] {
        let (mut recorder, body, _gate) = recorder(tuning.clone());
        record_walk(&mut recorder, &body, count);

        recorder.trigger_rewind();
        let elapsed = run_rewind(&mut recorder);

        assert!(
            (elapsed - expected).abs() <= 4.0 * DT,
            "{count} snapshots took {elapsed}s, expected {expected}s"
        );
        // The walk ends on the oldest snapshot
        assert_eq!(body.borrow().position, Vec2::new(0.0, 0.8));
    }
}

#[test]
fn test_walk_visits_newest_first() {
    let (mut recorder, body, _gate) = recorder(RecorderTuning::default());
    record_walk(&mut recorder, &body, 10);
    body.borrow_mut().position = Vec2::new(50.0, 0.8);
    recorder.trigger_rewind();

    let mut visited = Vec::new();
    while recorder.is_rewinding() {
        recorder.tick(DT);
        let x = body.borrow().position.x;
        if visited.last() != Some(&x) {
            visited.push(x);
        }
    }

    let expected: Vec<f32> = std::iter::once(50.0)
        .chain((0..10).rev().map(|i| i as f32))
        .collect();
    assert_eq!(visited, expected);
}

#[test]
fn test_compressed_walk_passes_several_snapshots_per_tick() {
    let (mut recorder, body, _gate) = recorder(RecorderTuning::default());
    record_walk(&mut recorder, &body, 1000);
    recorder.trigger_rewind();

    while recorder.playback().map(|p| p.phase()) != Some(PlaybackPhase::Walk) {
        recorder.tick(DT);
    }
    recorder.tick(DT);

    let index = recorder.playback().and_then(|p| p.applied_index());
    assert!(index.is_some_and(|i| i >= 6), "applied {index:?}");
}

#[test]
fn test_empty_history_still_finishes() {
    let tuning = RecorderTuning::default();
    let (mut recorder, body, gate) = recorder(tuning.clone());
    body.borrow_mut().position = Vec2::new(7.0, 0.8);

    recorder.trigger_rewind();
    let elapsed = run_rewind(&mut recorder);

    assert!(elapsed < tuning.rewind_delay + tuning.settle_delay + 4.0 * DT);
    assert!(gate.is_enabled());
    assert_eq!(body.borrow().position, Vec2::new(7.0, 0.8));
}

#[test]
fn test_finish_restores_body_and_control() {
    let (mut recorder, body, gate) = recorder(RecorderTuning::default());
    let completions = Rc::new(Cell::new(0));
    let c = completions.clone();
    recorder.set_on_complete(move || c.set(c.get() + 1));
    record_walk(&mut recorder, &body, 5);

    recorder.trigger_rewind();
    run_rewind(&mut recorder);
    for _ in 0..50 {
        recorder.tick(DT);
    }

    assert_eq!(completions.get(), 1);
    assert!(gate.is_enabled());
    assert_eq!(body.borrow().mode, BodyMode::Dynamic);
    assert_eq!(recorder.phase(), RecorderPhase::Recording);
    assert!(recorder.is_recording());
    assert_eq!(
        recorder.drain_events().as_slice(),
        &[RecorderEvent::RewindStarted, RecorderEvent::RewindCompleted]
    );
    // Sampling resumed on a fresh history
    assert!(recorder.history_len() > 0);
    assert!(recorder.history().iter().all(|s| s.position.x == 0.0));
}

#[test]
fn test_second_rewind_after_completion() {
    let (mut recorder, body, _gate) = recorder(RecorderTuning::default());
    let completions = Rc::new(Cell::new(0));
    let c = completions.clone();
    recorder.set_on_complete(move || c.set(c.get() + 1));

    for _ in 0..2 {
        record_walk(&mut recorder, &body, 4);
        assert!(recorder.trigger_rewind());
        run_rewind(&mut recorder);
    }

    assert_eq!(completions.get(), 2);
}

// ============================================================================
// Bus wiring
// ============================================================================

#[test]
fn test_bus_rewind_starts_playback() {
    let (recorder, body, _gate) = recorder(RecorderTuning::default());
    let recorder = Rc::new(RefCell::new(recorder));
    let bus = RewindBus::new();
    Recorder::attach(&recorder, &bus);
    record_walk(&mut recorder.borrow_mut(), &body, 2);

    bus.publish();
    bus.publish();

    assert!(recorder.borrow().is_rewinding());
    assert_eq!(recorder.borrow_mut().drain_events().len(), 1);
}

#[test]
fn test_teardown_unsubscribes_and_releases_body() {
    let (recorder, body, gate) = recorder(RecorderTuning::default());
    let recorder = Rc::new(RefCell::new(recorder));
    let bus = RewindBus::new();
    Recorder::attach(&recorder, &bus);
    record_walk(&mut recorder.borrow_mut(), &body, 4);
    bus.publish();

    recorder.borrow_mut().teardown();

    assert_eq!(bus.subscriber_count(), 0);
    assert!(gate.is_enabled());
    assert_eq!(body.borrow().mode, BodyMode::Dynamic);
    // Cancelled playback rests on the oldest snapshot
    assert_eq!(body.borrow().position, Vec2::new(0.0, 0.8));
    assert!(!recorder.borrow().is_rewinding());
}
