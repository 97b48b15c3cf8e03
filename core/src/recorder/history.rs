//! Snapshot history ring

use std::collections::VecDeque;

use glam::Vec2;

use crate::physics::PhysicsBody;

/// One recorded instant of the player's transform and collider
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub position: Vec2,
    pub scale: Vec2,
    pub collider_size: Vec2,
    pub collider_offset: Vec2,
    /// Recorder clock at capture time, in seconds
    pub timestamp: f32,
}

impl Snapshot {
    /// Capture the body's current state
    pub fn capture(body: &dyn PhysicsBody, timestamp: f32) -> Self {
        Self {
            position: body.position(),
            scale: body.scale(),
            collider_size: body.collider_size(),
            collider_offset: body.collider_offset(),
            timestamp,
        }
    }

    /// Put the body back into this recorded state
    pub fn apply(&self, body: &mut dyn PhysicsBody) {
        body.set_position(self.position);
        body.set_scale(self.scale);
        body.set_collider_size(self.collider_size);
        body.set_collider_offset(self.collider_offset);
    }
}

/// Bounded, oldest-first sequence of snapshots
///
/// When full, the oldest entry is evicted before the newest is appended.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    snapshots: VecDeque<Snapshot>,
    capacity: usize,
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            // Preallocate lazily; the default capacity covers twenty minutes
            snapshots: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Append a snapshot, evicting the oldest one at capacity.
    ///
    /// Returns the evicted snapshot, if any.
    pub fn push(&mut self, snapshot: Snapshot) -> Option<Snapshot> {
        let evicted = if self.snapshots.len() == self.capacity {
            self.snapshots.pop_front()
        } else {
            None
        };
        self.snapshots.push_back(snapshot);
        debug_assert!(self.snapshots.len() <= self.capacity);
        evicted
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    pub fn oldest(&self) -> Option<&Snapshot> {
        self.snapshots.front()
    }

    pub fn newest(&self) -> Option<&Snapshot> {
        self.snapshots.back()
    }

    /// Oldest-first iteration
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Snapshot> + ExactSizeIterator {
        self.snapshots.iter()
    }

    /// Move every snapshot out, newest first
    pub fn drain_newest_first(&mut self) -> Vec<Snapshot> {
        self.snapshots.drain(..).rev().collect()
    }
}
