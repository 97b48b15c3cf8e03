//! Input-driven control switch

use std::cell::Cell;
use std::rc::Rc;

/// Shared on/off switch for the movement controller's input-driven control
///
/// The recorder closes the gate for the duration of a rewind playback; the
/// controller neither samples input nor integrates while it is closed.
#[derive(Debug, Clone)]
pub struct ControlGate(Rc<Cell<bool>>);

impl ControlGate {
    /// New gate, open
    pub fn new() -> Self {
        Self(Rc::new(Cell::new(true)))
    }

    pub fn is_enabled(&self) -> bool {
        self.0.get()
    }

    pub fn enable(&self) {
        self.0.set(true);
    }

    pub fn disable(&self) {
        self.0.set(false);
    }
}

impl Default for ControlGate {
    fn default() -> Self {
        Self::new()
    }
}
