//! Loop timer
//!
//! Tracks the shrinking time budget. Each loop counts down from the current
//! budget; when the countdown runs out a rewind is raised on the bus. Every
//! rewind, whatever its cause, shrinks the budget by a fraction of the time
//! the loop actually consumed, down to a floor.

use std::cell::RefCell;
use std::rc::Rc;

use chronoloop_shared::{LoopTuning, PickupKind};

use crate::bus::{RewindBus, RewindListener, SubscriptionHandle};
use crate::task::TaskSlot;

mod pickup;

#[cfg(test)]
mod tests;

pub use pickup::{Pickup, SlowMotion};

/// Budget bookkeeping for the current level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopBudget {
    pub max_time: f32,
    pub min_time: f32,
    /// Budget of the current loop; never below `min_time` after a rewind
    pub time_available: f32,
    /// `max_time - time_available`, for display only
    pub removed_time: f32,
    /// Scaled seconds counted down since the last rewind
    pub elapsed_since_last_rewind: f32,
    /// Countdown of the current loop
    pub in_game_timer: f32,
}

impl LoopBudget {
    fn new(tuning: &LoopTuning) -> Self {
        Self {
            max_time: tuning.max_time,
            min_time: tuning.min_time,
            time_available: tuning.max_time,
            removed_time: 0.0,
            elapsed_since_last_rewind: 0.0,
            in_game_timer: tuning.max_time,
        }
    }
}

/// Proportions rendered by the UI gauge, each `0` when undefined
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GaugeFractions {
    /// `time_available / max_time`
    pub available: f32,
    /// `in_game_timer / time_available`
    pub remaining: f32,
    /// `removed_time / max_time`
    pub removed: f32,
}

impl GaugeFractions {
    const FULL: Self = Self {
        available: 1.0,
        remaining: 1.0,
        removed: 0.0,
    };
}

fn ratio(numerator: f32, denominator: f32) -> f32 {
    if denominator == 0.0 {
        0.0
    } else {
        (numerator / denominator).max(0.0)
    }
}

/// Shrinking-budget countdown
pub struct LoopTimer {
    budget: LoopBudget,
    remove_time_mult: f32,
    bus: RewindBus,
    /// Multiplier on the countdown, below 1 under slow motion
    time_scale: f32,
    slow_motion: TaskSlot<SlowMotion>,
    /// Set once the countdown has crossed zero in the current loop
    expired: bool,
    time_machine: bool,
    rewinds: u32,
    subscription: Option<SubscriptionHandle>,
}

impl LoopTimer {
    pub fn new(tuning: &LoopTuning, bus: RewindBus) -> Self {
        Self {
            budget: LoopBudget::new(tuning),
            remove_time_mult: tuning.remove_time_mult,
            bus,
            time_scale: 1.0,
            slow_motion: TaskSlot::new(),
            expired: false,
            time_machine: true,
            rewinds: 0,
            subscription: None,
        }
    }

    /// Subscribe `timer` to its bus
    pub fn attach(timer: &Rc<RefCell<Self>>) {
        let bus = timer.borrow().bus.clone();
        let handle = bus.subscribe_listener(timer);
        timer.borrow_mut().subscription = Some(handle);
    }

    pub fn teardown(&mut self) {
        if let Some(handle) = self.subscription.take() {
            self.bus.unsubscribe(handle);
        }
        self.slow_motion.cancel(&mut self.time_scale);
    }

    /// Level-start initialisation: full budget, fresh countdown
    pub fn start(&mut self) {
        self.budget.time_available = self.budget.max_time;
        self.budget.in_game_timer = self.budget.time_available;
        self.budget.removed_time = 0.0;
        self.budget.elapsed_since_last_rewind = 0.0;
        self.expired = false;
    }

    /// Count down one fixed step. Raises a rewind once per zero crossing.
    pub fn tick(&mut self, dt: f32) {
        self.slow_motion.advance(&mut self.time_scale, dt);

        if !self.time_machine {
            return;
        }

        let scaled = dt * self.time_scale;
        self.budget.in_game_timer -= scaled;
        self.budget.elapsed_since_last_rewind += scaled;

        if self.budget.in_game_timer <= 0.0 && !self.expired {
            self.expired = true;
            tracing::info!(
                time_available = self.budget.time_available,
                "loop budget exhausted, rewinding"
            );
            self.bus.raise();
        }
    }

    /// Recompute the budget after a rewind of any cause
    pub fn on_rewind(&mut self) {
        self.rewinds += 1;
        if !self.time_machine {
            return;
        }

        let budget = &mut self.budget;
        let previous = budget.time_available;
        let elapsed = budget.time_available - budget.in_game_timer;
        budget.time_available -= elapsed * self.remove_time_mult;
        budget.time_available = budget.time_available.max(budget.min_time);
        budget.removed_time = budget.max_time - budget.time_available;
        budget.in_game_timer = budget.time_available;
        budget.elapsed_since_last_rewind = 0.0;
        self.expired = false;

        debug_assert!(budget.time_available >= budget.min_time);
        tracing::info!(
            previous,
            elapsed,
            time_available = budget.time_available,
            "loop budget recomputed"
        );
    }

    /// Grant bonus seconds to the budget. No upper clamp.
    pub fn add_time(&mut self, seconds: f32) {
        self.budget.time_available += seconds;
        tracing::debug!(seconds, time_available = self.budget.time_available, "time added");
    }

    /// Apply a collected pickup
    pub fn collect(&mut self, kind: PickupKind) {
        match kind {
            PickupKind::AddTime { seconds } => self.add_time(seconds),
            PickupKind::SlowMotion { factor, duration } => {
                self.slow_motion
                    .start(SlowMotion::new(duration), &mut self.time_scale);
                self.set_time_scale(factor);
            }
        }
        tracing::info!(?kind, "pickup collected");
    }

    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Switch the loop off for the rest of the level
    pub fn remove_time_machine(&mut self) {
        if !self.time_machine {
            return;
        }
        self.time_machine = false;
        self.slow_motion.cancel(&mut self.time_scale);
        tracing::info!("time machine removed");
    }

    pub fn has_time_machine(&self) -> bool {
        self.time_machine
    }

    pub fn compute_gauge_fractions(&self) -> GaugeFractions {
        if !self.time_machine {
            return GaugeFractions::FULL;
        }
        let budget = &self.budget;
        GaugeFractions {
            available: ratio(budget.time_available, budget.max_time),
            remaining: ratio(budget.in_game_timer, budget.time_available),
            removed: ratio(budget.removed_time, budget.max_time),
        }
    }

    pub fn budget(&self) -> LoopBudget {
        self.budget
    }

    /// Seconds left in the current loop, never negative
    pub fn in_loop_remaining(&self) -> f32 {
        self.budget.in_game_timer.max(0.0)
    }

    /// Rewinds observed since construction
    pub fn rewind_count(&self) -> u32 {
        self.rewinds
    }
}

impl RewindListener for LoopTimer {
    fn on_rewind(&mut self) {
        LoopTimer::on_rewind(self);
    }
}

impl std::fmt::Debug for LoopTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopTimer")
            .field("budget", &self.budget)
            .field("time_scale", &self.time_scale)
            .field("expired", &self.expired)
            .field("time_machine", &self.time_machine)
            .finish()
    }
}
