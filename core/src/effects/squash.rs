//! Squash and stretch of the player's visual

use chronoloop_shared::SquashTuning;
use glam::Vec2;

use crate::movement::MovementFlags;
use crate::task::{Step, Task, TaskSlot};

/// Snap threshold of the lerp toward the target scale
const SNAP_DISTANCE: f32 = 0.005;
/// Horizontal speed at which the slide squash saturates
const SLIDE_SPEED_REFERENCE: f32 = 10.0;

/// Scripted scale sequences. Cancelling snaps back to `(1, 1)`.
#[derive(Debug, Clone, Copy)]
pub enum SquashSequence {
    /// Squash on impact, then ease back to neutral
    Land {
        elapsed: f32,
        recovering: bool,
        squashed: Vec2,
        squash_y: f32,
        squash_duration: f32,
        recover_duration: f32,
    },
    /// Crouch down, then spring up
    JumpAnticipation {
        elapsed: f32,
        springing: bool,
        squash: f32,
        stretch: f32,
        half: f32,
    },
}

impl SquashSequence {
    pub fn land(tuning: &SquashTuning) -> Self {
        Self::Land {
            elapsed: 0.0,
            recovering: false,
            squashed: Vec2::ONE,
            squash_y: tuning.land_squash_y,
            squash_duration: tuning.land_squash_duration,
            recover_duration: tuning.land_recover_duration,
        }
    }

    pub fn jump_anticipation(tuning: &SquashTuning) -> Self {
        Self::JumpAnticipation {
            elapsed: 0.0,
            springing: false,
            squash: tuning.jump_anticipate_squash,
            stretch: tuning.jump_anticipate_stretch,
            half: tuning.jump_anticipate_time * 0.5,
        }
    }
}

/// Area-preserving scale with height `y`
fn volume(y: f32) -> Vec2 {
    Vec2::new(1.0 / y, y)
}

fn progress(elapsed: f32, duration: f32) -> f32 {
    if duration <= 0.0 {
        1.0
    } else {
        (elapsed / duration).min(1.0)
    }
}

impl Task for SquashSequence {
    type Target = Vec2;

    fn step(&mut self, scale: &mut Vec2, dt: f32) -> Step {
        match self {
            SquashSequence::Land {
                elapsed,
                recovering,
                squashed,
                squash_y,
                squash_duration,
                recover_duration,
            } => {
                *elapsed += dt;
                if !*recovering {
                    let p = progress(*elapsed, *squash_duration);
                    *scale = Vec2::ONE.lerp(volume(*squash_y), p);
                    if p >= 1.0 {
                        *recovering = true;
                        *squashed = *scale;
                        *elapsed = 0.0;
                    }
                    return Step::Running;
                }
                let p = progress(*elapsed, *recover_duration);
                let ease = 1.0 - (1.0 - p).powi(3);
                *scale = squashed.lerp(Vec2::ONE, ease);
                if p >= 1.0 {
                    *scale = Vec2::ONE;
                    Step::Finished
                } else {
                    Step::Running
                }
            }
            SquashSequence::JumpAnticipation {
                elapsed,
                springing,
                squash,
                stretch,
                half,
            } => {
                *elapsed += dt;
                let p = progress(*elapsed, *half);
                if !*springing {
                    *scale = Vec2::ONE.lerp(volume(*squash), p);
                    if p >= 1.0 {
                        *springing = true;
                        *elapsed = 0.0;
                    }
                    return Step::Running;
                }
                *scale = volume(*squash).lerp(volume(*stretch), p);
                if p >= 1.0 {
                    Step::Finished
                } else {
                    Step::Running
                }
            }
        }
    }

    fn cancel(&mut self, scale: &mut Vec2) {
        *scale = Vec2::ONE;
    }
}

/// Visual scale driven by the controller's flags and velocity
#[derive(Debug)]
pub struct SquashStretch {
    tuning: SquashTuning,
    scale: Vec2,
    target: Vec2,
    grounded: bool,
    dashing: bool,
    land: TaskSlot<SquashSequence>,
    jump: TaskSlot<SquashSequence>,
}

impl SquashStretch {
    pub fn new(tuning: SquashTuning) -> Self {
        Self {
            tuning,
            scale: Vec2::ONE,
            target: Vec2::ONE,
            grounded: false,
            dashing: false,
            land: TaskSlot::new(),
            jump: TaskSlot::new(),
        }
    }

    /// Seed the landing edge detector, e.g. after spawning on the ground
    pub fn set_grounded(&mut self, grounded: bool) {
        self.grounded = grounded;
    }

    pub fn update(&mut self, flags: MovementFlags, velocity: Vec2, dt: f32) {
        let was_grounded = self.grounded;
        self.grounded = flags.grounded;
        if !was_grounded && flags.grounded {
            self.land
                .start(SquashSequence::land(&self.tuning), &mut self.scale);
        }

        let dash_started = flags.dashing && !self.dashing;
        self.dashing = flags.dashing;
        if dash_started {
            self.cancel_sequences();
        }

        if self.land.is_running() || self.jump.is_running() {
            self.land.advance(&mut self.scale, dt);
            self.jump.advance(&mut self.scale, dt);
            return;
        }

        self.target = self.compute_target(flags, velocity);
        self.apply(flags, dt);
    }

    /// Play the jump anticipation, restarting it if already running
    pub fn on_jump(&mut self) {
        self.jump
            .start(SquashSequence::jump_anticipation(&self.tuning), &mut self.scale);
    }

    /// Drop any running sequence and return to the neutral scale
    pub fn cancel_sequences(&mut self) {
        self.land.cancel(&mut self.scale);
        self.jump.cancel(&mut self.scale);
    }

    fn compute_target(&self, flags: MovementFlags, velocity: Vec2) -> Vec2 {
        let tuning = &self.tuning;
        if flags.dashing {
            return Vec2::new(tuning.dash_stretch_x, tuning.dash_squash_y);
        }
        if flags.sliding {
            let t = (velocity.x.abs() / SLIDE_SPEED_REFERENCE).min(1.0);
            return Vec2::ONE.lerp(Vec2::new(1.2, tuning.slide_squash_y), t);
        }
        if flags.grounded {
            let t = if tuning.run_speed_reference > 0.0 {
                (velocity.x.abs() / tuning.run_speed_reference).clamp(0.0, 1.0)
            } else {
                0.0
            };
            return Vec2::ONE.lerp(Vec2::new(1.08, 0.94), t);
        }

        let normalized = if tuning.max_velocity_y > 0.0 {
            (velocity.y / tuning.max_velocity_y).clamp(-1.0, 1.0)
        } else {
            0.0
        };
        let y = if normalized > 0.0 {
            1.0 + (tuning.max_stretch_y - 1.0) * normalized
        } else {
            1.0 + (tuning.max_squash_y - 1.0) * -normalized
        };
        let x = (1.0 / y.max(0.1)).clamp(0.8, 1.2);
        Vec2::new(x, y)
    }

    fn apply(&mut self, flags: MovementFlags, dt: f32) {
        if flags.grounded && !flags.dashing && !flags.sliding {
            self.scale = move_towards(self.scale, self.target, self.tuning.return_lerp_speed * dt);
            return;
        }

        let speed = if flags.dashing {
            self.tuning.dash_lerp_speed
        } else if flags.sliding {
            self.tuning.slide_lerp_speed
        } else {
            self.tuning.air_lerp_speed
        };
        let mut result = self.scale.lerp(self.target, (speed * dt).min(1.0));
        if result.distance(self.target) < SNAP_DISTANCE {
            result = self.target;
        }
        self.scale = result;
    }

    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    pub fn target(&self) -> Vec2 {
        self.target
    }

    pub fn is_animating(&self) -> bool {
        self.land.is_running() || self.jump.is_running()
    }
}

fn move_towards(current: Vec2, target: Vec2, max_delta: f32) -> Vec2 {
    let delta = target - current;
    let distance = delta.length();
    if distance <= max_delta || distance == 0.0 {
        target
    } else {
        current + delta / distance * max_delta
    }
}
