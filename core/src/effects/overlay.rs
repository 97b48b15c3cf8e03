//! Rewind overlay fade

use chronoloop_shared::OverlayTuning;

use crate::task::{Step, Task, TaskSlot};

/// Shader parameters derived from the master intensity
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OverlayIntensities {
    pub intensity: f32,
    pub glitch: f32,
    pub grain: f32,
    pub scanline: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct OverlayState {
    intensity: f32,
    visible: bool,
}

#[derive(Debug, Clone, Copy)]
enum Fade {
    In { elapsed: f32, duration: f32 },
    Out { elapsed: f32, duration: f32, from: f32 },
}

impl Task for Fade {
    type Target = OverlayState;

    fn step(&mut self, state: &mut OverlayState, dt: f32) -> Step {
        match self {
            Fade::In { elapsed, duration } => {
                *elapsed += dt;
                if *elapsed >= *duration {
                    state.intensity = 1.0;
                    return Step::Finished;
                }
                state.intensity = (*elapsed / *duration).clamp(0.0, 1.0);
                Step::Running
            }
            Fade::Out {
                elapsed,
                duration,
                from,
            } => {
                *elapsed += dt;
                if *elapsed >= *duration {
                    state.intensity = 0.0;
                    state.visible = false;
                    return Step::Finished;
                }
                let t = *elapsed / *duration;
                state.intensity = *from + (0.0 - *from) * t;
                Step::Running
            }
        }
    }

    fn cancel(&mut self, state: &mut OverlayState) {
        *state = OverlayState::default();
    }
}

/// Full-screen effect shown while a rewind plays
#[derive(Debug)]
pub struct RewindOverlay {
    tuning: OverlayTuning,
    state: OverlayState,
    fade: TaskSlot<Fade>,
}

impl RewindOverlay {
    pub fn new(tuning: OverlayTuning) -> Self {
        Self {
            tuning,
            state: OverlayState::default(),
            fade: TaskSlot::new(),
        }
    }

    /// Show the overlay and fade in, restarting any fade in flight
    pub fn on_rewind_start(&mut self) {
        if self.fade.is_running() {
            tracing::debug!("overlay fade restarted");
        }
        let fade = Fade::In {
            elapsed: 0.0,
            duration: self.tuning.fade_in_duration,
        };
        self.fade.start(fade, &mut self.state);
        self.state.visible = true;
    }

    /// Fade out from the current intensity, then hide
    pub fn on_rewind_complete(&mut self) {
        let from = self.state.intensity;
        let fade = Fade::Out {
            elapsed: 0.0,
            duration: self.tuning.fade_out_duration,
            from,
        };
        self.fade.start(fade, &mut self.state);
        self.state = OverlayState {
            intensity: from,
            visible: true,
        };
    }

    pub fn tick(&mut self, dt: f32) {
        self.fade.advance(&mut self.state, dt);
    }

    /// Stop any fade and hide
    pub fn reset(&mut self) {
        self.fade.cancel(&mut self.state);
        self.state = OverlayState::default();
    }

    pub fn is_visible(&self) -> bool {
        self.state.visible
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_running()
    }

    pub fn intensities(&self) -> OverlayIntensities {
        let intensity = self.state.intensity;
        OverlayIntensities {
            intensity,
            glitch: self.tuning.max_glitch * intensity,
            grain: self.tuning.max_grain * intensity,
            scanline: self.tuning.max_scanline * intensity,
        }
    }
}
