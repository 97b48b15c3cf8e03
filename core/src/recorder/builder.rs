//! Recorder construction

use chronoloop_shared::{ConfigError, RecorderTuning};

use crate::movement::ControlGate;
use crate::physics::SharedBody;

use super::Recorder;

/// Wires a [`Recorder`] to its collaborators
///
/// Both the body and the control gate are required. A recorder without them
/// would silently record nothing, so `build` refuses instead.
#[derive(Default)]
pub struct RecorderBuilder {
    tuning: RecorderTuning,
    body: Option<SharedBody>,
    control: Option<ControlGate>,
}

impl RecorderBuilder {
    pub fn new(tuning: RecorderTuning) -> Self {
        Self {
            tuning,
            body: None,
            control: None,
        }
    }

    /// Body (transform, rigid body and collider) to sample and replay
    pub fn body(mut self, body: SharedBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Gate of the movement controller to close while rewinding
    pub fn control(mut self, control: ControlGate) -> Self {
        self.control = Some(control);
        self
    }

    pub fn build(self) -> Result<Recorder, ConfigError> {
        let body = self.body.ok_or(ConfigError::MissingCollaborator {
            component: "Recorder",
            collaborator: "physics body",
        })?;
        let control = self.control.ok_or(ConfigError::MissingCollaborator {
            component: "Recorder",
            collaborator: "control gate",
        })?;

        let positive = [
            ("recorder.record_interval", self.tuning.record_interval),
            ("recorder.max_record_duration", self.tuning.max_record_duration),
        ];
        for (field, value) in positive {
            if value.is_nan() || value <= 0.0 {
                return Err(ConfigError::invalid(field, format!("{value} must be > 0")));
            }
        }

        Ok(Recorder::new(self.tuning, body, control))
    }
}
