//! Named audio cues
//!
//! Gameplay code never plays sounds itself. It queues one of these cues as a
//! side effect of a state transition and the host maps the name to a clip.

use serde::{Deserialize, Serialize};

/// Discrete audio cue fired by a gameplay transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioCue {
    Jump,
    Land,
    Dash,
    Slide,
    Death,
    Footstep,
    /// A global rewind was published
    Rewind,
    /// The time machine was switched off for the rest of the level
    TimeMachineStopped,
}

impl AudioCue {
    /// Clip name the host audio layer looks up
    pub fn name(self) -> &'static str {
        match self {
            Self::Jump => "Jump",
            Self::Land => "Land",
            Self::Dash => "Dash",
            Self::Slide => "Slide",
            Self::Death => "Death",
            Self::Footstep => "Footstep",
            Self::Rewind => "Rewind",
            Self::TimeMachineStopped => "StopTimeMachine",
        }
    }
}

impl std::fmt::Display for AudioCue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
