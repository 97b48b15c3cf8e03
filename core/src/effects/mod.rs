//! Cosmetic sequence state
//!
//! Neither type here feeds back into the simulation. They turn recorder and
//! controller edges into values a renderer can read: the rewind overlay
//! intensity and the player's visual squash/stretch scale.

mod overlay;
mod squash;


pub use overlay::{OverlayIntensities, RewindOverlay};
pub use squash::{SquashSequence, SquashStretch};
