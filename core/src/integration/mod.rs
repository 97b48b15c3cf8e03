//! Integration tests for the chronoloop core
//!
//! Drives whole levels frame by frame: loops expiring and shrinking, deaths
//! rewinding the player, and the reverse playback of recorded trajectories.


#[cfg(test)]
pub(crate) mod test_utils {
    use std::time::Duration;

    use crate::level::Level;
    use crate::movement::ControllerInput;

    /// One rendered frame at the default 50 Hz tick rate
    pub const FRAME: Duration = Duration::from_millis(20);

    fn frames(seconds: f32) -> usize {
        (seconds / FRAME.as_secs_f32()).round() as usize
    }

    /// Hold `input` for `seconds` of frames
    pub fn run(level: &mut Level, seconds: f32, input: ControllerInput) {
        for _ in 0..frames(seconds) {
            level.frame(FRAME, input);
        }
    }

    /// Run until `done` holds, giving up after `seconds`
    pub fn run_until(
        level: &mut Level,
        seconds: f32,
        input: ControllerInput,
        done: impl Fn(&Level) -> bool,
    ) -> bool {
        for _ in 0..frames(seconds) {
            if done(level) {
                return true;
            }
            level.frame(FRAME, input);
        }
        done(level)
    }

    /// Press `input` for a single frame
    pub fn tap(level: &mut Level, input: ControllerInput) {
        level.frame(FRAME, input);
    }
}
