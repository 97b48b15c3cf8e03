//! Player input sampling

/// Held input values for one frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControllerInput {
    /// Horizontal axis in `[-1, 1]`
    pub move_x: f32,
    pub jump: bool,
    pub dash: bool,
    pub crouch: bool,
}

impl ControllerInput {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn moving(move_x: f32) -> Self {
        Self {
            move_x,
            ..Self::default()
        }
    }
}

/// Current and previous frame, for press/release edges
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct InputState {
    previous: ControllerInput,
    current: ControllerInput,
}

impl InputState {
    pub fn observe(&mut self, mut input: ControllerInput) {
        input.move_x = if input.move_x.is_finite() {
            input.move_x.clamp(-1.0, 1.0)
        } else {
            0.0
        };
        self.previous = self.current;
        self.current = input;
    }

    /// Drop pending edges. Buttons still down stay held and must be
    /// released before they press again.
    pub fn clear(&mut self) {
        let held = ControllerInput {
            move_x: 0.0,
            ..self.current
        };
        self.previous = held;
        self.current = held;
    }

    pub fn move_x(&self) -> f32 {
        self.current.move_x
    }

    pub fn jump_pressed(&self) -> bool {
        self.current.jump && !self.previous.jump
    }

    pub fn jump_held(&self) -> bool {
        self.current.jump
    }

    pub fn dash_pressed(&self) -> bool {
        self.current.dash && !self.previous.dash
    }

    pub fn crouch_held(&self) -> bool {
        self.current.crouch
    }

    pub fn crouch_released(&self) -> bool {
        !self.current.crouch && self.previous.crouch
    }
}
