//! Movement state machine
//!
//! Platformer controller over a [`PhysicsBody`]: run, buffered jump with
//! coyote time, dash, crouch and slide. Discrete transitions and timers run
//! in [`MovementController::update`] (variable step); velocity shaping runs
//! in [`MovementController::fixed_update`] before the world integrates the
//! body.
//!
//! While the [`ControlGate`] is closed (rewind playback) neither step does
//! anything. A rewind resets every flag and timer and schedules a teleport
//! to the respawn anchor, applied on the first step after the gate reopens.

use std::cell::RefCell;
use std::rc::Rc;

use chronoloop_shared::{AudioCue, MovementTuning};
use glam::Vec2;
use smallvec::SmallVec;

use crate::bus::{RewindBus, RewindListener, SubscriptionHandle};
use crate::physics::{SharedBody, WorldProbe};

mod gate;
mod input;


pub use gate::ControlGate;
pub use input::ControllerInput;

use input::InputState;

/// Below this the horizontal axis counts as neutral
const INPUT_DEADZONE: f32 = 0.01;
/// Footsteps need at least this horizontal speed
const FOOTSTEP_MIN_SPEED: f32 = 0.1;
/// Stand-up probe: shrunken standing box swept slightly upward
const STAND_CAST_SCALE: f32 = 0.9;
const STAND_CAST_DISTANCE: f32 = 0.05;
/// Friction factors for overshoot correction
const GROUND_FRICTION: f32 = 0.15;
const AIR_FRICTION: f32 = 0.05;
/// Slide deceleration factor while holding the slide direction
const SLIDE_HOLD_FACTOR: f32 = 0.3;
/// Float slack on timer window ends
const TIMER_EPSILON: f32 = 1e-4;

/// Discrete mode flags. `sliding` implies `crouching`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MovementFlags {
    pub grounded: bool,
    pub crouching: bool,
    pub sliding: bool,
    pub dashing: bool,
    pub invincible: bool,
}

/// Countdown timers, in seconds. A timer is armed while positive.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MovementTimers {
    pub coyote: f32,
    pub jump_buffer: f32,
    pub dash: f32,
    pub dash_cooldown: f32,
    pub slide: f32,
    pub invincibility: f32,
}

/// Gameplay events the level turns into effects
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MovementEvent {
    /// Spawn a dead-body marker where the player died
    DeathMarker { position: Vec2 },
    /// A jump was executed
    Jumped,
}

pub struct MovementController {
    tuning: MovementTuning,
    body: SharedBody,
    control: ControlGate,
    bus: RewindBus,
    respawn_anchor: Vec2,
    standing_size: Vec2,
    standing_offset: Vec2,

    input: InputState,
    flags: MovementFlags,
    timers: MovementTimers,
    was_grounded: bool,
    /// Left the ground by jumping; coyote time is not granted
    jumped: bool,
    /// Death invincibility, held until the rewind completes
    death_lock: bool,
    footstep_timer: f32,

    time_machine: bool,
    pending_respawn: bool,
    deaths: u32,

    cues: SmallVec<[AudioCue; 4]>,
    events: SmallVec<[MovementEvent; 2]>,
    subscription: Option<SubscriptionHandle>,
}

impl MovementController {
    /// The body's current collider is taken as the standing collider
    pub fn new(
        tuning: MovementTuning,
        body: SharedBody,
        control: ControlGate,
        bus: RewindBus,
        respawn_anchor: Vec2,
    ) -> Self {
        let (standing_size, standing_offset) = {
            let body = body.borrow();
            (body.collider_size(), body.collider_offset())
        };
        Self {
            tuning,
            body,
            control,
            bus,
            respawn_anchor,
            standing_size,
            standing_offset,
            input: InputState::default(),
            flags: MovementFlags::default(),
            timers: MovementTimers::default(),
            was_grounded: false,
            jumped: false,
            death_lock: false,
            footstep_timer: 0.0,
            time_machine: true,
            pending_respawn: false,
            deaths: 0,
            cues: SmallVec::new(),
            events: SmallVec::new(),
            subscription: None,
        }
    }

    /// Subscribe `controller` to its bus
    pub fn attach(controller: &Rc<RefCell<Self>>) {
        let bus = controller.borrow().bus.clone();
        let handle = bus.subscribe_listener(controller);
        controller.borrow_mut().subscription = Some(handle);
    }

    pub fn teardown(&mut self) {
        if let Some(handle) = self.subscription.take() {
            self.bus.unsubscribe(handle);
        }
    }

    /// Resolve the spawn contact so the first frame does not read as a landing
    pub fn initialize(&mut self, world: &dyn WorldProbe) {
        self.flags.grounded = self.probe_ground(world);
        self.was_grounded = self.flags.grounded;
    }

    // ========================================================================
    // Variable step
    // ========================================================================

    /// Sample input and run discrete transitions
    pub fn update(&mut self, input: ControllerInput, world: &dyn WorldProbe, dt: f32) {
        if !self.control.is_enabled() {
            return;
        }
        self.apply_pending_respawn();
        self.input.observe(input);

        self.tick_timers(world, dt);
        self.check_ground(world);
        self.handle_crouch_and_slide(world, dt);
        self.handle_dash(world);
        self.handle_jump(world, dt);
        self.handle_footsteps(dt);

        debug_assert!(!self.flags.sliding || self.flags.crouching);
    }

    fn tick_timers(&mut self, world: &dyn WorldProbe, dt: f32) {
        let timers = &mut self.timers;
        if timers.coyote > 0.0 {
            timers.coyote -= dt;
        }
        if timers.dash_cooldown > 0.0 {
            timers.dash_cooldown -= dt;
        }
        if timers.invincibility > 0.0 {
            timers.invincibility -= dt;
            if timers.invincibility <= 0.0 && !self.death_lock {
                self.flags.invincible = false;
            }
        }

        if self.flags.dashing {
            self.timers.dash -= dt;
            if self.timers.dash <= 0.0 {
                self.end_dash();
            }
        }
        if self.flags.sliding {
            self.timers.slide -= dt;
            if self.timers.slide <= 0.0 {
                self.end_slide(world);
            }
        }
    }

    fn probe_ground(&self, world: &dyn WorldProbe) -> bool {
        let center = self.body.borrow().position() + self.tuning.ground_check_offset;
        world.overlaps_ground(center, self.tuning.ground_check_radius)
    }

    fn check_ground(&mut self, world: &dyn WorldProbe) {
        self.was_grounded = self.flags.grounded;
        self.flags.grounded = self.probe_ground(world);

        if self.was_grounded && !self.flags.grounded && !self.jumped {
            self.timers.coyote = self.tuning.coyote_time;
        }
        if !self.was_grounded && self.flags.grounded {
            self.cues.push(AudioCue::Land);
        }
        if self.flags.grounded && self.body.borrow().velocity().y <= 0.0 {
            self.jumped = false;
        }
    }

    fn handle_crouch_and_slide(&mut self, world: &dyn WorldProbe, dt: f32) {
        if self.flags.dashing {
            return;
        }

        let crouch_held = self.input.crouch_held();
        if crouch_held && self.flags.grounded && !self.flags.crouching {
            let vx = self.body.borrow().velocity().x;
            if vx.abs() > self.tuning.slide_min_speed {
                self.start_slide(vx);
            } else {
                self.flags.crouching = true;
                self.set_crouch_collider();
            }
        } else if self.flags.crouching && !self.flags.sliding && !crouch_held {
            let stood = self.try_stand_up(world);
            if !stood && self.input.crouch_released() {
                tracing::debug!("crouch released under an obstruction, staying down");
            }
        }

        if self.flags.sliding {
            let mut body = self.body.borrow_mut();
            let mut velocity = body.velocity();
            let move_x = self.input.move_x();
            let holding = move_x.abs() > INPUT_DEADZONE && move_x.signum() == velocity.x.signum();
            let rate = if holding {
                self.tuning.slide_deceleration * SLIDE_HOLD_FACTOR
            } else {
                self.tuning.slide_deceleration
            };
            velocity.x = move_towards(velocity.x, 0.0, rate * dt);
            body.set_velocity(velocity);
        }
    }

    fn start_slide(&mut self, vx: f32) {
        self.flags.sliding = true;
        self.flags.crouching = true;
        self.timers.slide = self.tuning.slide_duration;

        let direction = if vx == 0.0 { self.facing() } else { vx.signum() };
        {
            let mut body = self.body.borrow_mut();
            let velocity = body.velocity();
            body.set_velocity(Vec2::new(
                velocity.x + direction * self.tuning.slide_added_speed,
                velocity.y,
            ));
        }
        self.set_crouch_collider();
        self.cues.push(AudioCue::Slide);
        tracing::debug!(direction, "slide started");
    }

    /// Slide ran its course; stay crouched while the button is held
    fn end_slide(&mut self, world: &dyn WorldProbe) {
        self.flags.sliding = false;
        self.timers.slide = 0.0;
        if !self.input.crouch_held() {
            self.try_stand_up(world);
        }
    }

    /// Jump or dash cut the slide short
    fn interrupt_slide(&mut self, world: &dyn WorldProbe) {
        self.flags.sliding = false;
        self.timers.slide = 0.0;
        if !self.try_stand_up(world) {
            tracing::debug!("slide interrupted under an obstruction, staying crouched");
        }
    }

    fn try_stand_up(&mut self, world: &dyn WorldProbe) -> bool {
        if !self.can_stand_up(world) {
            return false;
        }
        self.flags.crouching = false;
        self.set_stand_collider();
        true
    }

    fn can_stand_up(&self, world: &dyn WorldProbe) -> bool {
        let origin = self.body.borrow().position() + self.standing_offset;
        !world.box_cast_up(
            origin,
            self.standing_size * STAND_CAST_SCALE,
            STAND_CAST_DISTANCE,
        )
    }

    fn set_crouch_collider(&mut self) {
        let mut body = self.body.borrow_mut();
        body.set_collider_size(self.tuning.crouch_size);
        body.set_collider_offset(self.tuning.crouch_offset);
    }

    fn set_stand_collider(&mut self) {
        let mut body = self.body.borrow_mut();
        body.set_collider_size(self.standing_size);
        body.set_collider_offset(self.standing_offset);
    }

    fn handle_dash(&mut self, world: &dyn WorldProbe) {
        if !self.input.dash_pressed() {
            return;
        }
        if self.flags.dashing || self.timers.dash_cooldown > 0.0 {
            tracing::debug!(cooldown = self.timers.dash_cooldown, "dash unavailable");
            return;
        }
        if self.flags.sliding {
            self.interrupt_slide(world);
        }

        let move_x = self.input.move_x();
        let direction = if move_x.abs() > INPUT_DEADZONE {
            move_x.signum()
        } else {
            self.facing()
        };

        self.flags.dashing = true;
        self.timers.dash = self.tuning.dash_duration;
        self.timers.dash_cooldown = self.tuning.dash_cooldown;

        let invincibility = self.tuning.dash_invincibility.min(self.tuning.dash_duration);
        if invincibility > 0.0 {
            self.timers.invincibility = self.timers.invincibility.max(invincibility);
            self.flags.invincible = true;
        }

        {
            let mut body = self.body.borrow_mut();
            let velocity = body.velocity();
            body.set_gravity_scale(0.0);
            body.set_velocity(Vec2::new(
                velocity.x + direction * self.tuning.dash_added_speed,
                0.0,
            ));
        }
        self.cues.push(AudioCue::Dash);
        tracing::debug!(direction, "dash started");
    }

    fn end_dash(&mut self) {
        self.flags.dashing = false;
        self.timers.dash = 0.0;
        self.body.borrow_mut().set_gravity_scale(1.0);
    }

    /// Arm the buffer on a press, otherwise count it down. Returns whether a
    /// buffered press is live this frame.
    fn tick_jump_buffer(&mut self, dt: f32) -> bool {
        if self.input.jump_pressed() {
            self.timers.jump_buffer = self.tuning.jump_buffer_time;
            return true;
        }
        if self.timers.jump_buffer <= 0.0 {
            return false;
        }
        // Inclusive: a press exactly one window ago still counts
        let remaining = self.timers.jump_buffer - dt;
        self.timers.jump_buffer = remaining.max(0.0);
        remaining > -TIMER_EPSILON
    }

    fn handle_jump(&mut self, world: &dyn WorldProbe, dt: f32) {
        let buffered = self.tick_jump_buffer(dt);
        if buffered && self.flags.sliding {
            self.interrupt_slide(world);
        }

        let supported = self.flags.grounded || self.timers.coyote > 0.0;
        if buffered && supported && !self.flags.crouching {
            {
                let mut body = self.body.borrow_mut();
                let velocity = body.velocity();
                body.set_velocity(Vec2::new(velocity.x, self.tuning.jump_force));
            }
            self.timers.jump_buffer = 0.0;
            self.timers.coyote = 0.0;
            self.jumped = true;
            self.cues.push(AudioCue::Jump);
            self.events.push(MovementEvent::Jumped);
            tracing::debug!(grounded = self.flags.grounded, "jump");
        }
    }

    fn handle_footsteps(&mut self, dt: f32) {
        let speed = self.body.borrow().velocity().x.abs();
        let running = self.flags.grounded
            && !self.flags.sliding
            && !self.flags.dashing
            && speed > FOOTSTEP_MIN_SPEED;
        if !running {
            self.footstep_timer = 0.0;
            return;
        }
        self.footstep_timer -= dt;
        if self.footstep_timer <= 0.0 {
            self.cues.push(AudioCue::Footstep);
            self.footstep_timer = self.tuning.footstep_interval;
        }
    }

    // ========================================================================
    // Fixed step
    // ========================================================================

    /// Shape the velocity before the world integrates the body
    pub fn fixed_update(&mut self, world: &dyn WorldProbe, dt: f32) {
        if !self.control.is_enabled() {
            return;
        }
        self.apply_pending_respawn();

        if !self.flags.dashing {
            self.apply_movement(dt);
        }
        self.apply_gravity(world, dt);
        self.clamp_speed();
    }

    fn apply_movement(&mut self, dt: f32) {
        if self.flags.sliding {
            return;
        }

        let move_x = self.input.move_x();
        let speed = if self.flags.crouching {
            self.tuning.crouch_speed
        } else {
            self.tuning.move_speed
        };
        let target = move_x * speed;

        let mut body = self.body.borrow_mut();
        let mut velocity = body.velocity();
        let pushing_same_way =
            move_x.abs() > INPUT_DEADZONE && move_x.signum() == velocity.x.signum();

        if pushing_same_way && velocity.x.abs() > target.abs() {
            let friction = if self.flags.grounded {
                GROUND_FRICTION
            } else {
                AIR_FRICTION
            };
            velocity.x = move_towards(velocity.x, target, self.tuning.deceleration * friction * dt);
        } else {
            let rate = if target.abs() > INPUT_DEADZONE {
                self.tuning.acceleration
            } else {
                self.tuning.deceleration
            };
            velocity.x = move_towards(velocity.x, target, rate * dt);
        }
        body.set_velocity(velocity);

        if move_x.abs() > INPUT_DEADZONE {
            let scale = body.scale();
            body.set_scale(Vec2::new(scale.x.abs() * move_x.signum(), scale.y));
        }
    }

    fn apply_gravity(&mut self, world: &dyn WorldProbe, dt: f32) {
        if self.flags.dashing {
            return;
        }
        let gravity = world.gravity().y;
        let mut body = self.body.borrow_mut();
        let mut velocity = body.velocity();
        if velocity.y < 0.0 {
            velocity.y += gravity * (self.tuning.fall_gravity_multiplier - 1.0) * dt;
        } else if velocity.y > 0.0 && !self.input.jump_held() {
            velocity.y += gravity * (self.tuning.low_jump_multiplier - 1.0) * dt;
        }
        body.set_velocity(velocity);
    }

    fn clamp_speed(&mut self) {
        let max = self.tuning.max_horizontal_speed;
        let mut body = self.body.borrow_mut();
        let mut velocity = body.velocity();
        if velocity.x.abs() > max {
            velocity.x = velocity.x.signum() * max;
            body.set_velocity(velocity);
        }
    }

    // ========================================================================
    // Death and rewind
    // ========================================================================

    /// Hazard contact from the world. Returns `true` if it killed the player.
    pub fn on_hazard_contact(&mut self) -> bool {
        if !self.control.is_enabled() {
            return false;
        }
        if self.flags.invincible {
            tracing::debug!("hazard contact while invincible, ignored");
            return false;
        }

        self.flags.invincible = true;
        self.death_lock = true;
        self.deaths += 1;

        let position = self.body.borrow().position();
        self.events.push(MovementEvent::DeathMarker { position });
        self.cues.push(AudioCue::Death);
        tracing::info!(x = position.x, y = position.y, "player died");

        if self.time_machine {
            self.bus.raise();
        } else {
            self.reset_state();
            self.pending_respawn = true;
        }
        true
    }

    /// Reset flags and timers and schedule the respawn teleport
    pub fn on_rewind(&mut self) {
        self.reset_state();
        self.pending_respawn = true;
        tracing::debug!("movement reset for rewind");
    }

    fn reset_state(&mut self) {
        if self.flags.dashing {
            self.end_dash();
        }
        let invincible = self.flags.invincible && self.death_lock;
        self.flags = MovementFlags {
            invincible,
            ..MovementFlags::default()
        };
        self.timers = MovementTimers::default();
        self.was_grounded = false;
        self.jumped = false;
        self.footstep_timer = 0.0;
        self.input.clear();
    }

    fn apply_pending_respawn(&mut self) {
        if !self.pending_respawn {
            return;
        }
        self.pending_respawn = false;
        {
            let mut body = self.body.borrow_mut();
            body.set_position(self.respawn_anchor);
            body.set_velocity(Vec2::ZERO);
            body.set_gravity_scale(1.0);
            body.set_collider_size(self.standing_size);
            body.set_collider_offset(self.standing_offset);
        }
        if !self.time_machine {
            self.stop_being_invincible();
        }
        tracing::debug!(
            x = self.respawn_anchor.x,
            y = self.respawn_anchor.y,
            "respawned at anchor"
        );
    }

    /// Release the death invincibility
    pub fn stop_being_invincible(&mut self) {
        self.death_lock = false;
        self.flags.invincible = self.timers.invincibility > 0.0;
    }

    /// With the time machine off, deaths respawn locally instead of rewinding
    pub fn set_time_machine(&mut self, enabled: bool) {
        self.time_machine = enabled;
    }

    pub fn set_respawn_anchor(&mut self, anchor: Vec2) {
        self.respawn_anchor = anchor;
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn flags(&self) -> MovementFlags {
        self.flags
    }

    pub fn timers(&self) -> MovementTimers {
        self.timers
    }

    pub fn is_grounded(&self) -> bool {
        self.flags.grounded
    }

    pub fn is_crouching(&self) -> bool {
        self.flags.crouching
    }

    pub fn is_sliding(&self) -> bool {
        self.flags.sliding
    }

    pub fn is_dashing(&self) -> bool {
        self.flags.dashing
    }

    pub fn is_invincible(&self) -> bool {
        self.flags.invincible
    }

    /// `1` facing right, `-1` facing left
    pub fn facing(&self) -> f32 {
        if self.body.borrow().scale().x < 0.0 {
            -1.0
        } else {
            1.0
        }
    }

    pub fn velocity(&self) -> Vec2 {
        self.body.borrow().velocity()
    }

    pub fn respawn_anchor(&self) -> Vec2 {
        self.respawn_anchor
    }

    pub fn has_pending_respawn(&self) -> bool {
        self.pending_respawn
    }

    pub fn deaths(&self) -> u32 {
        self.deaths
    }

    pub fn control(&self) -> &ControlGate {
        &self.control
    }

    pub fn tuning(&self) -> &MovementTuning {
        &self.tuning
    }

    pub fn drain_cues(&mut self) -> SmallVec<[AudioCue; 4]> {
        std::mem::take(&mut self.cues)
    }

    pub fn drain_events(&mut self) -> SmallVec<[MovementEvent; 2]> {
        std::mem::take(&mut self.events)
    }
}

impl RewindListener for MovementController {
    fn on_rewind(&mut self) {
        MovementController::on_rewind(self);
    }
}

impl std::fmt::Debug for MovementController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MovementController")
            .field("flags", &self.flags)
            .field("timers", &self.timers)
            .field("pending_respawn", &self.pending_respawn)
            .finish()
    }
}

/// Step `current` toward `target` by at most `max_delta`
fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}
