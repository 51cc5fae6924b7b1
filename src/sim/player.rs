//! Player movement state machine
//!
//! One `advance` per tick. The order is fixed: grace timers, contact refresh,
//! horizontal blend, jump shaping, then jump/wall-jump/slide resolution.
//! Contact flags come from the previous physics step, so landing is seen one
//! tick after the body touches down.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::physics::{ContactFlags, PhysicsPort};
use crate::colors;
use crate::consts::*;
use crate::input::InputState;
use crate::lerp;

/// Everything the controller knows about its body between ticks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerKinematics {
    pub position: Vec2,
    pub velocity: Vec2,
    pub is_grounded: bool,
    pub is_touching_wall: bool,
    /// -1 left wall, 1 right wall, 0 none (or both)
    pub wall_side: i8,
    pub jump_buffer_ms: f32,
    pub coyote_ms: f32,
}

impl PlayerKinematics {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            is_grounded: false,
            is_touching_wall: false,
            wall_side: 0,
            jump_buffer_ms: 0.0,
            coyote_ms: 0.0,
        }
    }
}

/// Gates for optional controller branches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilitySet {
    pub wall_slide: bool,
    pub wall_jump: bool,
    pub beat_dash: bool,
    pub echo_mode: bool,
}

impl Default for AbilitySet {
    fn default() -> Self {
        Self {
            wall_slide: true,
            wall_jump: true,
            beat_dash: false,
            echo_mode: false,
        }
    }
}

/// Body state read back from physics
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BodyFeedback {
    pub position: Vec2,
    pub velocity: Vec2,
    pub contacts: ContactFlags,
}

impl BodyFeedback {
    pub fn from_port(body: &dyn PhysicsPort) -> Self {
        Self {
            position: body.position(),
            velocity: body.velocity(),
            contacts: body.contacts(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementState {
    Grounded,
    Airborne,
    WallSliding,
    /// Rising after pushing off a wall
    WallJumping,
}

/// Render hints derived from motion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualState {
    pub tint: u32,
    pub scale: Vec2,
    pub rotation: f32,
}

impl VisualState {
    /// Squash/stretch and lean from horizontal speed, tint from contact
    pub fn from_motion(velocity: Vec2, grounded: bool, touching_wall: bool) -> Self {
        let r = velocity.x.abs() / PLAYER_SPEED;
        let tint = if touching_wall && !grounded {
            colors::PARTICLE
        } else if !grounded {
            colors::NOTE
        } else {
            colors::PLAYER
        };
        Self {
            tint,
            scale: Vec2::new(1.0 + 0.1 * r, 1.0 - 0.05 * r),
            rotation: velocity.x / PLAYER_SPEED * 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerEvent {
    Jumped,
    WallJumped,
    Respawned,
}

/// Result of one tick
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerOutput {
    /// Desired body velocity
    pub velocity: Vec2,
    pub visual: VisualState,
    pub state: MovementState,
    pub events: Vec<PlayerEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerController {
    kin: PlayerKinematics,
    pub abilities: AbilitySet,
    spawn: Vec2,
    state: MovementState,
}

impl PlayerController {
    pub fn new(spawn: Vec2) -> Self {
        Self {
            kin: PlayerKinematics::at(spawn),
            abilities: AbilitySet::default(),
            spawn,
            state: MovementState::Airborne,
        }
    }

    pub fn kinematics(&self) -> &PlayerKinematics {
        &self.kin
    }

    pub fn state(&self) -> MovementState {
        self.state
    }

    pub fn spawn(&self) -> Vec2 {
        self.spawn
    }

    pub fn set_spawn(&mut self, spawn: Vec2) {
        self.spawn = spawn;
    }

    /// Advance one tick from explicit body feedback
    pub fn advance(&mut self, input: &InputState, elapsed_ms: f32, feedback: &BodyFeedback) -> PlayerOutput {
        let mut events = Vec::new();
        let mut vel = feedback.velocity;
        self.kin.position = feedback.position;

        // Grace timers use last tick's ground flag
        if input.jump_pressed {
            self.kin.jump_buffer_ms = JUMP_BUFFER_MS;
        } else {
            self.kin.jump_buffer_ms = (self.kin.jump_buffer_ms - elapsed_ms).max(0.0);
        }
        if self.kin.is_grounded {
            self.kin.coyote_ms = COYOTE_MS;
        } else {
            self.kin.coyote_ms = (self.kin.coyote_ms - elapsed_ms).max(0.0);
        }

        // Contacts
        let contacts = feedback.contacts;
        self.kin.is_grounded = contacts.down;
        self.kin.is_touching_wall = contacts.left || contacts.right;
        self.kin.wall_side = match (contacts.left, contacts.right) {
            (true, false) => -1,
            (false, true) => 1,
            _ => 0,
        };
        let grounded = self.kin.is_grounded;

        // Horizontal
        let mut target = if input.left {
            -PLAYER_SPEED
        } else if input.right {
            PLAYER_SPEED
        } else {
            0.0
        };
        if !grounded {
            target *= AIR_CONTROL;
        }
        if target != 0.0 {
            let accel = if grounded { ACCELERATION } else { ACCELERATION * 0.5 };
            vel.x = lerp(vel.x, target, accel);
        } else if grounded {
            vel.x = lerp(vel.x, 0.0, DECELERATION);
            if vel.x.abs() < STOP_THRESHOLD {
                vel.x = 0.0;
            }
        }

        // Variable jump height
        if input.jump && vel.y < 0.0 {
            vel.y *= JUMP_HOLD_FACTOR;
        } else if !input.jump && vel.y < JUMP_CUT_MIN_RISE {
            vel.y *= JUMP_CUT_FACTOR;
        }

        // Wall branches need exactly one wall
        let on_wall = self.abilities.wall_slide
            && self.kin.wall_side != 0
            && !grounded
            && vel.y > 0.0;
        let pressing_into_wall = (self.kin.wall_side == -1 && input.left)
            || (self.kin.wall_side == 1 && input.right);
        let buffered = self.kin.jump_buffer_ms > 0.0;

        let mut sliding = false;
        if on_wall && self.abilities.wall_jump && buffered {
            vel.x = self.kin.wall_side as f32 * -WALL_JUMP_PUSH;
            vel.y = JUMP_FORCE * WALL_JUMP_FACTOR;
            self.kin.jump_buffer_ms = 0.0;
            self.kin.coyote_ms = 0.0;
            self.state = MovementState::WallJumping;
            events.push(PlayerEvent::WallJumped);
        } else if buffered && (self.kin.coyote_ms > 0.0 || grounded) {
            vel.y = JUMP_FORCE;
            self.kin.jump_buffer_ms = 0.0;
            self.kin.coyote_ms = 0.0;
            events.push(PlayerEvent::Jumped);
        } else if on_wall && pressing_into_wall {
            vel.y = vel.y.min(WALL_SLIDE_MAX_SPEED);
            sliding = true;
        }

        self.state = if grounded {
            MovementState::Grounded
        } else if sliding {
            MovementState::WallSliding
        } else if self.state == MovementState::WallJumping && vel.y < 0.0 && !self.kin.is_touching_wall {
            MovementState::WallJumping
        } else if events.contains(&PlayerEvent::WallJumped) {
            MovementState::WallJumping
        } else {
            MovementState::Airborne
        };

        self.kin.velocity = vel;

        PlayerOutput {
            velocity: vel,
            visual: VisualState::from_motion(vel, grounded, self.kin.is_touching_wall),
            state: self.state,
            events,
        }
    }

    /// Read feedback from `body`, advance, and write the velocity back
    pub fn drive(&mut self, input: &InputState, elapsed_ms: f32, body: &mut dyn PhysicsPort) -> PlayerOutput {
        let feedback = BodyFeedback::from_port(body);
        let output = self.advance(input, elapsed_ms, &feedback);
        body.set_velocity(output.velocity);
        output
    }

    /// Back to spawn: velocity zeroed, timers and contacts cleared
    pub fn respawn(&mut self) -> PlayerEvent {
        self.kin = PlayerKinematics::at(self.spawn);
        self.state = MovementState::Airborne;
        PlayerEvent::Respawned
    }

    /// `respawn` plus moving the body to match
    pub fn respawn_body(&mut self, body: &mut dyn PhysicsPort) -> PlayerEvent {
        let event = self.respawn();
        body.teleport(self.spawn);
        body.set_velocity(Vec2::ZERO);
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 20.0;

    fn grounded_at(vel: Vec2) -> BodyFeedback {
        BodyFeedback {
            position: Vec2::new(100.0, 400.0),
            velocity: vel,
            contacts: ContactFlags {
                down: true,
                ..Default::default()
            },
        }
    }

    fn airborne(vel: Vec2) -> BodyFeedback {
        BodyFeedback {
            position: Vec2::new(100.0, 300.0),
            velocity: vel,
            contacts: ContactFlags::default(),
        }
    }

    fn on_wall(vel: Vec2, left: bool, right: bool) -> BodyFeedback {
        BodyFeedback {
            position: Vec2::new(100.0, 300.0),
            velocity: vel,
            contacts: ContactFlags {
                left,
                right,
                ..Default::default()
            },
        }
    }

    fn press() -> InputState {
        InputState {
            jump: true,
            jump_pressed: true,
            ..Default::default()
        }
    }

    fn hold() -> InputState {
        InputState {
            jump: true,
            ..Default::default()
        }
    }

    fn count_jumps(out: &PlayerOutput) -> usize {
        out.events.iter().filter(|e| **e == PlayerEvent::Jumped).count()
    }

    #[test]
    fn test_jump_buffer_lands_within_window() {
        let mut player = PlayerController::new(Vec2::ZERO);
        // Long fall so coyote time is gone
        for _ in 0..10 {
            player.advance(&InputState::default(), DT, &airborne(Vec2::new(0.0, 200.0)));
        }
        let out = player.advance(&press(), DT, &airborne(Vec2::new(0.0, 200.0)));
        assert_eq!(count_jumps(&out), 0);
        let out = player.advance(&hold(), DT, &airborne(Vec2::new(0.0, 200.0)));
        assert_eq!(count_jumps(&out), 0);

        // Land 40 ms after the press
        let mut jumps = 0;
        let out = player.advance(&hold(), DT, &grounded_at(Vec2::ZERO));
        jumps += count_jumps(&out);
        assert_eq!(out.velocity.y, JUMP_FORCE);
        for _ in 0..10 {
            jumps += count_jumps(&player.advance(&hold(), DT, &grounded_at(Vec2::ZERO)));
        }
        assert_eq!(jumps, 1);
    }

    #[test]
    fn test_jump_buffer_expires() {
        let mut player = PlayerController::new(Vec2::ZERO);
        for _ in 0..10 {
            player.advance(&InputState::default(), DT, &airborne(Vec2::new(0.0, 200.0)));
        }
        player.advance(&press(), DT, &airborne(Vec2::new(0.0, 200.0)));
        // 160 ms later
        for _ in 0..8 {
            player.advance(&hold(), DT, &airborne(Vec2::new(0.0, 200.0)));
        }
        let out = player.advance(&hold(), DT, &grounded_at(Vec2::ZERO));
        assert_eq!(count_jumps(&out), 0);
    }

    fn leave_ground_then_press(airborne_ticks: usize) -> PlayerOutput {
        let mut player = PlayerController::new(Vec2::ZERO);
        for _ in 0..5 {
            player.advance(&InputState::default(), DT, &grounded_at(Vec2::ZERO));
        }
        for _ in 0..airborne_ticks {
            player.advance(&InputState::default(), DT, &airborne(Vec2::new(0.0, 50.0)));
        }
        player.advance(&press(), DT, &airborne(Vec2::new(0.0, 50.0)))
    }

    #[test]
    fn test_coyote_time() {
        // 60 ms after leaving the ledge
        assert_eq!(count_jumps(&leave_ground_then_press(2)), 1);
        // 120 ms after
        assert_eq!(count_jumps(&leave_ground_then_press(6)), 0);
    }

    #[test]
    fn test_wall_jump_pushes_away() {
        for (left, right, side) in [(true, false, -1.0), (false, true, 1.0)] {
            let mut player = PlayerController::new(Vec2::ZERO);
            for _ in 0..10 {
                player.advance(&InputState::default(), DT, &airborne(Vec2::new(0.0, 50.0)));
            }
            let out = player.advance(&press(), DT, &on_wall(Vec2::new(0.0, 50.0), left, right));
            assert_eq!(out.velocity.x.signum(), -side);
            assert_eq!(out.velocity.x, side * -WALL_JUMP_PUSH);
            assert_eq!(out.velocity.y, WALL_JUMP_FACTOR * JUMP_FORCE);
            assert_eq!(out.events, vec![PlayerEvent::WallJumped]);
            assert_eq!(out.state, MovementState::WallJumping);
        }
    }

    #[test]
    fn test_wall_jump_beats_coyote_jump() {
        let mut player = PlayerController::new(Vec2::ZERO);
        player.advance(&InputState::default(), DT, &grounded_at(Vec2::ZERO));
        let out = player.advance(&press(), DT, &on_wall(Vec2::new(0.0, 50.0), false, true));
        assert_eq!(out.events, vec![PlayerEvent::WallJumped]);
        assert_eq!(player.kinematics().coyote_ms, 0.0);
        assert_eq!(player.kinematics().jump_buffer_ms, 0.0);
    }

    #[test]
    fn test_both_walls_disable_wall_branches() {
        let mut player = PlayerController::new(Vec2::ZERO);
        for _ in 0..10 {
            player.advance(&InputState::default(), DT, &airborne(Vec2::new(0.0, 50.0)));
        }
        let out = player.advance(&press(), DT, &on_wall(Vec2::new(0.0, 400.0), true, true));
        assert!(out.events.is_empty());
        assert_eq!(player.kinematics().wall_side, 0);
        assert_eq!(out.velocity.y, 400.0);
    }

    #[test]
    fn test_wall_slide_caps_fall() {
        let mut player = PlayerController::new(Vec2::ZERO);
        let input = InputState {
            left: true,
            ..Default::default()
        };
        let out = player.advance(&input, DT, &on_wall(Vec2::new(0.0, 400.0), true, false));
        assert_eq!(out.velocity.y, WALL_SLIDE_MAX_SPEED);
        assert_eq!(out.state, MovementState::WallSliding);
        assert_eq!(out.visual.tint, colors::PARTICLE);

        // Not pressing toward the wall: no cap
        let out = player.advance(&InputState::default(), DT, &on_wall(Vec2::new(0.0, 400.0), true, false));
        assert_eq!(out.velocity.y, 400.0);
    }

    #[test]
    fn test_rising_along_wall_neither_slides_nor_wall_jumps() {
        let mut player = PlayerController::new(Vec2::ZERO);
        for _ in 0..10 {
            player.advance(&InputState::default(), DT, &airborne(Vec2::new(0.0, 50.0)));
        }
        let into_wall = InputState {
            left: true,
            jump: true,
            jump_pressed: true,
            ..Default::default()
        };
        let out = player.advance(&into_wall, DT, &on_wall(Vec2::new(0.0, -200.0), true, false));
        assert!(out.events.is_empty());
        assert_ne!(out.state, MovementState::WallSliding);
        assert_eq!(out.velocity.y, -200.0 * JUMP_HOLD_FACTOR);

        // Once the body starts falling the still-buffered press wall-jumps
        let held = InputState {
            left: true,
            jump: true,
            ..Default::default()
        };
        let out = player.advance(&held, DT, &on_wall(Vec2::new(0.0, 50.0), true, false));
        assert!(out.events.contains(&PlayerEvent::WallJumped));
    }

    #[test]
    fn test_variable_jump_height() {
        let mut player = PlayerController::new(Vec2::ZERO);
        let out = player.advance(&hold(), DT, &airborne(Vec2::new(0.0, -300.0)));
        assert!((out.velocity.y - -294.0).abs() < 1e-3);

        let out = player.advance(&InputState::default(), DT, &airborne(Vec2::new(0.0, -300.0)));
        assert_eq!(out.velocity.y, -150.0);

        let out = player.advance(&InputState::default(), DT, &airborne(Vec2::new(0.0, -80.0)));
        assert_eq!(out.velocity.y, -80.0);
    }

    #[test]
    fn test_horizontal_blend() {
        let mut player = PlayerController::new(Vec2::ZERO);
        let right = InputState {
            right: true,
            ..Default::default()
        };
        let out = player.advance(&right, DT, &grounded_at(Vec2::ZERO));
        assert!((out.velocity.x - 60.0).abs() < 1e-4);

        // Airborne: 0.75 of the target, half the acceleration
        let out = player.advance(&right, DT, &airborne(Vec2::ZERO));
        assert!((out.velocity.x - 22.5).abs() < 1e-4);

        // Airborne without input keeps momentum
        let out = player.advance(&InputState::default(), DT, &airborne(Vec2::new(120.0, 0.0)));
        assert_eq!(out.velocity.x, 120.0);

        // Ground deceleration snaps to zero
        let out = player.advance(&InputState::default(), DT, &grounded_at(Vec2::new(11.0, 0.0)));
        assert_eq!(out.velocity.x, 0.0);
        let out = player.advance(&InputState::default(), DT, &grounded_at(Vec2::new(100.0, 0.0)));
        assert!((out.velocity.x - 90.0).abs() < 1e-4);
    }

    #[test]
    fn test_visual_state() {
        let vis = VisualState::from_motion(Vec2::new(300.0, 0.0), true, false);
        assert_eq!(vis.tint, colors::PLAYER);
        assert!((vis.scale.x - 1.1).abs() < 1e-6);
        assert!((vis.scale.y - 0.95).abs() < 1e-6);
        assert!((vis.rotation - 0.1).abs() < 1e-6);

        let vis = VisualState::from_motion(Vec2::new(-150.0, 0.0), false, false);
        assert_eq!(vis.tint, colors::NOTE);
        assert!((vis.rotation + 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_respawn_resets() {
        let mut player = PlayerController::new(Vec2::new(100.0, 400.0));
        player.advance(&press(), DT, &grounded_at(Vec2::new(200.0, 0.0)));
        assert_eq!(player.respawn(), PlayerEvent::Respawned);
        let kin = player.kinematics();
        assert_eq!(kin.position, Vec2::new(100.0, 400.0));
        assert_eq!(kin.velocity, Vec2::ZERO);
        assert_eq!(kin.jump_buffer_ms, 0.0);
        assert_eq!(kin.coyote_ms, 0.0);
        assert!(!kin.is_grounded);
    }
}
