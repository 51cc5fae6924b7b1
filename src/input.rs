//! Player intent, normalized from devices
//!
//! Keyboard and gamepad snapshots collapse into one `InputState` per tick.
//! The demo AI produces the same shape; a tick never mixes the two sources.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Analog stick dead zone
pub const DEAD_ZONE: f32 = 0.15;

/// Normalized intent for a single simulation tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputState {
    pub left: bool,
    pub right: bool,
    /// Jump held
    pub jump: bool,
    /// Jump went from released to held this tick
    pub jump_pressed: bool,
    pub dash: bool,
    pub pause: bool,
}

/// Keyboard keys relevant to play, already collapsed across bindings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyboardState {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub dash: bool,
    pub pause: bool,
}

impl KeyboardState {
    /// Apply a DOM `KeyboardEvent.key` value. Returns false for unbound keys.
    pub fn apply_key(&mut self, key: &str, down: bool) -> bool {
        match key {
            "ArrowLeft" | "a" | "A" => self.left = down,
            "ArrowRight" | "d" | "D" => self.right = down,
            "ArrowUp" | "w" | "W" | " " => self.jump = down,
            "Shift" => self.dash = down,
            "Escape" => self.pause = down,
            _ => return false,
        }
        true
    }
}

/// Gamepad snapshot (standard mapping)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GamepadState {
    pub left_stick: Vec2,
    pub right_stick: Vec2,
    pub dpad_left: bool,
    pub dpad_right: bool,
    /// A / cross
    pub a: bool,
    /// X / square
    pub x: bool,
    pub start: bool,
}

/// Standard-mapping button indices
pub mod buttons {
    pub const A: usize = 0;
    pub const X: usize = 2;
    pub const START: usize = 9;
    pub const DPAD_LEFT: usize = 14;
    pub const DPAD_RIGHT: usize = 15;
}

/// Standard-mapping axis indices
pub mod axes {
    pub const LEFT_X: usize = 0;
    pub const LEFT_Y: usize = 1;
    pub const RIGHT_X: usize = 2;
    pub const RIGHT_Y: usize = 3;
}

impl GamepadState {
    /// Build from standard-mapping button and axis arrays; missing entries read as neutral
    pub fn from_standard(pressed: &[bool], axis_values: &[f64]) -> Self {
        let button = |i: usize| pressed.get(i).copied().unwrap_or(false);
        let axis = |i: usize| axis_values.get(i).copied().unwrap_or(0.0) as f32;
        Self {
            left_stick: Vec2::new(axis(axes::LEFT_X), axis(axes::LEFT_Y)),
            right_stick: Vec2::new(axis(axes::RIGHT_X), axis(axes::RIGHT_Y)),
            dpad_left: button(buttons::DPAD_LEFT),
            dpad_right: button(buttons::DPAD_RIGHT),
            a: button(buttons::A),
            x: button(buttons::X),
            start: button(buttons::START),
        }
    }
}

/// A rumble request for the connected gamepad
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vibration {
    pub duration_ms: f32,
    pub weak_magnitude: f32,
    pub strong_magnitude: f32,
}

/// Zero out components inside the dead zone
pub fn apply_dead_zone(stick: Vec2, dead_zone: f32) -> Vec2 {
    Vec2::new(
        if stick.x.abs() > dead_zone { stick.x } else { 0.0 },
        if stick.y.abs() > dead_zone { stick.y } else { 0.0 },
    )
}

/// Polls device snapshots and tracks the jump edge
#[derive(Debug, Clone)]
pub struct InputManager {
    state: InputState,
    dead_zone: f32,
    gamepad: Option<GamepadState>,
    vibration_enabled: bool,
    pending_vibration: Option<Vibration>,
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            state: InputState::default(),
            dead_zone: DEAD_ZONE,
            gamepad: None,
            vibration_enabled: true,
            pending_vibration: None,
        }
    }

    /// Build this tick's `InputState` from the current device snapshots
    pub fn update(&mut self, keyboard: &KeyboardState, gamepad: Option<&GamepadState>) -> InputState {
        if gamepad.is_some() != self.gamepad.is_some() {
            if gamepad.is_some() {
                log::info!("Gamepad connected");
            } else {
                log::info!("Gamepad disconnected");
            }
        }
        self.gamepad = gamepad.copied();

        let mut left = keyboard.left;
        let mut right = keyboard.right;
        let mut jump = keyboard.jump;
        let mut dash = keyboard.dash;
        let mut pause = keyboard.pause;

        if let Some(pad) = gamepad {
            left |= pad.left_stick.x < -self.dead_zone || pad.dpad_left;
            right |= pad.left_stick.x > self.dead_zone || pad.dpad_right;
            jump |= pad.a;
            dash |= pad.x;
            pause |= pad.start;
        }

        let jump_pressed = jump && !self.state.jump;
        self.state = InputState {
            left,
            right,
            jump,
            jump_pressed,
            dash,
            pause,
        };
        self.state
    }

    /// Last produced state
    pub fn state(&self) -> InputState {
        self.state
    }

    /// Forget directions and edges when switching sessions. A jump still held
    /// stays held, so it cannot register as a fresh press.
    pub fn reset(&mut self) {
        self.state = InputState {
            jump: self.state.jump,
            ..Default::default()
        };
    }

    pub fn has_gamepad(&self) -> bool {
        self.gamepad.is_some()
    }

    /// Right stick with dead zone applied (neutral without a gamepad)
    pub fn analog_stick(&self) -> Vec2 {
        self.gamepad
            .map(|pad| apply_dead_zone(pad.right_stick, self.dead_zone))
            .unwrap_or(Vec2::ZERO)
    }

    pub fn set_vibration_enabled(&mut self, enabled: bool) {
        self.vibration_enabled = enabled;
        if !enabled {
            self.pending_vibration = None;
        }
    }

    /// Queue a rumble; dropped when no gamepad is connected
    pub fn vibrate(&mut self, duration_ms: f32, intensity: f32) {
        if !self.vibration_enabled || self.gamepad.is_none() {
            return;
        }
        let intensity = intensity.clamp(0.0, 1.0);
        self.pending_vibration = Some(Vibration {
            duration_ms: duration_ms.max(0.0),
            weak_magnitude: intensity * 0.5,
            strong_magnitude: intensity,
        });
    }

    pub fn light_vibration(&mut self) {
        self.vibrate(100.0, 0.3);
    }

    pub fn strong_vibration(&mut self) {
        self.vibrate(300.0, 1.0);
    }

    /// Take the queued rumble for the platform layer to play
    pub fn take_vibration(&mut self) -> Option<Vibration> {
        self.pending_vibration.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_jump_edge_single_tick() {
        let mut input = InputManager::new();
        let mut kb = KeyboardState::default();

        kb.jump = true;
        let first = input.update(&kb, None);
        assert!(first.jump && first.jump_pressed);

        let held = input.update(&kb, None);
        assert!(held.jump && !held.jump_pressed);

        kb.jump = false;
        let released = input.update(&kb, None);
        assert!(!released.jump && !released.jump_pressed);

        kb.jump = true;
        assert!(input.update(&kb, None).jump_pressed);
    }

    #[test]
    fn test_reset_keeps_held_jump() {
        let mut input = InputManager::new();
        let kb = KeyboardState {
            jump: true,
            right: true,
            ..Default::default()
        };
        input.update(&kb, None);
        input.reset();
        assert_eq!(
            input.state(),
            InputState {
                jump: true,
                ..Default::default()
            }
        );
        assert!(!input.update(&kb, None).jump_pressed);
    }

    #[test]
    fn test_gamepad_dead_zone() {
        let mut input = InputManager::new();
        let kb = KeyboardState::default();
        let pad = GamepadState {
            left_stick: Vec2::new(-0.1, 0.0),
            ..Default::default()
        };
        let state = input.update(&kb, Some(&pad));
        assert!(!state.left && !state.right);

        let pad = GamepadState {
            left_stick: Vec2::new(-0.5, 0.0),
            right_stick: Vec2::new(0.1, -0.9),
            ..Default::default()
        };
        let state = input.update(&kb, Some(&pad));
        assert!(state.left);
        assert_eq!(input.analog_stick(), Vec2::new(0.0, -0.9));
    }

    #[test]
    fn test_keyboard_and_gamepad_share_jump_edge() {
        let mut input = InputManager::new();
        let kb = KeyboardState {
            jump: true,
            ..Default::default()
        };
        assert!(input.update(&kb, None).jump_pressed);

        // Pad A pressed while the key is still held is not a new press
        let pad = GamepadState {
            a: true,
            ..Default::default()
        };
        assert!(!input.update(&kb, Some(&pad)).jump_pressed);
    }

    #[test]
    fn test_vibration_requires_gamepad() {
        let mut input = InputManager::new();
        input.light_vibration();
        assert_eq!(input.take_vibration(), None);

        input.update(&KeyboardState::default(), Some(&GamepadState::default()));
        input.strong_vibration();
        let rumble = input.take_vibration().unwrap();
        assert_eq!(rumble.duration_ms, 300.0);
        assert_eq!(rumble.strong_magnitude, 1.0);
        assert_eq!(rumble.weak_magnitude, 0.5);
        assert_eq!(input.take_vibration(), None);
    }

    #[test]
    fn test_gamepad_from_standard_mapping() {
        let mut pressed = vec![false; 16];
        pressed[buttons::A] = true;
        pressed[buttons::DPAD_RIGHT] = true;
        let pad = GamepadState::from_standard(&pressed, &[0.25, -0.5]);
        assert!(pad.a && pad.dpad_right && !pad.start);
        assert_eq!(pad.left_stick, Vec2::new(0.25, -0.5));
        assert_eq!(pad.right_stick, Vec2::ZERO);
    }

    #[test]
    fn test_apply_key_bindings() {
        let mut kb = KeyboardState::default();
        assert!(kb.apply_key("a", true));
        assert!(kb.apply_key(" ", true));
        assert!(!kb.apply_key("q", true));
        assert!(kb.left && kb.jump);
        kb.apply_key("A", false);
        assert!(!kb.left);
    }

    proptest! {
        #[test]
        fn prop_jump_pressed_only_on_rising_edge(held in proptest::collection::vec(any::<bool>(), 1..200)) {
            let mut input = InputManager::new();
            let mut previous = false;
            for jump in held {
                let kb = KeyboardState { jump, ..Default::default() };
                let state = input.update(&kb, None);
                prop_assert_eq!(state.jump_pressed, jump && !previous);
                previous = jump;
            }
        }
    }
}
