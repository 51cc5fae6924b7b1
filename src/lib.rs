//! Chorus King - a rhythm platformer
//!
//! Core modules:
//! - `sim`: Deterministic simulation (player controller, physics, demo AI, game rules)
//! - `audio`: Procedural synthesis, layered music mixer, beat clock
//! - `input`: Device snapshots normalized into `InputState`
//! - `level`: Level data, sequencing, placement
//! - `game`: Host embedding surface and frame driver
//! - `settings`: Player preferences (LocalStorage on the web)
//! - `platform`: Browser/native platform abstraction

pub mod audio;
pub mod error;
pub mod game;
pub mod input;
pub mod level;
pub mod platform;
pub mod settings;
pub mod sim;

pub use audio::{AudioBackend, AudioEngine, AudioPort, NullBackend};
pub use error::{InitError, LevelError, WavError};
pub use game::{ChorusKing, ContainerHandle, Mode};
pub use input::{InputManager, InputState};
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Reference surface size
    pub const VIEW_WIDTH: u32 = 1280;
    pub const VIEW_HEIGHT: u32 = 720;

    /// Arcade physics
    pub const GRAVITY: f32 = 800.0;
    /// Largest frame delta fed to the simulation (ms)
    pub const MAX_FRAME_MS: f32 = 100.0;
    /// Falling below this y respawns the player
    pub const FALL_LIMIT_Y: f32 = 800.0;

    /// Player movement feel
    pub const PLAYER_SPEED: f32 = 300.0;
    pub const PLAYER_RADIUS: f32 = 16.0;
    pub const PLAYER_MAX_FALL_SPEED: f32 = 1000.0;
    pub const PLAYER_DRAG_X: f32 = 800.0;
    pub const JUMP_FORCE: f32 = -400.0;
    pub const ACCELERATION: f32 = 0.2;
    pub const DECELERATION: f32 = 0.1;
    pub const AIR_CONTROL: f32 = 0.75;
    /// Ground deceleration snaps to zero below this speed
    pub const STOP_THRESHOLD: f32 = 10.0;

    /// Input grace windows (ms)
    pub const JUMP_BUFFER_MS: f32 = 150.0;
    pub const COYOTE_MS: f32 = 100.0;

    /// Variable jump height
    pub const JUMP_HOLD_FACTOR: f32 = 0.98;
    pub const JUMP_CUT_FACTOR: f32 = 0.5;
    pub const JUMP_CUT_MIN_RISE: f32 = -100.0;

    /// Wall interactions
    pub const WALL_SLIDE_MAX_SPEED: f32 = 100.0;
    pub const WALL_JUMP_PUSH: f32 = 300.0;
    pub const WALL_JUMP_FACTOR: f32 = 0.8;

    /// Platforms
    pub const BOUNCY_LAUNCH_SPEED: f32 = -700.0;
    pub const MOVING_PLATFORM_SPEED: f32 = 50.0;
    pub const DEFAULT_MOVE_RANGE: f32 = 100.0;

    /// Enemies
    pub const ENEMY_PATROL_SPEED: f32 = 100.0;
    pub const ENEMY_PATROL_RANGE: f32 = 200.0;
    pub const ENEMY_SHOOT_INTERVAL_MS: f32 = 2000.0;
    pub const ENEMY_WIDTH: f32 = 28.0;
    pub const ENEMY_HEIGHT: f32 = 24.0;
    pub const PROJECTILE_SIZE: f32 = 6.0;
    pub const PROJECTILE_LIFETIME_MS: f32 = 3000.0;
    pub const STOMP_BOUNCE_SPEED: f32 = -300.0;

    /// Pickups and hazards
    pub const NOTE_SIZE: f32 = 20.0;
    pub const HAZARD_SIZE: f32 = 24.0;
    pub const GOAL_SIZE: f32 = 48.0;

    /// Scoring
    pub const NOTE_SCORE: u64 = 100;
    pub const STOMP_SCORE: u64 = 200;
    pub const COMBO_WINDOW_MS: f32 = 2000.0;
    pub const COMBO_MAX: u32 = 10;

    /// Audio
    pub const SAMPLE_RATE: u32 = 44100;
    pub const DEFAULT_BPM: f64 = 120.0;
    pub const BEAT_SUBDIVISION: u32 = 16;
    pub const TIME_SIGNATURE: u32 = 4;
}

/// Colors (0xRRGGBB)
pub mod colors {
    pub const PLAYER: u32 = 0x00ff88;
    pub const NOTE: u32 = 0xffff00;
    pub const PARTICLE: u32 = 0x00ffff;
}

/// Linear interpolation by a fixed factor
#[inline]
pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}
