//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay deterministic:
//! - Time arrives as explicit elapsed milliseconds
//! - Seeded RNG only (demo AI)
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod demo_ai;
pub mod enemy;
pub mod physics;
pub mod player;
pub mod state;
pub mod tick;

pub use demo_ai::{AiAction, DemoAi, Perception};
pub use enemy::{Enemy, Projectile};
pub use physics::{Aabb, ArcadeWorld, Body, ContactFlags, PhysicsPort};
pub use player::{
    AbilitySet, BodyFeedback, MovementState, PlayerController, PlayerEvent, PlayerKinematics,
    PlayerOutput, VisualState,
};
pub use state::{Combo, GameEvent, GamePhase, GameState, GameStats, Goal, Hazard, Note, Platform};
pub use tick::tick;
