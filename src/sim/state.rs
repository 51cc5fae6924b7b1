//! Game state and core simulation types
//!
//! One `GameState` per loaded level. Everything the tick mutates lives here.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::demo_ai::Perception;
use super::enemy::{Enemy, Projectile};
use super::physics::{Aabb, ArcadeWorld, Body};
use super::player::{MovementState, PlayerController, VisualState};
use crate::consts::*;
use crate::level::{CameraSetup, LevelData, LevelLayout, PlatformKind};

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Playing,
    Paused,
    /// Every note collected or the goal reached
    LevelComplete,
}

/// Things that happened during a tick, for the host to react to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Jumped,
    WallJumped,
    NoteCollected { id: u32, score: u64, multiplier: u32 },
    EnemyStomped { id: u32 },
    Bounced,
    PlayerHit,
    Respawned,
    ComboExpired,
    LevelComplete { next_level: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub id: u32,
    pub bounds: Aabb,
    pub kind: PlatformKind,
    pub color: u32,
    /// Left-edge travel limits for moving platforms
    pub travel: Option<(f32, f32)>,
    pub direction: f32,
}

impl Platform {
    /// Slide along the travel range. Returns the horizontal displacement.
    pub fn update(&mut self, elapsed_ms: f32) -> f32 {
        let Some((start, end)) = self.travel else {
            return 0.0;
        };
        let before = self.bounds.min.x;
        let mut x = before + self.direction * MOVING_PLATFORM_SPEED * elapsed_ms / 1000.0;
        if self.direction > 0.0 && x >= end {
            x = end;
            self.direction = -1.0;
        } else if self.direction < 0.0 && x <= start {
            x = start;
            self.direction = 1.0;
        }
        let dx = x - before;
        self.bounds = self.bounds.translated(Vec2::new(dx, 0.0));
        dx
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: u32,
    pub pos: Vec2,
    pub color: u32,
    pub pitch: String,
}

impl Note {
    pub fn aabb(&self) -> Aabb {
        Aabb::from_center(self.pos, Vec2::splat(NOTE_SIZE * 0.5))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hazard {
    pub pos: Vec2,
    pub color: u32,
}

impl Hazard {
    pub fn aabb(&self) -> Aabb {
        Aabb::from_center(self.pos, Vec2::splat(HAZARD_SIZE * 0.5))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub pos: Vec2,
    pub color: u32,
    pub next_level: Option<String>,
}

impl Goal {
    pub fn aabb(&self) -> Aabb {
        Aabb::from_center(self.pos, Vec2::splat(GOAL_SIZE * 0.5))
    }
}

/// Score multiplier with a rolling window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Combo {
    pub multiplier: u32,
    pub timer_ms: f32,
}

impl Default for Combo {
    fn default() -> Self {
        Self {
            multiplier: 1,
            timer_ms: 0.0,
        }
    }
}

impl Combo {
    /// Register a collection and return the multiplier to score it with
    pub fn register(&mut self) -> u32 {
        self.multiplier = if self.timer_ms > 0.0 {
            (self.multiplier + 1).min(COMBO_MAX)
        } else {
            2
        };
        self.timer_ms = COMBO_WINDOW_MS;
        self.multiplier
    }

    /// Run the window down. Returns true when the combo just expired.
    pub fn decay(&mut self, elapsed_ms: f32) -> bool {
        if self.timer_ms <= 0.0 {
            return false;
        }
        self.timer_ms -= elapsed_ms;
        if self.timer_ms <= 0.0 {
            self.reset();
            return true;
        }
        false
    }

    pub fn reset(&mut self) {
        self.multiplier = 1;
        self.timer_ms = 0.0;
    }

    pub fn is_active(&self) -> bool {
        self.timer_ms > 0.0
    }
}

/// Snapshot for HUD and results
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameStats {
    pub score: u64,
    pub notes_collected: u32,
    pub total_notes: u32,
    pub deaths: u32,
    pub time_elapsed_ms: f64,
    pub combo: u32,
}

/// Complete state of one level in play
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub level_name: String,
    pub bpm: f64,
    pub world: ArcadeWorld,
    pub body: Body,
    pub player: PlayerController,
    pub platforms: Vec<Platform>,
    /// Uncollected notes
    pub notes: Vec<Note>,
    pub total_notes: u32,
    pub enemies: Vec<Enemy>,
    pub projectiles: Vec<Projectile>,
    pub hazards: Vec<Hazard>,
    pub goal: Goal,
    #[serde(skip)]
    pub camera: CameraSetup,
    pub camera_scroll: Vec2,
    pub combo: Combo,
    pub score: u64,
    pub deaths: u32,
    pub time_elapsed_ms: f64,
    pub phase: GamePhase,
    /// Movement state and visuals from the last tick
    pub movement: MovementState,
    #[serde(skip)]
    pub visual: Option<VisualState>,
    /// Events produced by the last tick
    #[serde(skip)]
    pub events: Vec<GameEvent>,
    next_id: u32,
}

impl GameState {
    pub fn from_level(level: &LevelData) -> Self {
        Self::from_layout(&LevelLayout::from_level(level))
    }

    pub fn from_layout(layout: &LevelLayout) -> Self {
        let mut next_id = 1;
        let mut alloc = || {
            let id = next_id;
            next_id += 1;
            id
        };

        let platforms = layout
            .platforms
            .iter()
            .map(|p| Platform {
                id: alloc(),
                bounds: p.bounds,
                kind: p.kind,
                color: p.color,
                travel: p.travel,
                direction: 1.0,
            })
            .collect();
        let notes: Vec<Note> = layout
            .notes
            .iter()
            .map(|n| Note {
                id: alloc(),
                pos: n.pos,
                color: n.color,
                pitch: n.pitch.clone(),
            })
            .collect();
        let enemies = layout
            .enemies
            .iter()
            .map(|e| Enemy::new(alloc(), e.pos, e.patrol_range, e.shoot_interval_ms, e.color))
            .collect();
        let hazards = layout
            .hazards
            .iter()
            .map(|h| Hazard {
                pos: h.pos,
                color: h.color,
            })
            .collect();

        let total_notes = notes.len() as u32;
        log::info!("Level '{}' ready: {total_notes} notes", layout.name);

        Self {
            level_name: layout.name.clone(),
            bpm: layout.bpm,
            world: ArcadeWorld::new(layout.camera.bounds.x, layout.camera.bounds.y),
            body: Body::player(layout.spawn),
            player: PlayerController::new(layout.spawn),
            platforms,
            notes,
            total_notes,
            enemies,
            projectiles: Vec::new(),
            hazards,
            goal: Goal {
                pos: layout.goal.pos,
                color: layout.goal.color,
                next_level: layout.goal.next_level.clone(),
            },
            camera: layout.camera,
            camera_scroll: Vec2::ZERO,
            combo: Combo::default(),
            score: 0,
            deaths: 0,
            time_elapsed_ms: 0.0,
            phase: GamePhase::Playing,
            movement: MovementState::Airborne,
            visual: None,
            events: Vec::new(),
            next_id,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// The ID `next_entity_id` will hand out next
    pub fn peek_entity_id(&self) -> u32 {
        self.next_id
    }

    /// Solid boxes the player collides with
    pub fn solids(&self) -> Vec<Aabb> {
        self.platforms.iter().map(|p| p.bounds).collect()
    }

    pub fn notes_collected(&self) -> u32 {
        self.total_notes - self.notes.len() as u32
    }

    pub fn stats(&self) -> GameStats {
        GameStats {
            score: self.score,
            notes_collected: self.notes_collected(),
            total_notes: self.total_notes,
            deaths: self.deaths,
            time_elapsed_ms: self.time_elapsed_ms,
            combo: self.combo.multiplier,
        }
    }

    /// What the autopilot is allowed to see
    pub fn perception(&self) -> Perception {
        Perception {
            player: self.body.pos,
            collectibles: self.notes.iter().map(|n| n.pos).collect(),
            threats: self.enemies.iter().map(|e| e.pos).collect(),
            platforms: self.solids(),
            floor_y: FALL_LIMIT_Y,
        }
    }
}
