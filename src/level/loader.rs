//! Turns level data into placement instructions and camera setup

use glam::Vec2;

use super::{LevelData, PlatformKind};
use crate::colors;
use crate::consts::{DEFAULT_MOVE_RANGE, VIEW_HEIGHT, VIEW_WIDTH};
use crate::sim::physics::Aabb;

/// Palette names used by level files
const COLOR_MAP: [(&str, u32); 14] = [
    ("NEON_BLUE", 0x00ffff),
    ("NEON_PINK", 0xff00ff),
    ("NEON_GREEN", 0x00ff00),
    ("NEON_ORANGE", 0xff8000),
    ("NEON_YELLOW", 0xffff00),
    ("NEON_PURPLE", 0x8000ff),
    ("NEON_CYAN", 0x00ffff),
    ("NEON_RED", 0xff0040),
    ("NEON_WHITE", 0xffffff),
    ("DANGER_RED", 0xff0000),
    ("DANGER_ORANGE", 0xff4500),
    ("ELECTRIC_BLUE", 0x0080ff),
    ("LASER_GREEN", 0x80ff00),
    ("PLASMA_PURPLE", 0xff00c0),
];

/// Camera follow smoothing
pub const CAMERA_LERP: f32 = 0.08;
/// Region around the target inside which the camera holds still
pub const CAMERA_DEADZONE: Vec2 = Vec2::new(100.0, 60.0);

/// Palette lookup; unknown names fall back to the player color
pub fn color_from_name(name: &str) -> u32 {
    COLOR_MAP
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, c)| *c)
        .unwrap_or(colors::PLAYER)
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlatformPlacement {
    pub bounds: Aabb,
    pub kind: PlatformKind,
    pub color: u32,
    /// Moving platforms travel between these x positions (left edge)
    pub travel: Option<(f32, f32)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotePlacement {
    pub pos: Vec2,
    pub color: u32,
    pub pitch: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnemyPlacement {
    /// Bottom-center
    pub pos: Vec2,
    pub color: u32,
    pub patrol_range: Option<f32>,
    pub shoot_interval_ms: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HazardPlacement {
    pub pos: Vec2,
    pub color: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GoalPlacement {
    pub pos: Vec2,
    pub color: u32,
    pub next_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundSetup {
    pub style: String,
    pub colors: Vec<u32>,
    pub particles: u32,
    pub effects: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSetup {
    /// World size the camera may scroll over
    pub bounds: Vec2,
    pub zoom: f32,
    pub follow_offset: Vec2,
    pub deadzone: Vec2,
    pub lerp: f32,
}

impl CameraSetup {
    /// Next scroll position (top-left) following `target`.
    ///
    /// The target may wander inside the deadzone; beyond it the camera eases
    /// toward it and is then clamped to the bounds.
    pub fn follow(&self, scroll: Vec2, target: Vec2, view: Vec2) -> Vec2 {
        let view = view / self.zoom.max(0.01);
        let desired_center = target - self.follow_offset;
        let center = scroll + view * 0.5;
        let half_dz = self.deadzone * 0.5;

        let mut goal = center;
        for axis in 0..2 {
            let offset = desired_center[axis] - center[axis];
            if offset > half_dz[axis] {
                goal[axis] = desired_center[axis] - half_dz[axis];
            } else if offset < -half_dz[axis] {
                goal[axis] = desired_center[axis] + half_dz[axis];
            }
        }

        let eased = center + (goal - center) * self.lerp;
        let next = eased - view * 0.5;
        let max = (self.bounds - view).max(Vec2::ZERO);
        next.clamp(Vec2::ZERO, max)
    }
}

impl Default for CameraSetup {
    fn default() -> Self {
        Self {
            bounds: Vec2::new(VIEW_WIDTH as f32, VIEW_HEIGHT as f32),
            zoom: 1.0,
            follow_offset: Vec2::ZERO,
            deadzone: CAMERA_DEADZONE,
            lerp: CAMERA_LERP,
        }
    }
}

/// Everything needed to populate a level
#[derive(Debug, Clone, PartialEq)]
pub struct LevelLayout {
    pub name: String,
    pub bpm: f64,
    pub spawn: Vec2,
    pub platforms: Vec<PlatformPlacement>,
    pub notes: Vec<NotePlacement>,
    pub enemies: Vec<EnemyPlacement>,
    pub hazards: Vec<HazardPlacement>,
    pub goal: GoalPlacement,
    pub camera: CameraSetup,
    pub background: BackgroundSetup,
}

impl LevelLayout {
    pub fn from_level(level: &LevelData) -> Self {
        let platforms = level
            .platforms
            .iter()
            .map(|p| PlatformPlacement {
                bounds: Aabb::from_top_left(p.x, p.y, p.width, p.height),
                kind: p.kind,
                color: color_from_name(&p.color),
                travel: match p.kind {
                    PlatformKind::Moving => Some((p.x, p.x + p.move_range.unwrap_or(DEFAULT_MOVE_RANGE))),
                    _ => None,
                },
            })
            .collect();

        let notes = level
            .notes
            .iter()
            .map(|n| NotePlacement {
                pos: Vec2::new(n.x, n.y),
                color: color_from_name(&n.color),
                pitch: n.pitch.clone(),
            })
            .collect();

        let enemies = level
            .enemies
            .iter()
            .map(|e| EnemyPlacement {
                pos: Vec2::new(e.x, e.y),
                color: color_from_name(&e.color),
                patrol_range: e.patrol_range,
                shoot_interval_ms: e.shoot_interval,
            })
            .collect();

        let hazards = level
            .hazards
            .iter()
            .map(|h| HazardPlacement {
                pos: Vec2::new(h.x, h.y),
                color: color_from_name(&h.color),
            })
            .collect();

        log::debug!(
            "Layout {}: {} platforms, {} notes, {} enemies, {} hazards",
            level.name,
            level.platforms.len(),
            level.notes.len(),
            level.enemies.len(),
            level.hazards.len()
        );

        Self {
            name: level.name.clone(),
            bpm: level.music.bpm,
            spawn: Vec2::new(level.player.spawn.x, level.player.spawn.y),
            platforms,
            notes,
            enemies,
            hazards,
            goal: GoalPlacement {
                pos: Vec2::new(level.goal.x, level.goal.y),
                color: color_from_name(&level.goal.color),
                next_level: level.goal.next_level.clone(),
            },
            camera: CameraSetup {
                bounds: Vec2::new(level.camera.bounds.width, level.camera.bounds.height),
                zoom: level.camera.zoom,
                follow_offset: Vec2::new(level.camera.follow_offset.x, level.camera.follow_offset.y),
                deadzone: CAMERA_DEADZONE,
                lerp: CAMERA_LERP,
            },
            background: BackgroundSetup {
                style: level.background.style.clone(),
                colors: level.background.colors.iter().map(|c| color_from_name(c)).collect(),
                particles: level.background.particles,
                effects: level.background.effects.clone(),
            },
        }
    }
}
