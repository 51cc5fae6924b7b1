//! Level data, sequencing and embedded level files
//!
//! Levels are authored as JSON (camelCase) and compiled into the binary.
//! `loader` turns a parsed level into placement instructions.

pub mod loader;

use serde::{Deserialize, Serialize};

use crate::error::LevelError;

pub use loader::{CameraSetup, LevelLayout, color_from_name};

/// Playable levels in order
pub const LEVEL_LIST: [&str; 6] = ["level1", "level2", "level3", "level4", "level5", "level6"];

/// Identifier of the attract-mode level (not part of the sequence)
pub const DEMO_LEVEL_ID: &str = "demo";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelData {
    pub name: String,
    pub music: MusicInfo,
    pub camera: CameraConfig,
    pub player: PlayerConfig,
    #[serde(default)]
    pub platforms: Vec<PlatformData>,
    #[serde(default)]
    pub notes: Vec<NoteData>,
    #[serde(default)]
    pub enemies: Vec<EnemyData>,
    #[serde(default)]
    pub hazards: Vec<HazardData>,
    pub background: BackgroundData,
    pub goal: GoalData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicInfo {
    pub bpm: f64,
    pub key: String,
    pub style: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraConfig {
    pub bounds: Size,
    pub zoom: f32,
    pub follow_offset: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub spawn: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKind {
    Moving,
    Bouncy,
    /// Anything unrecognized is a plain platform
    #[serde(other)]
    Static,
}

/// Platforms are positioned by their top-left corner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformData {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(rename = "type")]
    pub kind: PlatformKind,
    pub color: String,
    #[serde(default)]
    pub move_range: Option<f32>,
}

/// Notes are positioned by their center
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteData {
    pub x: f32,
    pub y: f32,
    #[serde(rename = "type")]
    pub kind: String,
    pub color: String,
    pub pitch: String,
}

/// Enemies are positioned by their bottom-center
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemyData {
    pub x: f32,
    pub y: f32,
    #[serde(rename = "type")]
    pub kind: String,
    pub color: String,
    #[serde(default)]
    pub patrol_range: Option<f32>,
    #[serde(default)]
    pub shoot_interval: Option<f32>,
}

/// Hazards are positioned by their center
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardData {
    pub x: f32,
    pub y: f32,
    #[serde(rename = "type")]
    pub kind: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundData {
    pub style: String,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub particles: u32,
    #[serde(default)]
    pub effects: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalData {
    pub x: f32,
    pub y: f32,
    #[serde(rename = "type")]
    pub kind: String,
    pub color: String,
    #[serde(default)]
    pub next_level: Option<String>,
}

impl LevelData {
    /// Parse and validate a level document
    pub fn from_json(id: &str, json: &str) -> Result<Self, LevelError> {
        let level: LevelData = serde_json::from_str(json).map_err(|source| LevelError::Parse {
            id: id.to_string(),
            source,
        })?;
        level.validate(id)?;
        Ok(level)
    }

    /// Tempo must be positive; `goal.nextLevel` must name a real level
    pub fn validate(&self, id: &str) -> Result<(), LevelError> {
        if !self.music.bpm.is_finite() || self.music.bpm <= 0.0 {
            return Err(LevelError::InvalidBpm {
                level: id.to_string(),
                bpm: self.music.bpm,
            });
        }
        match &self.goal.next_level {
            Some(next) if !is_valid_level_id(next) => Err(LevelError::InvalidNextLevel {
                level: id.to_string(),
                next: next.clone(),
            }),
            _ => Ok(()),
        }
    }
}

/// Display information for the level select
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelMetadata {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub difficulty: &'static str,
    pub estimated_time: &'static str,
    pub theme: &'static str,
}

pub const LEVEL_METADATA: [LevelMetadata; 6] = [
    LevelMetadata {
        id: "level1",
        name: "Rhythm Awakening",
        description: "Your first steps into the musical world",
        difficulty: "Easy",
        estimated_time: "2-3 minutes",
        theme: "Synthwave",
    },
    LevelMetadata {
        id: "level2",
        name: "Neon Cascade",
        description: "Flowing melodies and cascading platforms",
        difficulty: "Easy-Medium",
        estimated_time: "3-4 minutes",
        theme: "Neon Flow",
    },
    LevelMetadata {
        id: "level3",
        name: "Crystal Harmonics",
        description: "Shimmering crystals create resonant melodies",
        difficulty: "Medium",
        estimated_time: "4-5 minutes",
        theme: "Crystal Cave",
    },
    LevelMetadata {
        id: "level4",
        name: "Cyber Storm",
        description: "Navigate through electric storms and digital chaos",
        difficulty: "Medium-Hard",
        estimated_time: "5-6 minutes",
        theme: "Cyberpunk",
    },
    LevelMetadata {
        id: "level5",
        name: "Vaporwave Sunset",
        description: "Drift through retro-futuristic landscapes",
        difficulty: "Hard",
        estimated_time: "6-7 minutes",
        theme: "Vaporwave",
    },
    LevelMetadata {
        id: "level6",
        name: "Cosmic Finale",
        description: "The ultimate test in the depths of space",
        difficulty: "Expert",
        estimated_time: "8-10 minutes",
        theme: "Cosmic",
    },
];

pub fn level_metadata(id: &str) -> Option<&'static LevelMetadata> {
    LEVEL_METADATA.iter().find(|m| m.id == id)
}

pub fn is_valid_level_id(id: &str) -> bool {
    LEVEL_LIST.contains(&id)
}

fn level_index(id: &str) -> Option<usize> {
    LEVEL_LIST.iter().position(|l| *l == id)
}

/// Following level, `None` after the last (or for unknown ids)
pub fn next_level_id(id: &str) -> Option<&'static str> {
    level_index(id).and_then(|i| LEVEL_LIST.get(i + 1).copied())
}

/// Preceding level, `None` before the first (or for unknown ids)
pub fn previous_level_id(id: &str) -> Option<&'static str> {
    level_index(id)
        .and_then(|i| i.checked_sub(1))
        .and_then(|i| LEVEL_LIST.get(i).copied())
}

/// Embedded JSON for a level id (including the demo level)
pub fn level_source(id: &str) -> Option<&'static str> {
    let json = match id {
        "level1" => include_str!("../../levels/level1.json"),
        "level2" => include_str!("../../levels/level2.json"),
        "level3" => include_str!("../../levels/level3.json"),
        "level4" => include_str!("../../levels/level4.json"),
        "level5" => include_str!("../../levels/level5.json"),
        "level6" => include_str!("../../levels/level6.json"),
        DEMO_LEVEL_ID => include_str!("../../levels/demo.json"),
        _ => return None,
    };
    Some(json)
}

pub fn try_load_level(id: &str) -> Result<LevelData, LevelError> {
    let json = level_source(id).ok_or_else(|| LevelError::UnknownLevel(id.to_string()))?;
    LevelData::from_json(id, json)
}

/// `try_load_level`, logging failures
pub fn load_level(id: &str) -> Option<LevelData> {
    match try_load_level(id) {
        Ok(level) => {
            log::info!("Loaded level {id}: {}", level.name);
            Some(level)
        }
        Err(e) => {
            log::error!("Error loading level {id}: {e}");
            None
        }
    }
}

/// The attract-mode level
pub fn demo_level() -> Result<LevelData, LevelError> {
    try_load_level(DEMO_LEVEL_ID)
}
