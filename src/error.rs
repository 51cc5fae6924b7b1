//! Error types for the fallible boundaries of the core
//!
//! Only `InitError` is fatal. Level and WAV errors are surfaced to callers that
//! want them; the convenience paths log and recover.

use thiserror::Error;

/// Startup failures surfaced to the embedding host
#[derive(Error, Debug)]
pub enum InitError {
    #[error("Game container '{0}' is not available")]
    ContainerMissing(String),
    #[error("Game container '{id}' has no drawable area ({width}x{height})")]
    EmptyContainer { id: String, width: u32, height: u32 },
}

/// Problems loading or validating level data
#[derive(Error, Debug)]
pub enum LevelError {
    #[error("Unknown level id: {0}")]
    UnknownLevel(String),
    #[error("Failed to parse level '{id}': {source}")]
    Parse {
        id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Level '{level}' points at unknown next level '{next}'")]
    InvalidNextLevel { level: String, next: String },
    #[error("Level '{level}' has invalid bpm {bpm}")]
    InvalidBpm { level: String, bpm: f64 },
}

/// Malformed PCM containers
#[derive(Error, Debug, PartialEq, Eq)]
pub enum WavError {
    #[error("WAV data too short ({0} bytes)")]
    TooShort(usize),
    #[error("Missing {0} chunk marker")]
    BadMarker(&'static str),
    #[error("Unsupported format: {channels} channel(s), {bits} bits")]
    Unsupported { channels: u16, bits: u16 },
    #[error("Data chunk claims {claimed} bytes but only {available} present")]
    Truncated { claimed: usize, available: usize },
}
