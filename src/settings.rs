//! Player settings and preferences
//!
//! Persisted in LocalStorage on the web, defaults on native.

use serde::{Deserialize, Serialize};

use crate::audio::AudioEngine;
use crate::input::InputManager;

/// Player settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Music layer volume (0.0 - 1.0)
    pub music_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Mute (and pause) when the page is hidden
    pub mute_on_hidden: bool,

    // === Input ===
    /// Gamepad rumble
    pub vibration: bool,

    // === HUD ===
    pub show_fps: bool,

    // === Accessibility ===
    /// Reduced motion (no camera easing, no background particles)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 1.0,
            music_volume: 0.8,
            sfx_volume: 1.0,
            mute_on_hidden: true,

            vibration: true,

            show_fps: false,

            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Clamp volumes into range
    pub fn sanitized(mut self) -> Self {
        for v in [&mut self.master_volume, &mut self.music_volume, &mut self.sfx_volume] {
            *v = if v.is_nan() { 1.0 } else { v.clamp(0.0, 1.0) };
        }
        self
    }

    /// Push audio and rumble preferences into the live systems
    pub fn apply_to(&self, audio: &mut AudioEngine, input: &mut InputManager) {
        audio.set_master_volume(self.master_volume);
        audio.set_music_volume(self.music_volume);
        audio.set_sfx_volume(self.sfx_volume);
        input.set_vibration_enabled(self.vibration);
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Parse stored settings; fields missing from older saves take defaults
    pub fn from_json(json: &str) -> Option<Self> {
        match serde_json::from_str::<Settings>(json) {
            Ok(settings) => Some(settings.sanitized()),
            Err(e) => {
                log::warn!("Ignoring stored settings: {e}");
                None
            }
        }
    }

    /// LocalStorage key
    const STORAGE_KEY: &'static str = "chorus_king_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Some(settings) = Self::from_json(&json) {
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if storage.set_item(Self::STORAGE_KEY, &self.to_json()).is_ok() {
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        log::debug!("No settings store on native ({})", Self::STORAGE_KEY);
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
