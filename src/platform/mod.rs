//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Time
//! - Audio output (Web Audio in the browser, silent on native)

#[cfg(target_arch = "wasm32")]
pub mod web_audio;

use crate::audio::{AudioBackend, NullBackend};

/// Monotonic host clock in milliseconds
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or_else(js_sys::Date::now)
}

/// Monotonic host clock in milliseconds
#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    use std::sync::OnceLock;
    use std::time::Instant;

    static EPOCH: OnceLock<Instant> = OnceLock::new();
    EPOCH.get_or_init(Instant::now).elapsed().as_secs_f64() * 1000.0
}

/// Best available audio output; falls back to silence
#[cfg(target_arch = "wasm32")]
pub fn default_audio_backend() -> Box<dyn AudioBackend> {
    match web_audio::WebAudioBackend::new() {
        Ok(backend) => Box::new(backend),
        Err(e) => {
            log::warn!("Web Audio unavailable ({e:?}), running silent");
            Box::new(NullBackend)
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn default_audio_backend() -> Box<dyn AudioBackend> {
    Box::new(NullBackend)
}
