//! Audio: procedural synthesis, layered music and the beat clock
//!
//! Everything audible is generated at startup. Playback goes through an
//! `AudioBackend` so the engine runs the same under Web Audio and headless.

pub mod beat;
pub mod engine;
pub mod synth;

pub use beat::BeatClock;
pub use engine::{AudioEngine, AudioLayer};
pub use synth::Waveform;

/// Output device for rendered clips.
///
/// Volumes arrive already composed (layer/SFX level times music/SFX volume).
/// Master volume and mute are bus-level and sent separately.
pub trait AudioBackend {
    /// Register a clip under `name`. `wav` is a mono 16-bit PCM WAV file;
    /// a backend that cannot decode it logs and skips the clip.
    fn load(&mut self, name: &str, wav: &[u8], looping: bool);
    /// Fire-and-forget one-shot
    fn play(&mut self, name: &str, volume: f32);
    fn start_loop(&mut self, name: &str, volume: f32);
    fn stop_loop(&mut self, name: &str);
    fn set_loop_volume(&mut self, name: &str, volume: f32);
    fn set_master_volume(&mut self, volume: f32);
    fn set_muted(&mut self, muted: bool);
    /// Resume output after a user gesture
    fn resume(&mut self);
    /// Release every loaded clip
    fn unload_all(&mut self);
}

/// Silent backend for native runs and tests
#[derive(Debug, Default)]
pub struct NullBackend;

impl AudioBackend for NullBackend {
    fn load(&mut self, name: &str, wav: &[u8], looping: bool) {
        match Waveform::from_wav_bytes(wav) {
            Ok(clip) => log::trace!(
                "load {name}: {} samples{}",
                clip.samples.len(),
                if looping { " (loop)" } else { "" }
            ),
            Err(e) => log::warn!("Skipping clip {name}: {e}"),
        }
    }

    fn play(&mut self, name: &str, volume: f32) {
        log::trace!("play {name} @ {volume:.2}");
    }

    fn start_loop(&mut self, name: &str, volume: f32) {
        log::trace!("start loop {name} @ {volume:.2}");
    }

    fn stop_loop(&mut self, name: &str) {
        log::trace!("stop loop {name}");
    }

    fn set_loop_volume(&mut self, _name: &str, _volume: f32) {}

    fn set_master_volume(&mut self, _volume: f32) {}

    fn set_muted(&mut self, muted: bool) {
        log::trace!("muted: {muted}");
    }

    fn resume(&mut self) {}

    fn unload_all(&mut self) {}
}

/// What gameplay needs from audio: fire a named effect
pub trait AudioPort {
    fn play_sfx(&mut self, name: &str, volume: f32);
}
