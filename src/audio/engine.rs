//! Layered music mixer, SFX bank and beat clock behind one owner

use super::synth::{self, Waveform};
use super::{AudioBackend, AudioPort, BeatClock};
use crate::consts::DEFAULT_BPM;

/// Layer names and their base levels
const LAYERS: [(&str, f32); 3] = [("bass", 0.4), ("melody", 0.3), ("synth", 0.2)];

/// One-shot effects. "bounce" and "explosion" are fired by gameplay too.
const SFX: [&str; 5] = ["jump", "note", "death", "bounce", "explosion"];

/// Background music layering
const BG_FADE_MS: f64 = 2000.0;
const BG_SYNTH_DELAY_MS: f64 = 2000.0;
const BG_MELODY_DELAY_MS: f64 = 4000.0;

/// Bass loop: one kick per second over a 2 s loop
const BASS_BPM: f64 = 60.0;
const BASS_LOOP_SECS: f32 = 2.0;
/// Collect chime fundamental (C5)
const NOTE_FUNDAMENTAL: f32 = 523.25;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Fade {
    from: f32,
    to: f32,
    start_ms: f64,
    duration_ms: f64,
    /// Stop the loop when the fade lands
    stop_at_end: bool,
}

impl Fade {
    fn level_at(&self, now_ms: f64) -> (f32, bool) {
        if self.duration_ms <= 0.0 {
            return (self.to, true);
        }
        let t = ((now_ms - self.start_ms) / self.duration_ms).clamp(0.0, 1.0);
        (self.from + (self.to - self.from) * t as f32, t >= 1.0)
    }
}

/// A looping music layer
#[derive(Debug, Clone, PartialEq)]
pub struct AudioLayer {
    pub name: &'static str,
    pub base_volume: f32,
    pub active: bool,
    /// Current level before the music volume is applied
    gain: f32,
    fade: Option<Fade>,
}

impl AudioLayer {
    fn new(name: &'static str, base_volume: f32) -> Self {
        Self {
            name,
            base_volume,
            active: false,
            gain: 0.0,
            fade: None,
        }
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }
}

/// Deferred layer fade-in
#[derive(Debug, Clone, Copy, PartialEq)]
struct Cue {
    at_ms: f64,
    layer: &'static str,
    fade_ms: f64,
}

/// Owns generated clips (via the backend), layers, volumes and the beat clock
pub struct AudioEngine {
    backend: Box<dyn AudioBackend>,
    layers: Vec<AudioLayer>,
    clock: BeatClock,
    cues: Vec<Cue>,
    master_volume: f32,
    music_volume: f32,
    sfx_volume: f32,
    muted: bool,
    hidden: bool,
    unlocked: bool,
    destroyed: bool,
}

impl AudioEngine {
    /// Synthesize every clip and hand it to the backend as WAV bytes
    pub fn new(mut backend: Box<dyn AudioBackend>, seed: u64, now_ms: f64) -> Self {
        let effects: [(&str, Waveform); 5] = [
            ("jump", synth::jump()),
            ("note", synth::note(NOTE_FUNDAMENTAL)),
            ("death", synth::death()),
            ("bounce", synth::bounce()),
            ("explosion", synth::explosion(seed)),
        ];
        for (name, clip) in &effects {
            backend.load(name, &clip.to_wav_bytes(), false);
        }

        let music: [(&str, Waveform); 3] = [
            ("bass", synth::bass_rhythm(BASS_BPM, BASS_LOOP_SECS)),
            ("melody", synth::melody()),
            ("synth", synth::synth_pad()),
        ];
        for (name, clip) in &music {
            backend.load(name, &clip.to_wav_bytes(), true);
        }
        log::info!(
            "Audio ready: {} effects, {} music layers",
            effects.len(),
            music.len()
        );

        let mut engine = Self {
            backend,
            layers: LAYERS
                .iter()
                .map(|&(name, base)| AudioLayer::new(name, base))
                .collect(),
            clock: BeatClock::new(DEFAULT_BPM, now_ms),
            cues: Vec::new(),
            master_volume: 1.0,
            music_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
            hidden: false,
            unlocked: false,
            destroyed: false,
        };
        engine.backend.set_master_volume(engine.master_volume);
        engine
    }

    fn layer_index(&self, name: &str) -> Option<usize> {
        let idx = self.layers.iter().position(|l| l.name == name);
        if idx.is_none() {
            log::warn!("Unknown music layer: {name}");
        }
        idx
    }

    pub fn layer(&self, name: &str) -> Option<&AudioLayer> {
        self.layers.iter().find(|l| l.name == name)
    }

    pub fn layers(&self) -> &[AudioLayer] {
        &self.layers
    }

    // === Sound effects ===

    pub fn play_sfx(&mut self, name: &str, volume: f32) {
        if self.destroyed {
            return;
        }
        if !SFX.contains(&name) {
            log::warn!("Unknown sound effect: {name}");
            return;
        }
        let vol = self.effective_sfx_volume(volume);
        self.backend.play(name, vol);
    }

    /// Requested level scaled by the SFX volume
    pub fn effective_sfx_volume(&self, requested: f32) -> f32 {
        requested.clamp(0.0, 1.0) * self.sfx_volume
    }

    // === Music layers ===

    pub fn play_music_layer(&mut self, name: &str) {
        if self.destroyed {
            return;
        }
        let Some(idx) = self.layer_index(name) else { return };
        let music = self.music_volume;
        let layer = &mut self.layers[idx];
        let was_active = layer.active;
        layer.active = true;
        layer.gain = layer.base_volume;
        layer.fade = None;
        let vol = layer.gain * music;
        if was_active {
            self.backend.set_loop_volume(name, vol);
        } else {
            self.backend.start_loop(name, vol);
        }
    }

    pub fn stop_music_layer(&mut self, name: &str) {
        let Some(idx) = self.layer_index(name) else { return };
        let layer = &mut self.layers[idx];
        layer.fade = None;
        layer.gain = 0.0;
        if layer.active {
            layer.active = false;
            self.backend.stop_loop(name);
        }
    }

    /// Start (if needed) and ramp up to the base level
    pub fn fade_in_music_layer(&mut self, name: &str, fade_ms: f64, now_ms: f64) {
        if self.destroyed {
            return;
        }
        let Some(idx) = self.layer_index(name) else { return };
        let music = self.music_volume;
        let layer = &mut self.layers[idx];
        if !layer.active {
            layer.active = true;
            layer.gain = 0.0;
            self.backend.start_loop(name, 0.0);
        }
        layer.fade = Some(Fade {
            from: layer.gain,
            to: layer.base_volume,
            start_ms: now_ms,
            duration_ms: fade_ms.max(0.0),
            stop_at_end: false,
        });
        log::debug!("Fading in {name} over {fade_ms}ms");
        if fade_ms <= 0.0 {
            self.apply_fades(now_ms);
        } else {
            let vol = self.layers[idx].gain * music;
            self.backend.set_loop_volume(name, vol);
        }
    }

    /// Ramp to silence, then stop the layer
    pub fn fade_out_music_layer(&mut self, name: &str, fade_ms: f64, now_ms: f64) {
        let Some(idx) = self.layer_index(name) else { return };
        let layer = &mut self.layers[idx];
        if !layer.active {
            return;
        }
        layer.fade = Some(Fade {
            from: layer.gain,
            to: 0.0,
            start_ms: now_ms,
            duration_ms: fade_ms.max(0.0),
            stop_at_end: true,
        });
        log::debug!("Fading out {name} over {fade_ms}ms");
        if fade_ms <= 0.0 {
            self.apply_fades(now_ms);
        }
    }

    /// Bass now, synth pad after 2 s, melody after 4 s, each fading in
    pub fn start_background_music(&mut self, now_ms: f64) {
        if self.destroyed {
            return;
        }
        self.cues.clear();
        self.play_music_layer("bass");
        self.cues.push(Cue {
            at_ms: now_ms + BG_SYNTH_DELAY_MS,
            layer: "synth",
            fade_ms: BG_FADE_MS,
        });
        self.cues.push(Cue {
            at_ms: now_ms + BG_MELODY_DELAY_MS,
            layer: "melody",
            fade_ms: BG_FADE_MS,
        });
        log::info!("Background music started");
    }

    pub fn stop_all_music(&mut self) {
        self.cues.clear();
        let names: Vec<&'static str> = self.layers.iter().map(|l| l.name).collect();
        for name in names {
            self.stop_music_layer(name);
        }
    }

    /// Layer level at full gain: base times music volume
    pub fn layer_volume(&self, name: &str) -> Option<f32> {
        self.layer(name).map(|l| l.base_volume * self.music_volume)
    }

    // === Beat clock ===

    pub fn set_bpm(&mut self, bpm: f64, now_ms: f64) {
        self.clock.set_bpm(bpm, now_ms);
        log::debug!("BPM set to {}", self.clock.bpm());
    }

    pub fn bpm(&self) -> f64 {
        self.clock.bpm()
    }

    pub fn current_beat(&self) -> u64 {
        self.clock.current_beat()
    }

    pub fn time_to_next_beat(&self, now_ms: f64) -> f64 {
        self.clock.time_to_next_beat(now_ms)
    }

    pub fn is_on_beat(&self, tolerance_ms: f64, now_ms: f64) -> bool {
        self.clock.is_on_beat(tolerance_ms, now_ms)
    }

    pub fn beat_phase(&self, now_ms: f64) -> f64 {
        self.clock.beat_phase(now_ms)
    }

    pub fn clock(&self) -> &BeatClock {
        &self.clock
    }

    /// Advance the beat clock, running fades and due cues.
    /// Returns the beat number if one fired.
    pub fn update(&mut self, now_ms: f64) -> Option<u64> {
        if self.destroyed {
            return None;
        }
        let beat = self.clock.update(now_ms);

        let due: Vec<Cue> = self.cues.iter().filter(|c| c.at_ms <= now_ms).copied().collect();
        self.cues.retain(|c| c.at_ms > now_ms);
        for cue in due {
            self.fade_in_music_layer(cue.layer, cue.fade_ms, now_ms);
        }

        self.apply_fades(now_ms);
        beat
    }

    fn apply_fades(&mut self, now_ms: f64) {
        let music = self.music_volume;
        for layer in &mut self.layers {
            let Some(fade) = layer.fade else { continue };
            let (gain, done) = fade.level_at(now_ms);
            layer.gain = gain;
            if done {
                layer.fade = None;
                if fade.stop_at_end {
                    layer.active = false;
                    self.backend.stop_loop(layer.name);
                    continue;
                }
            }
            self.backend.set_loop_volume(layer.name, gain * music);
        }
    }

    // === Volumes ===

    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = volume.clamp(0.0, 1.0);
        self.backend.set_master_volume(self.master_volume);
    }

    pub fn set_music_volume(&mut self, volume: f32) {
        self.music_volume = volume.clamp(0.0, 1.0);
        for layer in self.layers.iter().filter(|l| l.active) {
            self.backend
                .set_loop_volume(layer.name, layer.gain * self.music_volume);
        }
    }

    pub fn set_sfx_volume(&mut self, volume: f32) {
        self.sfx_volume = volume.clamp(0.0, 1.0);
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    pub fn music_volume(&self) -> f32 {
        self.music_volume
    }

    pub fn sfx_volume(&self) -> f32 {
        self.sfx_volume
    }

    // === Lifecycle ===

    pub fn mute_all(&mut self) {
        self.muted = true;
        self.sync_mute();
    }

    pub fn unmute_all(&mut self) {
        self.muted = false;
        self.sync_mute();
    }

    /// Hidden pages are silent; mixer state is kept for when they come back
    pub fn set_page_visible(&mut self, visible: bool) {
        if self.hidden == !visible {
            return;
        }
        self.hidden = !visible;
        log::debug!("Page visible: {visible}");
        self.sync_mute();
    }

    fn sync_mute(&mut self) {
        self.backend.set_muted(self.muted || self.hidden);
    }

    /// Output is silent (user mute or hidden page)
    pub fn is_silenced(&self) -> bool {
        self.muted || self.hidden
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Resume output on the first user gesture
    pub fn unlock(&mut self) {
        if self.unlocked || self.destroyed {
            return;
        }
        self.unlocked = true;
        self.backend.resume();
        log::info!("Audio unlocked");
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    /// Stop everything and release clips. Later calls are no-ops.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.stop_all_music();
        self.backend.unload_all();
        self.destroyed = true;
        log::info!("Audio destroyed");
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

impl AudioPort for AudioEngine {
    fn play_sfx(&mut self, name: &str, volume: f32) {
        AudioEngine::play_sfx(self, name, volume);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Load(String, bool),
        Play(String, f32),
        StartLoop(String, f32),
        StopLoop(String),
        LoopVolume(String, f32),
        Master(f32),
        Muted(bool),
        Resume,
        UnloadAll,
    }

    /// Calls in order, plus every clip as decoded from the bytes it was given
    #[derive(Default, Clone)]
    struct Recorder(Rc<RefCell<Vec<Call>>>, Rc<RefCell<Vec<(String, Waveform)>>>);

    impl AudioBackend for Recorder {
        fn load(&mut self, name: &str, wav: &[u8], looping: bool) {
            self.0.borrow_mut().push(Call::Load(name.into(), looping));
            let clip = Waveform::from_wav_bytes(wav).unwrap();
            self.1.borrow_mut().push((name.into(), clip));
        }
        fn play(&mut self, name: &str, volume: f32) {
            self.0.borrow_mut().push(Call::Play(name.into(), volume));
        }
        fn start_loop(&mut self, name: &str, volume: f32) {
            self.0.borrow_mut().push(Call::StartLoop(name.into(), volume));
        }
        fn stop_loop(&mut self, name: &str) {
            self.0.borrow_mut().push(Call::StopLoop(name.into()));
        }
        fn set_loop_volume(&mut self, name: &str, volume: f32) {
            self.0.borrow_mut().push(Call::LoopVolume(name.into(), volume));
        }
        fn set_master_volume(&mut self, volume: f32) {
            self.0.borrow_mut().push(Call::Master(volume));
        }
        fn set_muted(&mut self, muted: bool) {
            self.0.borrow_mut().push(Call::Muted(muted));
        }
        fn resume(&mut self) {
            self.0.borrow_mut().push(Call::Resume);
        }
        fn unload_all(&mut self) {
            self.0.borrow_mut().push(Call::UnloadAll);
        }
    }

    fn engine() -> (AudioEngine, Rc<RefCell<Vec<Call>>>) {
        let rec = Recorder::default();
        let log = rec.0.clone();
        let engine = AudioEngine::new(Box::new(rec), 1, 0.0);
        log.borrow_mut().clear();
        (engine, log)
    }

    #[test]
    fn test_loads_every_clip() {
        let rec = Recorder::default();
        let log = rec.0.clone();
        let _engine = AudioEngine::new(Box::new(rec), 1, 0.0);
        let calls = log.borrow();
        assert!(calls.contains(&Call::Load("jump".into(), false)));
        assert!(calls.contains(&Call::Load("bounce".into(), false)));
        assert!(calls.contains(&Call::Load("bass".into(), true)));
        assert!(calls.contains(&Call::Load("synth".into(), true)));
    }

    #[test]
    fn test_clips_arrive_as_wav() {
        let rec = Recorder::default();
        let clips = rec.1.clone();
        let _engine = AudioEngine::new(Box::new(rec), 1, 0.0);
        let clips = clips.borrow();
        assert_eq!(clips.len(), SFX.len() + LAYERS.len());
        for (name, clip) in clips.iter() {
            assert_eq!(clip.sample_rate, crate::consts::SAMPLE_RATE, "{name}");
            assert!(clip.peak() > 0, "{name} is silent");
        }
        let (_, jump) = clips.iter().find(|(n, _)| n == "jump").unwrap();
        assert_eq!(*jump, synth::jump());
    }

    #[test]
    fn test_bass_kicks_once_per_second() {
        let rec = Recorder::default();
        let clips = rec.1.clone();
        let _engine = AudioEngine::new(Box::new(rec), 1, 0.0);
        let clips = clips.borrow();
        let (_, bass) = clips.iter().find(|(n, _)| n == "bass").unwrap();

        let sr = bass.sample_rate as usize;
        assert_eq!(bass.samples.len(), 2 * sr);
        let window_peak = |from: f32, to: f32| {
            bass.samples[(from * sr as f32) as usize..(to * sr as f32) as usize]
                .iter()
                .map(|s| s.saturating_abs())
                .max()
                .unwrap_or(0)
        };
        assert!(window_peak(0.0, 0.1) > 5000);
        assert!(window_peak(1.0, 1.1) > 5000);
        // Nothing between kicks; a 120 BPM render would kick at 0.5 s
        assert_eq!(window_peak(0.2, 0.9), 0);
        assert_eq!(window_peak(1.2, 1.9), 0);
    }

    #[test]
    fn test_music_volume_composition_order_independent() {
        let (mut a, _) = engine();
        a.set_music_volume(0.5);
        a.set_master_volume(0.3);
        let (mut b, _) = engine();
        b.set_master_volume(0.3);
        b.set_music_volume(0.5);
        assert!((a.layer_volume("bass").unwrap() - 0.2).abs() < 1e-6);
        assert_eq!(a.layer_volume("bass"), b.layer_volume("bass"));
    }

    #[test]
    fn test_volumes_clamped() {
        let (mut engine, _) = engine();
        engine.set_master_volume(3.0);
        engine.set_music_volume(-1.0);
        engine.set_sfx_volume(1.5);
        assert_eq!(engine.master_volume(), 1.0);
        assert_eq!(engine.music_volume(), 0.0);
        assert_eq!(engine.sfx_volume(), 1.0);
    }

    #[test]
    fn test_unknown_names_are_noops() {
        let (mut engine, log) = engine();
        engine.play_sfx("kazoo", 1.0);
        engine.play_music_layer("choir");
        engine.fade_out_music_layer("choir", 100.0, 0.0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_sfx_scaled_by_sfx_volume() {
        let (mut engine, log) = engine();
        engine.set_sfx_volume(0.5);
        engine.play_sfx("note", 0.7);
        assert_eq!(log.borrow().last(), Some(&Call::Play("note".into(), 0.35)));
    }

    #[test]
    fn test_background_music_schedule() {
        let (mut engine, log) = engine();
        engine.start_background_music(1000.0);
        assert!(engine.layer("bass").unwrap().active);
        assert!(!engine.layer("synth").unwrap().active);

        engine.update(2999.0);
        assert!(!engine.layer("synth").unwrap().active);

        engine.update(3000.0);
        let synth = engine.layer("synth").unwrap();
        assert!(synth.active && synth.is_fading());
        assert!(log.borrow().contains(&Call::StartLoop("synth".into(), 0.0)));

        engine.update(5000.0);
        let synth = engine.layer("synth").unwrap();
        assert!(!synth.is_fading());
        assert!((synth.gain() - 0.2).abs() < 1e-6);
        assert!(engine.layer("melody").unwrap().active);

        engine.update(7000.0);
        assert!((engine.layer("melody").unwrap().gain() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_fade_out_stops_layer() {
        let (mut engine, log) = engine();
        engine.play_music_layer("melody");
        engine.fade_out_music_layer("melody", 1000.0, 0.0);
        engine.update(500.0);
        let melody = engine.layer("melody").unwrap();
        assert!(melody.active);
        assert!((melody.gain() - 0.15).abs() < 1e-6);

        engine.update(1000.0);
        assert!(!engine.layer("melody").unwrap().active);
        assert_eq!(log.borrow().last(), Some(&Call::StopLoop("melody".into())));
    }

    #[test]
    fn test_visibility_idempotent() {
        let (mut engine, log) = engine();
        engine.set_page_visible(false);
        engine.set_page_visible(false);
        assert!(engine.is_silenced());
        engine.set_page_visible(true);
        engine.set_page_visible(true);
        assert!(!engine.is_silenced());
        assert_eq!(
            *log.borrow(),
            vec![Call::Muted(true), Call::Muted(false)]
        );
    }

    #[test]
    fn test_hidden_keeps_user_mute() {
        let (mut engine, log) = engine();
        engine.mute_all();
        engine.set_page_visible(false);
        engine.set_page_visible(true);
        assert_eq!(log.borrow().last(), Some(&Call::Muted(true)));
        engine.unmute_all();
        assert_eq!(log.borrow().last(), Some(&Call::Muted(false)));
    }

    #[test]
    fn test_unlock_once_and_destroy() {
        let (mut engine, log) = engine();
        engine.unlock();
        engine.unlock();
        assert_eq!(*log.borrow(), vec![Call::Resume]);

        engine.play_music_layer("bass");
        engine.destroy();
        engine.destroy();
        engine.play_sfx("jump", 1.0);
        let calls = log.borrow();
        assert_eq!(calls.iter().filter(|c| **c == Call::UnloadAll).count(), 1);
        assert!(!calls.iter().any(|c| matches!(c, Call::Play(..))));
        assert!(engine.is_destroyed());
    }

    #[test]
    fn test_beat_via_engine() {
        let (mut engine, _) = engine();
        engine.set_bpm(120.0, 0.0);
        assert!(engine.time_to_next_beat(0.0) <= 500.0);
        assert_eq!(engine.update(499.0), None);
        assert_eq!(engine.update(500.0), Some(1));
        assert_eq!(engine.current_beat(), 1);
    }
}
