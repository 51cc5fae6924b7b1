//! Web Audio output
//!
//! Every clip becomes an `AudioBuffer`. One-shots get a fresh source and gain
//! node per play; loops keep theirs so volume can be changed live. Everything
//! routes through a master gain node.

use std::collections::HashMap;

use wasm_bindgen::JsValue;
use web_sys::{AudioBuffer, AudioBufferSourceNode, AudioContext, AudioContextState, GainNode};

use crate::audio::{AudioBackend, Waveform};

struct Voice {
    source: AudioBufferSourceNode,
    gain: GainNode,
}

pub struct WebAudioBackend {
    ctx: AudioContext,
    master: GainNode,
    buffers: HashMap<String, AudioBuffer>,
    loops: HashMap<String, Voice>,
    master_volume: f32,
    muted: bool,
}

impl WebAudioBackend {
    pub fn new() -> Result<Self, JsValue> {
        let ctx = AudioContext::new()?;
        let master = ctx.create_gain()?;
        master.connect_with_audio_node(&ctx.destination())?;
        log::info!("Web Audio context at {} Hz", ctx.sample_rate());
        Ok(Self {
            ctx,
            master,
            buffers: HashMap::new(),
            loops: HashMap::new(),
            master_volume: 1.0,
            muted: false,
        })
    }

    fn voice(&self, name: &str, volume: f32, looping: bool) -> Result<Voice, JsValue> {
        let buffer = self
            .buffers
            .get(name)
            .ok_or_else(|| JsValue::from_str(&format!("no clip named {name}")))?;
        let source = self.ctx.create_buffer_source()?;
        source.set_buffer(Some(buffer));
        source.set_loop(looping);
        let gain = self.ctx.create_gain()?;
        gain.gain().set_value(volume);
        source.connect_with_audio_node(&gain)?;
        gain.connect_with_audio_node(&self.master)?;
        source.start()?;
        Ok(Voice { source, gain })
    }

    fn sync_master(&self) {
        let level = if self.muted { 0.0 } else { self.master_volume };
        self.master.gain().set_value(level);
    }
}

impl AudioBackend for WebAudioBackend {
    fn load(&mut self, name: &str, wav: &[u8], _looping: bool) {
        let clip = match Waveform::from_wav_bytes(wav) {
            Ok(clip) => clip,
            Err(e) => {
                log::warn!("Skipping clip {name}: {e}");
                return;
            }
        };
        let samples = clip.to_f32();
        let buffer = self
            .ctx
            .create_buffer(1, samples.len().max(1) as u32, clip.sample_rate as f32)
            .and_then(|buffer| buffer.copy_to_channel(&samples, 0).map(|_| buffer));
        match buffer {
            Ok(buffer) => {
                self.buffers.insert(name.to_string(), buffer);
            }
            Err(e) => log::error!("Failed to create buffer for {name}: {e:?}"),
        }
    }

    fn play(&mut self, name: &str, volume: f32) {
        if let Err(e) = self.voice(name, volume, false) {
            log::warn!("Could not play {name}: {e:?}");
        }
    }

    fn start_loop(&mut self, name: &str, volume: f32) {
        self.stop_loop(name);
        match self.voice(name, volume, true) {
            Ok(voice) => {
                self.loops.insert(name.to_string(), voice);
            }
            Err(e) => log::warn!("Could not start loop {name}: {e:?}"),
        }
    }

    fn stop_loop(&mut self, name: &str) {
        if let Some(voice) = self.loops.remove(name) {
            let _ = voice.source.stop();
            let _ = voice.gain.disconnect();
        }
    }

    fn set_loop_volume(&mut self, name: &str, volume: f32) {
        if let Some(voice) = self.loops.get(name) {
            voice.gain.gain().set_value(volume);
        }
    }

    fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = volume;
        self.sync_master();
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.sync_master();
    }

    fn resume(&mut self) {
        if self.ctx.state() == AudioContextState::Suspended {
            // The returned promise only reports completion
            let _ = self.ctx.resume();
        }
    }

    fn unload_all(&mut self) {
        let names: Vec<String> = self.loops.keys().cloned().collect();
        for name in names {
            self.stop_loop(&name);
        }
        self.buffers.clear();
        let _ = self.ctx.close();
    }
}
