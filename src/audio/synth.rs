//! Procedural waveform generators
//!
//! Every clip is rendered once at startup as mono 16-bit PCM and can be
//! wrapped in a RIFF/WAVE container for the playback layer.

use std::f32::consts::TAU;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::consts::SAMPLE_RATE;
use crate::error::WavError;

/// Size of the canonical PCM WAV header
pub const WAV_HEADER_LEN: usize = 44;

/// A rendered mono 16-bit clip
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub sample_rate: u32,
    pub samples: Vec<i16>,
}

impl Waveform {
    /// Quantize f32 samples (-1.0 to 1.0)
    pub fn from_f32(sample_rate: u32, samples: &[f32]) -> Self {
        Self {
            sample_rate,
            samples: samples.iter().map(|&s| quantize(s)).collect(),
        }
    }

    /// Duration in seconds
    pub fn duration(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Samples back in -1.0 to 1.0 range
    pub fn to_f32(&self) -> Vec<f32> {
        self.samples.iter().map(|&s| s as f32 / 32767.0).collect()
    }

    /// Largest absolute sample
    pub fn peak(&self) -> i16 {
        self.samples
            .iter()
            .map(|s| s.saturating_abs())
            .max()
            .unwrap_or(0)
    }

    /// Encode as a 44-byte-header PCM WAV file
    pub fn to_wav_bytes(&self) -> Vec<u8> {
        let data_len = (self.samples.len() * 2) as u32;
        let mut out = Vec::with_capacity(WAV_HEADER_LEN + data_len as usize);

        // RIFF header
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");

        // fmt chunk (16 bytes)
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes()); // PCM
        out.extend_from_slice(&1u16.to_le_bytes()); // mono
        out.extend_from_slice(&self.sample_rate.to_le_bytes());
        out.extend_from_slice(&(self.sample_rate * 2).to_le_bytes()); // byte rate
        out.extend_from_slice(&2u16.to_le_bytes()); // block align
        out.extend_from_slice(&16u16.to_le_bytes()); // bits per sample

        // data chunk
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        for sample in &self.samples {
            out.extend_from_slice(&sample.to_le_bytes());
        }
        out
    }

    /// Decode a WAV produced by `to_wav_bytes`
    pub fn from_wav_bytes(bytes: &[u8]) -> Result<Self, WavError> {
        if bytes.len() < WAV_HEADER_LEN {
            return Err(WavError::TooShort(bytes.len()));
        }
        if &bytes[0..4] != b"RIFF" {
            return Err(WavError::BadMarker("RIFF"));
        }
        if &bytes[8..12] != b"WAVE" {
            return Err(WavError::BadMarker("WAVE"));
        }
        if &bytes[12..16] != b"fmt " {
            return Err(WavError::BadMarker("fmt "));
        }
        if &bytes[36..40] != b"data" {
            return Err(WavError::BadMarker("data"));
        }

        let channels = u16::from_le_bytes([bytes[22], bytes[23]]);
        let bits = u16::from_le_bytes([bytes[34], bytes[35]]);
        if channels != 1 || bits != 16 {
            return Err(WavError::Unsupported { channels, bits });
        }

        let sample_rate = u32::from_le_bytes([bytes[24], bytes[25], bytes[26], bytes[27]]);
        let claimed = u32::from_le_bytes([bytes[40], bytes[41], bytes[42], bytes[43]]) as usize;
        let available = bytes.len() - WAV_HEADER_LEN;
        if claimed > available {
            return Err(WavError::Truncated { claimed, available });
        }

        let samples = bytes[WAV_HEADER_LEN..WAV_HEADER_LEN + claimed]
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();

        Ok(Self {
            sample_rate,
            samples,
        })
    }
}

/// f32 -> i16 the way the clips have always been rendered (floor, then clamp)
#[inline]
pub fn quantize(sample: f32) -> i16 {
    (sample * 32767.0).floor().clamp(-32768.0, 32767.0) as i16
}

#[inline]
fn sample_count(duration: f32) -> usize {
    (SAMPLE_RATE as f32 * duration) as usize
}

/// Sine oscillator following a frequency curve, with an amplitude curve.
///
/// Phase is accumulated so sweeps stay continuous.
fn render<F, A>(duration: f32, freq_at: F, amp_at: A) -> Waveform
where
    F: Fn(f32) -> f32,
    A: Fn(f32) -> f32,
{
    let n = sample_count(duration);
    let dt = 1.0 / SAMPLE_RATE as f32;
    let mut phase = 0.0f32;
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let t = i as f32 * dt;
        out.push(phase.sin() * amp_at(t));
        phase = (phase + TAU * freq_at(t) * dt) % TAU;
    }
    Waveform::from_f32(SAMPLE_RATE, &out)
}

/// Plain sine at a fixed amplitude of 0.3
pub fn tone(frequency: f32, duration: f32) -> Waveform {
    let n = sample_count(duration);
    let out: Vec<f32> = (0..n)
        .map(|i| (TAU * frequency * i as f32 / SAMPLE_RATE as f32).sin() * 0.3)
        .collect();
    Waveform::from_f32(SAMPLE_RATE, &out)
}

/// Jump: short tone sweeping 440 -> 880 Hz, decaying exponentially
pub fn jump() -> Waveform {
    let duration = 0.15;
    render(
        duration,
        |t| 440.0 * 2f32.powf(t / duration),
        |t| 0.4 * (-t / 0.05).exp(),
    )
}

/// Note collect: decaying chord of a fundamental and two harmonics
pub fn note(fundamental: f32) -> Waveform {
    let n = sample_count(0.3);
    let partials = [(1.0, 1.0), (2.0, 0.5), (3.0, 0.25)];
    let norm: f32 = partials.iter().map(|(_, w)| w).sum();
    let out: Vec<f32> = (0..n)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = (-t / 0.08).exp();
            let chord: f32 = partials
                .iter()
                .map(|(mult, weight)| (TAU * fundamental * mult * t).sin() * weight)
                .sum();
            chord / norm * env * 0.5
        })
        .collect();
    Waveform::from_f32(SAMPLE_RATE, &out)
}

/// Death: falling sweep 440 -> 110 Hz over half a second
pub fn death() -> Waveform {
    let duration = 0.5;
    render(
        duration,
        |t| 440.0 * 0.25f32.powf(t / duration),
        |t| 0.4 * (1.0 - t / duration),
    )
}

/// Bounce: quick springy chirp 200 -> 600 Hz
pub fn bounce() -> Waveform {
    let duration = 0.2;
    render(
        duration,
        |t| 200.0 + 400.0 * (t / duration).sqrt(),
        |t| 0.35 * (-t / 0.07).exp(),
    )
}

/// Explosion: seeded white noise through a one-pole low-pass
pub fn explosion(seed: u64) -> Waveform {
    let n = sample_count(0.6);
    let cutoff = 900.0;
    let alpha = {
        let rc = 1.0 / (TAU * cutoff);
        let dt = 1.0 / SAMPLE_RATE as f32;
        dt / (rc + dt)
    };

    let mut rng = Pcg32::seed_from_u64(seed);
    let mut z1 = 0.0f32;
    let out: Vec<f32> = (0..n)
        .map(|i| {
            let white = rng.random_range(-1.0f32..1.0);
            z1 += alpha * (white - z1);
            let t = i as f32 / SAMPLE_RATE as f32;
            // Low-passed noise is quiet; boost before the envelope
            (z1 * 3.0).clamp(-1.0, 1.0) * (-t / 0.15).exp() * 0.8
        })
        .collect();
    Waveform::from_f32(SAMPLE_RATE, &out)
}

/// Bass layer: one kick per beat, each a 100 ms sine dropping 100 -> 60 Hz
pub fn bass_rhythm(bpm: f64, duration: f32) -> Waveform {
    let n = sample_count(duration);
    let sr = SAMPLE_RATE as f32;
    let beat_interval = (sr * (60.0 / bpm.max(1.0)) as f32).max(1.0);
    let kick_len = sr * 0.1;
    let out: Vec<f32> = (0..n)
        .map(|i| {
            let beat_pos = i as f32 % beat_interval;
            if beat_pos < kick_len {
                let freq = 60.0 + (1.0 - beat_pos / kick_len) * 40.0;
                (TAU * freq * i as f32 / sr).sin() * (-beat_pos / (sr * 0.05)).exp() * 0.8
            } else {
                0.0
            }
        })
        .collect();
    Waveform::from_f32(SAMPLE_RATE, &out)
}

/// Melody loop notes (Hz): A4 C5 E5 C5 A4 F4 A4 C5
pub const MELODY_NOTES: [f32; 8] = [440.0, 523.0, 659.0, 523.0, 440.0, 349.0, 440.0, 523.0];

/// Melody layer: 4 second loop of `MELODY_NOTES`, each with 10% fade in/out
pub fn melody() -> Waveform {
    let n = sample_count(4.0);
    let note_len = n as f32 / MELODY_NOTES.len() as f32;
    let out: Vec<f32> = (0..n)
        .map(|i| {
            let idx = ((i as f32 / note_len) as usize).min(MELODY_NOTES.len() - 1);
            let freq = MELODY_NOTES[idx];
            let pos = i as f32 % note_len;
            let fade_in = (pos / (note_len * 0.1)).min(1.0);
            let fade_out = ((note_len - pos) / (note_len * 0.1)).min(1.0);
            let env = fade_in.min(fade_out);
            (TAU * freq * i as f32 / SAMPLE_RATE as f32).sin() * env * 0.3
        })
        .collect();
    Waveform::from_f32(SAMPLE_RATE, &out)
}

/// Synth layer: 8 second pad of two slowly wandering sines
pub fn synth_pad() -> Waveform {
    let n = sample_count(8.0);
    let out: Vec<f32> = (0..n)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            let f1 = 220.0 + (t * 0.5).sin() * 20.0;
            let f2 = 330.0 + (t * 0.3).cos() * 15.0;
            ((TAU * f1 * t).sin() + (TAU * f2 * t).sin() * 0.5) * 0.15
        })
        .collect();
    Waveform::from_f32(SAMPLE_RATE, &out)
}
