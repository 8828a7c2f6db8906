//! Audio clips and the sink that collects them.
//!
//! Code that produces sound (key clicks, narration) receives an
//! [`AudioSink`] once per session. While a recording runs the sink is the
//! recorder; otherwise it is a [`NullAudioSink`], so producers never need to
//! know whether anything is listening.

use std::f32::consts::TAU;
use std::time::Duration;

/// Sample data in one of the shapes audio playback code hands out.
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    /// Mono, signed 16-bit
    MonoI16(Vec<i16>),
    /// Interleaved-as-pairs stereo, signed 16-bit
    StereoI16(Vec<[i16; 2]>),
    /// Mono, float in [-1, 1]
    MonoF32(Vec<f32>),
    /// Stereo pairs, float in [-1, 1]
    StereoF32(Vec<[f32; 2]>),
}

fn i16_to_f32(sample: i16) -> f32 {
    sample as f32 / 32768.0
}

impl Samples {
    /// Number of sample frames (a stereo pair counts once).
    pub fn frames(&self) -> usize {
        match self {
            Samples::MonoI16(s) => s.len(),
            Samples::StereoI16(s) => s.len(),
            Samples::MonoF32(s) => s.len(),
            Samples::StereoF32(s) => s.len(),
        }
    }

    /// Frame `index` as a float stereo pair; mono is duplicated to both channels.
    pub fn frame(&self, index: usize) -> Option<[f32; 2]> {
        match self {
            Samples::MonoI16(s) => s.get(index).map(|&v| {
                let v = i16_to_f32(v);
                [v, v]
            }),
            Samples::StereoI16(s) => s
                .get(index)
                .map(|&[l, r]| [i16_to_f32(l), i16_to_f32(r)]),
            Samples::MonoF32(s) => s.get(index).map(|&v| [v, v]),
            Samples::StereoF32(s) => s.get(index).copied(),
        }
    }

    /// Convert every frame to a float stereo pair.
    pub fn to_stereo_f32(&self) -> Vec<[f32; 2]> {
        (0..self.frames()).filter_map(|i| self.frame(i)).collect()
    }
}

/// A short sound and the rate it was sampled at.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    /// Sample data
    pub samples: Samples,
    /// Sample rate in Hz
    pub rate: u32,
}

impl AudioClip {
    /// Create a clip.
    pub fn new(samples: Samples, rate: u32) -> Self {
        Self { samples, rate }
    }

    /// Playback length of the clip.
    pub fn duration(&self) -> Duration {
        if self.rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.frames() as f64 / self.rate as f64)
    }

    /// Whether the clip holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.frames() == 0
    }

    /// A short keystroke click: a decaying 2 kHz tone over a noisy attack.
    pub fn click(rate: u32) -> Self {
        const LENGTH: Duration = Duration::from_millis(30);
        const AMPLITUDE: f32 = 0.35;

        let frames = (rate as f64 * LENGTH.as_secs_f64()) as usize;
        let mut noise: u32 = 0x9E37_79B9;
        let samples = (0..frames)
            .map(|i| {
                let t = i as f32 / rate as f32;
                // xorshift keeps the click deterministic
                noise ^= noise << 13;
                noise ^= noise >> 17;
                noise ^= noise << 5;
                let hiss = (noise as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let tone = (TAU * 2_000.0 * t).sin();
                let envelope = (-t * 180.0).exp();
                AMPLITUDE * envelope * (0.6 * tone + 0.4 * hiss)
            })
            .collect();

        Self::new(Samples::MonoF32(samples), rate)
    }
}

/// Destination for audio produced during a session.
///
/// Implementations must accept clips from any thread and must never fail
/// the caller: a clip that cannot be used is dropped.
pub trait AudioSink: Send + Sync {
    /// Offer a clip that starts playing now.
    fn add_audio(&self, clip: AudioClip);
}

/// Sink that discards everything; used when nothing is recording.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAudioSink;

impl AudioSink for NullAudioSink {
    fn add_audio(&self, _clip: AudioClip) {}
}
