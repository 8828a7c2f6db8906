//! Audio event collection, mixing and WAV output.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use vimfu_core::{Result, Samples};

/// A clip placed on the recording timeline, already at the track rate.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioEvent {
    /// Time since recording start
    pub offset: Duration,
    /// Stereo samples at the track rate
    pub samples: Vec<[f32; 2]>,
}

/// Convert samples to stereo float at `to_rate`, picking the nearest earlier
/// source sample for each output sample.
pub fn resample(samples: &Samples, from_rate: u32, to_rate: u32) -> Vec<[f32; 2]> {
    if from_rate == 0 || to_rate == 0 {
        return Vec::new();
    }
    if from_rate == to_rate {
        return samples.to_stereo_f32();
    }

    let frames = samples.frames() as u64;
    let out_len = frames * to_rate as u64 / from_rate as u64;
    (0..out_len)
        .filter_map(|i| samples.frame((i * from_rate as u64 / to_rate as u64) as usize))
        .collect()
}

/// Number of sample frames covering `duration` at `rate`.
pub fn frames_for(duration: Duration, rate: u32) -> usize {
    (duration.as_nanos() * rate as u128 / 1_000_000_000) as usize
}

/// Mix events into one stereo track of `duration`.
///
/// Events are summed where they overlap and the result is clipped to
/// [-1, 1]. Samples past the end of the track are dropped.
pub fn render_audio_track(events: &[AudioEvent], duration: Duration, rate: u32) -> Vec<[f32; 2]> {
    let mut track = vec![[0.0f32; 2]; frames_for(duration, rate)];

    for event in events {
        let start = frames_for(event.offset, rate);
        if start >= track.len() {
            continue;
        }
        for (slot, [l, r]) in track[start..].iter_mut().zip(&event.samples) {
            slot[0] += l;
            slot[1] += r;
        }
    }

    for frame in &mut track {
        frame[0] = frame[0].clamp(-1.0, 1.0);
        frame[1] = frame[1].clamp(-1.0, 1.0);
    }
    track
}

/// Encode a stereo track as a 16-bit PCM RIFF/WAVE stream.
pub fn write_wav_to<W: Write>(writer: &mut W, track: &[[f32; 2]], rate: u32) -> Result<()> {
    const CHANNELS: u16 = 2;
    const BITS: u16 = 16;
    let block_align = CHANNELS * BITS / 8;
    let data_len = track.len() as u32 * block_align as u32;

    writer.write_all(b"RIFF")?;
    writer.write_all(&(36 + data_len).to_le_bytes())?;
    writer.write_all(b"WAVE")?;

    writer.write_all(b"fmt ")?;
    writer.write_all(&16u32.to_le_bytes())?;
    writer.write_all(&1u16.to_le_bytes())?; // PCM
    writer.write_all(&CHANNELS.to_le_bytes())?;
    writer.write_all(&rate.to_le_bytes())?;
    writer.write_all(&(rate * block_align as u32).to_le_bytes())?;
    writer.write_all(&block_align.to_le_bytes())?;
    writer.write_all(&BITS.to_le_bytes())?;

    writer.write_all(b"data")?;
    writer.write_all(&data_len.to_le_bytes())?;
    for frame in track {
        for sample in frame {
            let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
            writer.write_all(&value.to_le_bytes())?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Write a stereo track to a WAV file.
pub fn write_wav<P: AsRef<Path>>(path: P, track: &[[f32; 2]], rate: u32) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_wav_to(&mut writer, track, rate)
}
