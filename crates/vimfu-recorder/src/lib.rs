//! # vimfu-recorder
//!
//! Real-time screen recording with a mixed audio track.
//!
//! - [`Recorder`] films a [`Surface`] on its own thread, paced to wall-clock
//!   time by [`FramePacer`], and collects audio clips as an
//!   [`AudioSink`](vimfu_core::AudioSink)
//! - [`TerminalSurface`] renders a terminal screen to pixels
//! - [`render_audio_track`] mixes collected clips; [`write_wav`] stores them
//! - [`VideoEncoder`] and [`Muxer`] wrap the external encoder
//!
//! ## Architecture
//!
//! Layer 2: depends on `vimfu-core` and `vimfu-emulator`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod audio;
pub mod mux;
pub mod pacing;
pub mod recorder;
pub mod surface;
pub mod video;

pub use audio::{frames_for, render_audio_track, resample, write_wav, write_wav_to, AudioEvent};
pub use mux::{FfmpegMuxer, Muxer};
pub use pacing::FramePacer;
pub use recorder::{Recorder, RecorderConfig, RecorderState};
pub use surface::{render_snapshot, Surface, TerminalSurface, CELL_HEIGHT, CELL_WIDTH};
pub use video::{FfmpegEncoder, FfmpegVideoSink, VideoEncoder, VideoSink};
