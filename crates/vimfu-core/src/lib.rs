//! # vimfu-core
//!
//! Core types for the vimfu capture and recording layer.
//!
//! This crate contains all fundamental types with **no internal dependencies**
//! on other vimfu crates. It provides:
//!
//! - Geometry types (Position, Bounds, Dimensions)
//! - Cell and source color types for the terminal grid
//! - Canonical color normalization shared by frame capture and pixel rendering
//! - Vim-style key notation
//! - Audio clips and the sink that collects them
//! - Configuration and error types
//!
//! ## Architecture
//!
//! This is Layer 0 in the architecture - all other crates depend on this one,
//! but this crate has no dependencies on other vimfu crates.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod audio;
pub mod cell;
pub mod color;
pub mod config;
pub mod error;
pub mod geometry;
pub mod key;

// Re-export commonly used types
pub use audio::{AudioClip, AudioSink, NullAudioSink, Samples};
pub use cell::{Cell, CellAttributes, CellStyle, Color};
pub use color::{resolve_color, Rgb, DEFAULT_BG, DEFAULT_FG};
pub use config::{
    CaptureSettings, LoggingSettings, RecorderSettings, TerminalSettings, VimfuConfig,
};
pub use error::{Error, Result};
pub use geometry::{Bounds, Dimensions, Position};
pub use key::{keys_to_bytes, parse_keys, Key};
