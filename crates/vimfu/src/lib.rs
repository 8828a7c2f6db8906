//! vimfu command-line library.
//!
//! The binary in main.rs parses arguments with [`Cli`] and dispatches to
//! `vimfu-frames` for capture and [`record_lesson`] for video.

pub mod cli;
pub mod record;

pub use cli::{file_title, CaptureArgs, Cli, Command, RecordArgs};
pub use record::{record_lesson, record_with};
