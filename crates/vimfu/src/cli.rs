//! Command-line interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use vimfu_core::{Result, VimfuConfig};
use vimfu_frames::Lesson;

/// Capture and record terminal lessons.
#[derive(Debug, Parser)]
#[command(name = "vimfu", version, about)]
pub struct Cli {
    /// YAML config file
    #[arg(long, global = true, env = "VIMFU_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// What to do.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Play a lesson and write its frame document
    Capture(CaptureArgs),
    /// Play a lesson while recording video with audio
    Record(RecordArgs),
    /// Print the JSON Schema of frame documents
    Schema,
}

/// Arguments of `vimfu capture`.
#[derive(Debug, Args)]
pub struct CaptureArgs {
    /// Lesson file
    pub lesson: PathBuf,

    /// Output file, stdout when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments of `vimfu record`.
#[derive(Debug, Args)]
pub struct RecordArgs {
    /// Lesson file
    pub lesson: PathBuf,

    /// Output name, defaults to the lesson title
    #[arg(long)]
    pub title: Option<String>,

    /// Output directory
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Video frame rate
    #[arg(long)]
    pub fps: Option<u32>,

    /// Leave out keystroke clicks
    #[arg(long)]
    pub no_clicks: bool,
}

impl Cli {
    /// Config from `--config`, or defaults.
    pub fn load_config(&self) -> Result<VimfuConfig> {
        match &self.config {
            Some(path) => VimfuConfig::from_file(path),
            None => Ok(VimfuConfig::default()),
        }
    }
}

impl RecordArgs {
    /// Apply command-line overrides on top of the config file.
    pub fn apply(&self, config: &mut VimfuConfig) -> Result<()> {
        if let Some(dir) = &self.out_dir {
            config.recorder.output_dir = dir.clone();
        }
        if let Some(fps) = self.fps {
            config.recorder.fps = fps;
        }
        if self.no_clicks {
            config.recorder.clicks = false;
        }
        config.validate()
    }

    /// Output name for `lesson`, safe to use as a file name.
    pub fn title(&self, lesson: &Lesson) -> String {
        file_title(self.title.as_deref().unwrap_or(&lesson.title))
    }
}

/// Replace characters that do not belong in a file name.
pub fn file_title(title: &str) -> String {
    let cleaned: String = title
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "recording".to_string()
    } else {
        cleaned
    }
}
