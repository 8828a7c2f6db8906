//! Combining the video-only file and the audio track.

use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;

use tracing::debug;

use vimfu_core::{Error, Result};

/// Joins a video and an audio file into one container.
pub trait Muxer: Send + Sync {
    /// Write `output` from `video` and `audio`.
    fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<()>;
}

/// Muxing through an external `ffmpeg`: video copied, audio encoded to AAC,
/// trimmed to the shorter stream.
#[derive(Debug, Clone)]
pub struct FfmpegMuxer {
    program: String,
}

impl FfmpegMuxer {
    /// Muxer running `program` (usually `ffmpeg`).
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, video: &Path, audio: &Path, output: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(["-hide_banner", "-loglevel", "error", "-y"])
            .arg("-i")
            .arg(video)
            .arg("-i")
            .arg(audio)
            .args(["-c:v", "copy", "-c:a", "aac", "-shortest"])
            .arg(output);
        command
    }
}

impl Default for FfmpegMuxer {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl Muxer for FfmpegMuxer {
    fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<()> {
        let mut command = self.command(video, audio, output);
        debug!("Muxing: {:?}", command);

        let result = command.output().map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                Error::Mux(format!("{} was not found on PATH", self.program))
            } else {
                Error::Mux(format!("failed to run {}: {e}", self.program))
            }
        })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(Error::Mux(format!(
                "{} exited with {}: {}",
                self.program,
                result.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}
