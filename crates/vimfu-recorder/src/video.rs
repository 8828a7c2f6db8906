//! Streaming video output.
//!
//! Frames are written by the capture thread only. The default encoder pipes
//! raw RGBA frames into an `ffmpeg` child process.

use std::io::{ErrorKind, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};

use image::RgbaImage;
use tracing::debug;

use vimfu_core::{Error, Result};

/// Open video being written frame by frame.
pub trait VideoSink: Send {
    /// Append one frame. Every frame must have the size the sink was opened with.
    fn write_frame(&mut self, frame: &RgbaImage) -> Result<()>;

    /// Flush and close the container.
    fn finish(self: Box<Self>) -> Result<()>;
}

/// Opens video sinks; the recorder's seam for swapping encoders.
pub trait VideoEncoder: Send + Sync {
    /// Start a video of `width`x`height` pixels at `fps` frames per second.
    fn open(&self, path: &Path, width: u32, height: u32, fps: u32) -> Result<Box<dyn VideoSink>>;
}

/// H.264 encoding through an external `ffmpeg`.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    program: String,
}

impl FfmpegEncoder {
    /// Encoder running `program` (usually `ffmpeg`).
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl VideoEncoder for FfmpegEncoder {
    fn open(&self, path: &Path, width: u32, height: u32, fps: u32) -> Result<Box<dyn VideoSink>> {
        let mut command = Command::new(&self.program);
        command
            .args(["-hide_banner", "-loglevel", "error", "-y"])
            .args(["-f", "rawvideo", "-pix_fmt", "rgba"])
            .arg("-s:v")
            .arg(format!("{width}x{height}"))
            .arg("-r")
            .arg(fps.to_string())
            .args(["-i", "-", "-an"])
            .args(["-c:v", "libx264", "-pix_fmt", "yuv420p"])
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit());

        debug!("Starting video encoder: {:?}", command);
        let mut child = command.spawn().map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                Error::Encoder(format!("{} was not found on PATH", self.program))
            } else {
                Error::Encoder(format!("failed to start {}: {e}", self.program))
            }
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Encoder("encoder stdin unavailable".to_string()))?;

        Ok(Box::new(FfmpegVideoSink {
            child,
            stdin,
            width,
            height,
        }))
    }
}

/// Raw frames streamed to a running `ffmpeg`.
#[derive(Debug)]
pub struct FfmpegVideoSink {
    child: Child,
    stdin: ChildStdin,
    width: u32,
    height: u32,
}

impl VideoSink for FfmpegVideoSink {
    fn write_frame(&mut self, frame: &RgbaImage) -> Result<()> {
        if frame.dimensions() != (self.width, self.height) {
            return Err(Error::Encoder(format!(
                "frame is {}x{}, video is {}x{}",
                frame.width(),
                frame.height(),
                self.width,
                self.height
            )));
        }
        self.stdin
            .write_all(frame.as_raw())
            .map_err(|e| Error::Encoder(format!("failed to write frame: {e}")))
    }

    fn finish(self: Box<Self>) -> Result<()> {
        let FfmpegVideoSink {
            mut child,
            mut stdin,
            ..
        } = *self;
        stdin.flush()?;
        drop(stdin);

        let status = child.wait()?;
        if !status.success() {
            return Err(Error::Encoder(format!("encoder exited with {status}")));
        }
        Ok(())
    }
}
