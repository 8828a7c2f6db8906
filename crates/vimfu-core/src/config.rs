//! Configuration types for vimfu.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{Dimensions, Error};

/// Top-level configuration loaded from a YAML file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VimfuConfig {
    /// Terminal settings
    pub terminal: TerminalSettings,
    /// Frame capture settings
    pub capture: CaptureSettings,
    /// Audio/video recorder settings
    pub recorder: RecorderSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

impl VimfuConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string.
    pub fn from_yaml(yaml: &str) -> crate::Result<Self> {
        let config: VimfuConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> crate::Result<()> {
        if self.terminal.rows == 0 || self.terminal.cols == 0 {
            return Err(Error::Config("terminal dimensions must be > 0".to_string()));
        }

        if !(1..=120).contains(&self.recorder.fps) {
            return Err(Error::Config(format!(
                "recorder.fps must be within 1..=120, got {}",
                self.recorder.fps
            )));
        }

        if self.recorder.sample_rate == 0 {
            return Err(Error::Config("recorder.sample_rate must be > 0".to_string()));
        }

        if self.terminal.poll_interval_ms == 0 {
            return Err(Error::Config(
                "terminal.poll_interval_ms must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Terminal settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalSettings {
    /// Terminal rows
    pub rows: u16,
    /// Terminal columns
    pub cols: u16,
    /// TERM environment variable value
    pub term: String,
    /// Screen polling interval for pattern waits, in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for TerminalSettings {
    fn default() -> Self {
        Self {
            rows: 24,
            cols: 80,
            term: "xterm-256color".to_string(),
            poll_interval_ms: 100,
        }
    }
}

impl TerminalSettings {
    /// Configured geometry.
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.rows, self.cols)
    }

    /// Polling interval as a duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Frame capture settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Delay after a visual step before the screen is snapshotted
    pub settle_ms: u64,
    /// How long setup may take to reach the ready screen
    pub ready_timeout_ms: u64,
    /// Default timeout for `wait_for` steps without their own
    pub wait_timeout_ms: u64,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            settle_ms: 150,
            ready_timeout_ms: 10_000,
            wait_timeout_ms: 5_000,
        }
    }
}

impl CaptureSettings {
    /// Settle delay as a duration.
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// Audio/video recorder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderSettings {
    /// Target video frame rate
    pub fps: u32,
    /// Directory receiving `{title}.mp4` and its temporaries
    pub output_dir: PathBuf,
    /// Sample rate of the mixed audio track
    pub sample_rate: u32,
    /// Upper bound on waiting for the capture thread at stop
    pub join_timeout_ms: u64,
    /// ffmpeg executable used for encoding and muxing
    pub ffmpeg: String,
    /// Emit a click sound for every keys step
    pub clicks: bool,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            fps: 30,
            output_dir: PathBuf::from("."),
            sample_rate: 44_100,
            join_timeout_ms: 2_000,
            ffmpeg: "ffmpeg".to_string(),
            clicks: true,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error), overridden by `RUST_LOG`
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
