//! Session documents: timestamped, action-tagged frames.

use std::path::Path;

use schemars::{JsonSchema, Schema};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use vimfu_core::{Error, Result, Rgb, DEFAULT_BG, DEFAULT_FG};

use crate::frame::Frame;

/// Value of the `format` field.
pub const FORMAT: &str = "vimfu-frames";

/// Value of the `version` field.
pub const VERSION: u32 = 1;

/// What produced a frame, plus narration and overlays to show with it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActionDescriptor {
    /// Step kind, e.g. `keys`
    #[serde(rename = "type")]
    pub kind: String,
    /// Human-readable description of the step
    pub detail: String,
    /// Narration spoken before this frame
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub say: Option<String>,
    /// Overlay text shown with this frame
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay: Option<String>,
    /// Caption under the overlay
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay_caption: Option<String>,
    /// Keystroke badge shown by animated renderers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_overlay: Option<String>,
    /// Caption under the keystroke badge
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_caption: Option<String>,
}

impl ActionDescriptor {
    /// Descriptor with only the kind and detail set.
    pub fn new(kind: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            detail: detail.into(),
            ..Default::default()
        }
    }
}

/// A frame with its timestamp and action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TimedFrame {
    /// Encoded screen
    #[serde(flatten)]
    pub frame: Frame,
    /// Milliseconds since capture started
    pub ms: u64,
    /// Step that produced the frame
    pub action: ActionDescriptor,
}

/// Ordered frames of one captured lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionDocument {
    /// Always `vimfu-frames`
    pub format: String,
    /// Document version
    pub version: u32,
    /// Lesson title
    pub title: String,
    /// Where the lesson came from
    pub source: String,
    /// Rows at the start of the capture
    pub rows: u16,
    /// Columns at the start of the capture
    pub cols: u16,
    /// Default foreground color
    pub default_fg: Rgb,
    /// Default background color
    pub default_bg: Rgb,
    /// Number of entries in `frames`
    pub frame_count: usize,
    /// Frames in capture order
    pub frames: Vec<TimedFrame>,
}

impl SessionDocument {
    /// Empty document.
    pub fn new(title: impl Into<String>, source: impl Into<String>, rows: u16, cols: u16) -> Self {
        Self {
            format: FORMAT.to_string(),
            version: VERSION,
            title: title.into(),
            source: source.into(),
            rows,
            cols,
            default_fg: DEFAULT_FG,
            default_bg: DEFAULT_BG,
            frame_count: 0,
            frames: Vec::new(),
        }
    }

    /// Append a frame.
    ///
    /// Timestamps never go backwards: an `ms` earlier than the last frame's
    /// is raised to it.
    pub fn push(&mut self, frame: Frame, ms: u64, action: ActionDescriptor) {
        let ms = match self.frames.last() {
            Some(last) if ms < last.ms => last.ms,
            _ => ms,
        };
        self.frames.push(TimedFrame { frame, ms, action });
        self.frame_count = self.frames.len();
    }

    /// Frames in order.
    pub fn frames(&self) -> &[TimedFrame] {
        &self.frames
    }

    /// Number of frames.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Collapse runs of frames showing the same screen.
    ///
    /// When a frame matches the previously kept one (same text, same
    /// cursor), it is dropped but its action replaces the kept frame's
    /// action. The kept frame keeps its own screen and `ms`. Returns the
    /// number of frames removed.
    pub fn dedup(&mut self) -> usize {
        let before = self.frames.len();
        let mut kept: Vec<TimedFrame> = Vec::with_capacity(before);

        for timed in self.frames.drain(..) {
            match kept.last_mut() {
                Some(previous) if previous.frame.same_screen(&timed.frame) => {
                    previous.action = timed.action;
                }
                _ => kept.push(timed),
            }
        }

        self.frames = kept;
        self.frame_count = self.frames.len();
        let removed = before - self.frame_count;
        if removed > 0 {
            debug!("Dedup removed {} of {} frames", removed, before);
        }
        removed
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and check a document.
    pub fn from_json(json: &str) -> Result<Self> {
        let document: SessionDocument = serde_json::from_str(json)?;
        document.validate()?;
        Ok(document)
    }

    /// Write the document as JSON.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?)?;
        info!("Wrote {} frames to {}", self.frame_count, path.display());
        Ok(())
    }

    /// Read a document written by [`SessionDocument::write_to_file`].
    pub fn read_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    fn validate(&self) -> Result<()> {
        if self.format != FORMAT {
            return Err(Error::InvalidInput(format!(
                "unknown document format '{}'",
                self.format
            )));
        }
        if self.version != VERSION {
            return Err(Error::InvalidInput(format!(
                "unsupported document version {}",
                self.version
            )));
        }
        if self.frame_count != self.frames.len() {
            return Err(Error::InvalidInput(format!(
                "frameCount is {} but {} frames are present",
                self.frame_count,
                self.frames.len()
            )));
        }
        if self.frames.windows(2).any(|pair| pair[1].ms < pair[0].ms) {
            return Err(Error::InvalidInput(
                "frame timestamps go backwards".to_string(),
            ));
        }
        Ok(())
    }
}

/// JSON Schema of [`SessionDocument`].
pub fn document_schema() -> Schema {
    schemars::schema_for!(SessionDocument)
}
