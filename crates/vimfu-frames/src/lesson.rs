//! Lesson files and their steps.
//!
//! A lesson is a YAML document naming the program to run and the steps that
//! drive it:
//!
//! ```yaml
//! title: Deleting lines
//! command: vim -u NONE demo.txt
//! ready:
//!   pattern: demo.txt
//! steps:
//!   - type: say
//!     text: dd deletes the current line
//!   - type: keys
//!     keys: dd
//!   - type: wait_for
//!     pattern: fewer lines
//! teardown:
//!   - type: keys
//!     keys: ":q!<CR>"
//! ```

use std::path::Path;
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use vimfu_core::{Dimensions, Error, Result};

/// One lesson step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Step {
    /// Narration attached to the next captured frame
    Say {
        /// Spoken text
        text: String,
    },
    /// Author note, ignored when running
    Comment {
        /// Note text
        text: String,
    },
    /// Overlay attached to the next captured frame
    Overlay {
        /// Overlay text
        text: String,
        /// Optional caption
        #[serde(default)]
        caption: Option<String>,
    },
    /// Pause
    Wait {
        /// Pause length in milliseconds
        ms: u64,
    },
    /// Send keys in vim notation
    Keys {
        /// Keys, e.g. `dd` or `:wq<CR>`
        keys: String,
        /// Badge text, defaults to the keys
        #[serde(default)]
        overlay: Option<String>,
        /// Caption under the badge
        #[serde(default)]
        caption: Option<String>,
    },
    /// Type literal text, optionally one character at a time
    Type {
        /// Text sent verbatim
        text: String,
        /// Delay between characters in milliseconds
        #[serde(default)]
        delay_ms: Option<u64>,
    },
    /// Block until a pattern is on screen
    WaitFor {
        /// Regex (or literal text) to look for
        pattern: String,
        /// Timeout in milliseconds, defaults to the capture setting
        #[serde(default)]
        timeout_ms: Option<u64>,
    },
    /// Change the terminal size
    Resize {
        /// New rows
        rows: u16,
        /// New columns
        cols: u16,
    },
    /// Run one of two branches depending on the current screen
    When {
        /// Regex (or literal text) checked once
        pattern: String,
        /// Steps run when the pattern is on screen
        #[serde(default)]
        then: Vec<Step>,
        /// Steps run otherwise
        #[serde(default, rename = "else")]
        otherwise: Vec<Step>,
    },
}

impl Step {
    /// Whether the step changes what is on screen, and so gets a frame.
    pub fn is_visual(&self) -> bool {
        match self {
            Step::Say { .. } | Step::Comment { .. } | Step::Overlay { .. } | Step::Wait { .. } => {
                false
            }
            Step::Keys { .. }
            | Step::Type { .. }
            | Step::WaitFor { .. }
            | Step::Resize { .. }
            | Step::When { .. } => true,
        }
    }

    /// Step kind as written in the lesson file.
    pub fn kind(&self) -> &'static str {
        match self {
            Step::Say { .. } => "say",
            Step::Comment { .. } => "comment",
            Step::Overlay { .. } => "overlay",
            Step::Wait { .. } => "wait",
            Step::Keys { .. } => "keys",
            Step::Type { .. } => "type",
            Step::WaitFor { .. } => "wait_for",
            Step::Resize { .. } => "resize",
            Step::When { .. } => "when",
        }
    }

    /// Short human-readable description.
    pub fn detail(&self) -> String {
        match self {
            Step::Say { text } | Step::Comment { text } | Step::Overlay { text, .. } => {
                text.clone()
            }
            Step::Wait { ms } => format!("{ms}ms"),
            Step::Keys { keys, .. } => keys.clone(),
            Step::Type { text, .. } => text.clone(),
            Step::WaitFor { pattern, .. } => pattern.clone(),
            Step::Resize { rows, cols } => format!("{rows}x{cols}"),
            Step::When { pattern, .. } => format!("when /{pattern}/"),
        }
    }
}

/// Screen that means the program is ready for the first step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReadySpec {
    /// Regex (or literal text) to wait for
    pub pattern: String,
    /// Timeout in milliseconds, defaults to the capture setting
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

/// A lesson file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Lesson {
    /// Title, used for output names
    pub title: String,
    /// Free-form origin of the lesson, copied into the document
    #[serde(default)]
    pub source: String,
    /// Shell command started in the terminal
    pub command: String,
    /// Rows, defaults to the terminal setting
    #[serde(default)]
    pub rows: Option<u16>,
    /// Columns, defaults to the terminal setting
    #[serde(default)]
    pub cols: Option<u16>,
    /// Screen to wait for after setup
    #[serde(default)]
    pub ready: Option<ReadySpec>,
    /// Steps run before capture starts
    #[serde(default)]
    pub setup: Vec<Step>,
    /// Captured steps
    pub steps: Vec<Step>,
    /// Steps run after capture ends
    #[serde(default)]
    pub teardown: Vec<Step>,
}

impl Lesson {
    /// Parse a lesson from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let lesson: Lesson = serde_yaml::from_str(yaml)?;
        if lesson.command.trim().is_empty() {
            return Err(Error::InvalidInput("lesson command is empty".to_string()));
        }
        Ok(lesson)
    }

    /// Load a lesson file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_yaml(&std::fs::read_to_string(path)?)
    }

    /// Geometry, with missing values taken from `fallback`.
    pub fn dimensions(&self, fallback: Dimensions) -> Dimensions {
        Dimensions::new(
            self.rows.unwrap_or(fallback.rows),
            self.cols.unwrap_or(fallback.cols),
        )
    }

    /// Ready timeout, or `fallback` when the lesson has none.
    pub fn ready_timeout(&self, fallback: Duration) -> Duration {
        self.ready
            .as_ref()
            .and_then(|ready| ready.timeout_ms)
            .map(Duration::from_millis)
            .unwrap_or(fallback)
    }
}
