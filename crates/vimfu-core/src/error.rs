//! Error types for vimfu.

use thiserror::Error;

/// Main error type for vimfu operations.
#[derive(Debug, Error)]
pub enum Error {
    /// PTY-related errors (open, spawn, read, write)
    #[error("PTY error: {0}")]
    PtyError(String),

    /// Timeout waiting for a screen condition
    #[error("Timeout waiting for condition after {0}ms")]
    WaitTimeout(u64),

    /// Invalid key notation
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Invalid terminal dimensions
    #[error("Invalid dimensions: {rows}x{cols}")]
    InvalidDimensions {
        /// Number of rows
        rows: u16,
        /// Number of columns
        cols: u16,
    },

    /// Operation not valid in the current lifecycle state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A lesson step failed during capture; the whole capture is void
    #[error("Capture aborted at step {index} ({kind}): {source}")]
    Capture {
        /// Index of the failing step among the captured steps
        index: usize,
        /// Step kind, e.g. `keys`
        kind: String,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },

    /// Video encoder failure
    #[error("Encoder error: {0}")]
    Encoder(String),

    /// Audio/video mux failure
    #[error("Mux error: {0}")]
    Mux(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parse errors (config and lesson files)
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input or parameters (generic)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error with custom message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Wrap a step failure with the step's position and kind.
    pub fn capture(index: usize, kind: impl Into<String>, source: Error) -> Self {
        Error::Capture {
            index,
            kind: kind.into(),
            source: Box::new(source),
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
