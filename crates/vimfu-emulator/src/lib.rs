//! # vimfu-emulator
//!
//! Terminal state model and PTY hosting for vimfu.
//!
//! This crate provides:
//! - A cell grid with cursor, scroll region and alternate screen
//! - A `vte`-driven parser that applies escape sequences to the grid
//! - Copy-on-read screen snapshots with a generation counter
//! - [`PtyHost`], which runs one child process in a pseudo-terminal and
//!   keeps the grid current from a background reader thread
//!
//! ## Architecture
//!
//! This is Layer 1 in the architecture - it depends on vimfu-core and is
//! consumed by the frame encoder and the recorder.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod grid;
pub mod parser;
pub mod pty;
pub mod snapshot;
pub mod wait;

// Re-export commonly used types
pub use grid::{Cursor, Grid};
pub use parser::Parser;
pub use pty::{PtyHost, ScreenHandle};
pub use snapshot::{CursorState, ScreenSnapshot};
pub use wait::{poll_until, ScreenPattern, DEFAULT_POLL_INTERVAL};
