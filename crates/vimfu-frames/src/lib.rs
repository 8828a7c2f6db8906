//! # vimfu-frames
//!
//! Frame encoding and lesson capture.
//!
//! - [`capture_frame`] turns a screen snapshot into a run-length [`Frame`]
//! - [`SessionDocument`] collects timestamped, action-tagged frames and
//!   deduplicates them
//! - [`Lesson`] and [`Step`] describe what to type and when
//! - [`capture_lesson`] drives a lesson through a PTY host and returns the
//!   finished document
//!
//! ## Architecture
//!
//! Layer 2: depends on `vimfu-core` and `vimfu-emulator`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod capture;
pub mod frame;
pub mod lesson;
pub mod session;

pub use capture::{
    capture_lesson, capture_with, execute_step, finish, play_steps, prepare, StepContext,
    StepOptions,
};
pub use frame::{capture_frame, Frame, Line, Run};
pub use lesson::{Lesson, ReadySpec, Step};
pub use session::{document_schema, ActionDescriptor, SessionDocument, TimedFrame, FORMAT, VERSION};
