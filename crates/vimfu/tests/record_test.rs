//! The record flow against an in-memory terminal, encoder and muxer.

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::RgbaImage;
use vimfu::record_with;
use vimfu_core::{keys_to_bytes, Dimensions, Error, Result};
use vimfu_emulator::{poll_until, ScreenHandle, ScreenPattern, ScreenSnapshot};
use vimfu_frames::{Lesson, StepContext, StepOptions};
use vimfu_recorder::{
    Muxer, Recorder, RecorderConfig, RecorderState, TerminalSurface, VideoEncoder, VideoSink,
};

/// Echoes input straight back onto a screen.
struct EchoScreen {
    screen: ScreenHandle,
}

impl StepContext for EchoScreen {
    fn send_notation(&self, notation: &str) -> Result<()> {
        self.screen.feed(&keys_to_bytes(notation)?);
        Ok(())
    }

    fn send_text(&self, text: &str) -> Result<()> {
        self.screen.feed(text.as_bytes());
        Ok(())
    }

    fn snapshot(&self) -> ScreenSnapshot {
        self.screen.snapshot()
    }

    fn wait_for(&self, pattern: &str, timeout: Duration) -> bool {
        let pattern = ScreenPattern::new(pattern);
        poll_until(timeout, Duration::from_millis(1), || {
            pattern.is_match(&self.screen.snapshot().text())
        })
    }

    fn resize(&self, dimensions: Dimensions) -> Result<()> {
        dimensions.validate().map(|_| ())
    }
}

struct FileEncoder;

struct NullSink;

impl VideoEncoder for FileEncoder {
    fn open(&self, path: &Path, _width: u32, _height: u32, _fps: u32) -> Result<Box<dyn VideoSink>> {
        fs::write(path, b"video-only")?;
        Ok(Box::new(NullSink))
    }
}

impl VideoSink for NullSink {
    fn write_frame(&mut self, _frame: &RgbaImage) -> Result<()> {
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

#[derive(Default)]
struct CopyMuxer {
    wav: Arc<Mutex<Option<Vec<u8>>>>,
}

impl Muxer for CopyMuxer {
    fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<()> {
        *self.wav.lock().unwrap() = Some(fs::read(audio)?);
        fs::copy(video, output)?;
        Ok(())
    }
}

struct Session {
    terminal: EchoScreen,
    recorder: Recorder,
    wav: Arc<Mutex<Option<Vec<u8>>>>,
    dir: tempfile::TempDir,
}

fn session() -> Session {
    let dir = tempfile::tempdir().unwrap();
    let muxer = CopyMuxer::default();
    let wav = muxer.wav.clone();
    let recorder = Recorder::new(RecorderConfig::new("lesson", dir.path()).with_fps(20))
        .with_video(FileEncoder)
        .with_muxer(muxer);
    Session {
        terminal: EchoScreen {
            screen: ScreenHandle::new(Dimensions::new(2, 20)),
        },
        recorder,
        wav,
        dir,
    }
}

fn options() -> StepOptions {
    StepOptions {
        settle: Duration::ZERO,
        ready_timeout: Duration::from_millis(100),
        wait_timeout: Duration::from_millis(100),
        clicks: true,
        click_rate: 44_100,
    }
}

fn record(s: &Session, yaml: &str) -> Result<Option<std::path::PathBuf>> {
    let lesson = Lesson::from_yaml(yaml).unwrap();
    let surface = TerminalSurface::new(s.terminal.screen.clone());
    record_with(&s.terminal, &s.recorder, Box::new(surface), &lesson, &options())
}

#[test]
fn test_lesson_is_recorded_with_clicks() {
    let s = session();
    let output = record(
        &s,
        r#"
title: Echo
command: cat
setup:
  - type: type
    text: "$ "
steps:
  - type: keys
    keys: abc
  - type: wait
    ms: 150
teardown:
  - type: type
    text: "!"
"#,
    )
    .unwrap()
    .unwrap();

    assert_eq!(output, s.dir.path().join("lesson.mp4"));
    assert_eq!(fs::read(&output).unwrap(), b"video-only");
    assert!(!s.dir.path().join("_temp_lesson.wav").exists());
    assert_eq!(s.recorder.state(), RecorderState::Idle);
    assert_eq!(s.terminal.screen.snapshot().lines()[0], "$ abc!");

    let wav = s.wav.lock().unwrap().take().unwrap();
    assert!(wav[44..].iter().any(|&b| b != 0), "click missing from the track");
}

#[test]
fn test_failing_step_still_finalizes_the_video() {
    let s = session();
    let result = record(
        &s,
        r#"
title: Broken
command: cat
steps:
  - type: keys
    keys: abc
  - type: wait_for
    pattern: never shown
    timeout_ms: 20
teardown:
  - type: type
    text: "!"
"#,
    );

    match result {
        Err(Error::Capture { index, kind, .. }) => {
            assert_eq!(index, 1);
            assert_eq!(kind, "wait_for");
        }
        other => panic!("unexpected result {other:?}"),
    }
    assert_eq!(s.recorder.state(), RecorderState::Idle);
    assert!(s.dir.path().join("lesson.mp4").exists());
    assert!(!s.dir.path().join("_temp_lesson.mp4").exists());
    // Teardown ran after the recorder stopped
    assert_eq!(s.terminal.screen.snapshot().lines()[0], "abc!");
}

#[test]
fn test_setup_failure_records_nothing() {
    let s = session();
    let result = record(
        &s,
        r#"
title: Never ready
command: cat
setup:
  - type: wait_for
    pattern: never shown
    timeout_ms: 10
steps:
  - type: keys
    keys: x
"#,
    );

    assert!(matches!(result, Err(Error::Capture { .. })));
    assert_eq!(s.recorder.state(), RecorderState::Idle);
    assert_eq!(fs::read_dir(s.dir.path()).unwrap().count(), 0);
}
