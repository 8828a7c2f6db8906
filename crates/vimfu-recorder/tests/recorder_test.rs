//! Recorder lifecycle tests with in-process encoder and muxer fakes.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use image::{Rgba, RgbaImage};
use vimfu_core::{AudioClip, AudioSink, Error, Result, Samples};
use vimfu_recorder::{
    Muxer, Recorder, RecorderConfig, RecorderState, Surface, VideoEncoder, VideoSink,
};

const RATE: u32 = 1_000;

#[derive(Default)]
struct Film {
    frames: AtomicU64,
    opened: AtomicUsize,
}

struct FakeEncoder {
    film: Arc<Film>,
    fail_after: Option<u64>,
}

struct FakeSink {
    film: Arc<Film>,
    size: (u32, u32),
    fail_after: Option<u64>,
}

impl VideoEncoder for FakeEncoder {
    fn open(&self, path: &Path, width: u32, height: u32, _fps: u32) -> Result<Box<dyn VideoSink>> {
        fs::write(path, b"video-only")?;
        self.film.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSink {
            film: self.film.clone(),
            size: (width, height),
            fail_after: self.fail_after,
        }))
    }
}

impl VideoSink for FakeSink {
    fn write_frame(&mut self, frame: &RgbaImage) -> Result<()> {
        assert_eq!(frame.dimensions(), self.size);
        let written = self.film.frames.fetch_add(1, Ordering::SeqCst);
        match self.fail_after {
            Some(limit) if written >= limit => Err(Error::Encoder("disk full".to_string())),
            _ => Ok(()),
        }
    }

    fn finish(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

/// Copies the video to the output and keeps the WAV it was given.
#[derive(Default)]
struct FakeMuxer {
    wav: Arc<Mutex<Option<Vec<u8>>>>,
    fail: bool,
}

impl Muxer for FakeMuxer {
    fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<()> {
        *self.wav.lock().unwrap() = Some(fs::read(audio)?);
        if self.fail {
            return Err(Error::Mux("no aac encoder".to_string()));
        }
        fs::copy(video, output)?;
        Ok(())
    }
}

struct ColorSurface {
    grabs: u64,
    delay: Duration,
    failures: u64,
}

impl ColorSurface {
    fn new() -> Self {
        Self {
            grabs: 0,
            delay: Duration::ZERO,
            failures: 0,
        }
    }
}

impl Surface for ColorSurface {
    fn size(&self) -> (u32, u32) {
        (4, 2)
    }

    fn grab(&mut self) -> Result<RgbaImage> {
        self.grabs += 1;
        thread::sleep(self.delay);
        if self.grabs <= self.failures {
            return Err(Error::Other("window not ready".to_string()));
        }
        Ok(RgbaImage::from_pixel(4, 2, Rgba([self.grabs as u8, 0, 0, 255])))
    }
}

struct Setup {
    recorder: Recorder,
    film: Arc<Film>,
    wav: Arc<Mutex<Option<Vec<u8>>>>,
    dir: tempfile::TempDir,
}

fn setup(fps: u32, fail_mux: bool, fail_after: Option<u64>) -> Setup {
    let dir = tempfile::tempdir().unwrap();
    let film = Arc::new(Film::default());
    let muxer = FakeMuxer {
        fail: fail_mux,
        ..FakeMuxer::default()
    };
    let wav = muxer.wav.clone();

    let mut config = RecorderConfig::new("lesson", dir.path()).with_fps(fps);
    config.sample_rate = RATE;
    let recorder = Recorder::new(config)
        .with_video(FakeEncoder {
            film: film.clone(),
            fail_after,
        })
        .with_muxer(muxer);

    Setup {
        recorder,
        film,
        wav,
        dir,
    }
}

fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Stereo 16-bit samples from a WAV written by the recorder.
fn wav_samples(wav: &[u8]) -> Vec<i16> {
    wav[44..]
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect()
}

#[test]
fn test_stop_without_start_creates_nothing() {
    let s = setup(30, false, None);
    assert_eq!(s.recorder.stop().unwrap(), None);
    s.recorder.add_audio(AudioClip::click(44_100));
    assert!(entries(s.dir.path()).is_empty());
    assert_eq!(s.film.opened.load(Ordering::SeqCst), 0);
}

#[test]
fn test_recording_produces_muxed_output() {
    let s = setup(20, false, None);
    s.recorder.start(Box::new(ColorSurface::new())).unwrap();
    assert_eq!(s.recorder.state(), RecorderState::Recording);

    thread::sleep(Duration::from_millis(300));
    let output = s.recorder.stop().unwrap().unwrap();

    assert_eq!(output, s.dir.path().join("lesson.mp4"));
    assert_eq!(fs::read(&output).unwrap(), b"video-only");
    assert_eq!(entries(s.dir.path()), vec!["lesson.mp4".to_string()]);
    assert_eq!(s.recorder.state(), RecorderState::Idle);
    assert!(s.film.frames.load(Ordering::SeqCst) >= 4);
}

#[test]
fn test_start_twice_is_rejected() {
    let s = setup(10, false, None);
    s.recorder.start(Box::new(ColorSurface::new())).unwrap();
    let again = s.recorder.start(Box::new(ColorSurface::new()));
    assert!(matches!(again, Err(Error::InvalidState(_))));
    s.recorder.stop().unwrap();
}

#[test]
fn test_stale_outputs_are_replaced() {
    let s = setup(10, false, None);
    fs::write(s.dir.path().join("lesson.mp4"), b"old").unwrap();
    fs::write(s.dir.path().join("_temp_lesson.wav"), b"old").unwrap();

    s.recorder.start(Box::new(ColorSurface::new())).unwrap();
    assert!(!s.dir.path().join("lesson.mp4").exists());
    assert!(!s.dir.path().join("_temp_lesson.wav").exists());
    s.recorder.stop().unwrap();
}

#[test]
fn test_mux_failure_keeps_video_only_output() {
    let s = setup(10, true, None);
    s.recorder.start(Box::new(ColorSurface::new())).unwrap();
    thread::sleep(Duration::from_millis(150));
    let output = s.recorder.stop().unwrap().unwrap();

    assert_eq!(fs::read(output).unwrap(), b"video-only");
    assert_eq!(entries(s.dir.path()), vec!["lesson.mp4".to_string()]);
}

#[test]
fn test_unwritable_audio_keeps_video_only_output() {
    let s = setup(10, false, None);
    s.recorder.start(Box::new(ColorSurface::new())).unwrap();
    fs::create_dir(s.dir.path().join("_temp_lesson.wav")).unwrap();
    thread::sleep(Duration::from_millis(150));

    let output = s.recorder.stop().unwrap().unwrap();
    assert_eq!(output, s.dir.path().join("lesson.mp4"));
    assert_eq!(fs::read(&output).unwrap(), b"video-only");
    assert!(!s.dir.path().join("_temp_lesson.mp4").exists());
    assert!(s.wav.lock().unwrap().is_none());
    assert_eq!(s.recorder.state(), RecorderState::Idle);
}

#[test]
fn test_audio_lands_in_the_track() {
    let s = setup(10, false, None);
    s.recorder.start(Box::new(ColorSurface::new())).unwrap();
    thread::sleep(Duration::from_millis(50));
    s.recorder.add_audio(AudioClip::new(Samples::MonoI16(vec![16_384; 40]), 2 * RATE));
    thread::sleep(Duration::from_millis(200));
    s.recorder.stop().unwrap();

    let wav = s.wav.lock().unwrap().take().unwrap();
    let samples = wav_samples(&wav);
    let loud: Vec<usize> = samples
        .chunks_exact(2)
        .enumerate()
        .filter(|(_, frame)| frame[0] != 0)
        .map(|(i, _)| i)
        .collect();

    // 40 samples at twice the track rate make 20 track frames
    assert_eq!(loud.len(), 20);
    assert!(loud[0] >= 50, "clip starts at {} ms", loud[0]);
    assert!(loud.windows(2).all(|w| w[1] == w[0] + 1));
    assert!(samples.chunks_exact(2).all(|f| f[0] == f[1]));
}

#[test]
fn test_audio_after_stop_is_dropped() {
    let s = setup(10, false, None);
    s.recorder.start(Box::new(ColorSurface::new())).unwrap();
    thread::sleep(Duration::from_millis(50));
    s.recorder.stop().unwrap();
    s.recorder.add_audio(AudioClip::click(RATE));

    s.recorder.start(Box::new(ColorSurface::new())).unwrap();
    thread::sleep(Duration::from_millis(50));
    s.recorder.stop().unwrap();

    let wav = s.wav.lock().unwrap().take().unwrap();
    assert!(wav_samples(&wav).iter().all(|&v| v == 0));
}

#[test]
fn test_slow_grabs_keep_video_on_the_clock() {
    let fps = 20;
    let s = setup(fps, false, None);
    let surface = ColorSurface {
        delay: Duration::from_millis(120),
        ..ColorSurface::new()
    };
    s.recorder.start(Box::new(surface)).unwrap();
    thread::sleep(Duration::from_millis(1_000));
    s.recorder.stop().unwrap();

    // One track frame per millisecond gives the recorded duration
    let wav = s.wav.lock().unwrap().take().unwrap();
    let elapsed_ms = (wav.len() as u64 - 44) / 4;
    let expected = elapsed_ms * fps as u64 / 1_000;
    let written = s.film.frames.load(Ordering::SeqCst);
    assert!(
        written.abs_diff(expected) <= 2,
        "wrote {written} frames, expected {expected}"
    );
}

#[test]
fn test_grab_failures_are_retried() {
    let s = setup(20, false, None);
    let surface = ColorSurface {
        failures: 3,
        ..ColorSurface::new()
    };
    s.recorder.start(Box::new(surface)).unwrap();
    thread::sleep(Duration::from_millis(400));
    s.recorder.stop().unwrap();
    assert!(s.film.frames.load(Ordering::SeqCst) > 0);
}

#[test]
fn test_write_failure_fails_stop_and_cleans_up() {
    let s = setup(20, false, Some(2));
    s.recorder.start(Box::new(ColorSurface::new())).unwrap();
    thread::sleep(Duration::from_millis(300));

    let result = s.recorder.stop();
    assert!(matches!(result, Err(Error::Encoder(_))));
    assert_eq!(s.recorder.state(), RecorderState::Idle);
    assert!(entries(s.dir.path()).is_empty());
}
