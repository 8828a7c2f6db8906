//! The recording state machine.
//!
//! A [`Recorder`] moves Idle -> Recording -> Finalizing -> Idle. While
//! recording, a capture thread films a [`Surface`] paced to wall-clock time
//! and any thread may hand it audio clips. `stop` renders the audio track
//! and muxes both into `{title}.mp4`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use image::RgbaImage;
use tracing::{debug, error, info, warn};

use vimfu_core::{AudioClip, AudioSink, Error, RecorderSettings, Result};

use crate::audio::{render_audio_track, resample, write_wav, AudioEvent};
use crate::mux::{FfmpegMuxer, Muxer};
use crate::pacing::FramePacer;
use crate::surface::Surface;
use crate::video::{FfmpegEncoder, VideoEncoder, VideoSink};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Where and how fast to record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecorderConfig {
    /// Output name; the video is `{title}.mp4`
    pub title: String,
    /// Video frame rate
    pub fps: u32,
    /// Directory receiving the output and its temporaries
    pub output_dir: PathBuf,
    /// Audio track sample rate
    pub sample_rate: u32,
    /// Longest wait for the capture thread at stop
    pub join_timeout: Duration,
}

impl RecorderConfig {
    /// Config with default rates.
    pub fn new(title: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self::from_settings(title, &RecorderSettings {
            output_dir: output_dir.into(),
            ..RecorderSettings::default()
        })
    }

    /// Config from the `recorder` section of a config file.
    pub fn from_settings(title: impl Into<String>, settings: &RecorderSettings) -> Self {
        Self {
            title: title.into(),
            fps: settings.fps.max(1),
            output_dir: settings.output_dir.clone(),
            sample_rate: settings.sample_rate,
            join_timeout: Duration::from_millis(settings.join_timeout_ms),
        }
    }

    /// Set the frame rate (at least 1).
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps.max(1);
        self
    }

    /// Final muxed video.
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.mp4", self.title))
    }

    /// Video-only file written during recording.
    pub fn temp_video_path(&self) -> PathBuf {
        self.output_dir.join(format!("_temp_{}.mp4", self.title))
    }

    /// Rendered audio track.
    pub fn temp_audio_path(&self) -> PathBuf {
        self.output_dir.join(format!("_temp_{}.wav", self.title))
    }
}

/// Recorder lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    /// Not recording; `stop` and `add_audio` do nothing
    Idle,
    /// Capture thread running, audio being collected
    Recording,
    /// `stop` is encoding and muxing
    Finalizing,
}

/// What the capture thread hands back when it exits.
struct CaptureOutcome {
    sink: Box<dyn VideoSink>,
    frames: u64,
    elapsed: Duration,
    error: Option<Error>,
}

struct CaptureThread {
    stop: Sender<()>,
    done: Receiver<CaptureOutcome>,
    handle: JoinHandle<()>,
}

struct Inner {
    state: RecorderState,
    started: Option<Instant>,
    events: Vec<AudioEvent>,
    capture: Option<CaptureThread>,
}

/// Screen and audio recorder.
///
/// Audio producers receive it as a `&dyn AudioSink`; clips arriving while
/// idle are dropped.
pub struct Recorder {
    config: RecorderConfig,
    video: Box<dyn VideoEncoder>,
    muxer: Box<dyn Muxer>,
    inner: Mutex<Inner>,
}

impl Recorder {
    /// Recorder encoding and muxing with `ffmpeg` from PATH.
    pub fn new(config: RecorderConfig) -> Self {
        Self {
            config,
            video: Box::new(FfmpegEncoder::default()),
            muxer: Box::new(FfmpegMuxer::default()),
            inner: Mutex::new(Inner {
                state: RecorderState::Idle,
                started: None,
                events: Vec::new(),
                capture: None,
            }),
        }
    }

    /// Recorder configured from the `recorder` section, including the
    /// `ffmpeg` program to run.
    pub fn from_settings(title: impl Into<String>, settings: &RecorderSettings) -> Self {
        Self::new(RecorderConfig::from_settings(title, settings))
            .with_video(FfmpegEncoder::new(settings.ffmpeg.clone()))
            .with_muxer(FfmpegMuxer::new(settings.ffmpeg.clone()))
    }

    /// Replace the video encoder.
    pub fn with_video(mut self, video: impl VideoEncoder + 'static) -> Self {
        self.video = Box::new(video);
        self
    }

    /// Replace the mux step.
    pub fn with_muxer(mut self, muxer: impl Muxer + 'static) -> Self {
        self.muxer = Box::new(muxer);
        self
    }

    /// Recording settings.
    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RecorderState {
        lock(&self.inner).state
    }

    /// Begin filming `surface`.
    ///
    /// Stale outputs from an earlier run with the same title are deleted
    /// first.
    pub fn start(&self, surface: Box<dyn Surface>) -> Result<()> {
        let mut inner = lock(&self.inner);
        if inner.state != RecorderState::Idle {
            return Err(Error::InvalidState(format!(
                "cannot start recording while {:?}",
                inner.state
            )));
        }

        fs::create_dir_all(&self.config.output_dir)?;
        for path in [
            self.config.output_path(),
            self.config.temp_video_path(),
            self.config.temp_audio_path(),
        ] {
            remove_if_exists(&path)?;
        }

        let (width, height) = surface.size();
        let sink = self.video.open(
            &self.config.temp_video_path(),
            width,
            height,
            self.config.fps,
        )?;

        let (stop_tx, stop_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel();
        let fps = self.config.fps;
        let started = Instant::now();
        let handle = thread::Builder::new()
            .name("vimfu-capture".to_string())
            .spawn(move || {
                let outcome = capture_loop(surface, sink, fps, started, stop_rx);
                // The recorder may have given up waiting
                let _ = done_tx.send(outcome);
            })?;

        inner.state = RecorderState::Recording;
        inner.started = Some(started);
        inner.events.clear();
        inner.capture = Some(CaptureThread {
            stop: stop_tx,
            done: done_rx,
            handle,
        });

        info!(
            "Recording {} at {} fps ({}x{})",
            self.config.title, fps, width, height
        );
        Ok(())
    }

    /// Finish the recording and return the path of the muxed video.
    ///
    /// Returns `Ok(None)` when nothing is being recorded. When the audio
    /// track cannot be written or muxed, the video is kept without audio.
    pub fn stop(&self) -> Result<Option<PathBuf>> {
        let (capture, events) = {
            let mut inner = lock(&self.inner);
            if inner.state != RecorderState::Recording {
                return Ok(None);
            }
            inner.state = RecorderState::Finalizing;
            inner.started = None;
            (inner.capture.take(), std::mem::take(&mut inner.events))
        };

        let result = match capture {
            Some(capture) => self.finalize(capture, events),
            None => Err(Error::InvalidState("capture thread missing".to_string())),
        };

        lock(&self.inner).state = RecorderState::Idle;
        result.map(Some)
    }

    fn finalize(&self, capture: CaptureThread, events: Vec<AudioEvent>) -> Result<PathBuf> {
        let elapsed = match self.close_video(capture) {
            Ok(elapsed) => elapsed,
            Err(e) => {
                self.remove_temps();
                return Err(e);
            }
        };
        info!(
            "Mixing {} audio events over {:.2}s",
            events.len(),
            elapsed.as_secs_f64()
        );

        let output = self.config.output_path();
        if let Err(e) = self.add_audio_track(&events, elapsed, &output) {
            warn!("Adding audio failed, keeping the video without audio: {e}");
            let video_path = self.config.temp_video_path();
            if let Err(e) = fs::rename(&video_path, &output) {
                error!("Video-only recording left at {}", video_path.display());
                return Err(e.into());
            }
        }

        self.remove_temps();
        info!("Recording saved to {}", output.display());
        Ok(output)
    }

    /// Stop the capture thread and close the video. Returns the recorded
    /// duration.
    fn close_video(&self, capture: CaptureThread) -> Result<Duration> {
        let CaptureThread { stop, done, handle } = capture;
        let _ = stop.send(());

        let outcome = match done.recv_timeout(self.config.join_timeout) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => {
                return Err(Error::Encoder(format!(
                    "capture thread did not stop within {} ms",
                    self.config.join_timeout.as_millis()
                )))
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(Error::Encoder("capture thread exited unexpectedly".to_string()))
            }
        };
        let _ = handle.join();

        let CaptureOutcome {
            sink,
            frames,
            elapsed,
            error,
        } = outcome;
        let finished = sink.finish();
        if let Some(e) = error {
            return Err(e);
        }
        finished?;
        debug!("Closed video after {} frames", frames);
        Ok(elapsed)
    }

    /// Render the audio track and mux it with the temp video into `output`.
    fn add_audio_track(&self, events: &[AudioEvent], elapsed: Duration, output: &Path) -> Result<()> {
        let track = render_audio_track(events, elapsed, self.config.sample_rate);
        let audio_path = self.config.temp_audio_path();
        write_wav(&audio_path, &track, self.config.sample_rate)?;
        self.muxer
            .mux(&self.config.temp_video_path(), &audio_path, output)
    }

    fn remove_temps(&self) {
        for path in [self.config.temp_video_path(), self.config.temp_audio_path()] {
            if let Err(e) = remove_if_exists(&path) {
                warn!("Failed to remove {}: {e}", path.display());
            }
        }
    }
}

impl AudioSink for Recorder {
    fn add_audio(&self, clip: AudioClip) {
        let now = Instant::now();
        let samples = resample(&clip.samples, clip.rate, self.config.sample_rate);
        if samples.is_empty() {
            debug!("Skipping empty audio clip (rate {})", clip.rate);
            return;
        }

        let mut inner = lock(&self.inner);
        if inner.state != RecorderState::Recording {
            return;
        }
        if let Some(started) = inner.started {
            let offset = now.saturating_duration_since(started);
            inner.events.push(AudioEvent { offset, samples });
        }
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        if self.state() == RecorderState::Recording {
            if let Err(e) = self.stop() {
                error!("Failed to finish recording on drop: {e}");
            }
        }
    }
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}

/// Write copies of `image` until the pacer has caught up with `elapsed`.
fn catch_up(
    sink: &mut dyn VideoSink,
    pacer: &mut FramePacer,
    image: &RgbaImage,
    elapsed: Duration,
) -> Result<()> {
    for _ in 0..pacer.due(elapsed) {
        sink.write_frame(image)?;
        pacer.record(1);
    }
    Ok(())
}

fn grab(surface: &mut dyn Surface, last: &mut Option<RgbaImage>) {
    match surface.grab() {
        Ok(image) => *last = Some(image),
        Err(e) => debug!("Frame grab failed, retrying next frame: {e}"),
    }
}

fn capture_loop(
    mut surface: Box<dyn Surface>,
    mut sink: Box<dyn VideoSink>,
    fps: u32,
    started: Instant,
    stop: Receiver<()>,
) -> CaptureOutcome {
    let mut pacer = FramePacer::new(fps);
    let mut last = None;
    let mut error = None;

    loop {
        let elapsed = started.elapsed();
        if pacer.due(elapsed) > 0 {
            grab(surface.as_mut(), &mut last);
            if let Some(image) = &last {
                if let Err(e) = catch_up(sink.as_mut(), &mut pacer, image, elapsed) {
                    error!("Video write failed, capture stopped: {e}");
                    error = Some(e);
                    break;
                }
            }
        }

        match stop.recv_timeout(pacer.until_next(started.elapsed())) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    let elapsed = started.elapsed();
    if error.is_none() {
        grab(surface.as_mut(), &mut last);
        if let Some(image) = &last {
            if let Err(e) = catch_up(sink.as_mut(), &mut pacer, image, elapsed) {
                error = Some(e);
            }
        }
    }

    CaptureOutcome {
        sink,
        frames: pacer.written(),
        elapsed,
        error,
    }
}
