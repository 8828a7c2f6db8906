//! Lesson execution and frame capture.
//!
//! Steps run against a [`StepContext`], which [`PtyHost`] implements. Frame
//! capture and live playback share the same step semantics; they differ only
//! in what happens after each visual step.

use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use vimfu_core::{AudioClip, AudioSink, Dimensions, Error, NullAudioSink, Result, VimfuConfig};
use vimfu_emulator::{PtyHost, ScreenPattern, ScreenSnapshot};

use crate::frame::capture_frame;
use crate::lesson::{Lesson, Step};
use crate::session::{ActionDescriptor, SessionDocument};

/// What a step needs from the terminal it drives.
pub trait StepContext {
    /// Send keys written in vim notation.
    fn send_notation(&self, notation: &str) -> Result<()>;

    /// Send text verbatim.
    fn send_text(&self, text: &str) -> Result<()>;

    /// Copy of the current screen.
    fn snapshot(&self) -> ScreenSnapshot;

    /// Block until `pattern` is on screen or `timeout` passes.
    fn wait_for(&self, pattern: &str, timeout: Duration) -> bool;

    /// Change the terminal size.
    fn resize(&self, dimensions: Dimensions) -> Result<()>;

    /// Screen lines with trailing whitespace removed.
    fn screen(&self) -> Vec<String> {
        self.snapshot().lines()
    }
}

impl StepContext for PtyHost {
    fn send_notation(&self, notation: &str) -> Result<()> {
        self.send_key_notation(notation)
    }

    fn send_text(&self, text: &str) -> Result<()> {
        self.send_keys(text)
    }

    fn snapshot(&self) -> ScreenSnapshot {
        PtyHost::snapshot(self)
    }

    fn wait_for(&self, pattern: &str, timeout: Duration) -> bool {
        PtyHost::wait_for(self, pattern, timeout)
    }

    fn resize(&self, dimensions: Dimensions) -> Result<()> {
        PtyHost::resize(self, dimensions)
    }
}

/// Timing and sound options for running steps.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOptions {
    /// Pause after each visual step before the screen is read
    pub settle: Duration,
    /// Default timeout for the lesson's ready pattern
    pub ready_timeout: Duration,
    /// Default timeout for `wait_for` steps
    pub wait_timeout: Duration,
    /// Emit a click for keystrokes
    pub clicks: bool,
    /// Sample rate of generated clicks
    pub click_rate: u32,
}

impl StepOptions {
    /// Options from the loaded configuration.
    pub fn from_config(config: &VimfuConfig) -> Self {
        Self {
            settle: config.capture.settle(),
            ready_timeout: Duration::from_millis(config.capture.ready_timeout_ms),
            wait_timeout: Duration::from_millis(config.capture.wait_timeout_ms),
            clicks: config.recorder.clicks,
            click_rate: config.recorder.sample_rate,
        }
    }

    fn click(&self, audio: &dyn AudioSink) {
        if self.clicks {
            audio.add_audio(AudioClip::click(self.click_rate));
        }
    }
}

impl Default for StepOptions {
    fn default() -> Self {
        Self::from_config(&VimfuConfig::default())
    }
}

/// Run one step.
///
/// `when` steps check the screen once and run the chosen branch in place.
pub fn execute_step(
    ctx: &dyn StepContext,
    step: &Step,
    options: &StepOptions,
    audio: &dyn AudioSink,
) -> Result<()> {
    match step {
        Step::Say { text } => debug!("Narration: {}", text),
        Step::Comment { .. } | Step::Overlay { .. } => {}
        Step::Wait { ms } => thread::sleep(Duration::from_millis(*ms)),
        Step::Keys { keys, .. } => {
            options.click(audio);
            ctx.send_notation(keys)?;
        }
        Step::Type { text, delay_ms } => match delay_ms.filter(|&ms| ms > 0) {
            None => {
                options.click(audio);
                ctx.send_text(text)?;
            }
            Some(ms) => {
                let mut buf = [0u8; 4];
                for (i, c) in text.chars().enumerate() {
                    if i > 0 {
                        thread::sleep(Duration::from_millis(ms));
                    }
                    options.click(audio);
                    ctx.send_text(c.encode_utf8(&mut buf))?;
                }
            }
        },
        Step::WaitFor {
            pattern,
            timeout_ms,
        } => {
            let timeout = timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(options.wait_timeout);
            if !ctx.wait_for(pattern, timeout) {
                return Err(Error::WaitTimeout(timeout.as_millis() as u64));
            }
        }
        Step::Resize { rows, cols } => ctx.resize(Dimensions::new(*rows, *cols))?,
        Step::When {
            pattern,
            then,
            otherwise,
        } => {
            let matched = ScreenPattern::new(pattern).matches_lines(&ctx.screen());
            debug!("when /{}/ matched: {}", pattern, matched);
            let branch = if matched { then } else { otherwise };
            for step in branch {
                execute_step(ctx, step, options, audio)?;
            }
        }
    }
    Ok(())
}

/// Narration and overlays waiting for the next frame.
#[derive(Debug, Default)]
struct Pending {
    say: Option<String>,
    overlay: Option<String>,
    overlay_caption: Option<String>,
}

impl Pending {
    fn note(&mut self, step: &Step) {
        match step {
            Step::Say { text } => {
                self.say = Some(match self.say.take() {
                    Some(earlier) => format!("{earlier} {text}"),
                    None => text.clone(),
                });
            }
            Step::Overlay { text, caption } => {
                self.overlay = Some(text.clone());
                self.overlay_caption = caption.clone();
            }
            _ => {}
        }
    }

    fn describe(&mut self, step: &Step) -> ActionDescriptor {
        let mut action = ActionDescriptor::new(step.kind(), step.detail());
        action.say = self.say.take();
        action.overlay = self.overlay.take();
        action.overlay_caption = self.overlay_caption.take();
        if let Step::Keys {
            keys,
            overlay,
            caption,
        } = step
        {
            action.key_overlay = Some(overlay.clone().unwrap_or_else(|| keys.clone()));
            action.key_caption = caption.clone();
        }
        action
    }
}

/// Run setup steps and wait for the ready screen.
///
/// Setup makes no sound and takes no frames. A ready pattern that never
/// shows up is fatal.
pub fn prepare(ctx: &dyn StepContext, lesson: &Lesson, options: &StepOptions) -> Result<()> {
    for (index, step) in lesson.setup.iter().enumerate() {
        execute_step(ctx, step, options, &NullAudioSink)
            .map_err(|e| Error::capture(index, format!("setup {}", step.kind()), e))?;
    }

    if let Some(ready) = &lesson.ready {
        let timeout = lesson.ready_timeout(options.ready_timeout);
        if !ctx.wait_for(&ready.pattern, timeout) {
            return Err(Error::WaitTimeout(timeout.as_millis() as u64));
        }
        debug!("Ready pattern {:?} found", ready.pattern);
    }
    Ok(())
}

/// Run teardown steps. Failures are logged; capture has already finished.
pub fn finish(ctx: &dyn StepContext, lesson: &Lesson, options: &StepOptions) {
    for step in &lesson.teardown {
        if let Err(e) = execute_step(ctx, step, options, &NullAudioSink) {
            warn!("Teardown step {} failed: {}", step.kind(), e);
            return;
        }
    }
}

/// Run the lesson's steps live, pausing after visual ones.
///
/// Used while a recorder films the screen.
pub fn play_steps(
    ctx: &dyn StepContext,
    lesson: &Lesson,
    options: &StepOptions,
    audio: &dyn AudioSink,
) -> Result<()> {
    for (index, step) in lesson.steps.iter().enumerate() {
        execute_step(ctx, step, options, audio)
            .map_err(|e| Error::capture(index, step.kind(), e))?;
        if step.is_visual() {
            thread::sleep(options.settle);
        }
    }
    Ok(())
}

/// Capture a lesson against an already running terminal.
///
/// Runs setup and the ready wait, then every step, taking a frame after
/// each visual one. Narration and overlays from non-visual steps ride on
/// the next frame's action. Teardown runs uncaptured, then one dedup pass.
/// Any step failure voids the whole capture.
pub fn capture_with(
    ctx: &dyn StepContext,
    lesson: &Lesson,
    options: &StepOptions,
    audio: &dyn AudioSink,
) -> Result<SessionDocument> {
    prepare(ctx, lesson, options)?;

    let dimensions = ctx.snapshot().dimensions();
    let mut document =
        SessionDocument::new(&lesson.title, &lesson.source, dimensions.rows, dimensions.cols);
    let mut pending = Pending::default();
    let start = Instant::now();

    for (index, step) in lesson.steps.iter().enumerate() {
        execute_step(ctx, step, options, audio)
            .map_err(|e| Error::capture(index, step.kind(), e))?;

        if !step.is_visual() {
            pending.note(step);
            continue;
        }

        thread::sleep(options.settle);
        let frame = capture_frame(&ctx.snapshot());
        let ms = start.elapsed().as_millis() as u64;
        document.push(frame, ms, pending.describe(step));
    }

    finish(ctx, lesson, options);

    let captured = document.frame_count();
    document.dedup();
    info!(
        "Captured {} frames ({} after dedup) for {:?}",
        captured,
        document.frame_count(),
        lesson.title
    );
    Ok(document)
}

/// Start the lesson's program, capture it, and stop it.
pub fn capture_lesson(
    lesson: &Lesson,
    config: &VimfuConfig,
    audio: &dyn AudioSink,
) -> Result<SessionDocument> {
    let host = PtyHost::new(
        lesson.command.clone(),
        lesson.dimensions(config.terminal.dimensions()),
    )?
    .with_term(config.terminal.term.clone())
    .with_poll_interval(config.terminal.poll_interval());

    host.start()?;
    let result = capture_with(&host, lesson, &StepOptions::from_config(config), audio);
    host.stop();
    result
}
