//! Recording a lesson to video.

use std::path::PathBuf;

use tracing::{info, warn};

use vimfu_core::{Result, VimfuConfig};
use vimfu_emulator::PtyHost;
use vimfu_frames::{finish, play_steps, prepare, Lesson, StepContext, StepOptions};
use vimfu_recorder::{Recorder, Surface, TerminalSurface};

/// Play `lesson` in a fresh terminal while recording it as `{title}.mp4`.
///
/// Returns the path of the finished video.
pub fn record_lesson(lesson: &Lesson, config: &VimfuConfig, title: &str) -> Result<Option<PathBuf>> {
    let host = PtyHost::new(
        lesson.command.clone(),
        lesson.dimensions(config.terminal.dimensions()),
    )?
    .with_term(config.terminal.term.clone())
    .with_poll_interval(config.terminal.poll_interval());
    let recorder = Recorder::from_settings(title, &config.recorder);
    let options = StepOptions::from_config(config);

    host.start()?;
    let surface = TerminalSurface::new(host.screen());
    let result = record_with(&host, &recorder, Box::new(surface), lesson, &options);
    host.stop();
    result
}

/// Record `lesson` played against `ctx` while filming `surface`.
///
/// Setup runs before the recorder starts so the video opens on a ready
/// screen. A failing step still stops and finalizes the recording; the
/// step's error is returned.
pub fn record_with(
    ctx: &dyn StepContext,
    recorder: &Recorder,
    surface: Box<dyn Surface>,
    lesson: &Lesson,
    options: &StepOptions,
) -> Result<Option<PathBuf>> {
    prepare(ctx, lesson, options)?;

    recorder.start(surface)?;
    let played = play_steps(ctx, lesson, options, recorder);
    let stopped = recorder.stop();
    finish(ctx, lesson, options);

    if let Err(e) = played {
        if let Ok(Some(path)) = &stopped {
            warn!("Lesson aborted; partial video left at {}", path.display());
        }
        return Err(e);
    }

    if let Ok(Some(path)) = &stopped {
        info!("Recorded {:?} to {}", lesson.title, path.display());
    }
    stopped
}
