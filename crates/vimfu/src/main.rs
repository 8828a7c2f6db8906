//! # vimfu
//!
//! Plays scripted terminal lessons in a pseudo-terminal and either
//! captures them as a deduplicated frame document or records them to an
//! MP4 with keystroke audio.
//!
//! ## Architecture
//!
//! This is Layer 1, the binary that ties together:
//! - vimfu-core: shared types, config and errors
//! - vimfu-emulator: PTY host and terminal state
//! - vimfu-frames: frame encoding and lesson capture
//! - vimfu-recorder: video and audio recording

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use vimfu::{record_lesson, CaptureArgs, Cli, Command, RecordArgs};
use vimfu_core::{NullAudioSink, VimfuConfig};
use vimfu_frames::{capture_lesson, document_schema, Lesson};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config().context("failed to load config")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Capture(args) => capture(args, config),
        Command::Record(args) => record(args, config),
        Command::Schema => {
            let schema = serde_json::to_string_pretty(&document_schema())?;
            println!("{schema}");
            Ok(())
        }
    }
}

fn load_lesson(path: &std::path::Path) -> anyhow::Result<Lesson> {
    Lesson::from_file(path).with_context(|| format!("failed to load lesson {}", path.display()))
}

fn capture(args: CaptureArgs, config: VimfuConfig) -> anyhow::Result<()> {
    let lesson = load_lesson(&args.lesson)?;
    tracing::info!("Capturing {:?}", lesson.title);

    let document = capture_lesson(&lesson, &config, &NullAudioSink)
        .with_context(|| format!("failed to capture {:?}", lesson.title))?;

    match args.output {
        Some(path) => {
            document
                .write_to_file(&path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!("Wrote {} frames to {}", document.frame_count(), path.display());
        }
        None => println!("{}", document.to_json()?),
    }
    Ok(())
}

fn record(args: RecordArgs, mut config: VimfuConfig) -> anyhow::Result<()> {
    args.apply(&mut config).context("invalid recording options")?;
    let lesson = load_lesson(&args.lesson)?;
    let title = args.title(&lesson);

    match record_lesson(&lesson, &config, &title)
        .with_context(|| format!("failed to record {:?}", lesson.title))?
    {
        Some(path) => println!("{}", path.display()),
        None => tracing::warn!("Nothing was recorded"),
    }
    Ok(())
}
