//! Lesson capture against a scripted terminal.
//!
//! `EchoTerminal` feeds whatever is "typed" straight back into a terminal
//! state model, the way a line-less raw-mode program would echo it.

use std::sync::Mutex;
use std::time::Duration;

use vimfu_core::{keys_to_bytes, AudioClip, AudioSink, Dimensions, Error, Result};
use vimfu_emulator::{poll_until, Grid, Parser, ScreenPattern, ScreenSnapshot};
use vimfu_frames::{
    capture_with, execute_step, play_steps, Lesson, SessionDocument, Step, StepContext,
    StepOptions,
};

struct EchoTerminal {
    parser: Mutex<Parser>,
    generation: Mutex<u64>,
}

impl EchoTerminal {
    fn new(rows: u16, cols: u16) -> Self {
        Self {
            parser: Mutex::new(Parser::new(Grid::new(Dimensions::new(rows, cols)))),
            generation: Mutex::new(0),
        }
    }

    fn feed(&self, bytes: &[u8]) {
        self.parser.lock().unwrap().process(bytes);
        *self.generation.lock().unwrap() += 1;
    }
}

impl StepContext for EchoTerminal {
    fn send_notation(&self, notation: &str) -> Result<()> {
        let bytes = keys_to_bytes(notation)?;
        self.feed(&bytes);
        Ok(())
    }

    fn send_text(&self, text: &str) -> Result<()> {
        self.feed(text.as_bytes());
        Ok(())
    }

    fn snapshot(&self) -> ScreenSnapshot {
        let generation = *self.generation.lock().unwrap();
        ScreenSnapshot::from_grid(self.parser.lock().unwrap().grid(), generation)
    }

    fn wait_for(&self, pattern: &str, timeout: Duration) -> bool {
        let pattern = ScreenPattern::new(pattern);
        poll_until(timeout, Duration::from_millis(1), || {
            pattern.is_match(&self.snapshot().text())
        })
    }

    fn resize(&self, dimensions: Dimensions) -> Result<()> {
        let dimensions = dimensions.validate()?;
        self.parser.lock().unwrap().grid_mut().resize(dimensions);
        Ok(())
    }
}

#[derive(Default)]
struct CountingSink {
    clips: Mutex<usize>,
}

impl AudioSink for CountingSink {
    fn add_audio(&self, _clip: AudioClip) {
        *self.clips.lock().unwrap() += 1;
    }
}

fn fast_options() -> StepOptions {
    StepOptions {
        settle: Duration::ZERO,
        ready_timeout: Duration::from_millis(200),
        wait_timeout: Duration::from_millis(200),
        clicks: true,
        click_rate: 8_000,
    }
}

const LESSON: &str = r#"
title: Echo
source: tests
command: cat
ready:
  pattern: "^\\$"
setup:
  - type: type
    text: "$ "
steps:
  - type: say
    text: Type some letters.
  - type: keys
    keys: abc
  - type: wait
    ms: 1
  - type: type
    text: def
  - type: comment
    text: the next wait matches at once
  - type: wait_for
    pattern: abcdef
  - type: when
    pattern: "a.c"
    then:
      - type: keys
        keys: "<CR>!"
    else:
      - type: keys
        keys: "?"
  - type: overlay
    text: smaller
    caption: resize
  - type: resize
    rows: 3
    cols: 10
"#;

fn capture(lesson: &str) -> (Result<SessionDocument>, usize) {
    let lesson = Lesson::from_yaml(lesson).unwrap();
    let terminal = EchoTerminal::new(2, 20);
    let sink = CountingSink::default();
    let result = capture_with(&terminal, &lesson, &fast_options(), &sink);
    let clips = *sink.clips.lock().unwrap();
    (result, clips)
}

#[test]
fn test_capture_produces_deduplicated_frames() {
    let (result, clips) = capture(LESSON);
    let doc = result.unwrap();

    assert_eq!(doc.title, "Echo");
    assert_eq!(doc.source, "tests");
    assert_eq!((doc.rows, doc.cols), (2, 20));

    let kinds: Vec<&str> = doc.frames().iter().map(|f| f.action.kind.as_str()).collect();
    assert_eq!(kinds, vec!["keys", "wait_for", "when", "resize"]);
    assert_eq!(doc.frame_count, 4);

    let first = &doc.frames()[0];
    assert_eq!(first.frame.lines[0].text.trim_end(), "$ abc");
    assert_eq!(first.action.say.as_deref(), Some("Type some letters."));
    assert_eq!(first.action.key_overlay.as_deref(), Some("abc"));

    // The wait_for frame showed the same screen as the type frame
    let second = &doc.frames()[1];
    assert_eq!(second.frame.lines[0].text.trim_end(), "$ abcdef");
    assert_eq!(second.action.detail, "abcdef");
    assert_eq!(second.action.say, None);

    let third = &doc.frames()[2];
    assert_eq!(third.frame.lines[0].text.trim_end(), "! abcdef");
    assert_eq!(third.frame.cursor.col, 1);

    let fourth = &doc.frames()[3];
    assert_eq!((fourth.frame.rows, fourth.frame.cols), (3, 10));
    assert_eq!(fourth.action.overlay.as_deref(), Some("smaller"));
    assert_eq!(fourth.action.overlay_caption.as_deref(), Some("resize"));
    assert!(fourth
        .frame
        .lines
        .iter()
        .all(|line| line.runs_are_canonical(10)));

    assert!(doc.frames().windows(2).all(|pair| pair[0].ms <= pair[1].ms));

    // keys, type, and the keys inside the taken branch
    assert_eq!(clips, 3);
}

#[test]
fn test_step_failure_voids_capture() {
    let lesson = r#"
title: Broken
command: cat
steps:
  - type: keys
    keys: x
  - type: wait_for
    pattern: never shown
    timeout_ms: 20
  - type: keys
    keys: y
"#;
    let (result, _) = capture(lesson);
    match result {
        Err(Error::Capture {
            index,
            kind,
            source,
        }) => {
            assert_eq!(index, 1);
            assert_eq!(kind, "wait_for");
            assert!(matches!(*source, Error::WaitTimeout(20)));
        }
        other => panic!("expected a capture error, got {other:?}"),
    }
}

#[test]
fn test_ready_timeout_is_fatal() {
    let lesson = r#"
title: Never ready
command: cat
ready:
  pattern: login
  timeout_ms: 30
steps:
  - type: keys
    keys: x
"#;
    let (result, clips) = capture(lesson);
    assert!(matches!(result, Err(Error::WaitTimeout(30))));
    assert_eq!(clips, 0);
}

#[test]
fn test_setup_failure_names_the_setup_step() {
    let lesson = r#"
title: Bad setup
command: cat
setup:
  - type: keys
    keys: "<div>"
  - type: resize
    rows: 0
    cols: 5
steps: []
"#;
    let (result, _) = capture(lesson);
    match result {
        Err(Error::Capture { index, kind, .. }) => {
            assert_eq!(index, 1);
            assert_eq!(kind, "setup resize");
        }
        other => panic!("expected a capture error, got {other:?}"),
    }
}

#[test]
fn test_when_takes_else_branch() {
    let terminal = EchoTerminal::new(1, 10);
    terminal.send_text("xyz").unwrap();
    let step = Step::When {
        pattern: "abc".to_string(),
        then: vec![Step::Keys {
            keys: "T".to_string(),
            overlay: None,
            caption: None,
        }],
        otherwise: vec![Step::Keys {
            keys: "E".to_string(),
            overlay: None,
            caption: None,
        }],
    };
    execute_step(&terminal, &step, &fast_options(), &CountingSink::default()).unwrap();
    assert_eq!(terminal.screen(), vec!["xyzE".to_string()]);
}

#[test]
fn test_typing_with_delay_clicks_per_character() {
    let terminal = EchoTerminal::new(1, 10);
    let sink = CountingSink::default();
    let step = Step::Type {
        text: "héllo".to_string(),
        delay_ms: Some(1),
    };
    execute_step(&terminal, &step, &fast_options(), &sink).unwrap();
    assert_eq!(terminal.screen(), vec!["héllo".to_string()]);
    assert_eq!(*sink.clips.lock().unwrap(), 5);
}

#[test]
fn test_play_steps_runs_without_frames() {
    let lesson = Lesson::from_yaml(LESSON).unwrap();
    let terminal = EchoTerminal::new(2, 20);
    let mut options = fast_options();
    options.clicks = false;
    let sink = CountingSink::default();

    play_steps(&terminal, &lesson, &options, &sink).unwrap();

    assert_eq!(terminal.screen()[0], "!bcdef");
    assert_eq!(*sink.clips.lock().unwrap(), 0);
}
