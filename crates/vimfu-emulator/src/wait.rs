//! Screen pattern matching and polling waits.

use regex::Regex;
use std::time::{Duration, Instant};
use tracing::debug;

/// Default polling interval between screen checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Pattern matched against screen text.
///
/// Patterns are regular expressions. A pattern that fails to compile is
/// matched literally instead, so a lesson waiting for `"foo("` still works.
#[derive(Debug, Clone)]
pub struct ScreenPattern {
    source: String,
    matcher: Matcher,
}

#[derive(Debug, Clone)]
enum Matcher {
    Regex(Regex),
    Literal,
}

impl ScreenPattern {
    /// Compile a pattern, falling back to a literal match.
    pub fn new(pattern: &str) -> Self {
        let matcher = match Regex::new(pattern) {
            Ok(regex) => Matcher::Regex(regex),
            Err(e) => {
                debug!("Pattern {:?} is not a valid regex ({}), matching literally", pattern, e);
                Matcher::Literal
            }
        };
        Self {
            source: pattern.to_string(),
            matcher,
        }
    }

    /// Original pattern text.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the pattern occurs anywhere in `text`.
    pub fn is_match(&self, text: &str) -> bool {
        match &self.matcher {
            Matcher::Regex(regex) => regex.is_match(text),
            Matcher::Literal => text.contains(&self.source),
        }
    }

    /// Whether the pattern occurs on the screen made of `lines`.
    pub fn matches_lines(&self, lines: &[String]) -> bool {
        self.is_match(&lines.join("\n"))
    }
}

/// Poll `check` every `poll_interval` until it returns true or `timeout` passes.
///
/// The check runs at least once, and once more at the deadline, so a zero
/// timeout still checks the current state. Returns whether the check
/// succeeded.
pub fn poll_until(timeout: Duration, poll_interval: Duration, mut check: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    loop {
        if check() {
            return true;
        }

        let elapsed = start.elapsed();
        if elapsed >= timeout {
            return false;
        }

        std::thread::sleep(poll_interval.min(timeout - elapsed));
    }
}
