//! PTY hosting with portable-pty.
//!
//! A [`PtyHost`] owns one child process attached to a pseudo-terminal and a
//! background reader thread that feeds the child's output into the terminal
//! state model. The platform split (ConPTY on Windows, openpty+fork on
//! POSIX) is hidden behind [`portable_pty::PtySystem`], chosen when the host
//! is constructed.

use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize, PtySystem};
use std::io::{ErrorKind, Read, Write};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use vimfu_core::{keys_to_bytes, Dimensions, Error, Result};

use crate::grid::Grid;
use crate::parser::Parser;
use crate::snapshot::{CursorState, ScreenSnapshot};
use crate::wait::{poll_until, ScreenPattern, DEFAULT_POLL_INTERVAL};

const READ_BUFFER_SIZE: usize = 4096;
const READER_JOIN_TIMEOUT: Duration = Duration::from_secs(1);
const CHILD_EXIT_TIMEOUT: Duration = Duration::from_millis(500);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panicking reader leaves a grid that is still a valid grid
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Cloneable read-only view of a host's screen.
///
/// Handed to consumers on other threads (such as a video surface) so they
/// can snapshot the screen without owning the host.
#[derive(Debug, Clone)]
pub struct ScreenHandle {
    parser: Arc<Mutex<Parser>>,
    generation: Arc<AtomicU64>,
}

impl ScreenHandle {
    /// Blank screen not attached to any process; fed through [`ScreenHandle::feed`].
    pub fn new(dimensions: Dimensions) -> Self {
        Self {
            parser: Arc::new(Mutex::new(Parser::new(Grid::new(dimensions)))),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Copy the current grid and cursor.
    pub fn snapshot(&self) -> ScreenSnapshot {
        let parser = lock(&self.parser);
        ScreenSnapshot::from_grid(parser.grid(), self.generation.load(Ordering::Acquire))
    }

    /// Number of output chunks applied to the grid so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Feed output bytes into the terminal state model.
    pub fn feed(&self, bytes: &[u8]) {
        lock(&self.parser).process(bytes);
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    fn resize(&self, dimensions: Dimensions) {
        lock(&self.parser).grid_mut().resize(dimensions);
        self.generation.fetch_add(1, Ordering::AcqRel);
    }
}

/// Host for one child process running in a pseudo-terminal.
pub struct PtyHost {
    command: String,
    term: String,
    poll_interval: Duration,
    pty_system: Box<dyn PtySystem + Send>,
    dimensions: Mutex<Dimensions>,
    screen: ScreenHandle,
    running: Arc<AtomicBool>,
    master: Mutex<Option<Box<dyn MasterPty + Send>>>,
    writer: Mutex<Option<Box<dyn Write + Send>>>,
    child: Mutex<Option<Box<dyn Child + Send + Sync>>>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for PtyHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtyHost")
            .field("command", &self.command)
            .field("dimensions", &self.dimensions)
            .field("running", &self.running)
            .finish_non_exhaustive()
    }
}

impl PtyHost {
    /// Create a host for `command` using the platform's native pty system.
    ///
    /// Nothing is spawned until [`PtyHost::start`].
    ///
    /// # Example
    /// ```no_run
    /// use std::time::Duration;
    /// use vimfu_core::Dimensions;
    /// use vimfu_emulator::PtyHost;
    ///
    /// # fn example() -> vimfu_core::Result<()> {
    /// let host = PtyHost::new("vim -u NONE", Dimensions::new(24, 80))?;
    /// host.start()?;
    /// host.wait_for("~", Duration::from_secs(5));
    /// host.send_key_notation("ihello<Esc>")?;
    /// host.stop();
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(command: impl Into<String>, dimensions: Dimensions) -> Result<Self> {
        Self::with_pty_system(command, dimensions, native_pty_system())
    }

    /// Create a host backed by a specific pty implementation.
    pub fn with_pty_system(
        command: impl Into<String>,
        dimensions: Dimensions,
        pty_system: Box<dyn PtySystem + Send>,
    ) -> Result<Self> {
        let dimensions = dimensions.validate()?;
        Ok(Self {
            command: command.into(),
            term: "xterm-256color".to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            pty_system,
            dimensions: Mutex::new(dimensions),
            screen: ScreenHandle::new(dimensions),
            running: Arc::new(AtomicBool::new(false)),
            master: Mutex::new(None),
            writer: Mutex::new(None),
            child: Mutex::new(None),
            reader: Mutex::new(None),
        })
    }

    /// Set the `TERM` value exported to the child.
    pub fn with_term(mut self, term: impl Into<String>) -> Self {
        self.term = term.into();
        self
    }

    /// Set the screen polling interval used by [`PtyHost::wait_for`].
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Command line the host runs.
    pub fn command(&self) -> &str {
        &self.command
    }

    fn build_command(&self) -> CommandBuilder {
        let mut cmd = if cfg!(windows) {
            let mut cmd = CommandBuilder::new("cmd.exe");
            cmd.args(["/C", self.command.as_str()]);
            cmd
        } else {
            let script = format!("exec {}", self.command);
            let mut cmd = CommandBuilder::new("/bin/sh");
            cmd.args(["-c", script.as_str()]);
            cmd
        };
        cmd.env("TERM", &self.term);
        if let Ok(dir) = std::env::current_dir() {
            cmd.cwd(dir);
        }
        cmd
    }

    /// Open the pty, spawn the command and start the reader thread.
    ///
    /// Failures are fatal for the host; there is no retry. Starting a host
    /// twice is an error.
    pub fn start(&self) -> Result<()> {
        let mut child_slot = lock(&self.child);
        if child_slot.is_some() || lock(&self.reader).is_some() {
            return Err(Error::InvalidState("PTY host already started".to_string()));
        }

        let dimensions = *lock(&self.dimensions);
        info!(
            "Spawning PTY: command='{}', dimensions={}x{}",
            self.command, dimensions.rows, dimensions.cols
        );

        let pair = self
            .pty_system
            .openpty(PtySize {
                rows: dimensions.rows,
                cols: dimensions.cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| {
                error!("Failed to open PTY: {}", e);
                Error::PtyError(format!("Failed to open PTY: {e}"))
            })?;

        let child = pair.slave.spawn_command(self.build_command()).map_err(|e| {
            error!("Failed to spawn command '{}': {}", self.command, e);
            Error::PtyError(format!("Failed to spawn command: {e}"))
        })?;
        // Only the child keeps the slave open, so the reader sees EOF when it exits
        drop(pair.slave);

        let writer = pair
            .master
            .take_writer()
            .map_err(|e| Error::PtyError(format!("Failed to take writer: {e}")))?;
        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| Error::PtyError(format!("Failed to clone reader: {e}")))?;

        self.running.store(true, Ordering::Release);
        let screen = self.screen.clone();
        let running = Arc::clone(&self.running);
        let handle = thread::Builder::new()
            .name("vimfu-pty-reader".to_string())
            .spawn(move || read_loop(reader, screen, running))
            .map_err(|e| Error::PtyError(format!("Failed to start reader thread: {e}")))?;

        *child_slot = Some(child);
        *lock(&self.master) = Some(pair.master);
        *lock(&self.writer) = Some(writer);
        *lock(&self.reader) = Some(handle);

        info!("PTY spawned successfully: command='{}'", self.command);
        Ok(())
    }

    /// Write raw bytes to the pty master. No pacing is applied.
    pub fn send_bytes(&self, data: &[u8]) -> Result<()> {
        debug!("Writing {} bytes to PTY", data.len());
        let mut writer_slot = lock(&self.writer);
        let writer = writer_slot
            .as_mut()
            .ok_or_else(|| Error::PtyError("PTY host not started".to_string()))?;

        writer.write_all(data)?;
        writer.flush()?;
        Ok(())
    }

    /// Write text verbatim.
    pub fn send_keys(&self, text: &str) -> Result<()> {
        self.send_bytes(text.as_bytes())
    }

    /// Translate vim-style key notation (`<Esc>`, `<CR>`, `<C-w>`) and send it.
    pub fn send_key_notation(&self, notation: &str) -> Result<()> {
        let bytes = keys_to_bytes(notation)?;
        self.send_bytes(&bytes)
    }

    /// Read-only screen view for other threads.
    pub fn screen(&self) -> ScreenHandle {
        self.screen.clone()
    }

    /// Copy of the current grid, cursor and generation.
    pub fn snapshot(&self) -> ScreenSnapshot {
        self.screen.snapshot()
    }

    /// Screen lines with trailing whitespace removed.
    pub fn get_screen(&self) -> Vec<String> {
        self.snapshot().lines()
    }

    /// Cursor position and visibility.
    pub fn get_cursor(&self) -> CursorState {
        let parser = lock(&self.screen.parser);
        let cursor = parser.grid().cursor();
        CursorState::new(cursor.position.row, cursor.position.col, cursor.visible)
    }

    /// Block until `pattern` appears on screen or `timeout` passes.
    ///
    /// `pattern` is a regex; an invalid regex is matched literally. Never
    /// errors: a child that has exited simply never matches again.
    pub fn wait_for(&self, pattern: &str, timeout: Duration) -> bool {
        let pattern = ScreenPattern::new(pattern);
        let met = poll_until(timeout, self.poll_interval, || {
            pattern.is_match(&self.snapshot().text())
        });
        if !met {
            debug!("Timed out after {:?} waiting for {:?}", timeout, pattern.as_str());
        }
        met
    }

    /// Current pty geometry.
    pub fn dimensions(&self) -> Dimensions {
        *lock(&self.dimensions)
    }

    /// Resize the pty (the child gets SIGWINCH) and the grid.
    pub fn resize(&self, dimensions: Dimensions) -> Result<()> {
        let dimensions = dimensions.validate()?;
        info!("Resizing PTY to {}x{}", dimensions.rows, dimensions.cols);

        if let Some(master) = lock(&self.master).as_ref() {
            master
                .resize(PtySize {
                    rows: dimensions.rows,
                    cols: dimensions.cols,
                    pixel_width: 0,
                    pixel_height: 0,
                })
                .map_err(|e| Error::PtyError(format!("Resize failed: {e}")))?;
        }

        self.screen.resize(dimensions);
        *lock(&self.dimensions) = dimensions;
        Ok(())
    }

    /// Check if the child process is still running.
    pub fn is_alive(&self) -> bool {
        match lock(&self.child).as_mut() {
            Some(child) => child.try_wait().ok().flatten().is_none(),
            None => false,
        }
    }

    /// Stop the reader, terminate the child and close the pty.
    ///
    /// Best effort and idempotent; also runs on drop.
    pub fn stop(&self) {
        let was_running = self.running.swap(false, Ordering::AcqRel);

        if let Some(mut child) = lock(&self.child).take() {
            if child.try_wait().ok().flatten().is_none() {
                if let Err(e) = child.kill() {
                    debug!("Failed to kill child: {}", e);
                }
            }
            let exited = poll_until(CHILD_EXIT_TIMEOUT, Duration::from_millis(10), || {
                child.try_wait().ok().flatten().is_some()
            });
            if !exited {
                warn!("Child of '{}' did not exit after kill", self.command);
            }
        }

        // Closing the master unblocks the reader's pending read
        lock(&self.writer).take();
        lock(&self.master).take();

        if let Some(handle) = lock(&self.reader).take() {
            let finished = poll_until(READER_JOIN_TIMEOUT, Duration::from_millis(10), || {
                handle.is_finished()
            });
            if finished {
                if handle.join().is_err() {
                    warn!("PTY reader thread panicked");
                }
            } else {
                warn!("PTY reader thread did not exit within {:?}", READER_JOIN_TIMEOUT);
            }
        }

        if was_running {
            info!("PTY host stopped: command='{}'", self.command);
        }
    }
}

impl Drop for PtyHost {
    fn drop(&mut self) {
        self.stop();
    }
}

fn read_loop(mut reader: Box<dyn Read + Send>, screen: ScreenHandle, running: Arc<AtomicBool>) {
    let mut buffer = [0u8; READ_BUFFER_SIZE];
    let started = Instant::now();
    let mut total = 0usize;

    while running.load(Ordering::Acquire) {
        match reader.read(&mut buffer) {
            Ok(0) => {
                debug!("PTY reached EOF");
                break;
            }
            Ok(n) => {
                total += n;
                screen.feed(&buffer[..n]);
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                // EIO is how Linux reports a closed slave
                debug!("PTY read ended: {}", e);
                break;
            }
        }
    }

    debug!(
        "PTY reader exiting after {} bytes in {:?}",
        total,
        started.elapsed()
    );
}
