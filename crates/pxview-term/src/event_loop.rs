// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Event loop.
//
// Wires the pieces together: input events arrive from the reader thread,
// the application drains its own sources and handles events, paints a
// frame buffer, and the diff renderer sends only what changed.
//
// One iteration:
//
//   1. App::poll: the application drains whatever external channels it
//      owns (network batches, errors) and may ask to quit.
//   2. Every input event already waiting is handed to App::on_event.
//   3. A pending SIGWINCH resizes the frame and forces a full redraw.
//   4. The frame is cleared, painted and flushed.
//   5. The loop waits out the rest of the frame interval on the input
//      channel, so a key press cuts the wait short.
//
// Nothing in the loop blocks on the network. With no frame interval the
// loop spins as fast as the terminal accepts output.
//
// `run` reads stdin through an InputReader and writes to stdout; `drive`
// is the same loop over a caller's channel and writer.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError};
use std::time::{Duration, Instant};

use crate::buffer::FrameBuffer;
use crate::diff::DiffRenderer;
use crate::input::Event;
use crate::reader::InputReader;
use crate::terminal::{Size, Terminal};

// ─── SIGWINCH ────────────────────────────────────────────────────────────────

static SIGWINCH_RECEIVED: AtomicBool = AtomicBool::new(false);

/// The handler only stores to an atomic, which is async-signal-safe.
#[cfg(unix)]
fn install_sigwinch_handler() {
    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = sigwinch_handler as *const () as usize;
        sa.sa_flags = libc::SA_RESTART;
        libc::sigemptyset(&raw mut sa.sa_mask);
        libc::sigaction(libc::SIGWINCH, &raw const sa, std::ptr::null_mut());
    }
}

#[cfg(unix)]
extern "C" fn sigwinch_handler(_sig: libc::c_int) {
    SIGWINCH_RECEIVED.store(true, Ordering::Relaxed);
}

#[cfg(not(unix))]
fn install_sigwinch_handler() {}

// ─── App Trait ───────────────────────────────────────────────────────────────

/// What the application wants the loop to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Quit,
}

/// Application driven by [`EventLoop`].
///
/// Per iteration the loop calls [`poll`](App::poll), then
/// [`on_event`](App::on_event) for each waiting input event, then
/// [`on_resize`](App::on_resize) if the terminal changed size, then
/// [`paint`](App::paint). Only `paint` is required.
pub trait App {
    /// Drain non-input sources. Called first, every iteration.
    fn poll(&mut self) -> Action {
        Action::Continue
    }

    fn on_event(&mut self, _event: &Event) -> Action {
        Action::Continue
    }

    /// The frame buffer is already resized when this runs.
    fn on_resize(&mut self, _size: Size) {}

    /// Paint the whole frame. The buffer arrives cleared.
    fn paint(&mut self, buf: &mut FrameBuffer);
}

// ─── Loop Config ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopConfig {
    /// Minimum time between frames. `None` runs uncapped.
    pub frame_interval: Option<Duration>,
}

impl LoopConfig {
    /// Cap at `fps` frames per second; 0 means uncapped.
    #[must_use]
    pub fn with_fps(fps: u32) -> Self {
        Self {
            frame_interval: (fps > 0).then(|| Duration::from_secs(1) / fps),
        }
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self::with_fps(120)
    }
}

// ─── EventLoop ───────────────────────────────────────────────────────────────

/// Owns the terminal, the frame buffer and the diff renderer.
///
/// [`enter`](Self::enter) takes over the screen, [`run`](Self::run) drives
/// an [`App`] until it quits, [`leave`](Self::leave) hands the screen back.
/// Dropping the loop restores the terminal too.
///
/// # Example
///
/// ```no_run
/// use pxview_term::buffer::FrameBuffer;
/// use pxview_term::color::CellColor;
/// use pxview_term::event_loop::{Action, App, EventLoop, LoopConfig};
/// use pxview_term::input::{Event, KeyCode};
///
/// struct Hello;
///
/// impl App for Hello {
///     fn on_event(&mut self, event: &Event) -> Action {
///         match event {
///             Event::Key(key) if key.code == KeyCode::Char('q') => Action::Quit,
///             _ => Action::Continue,
///         }
///     }
///
///     fn paint(&mut self, buf: &mut FrameBuffer) {
///         buf.paint_text(0, 0, "press q", CellColor::WHITE, CellColor::BLACK);
///     }
/// }
///
/// let mut event_loop = EventLoop::new(LoopConfig::with_fps(60))?;
/// event_loop.enter()?;
/// let result = event_loop.run(&mut Hello);
/// event_loop.leave()?;
/// result?;
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct EventLoop {
    /// Raw mode, alternate screen, current size.
    terminal: Terminal,
    /// Remembers the last flushed frame so only changes are sent.
    renderer: DiffRenderer,
    /// Painted from scratch by the app every iteration.
    frame: FrameBuffer,
    config: LoopConfig,
}

impl EventLoop {
    /// Size the frame to the terminal. The screen is untouched until
    /// [`enter`](Self::enter).
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be initialized.
    pub fn new(config: LoopConfig) -> io::Result<Self> {
        let terminal = Terminal::new()?;
        let size = terminal.size();
        Ok(Self {
            terminal,
            renderer: DiffRenderer::new(),
            frame: FrameBuffer::new(size.cols, size.rows),
            config,
        })
    }

    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.terminal.size()
    }

    /// Enter TUI mode and start listening for resizes.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot switch modes.
    pub fn enter(&mut self) -> io::Result<()> {
        self.terminal.enter()?;
        install_sigwinch_handler();
        Ok(())
    }

    /// Restore the terminal.
    ///
    /// # Errors
    ///
    /// Returns an error if the restore sequence cannot be written.
    pub fn leave(&mut self) -> io::Result<()> {
        self.terminal.leave()
    }

    /// Run on stdin and stdout until the application returns
    /// [`Action::Quit`] or input ends.
    ///
    /// # Errors
    ///
    /// Returns an error if writing a frame fails. The input thread is
    /// stopped either way; restoring the terminal is left to
    /// [`leave`](Self::leave).
    pub fn run(&mut self, app: &mut impl App) -> io::Result<()> {
        let (mut reader, rx) = InputReader::spawn();
        let result = self.drive(app, &rx, &mut io::stdout());
        reader.stop();
        result
    }

    /// The loop behind [`run`](Self::run), over any event source and sink.
    ///
    /// Returns once [`App::poll`] or [`App::on_event`] asks to quit, or
    /// once `events` is empty and every sender is gone. A quit takes
    /// effect at once: no further events are handled and no frame is
    /// painted.
    ///
    /// # Errors
    ///
    /// Returns an error if writing a frame to `out` fails.
    pub fn drive(
        &mut self,
        app: &mut impl App,
        events: &Receiver<Event>,
        out: &mut impl Write,
    ) -> io::Result<()> {
        loop {
            let frame_start = Instant::now();

            if app.poll() == Action::Quit {
                return Ok(());
            }

            loop {
                match events.try_recv() {
                    Ok(event) => {
                        if app.on_event(&event) == Action::Quit {
                            return Ok(());
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => return Ok(()),
                }
            }

            self.draw(app, out)?;

            let Some(interval) = self.config.frame_interval else {
                continue;
            };
            let Some(remaining) = interval.checked_sub(frame_start.elapsed()) else {
                continue;
            };
            match events.recv_timeout(remaining) {
                Ok(event) => {
                    if app.on_event(&event) == Action::Quit {
                        return Ok(());
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return Ok(()),
            }
        }
    }

    fn draw(&mut self, app: &mut impl App, out: &mut impl Write) -> io::Result<()> {
        self.handle_resize(app);
        self.frame.clear();
        app.paint(&mut self.frame);

        let stats = self.renderer.render(&self.frame);
        tracing::trace!(
            rendered = stats.cells_rendered,
            skipped = stats.cells_skipped,
            bytes = stats.bytes_written,
            "frame"
        );
        self.renderer.flush_to(out)
    }

    fn handle_resize(&mut self, app: &mut impl App) {
        if SIGWINCH_RECEIVED.swap(false, Ordering::Relaxed) {
            let size = self.terminal.refresh_size();
            self.frame.resize(size.cols, size.rows);
            self.renderer.force_redraw();
            app.on_resize(size);
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
