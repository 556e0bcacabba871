// SPDX-License-Identifier: MIT
//
// Viewer session: the state the event loop drives.
//
// Owns the board, palette, viewport and debug log, plus the receiving ends
// of the loader's and stream reader's channels. Each iteration `poll`
// checks those channels without blocking, `on_event` handles keys and the
// mouse, and `paint` clamps the viewport and draws.
//
// Connection state only moves forward:
//
//   NotConnected ──loaded──▶ Connected ──stream error──▶ Errored(reason)
//                                     └──close frame───▶ Closed
//
// A failed load is fatal: `poll` quits and the error becomes the exit
// error.
//
// After the stream ends the last canvas stays on screen and pannable,
// unless the session was told to quit on disconnect.

use std::sync::mpsc::TryRecvError;

use pxview_board::{Board, Palette, PixelDelta, StreamChannels, StreamError};
use pxview_term::buffer::FrameBuffer;
use pxview_term::event_loop::{Action, App};
use pxview_term::input::{Event, KeyCode, KeyEvent, MouseButton, MouseEventKind};

use crate::debug_log::DebugLog;
use crate::error::ViewerError;
use crate::loader::{Loaded, Pending};
use crate::render;
use crate::viewport::{Viewport, ViewportPolicy};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    NotConnected,
    Connected,
    Closed,
    Errored(String),
}

impl ConnectionState {
    #[must_use]
    pub const fn has_ended(&self) -> bool {
        matches!(self, Self::Closed | Self::Errored(_))
    }
}

struct Canvas {
    board: Board,
    palette: Palette,
}

pub struct Session {
    state: ConnectionState,
    /// The loader's result channel, until it delivers.
    pending: Option<Pending>,
    canvas: Option<Canvas>,
    stream: Option<StreamChannels>,
    viewport: Viewport,
    policy: ViewportPolicy,
    log: DebugLog,
    exit_on_disconnect: bool,
    /// Set when loading failed.
    fatal: Option<ViewerError>,
}

impl Session {
    #[must_use]
    pub fn new(policy: ViewportPolicy, debug_lines: usize, exit_on_disconnect: bool) -> Self {
        Self {
            state: ConnectionState::NotConnected,
            pending: None,
            canvas: None,
            stream: None,
            viewport: Viewport::new(0, 0),
            policy,
            log: DebugLog::new(debug_lines),
            exit_on_disconnect,
            fatal: None,
        }
    }

    /// Wait for the loader without blocking; `poll` picks up its result.
    pub fn await_canvas(&mut self, pending: Pending) {
        self.pending = Some(pending);
    }

    /// Hand over the initialized canvas and the live stream.
    fn connect(&mut self, board: Board, palette: Palette, stream: StreamChannels) {
        let (width, height) = board.dimensions();
        tracing::info!(width, height, "session connected");
        self.canvas = Some(Canvas { board, palette });
        self.stream = Some(stream);
        self.state = ConnectionState::Connected;
    }

    #[must_use]
    pub const fn state(&self) -> &ConnectionState {
        &self.state
    }

    #[cfg(test)]
    fn board(&self) -> Option<&Board> {
        self.canvas.as_ref().map(|c| &c.board)
    }

    /// The error to exit with: a failed load, or the stream ending when
    /// that should fail the process.
    pub fn take_exit_error(&mut self) -> Option<ViewerError> {
        if let Some(err) = self.fatal.take() {
            return Some(err);
        }
        if !self.exit_on_disconnect {
            return None;
        }
        match &self.state {
            ConnectionState::Closed => Some(ViewerError::Disconnected("connection closed".into())),
            ConnectionState::Errored(reason) => Some(ViewerError::Disconnected(reason.clone())),
            ConnectionState::NotConnected | ConnectionState::Connected => None,
        }
    }

    // ── Loading ─────────────────────────────────────────────────────────

    /// `Quit` once the loader has failed.
    fn check_loader(&mut self) -> Action {
        let Some(pending) = self.pending.take() else {
            return if self.fatal.is_some() {
                Action::Quit
            } else {
                Action::Continue
            };
        };

        match pending.try_recv() {
            Ok(Ok(Loaded {
                board,
                palette,
                stream,
            })) => {
                self.connect(board, palette, stream);
                Action::Continue
            }
            Ok(Err(err)) => {
                self.fatal = Some(err);
                Action::Quit
            }
            Err(TryRecvError::Empty) => {
                self.pending = Some(pending);
                Action::Continue
            }
            Err(TryRecvError::Disconnected) => {
                self.fatal = Some(ViewerError::LoaderGone);
                Action::Quit
            }
        }
    }

    // ── Stream ──────────────────────────────────────────────────────────

    fn drain_stream(&mut self) {
        let Some(stream) = self.stream.take() else {
            return;
        };

        for batch in stream.batches.try_iter() {
            self.apply_batch(batch);
        }

        let mut ended = false;
        for err in stream.errors.try_iter() {
            ended |= self.on_stream_error(err);
        }

        if ended {
            // The reader may have queued a last batch between the two drains.
            for batch in stream.batches.try_iter() {
                self.apply_batch(batch);
            }
        } else {
            self.stream = Some(stream);
        }
    }

    fn apply_batch(&mut self, batch: Vec<PixelDelta>) {
        let Some(canvas) = self.canvas.as_mut() else {
            return;
        };
        for delta in batch {
            if let Err(e) = canvas.board.apply(delta) {
                tracing::debug!(x = e.x, y = e.y, "dropping out-of-range pixel");
                self.log.push(e.to_string());
            }
        }
    }

    /// Record a stream error. Returns `true` if the stream is finished.
    fn on_stream_error(&mut self, err: StreamError) -> bool {
        if !err.is_fatal() {
            self.log.push(err.to_string());
            return false;
        }
        if self.state.has_ended() {
            return true;
        }

        tracing::warn!(error = %err, "stream ended");
        self.state = match err {
            StreamError::Closed => ConnectionState::Closed,
            other => ConnectionState::Errored(other.to_string()),
        };
        true
    }

    // ── Input ───────────────────────────────────────────────────────────

    fn on_key(&mut self, key: &KeyEvent) -> Action {
        if key.is_ctrl('c') || key.code == KeyCode::Char('q') {
            return Action::Quit;
        }
        if self.state == ConnectionState::NotConnected {
            return Action::Continue;
        }

        let step = self.policy.pan_step;
        match key.code {
            KeyCode::Up => self.viewport.pan(0, -step),
            KeyCode::Down => self.viewport.pan(0, step),
            KeyCode::Left => self.viewport.pan(-step, 0),
            KeyCode::Right => self.viewport.pan(step, 0),
            _ => {}
        }
        Action::Continue
    }
}

impl App for Session {
    fn poll(&mut self) -> Action {
        if self.check_loader() == Action::Quit {
            return Action::Quit;
        }
        self.drain_stream();
        if self.exit_on_disconnect && self.state.has_ended() {
            Action::Quit
        } else {
            Action::Continue
        }
    }

    fn on_event(&mut self, event: &Event) -> Action {
        match event {
            Event::Key(key) => self.on_key(key),
            Event::Mouse(mouse) => {
                if self.state != ConnectionState::NotConnected {
                    match mouse.kind {
                        MouseEventKind::Press(MouseButton::Left)
                        | MouseEventKind::Drag(MouseButton::Left) => {
                            self.viewport.drag_to(mouse.x, mouse.y);
                        }
                        MouseEventKind::Release(_) if self.viewport.is_dragging() => {
                            self.viewport.end_drag();
                        }
                        _ => {}
                    }
                }
                Action::Continue
            }
        }
    }

    fn paint(&mut self, frame: &mut FrameBuffer) {
        let Some(canvas) = &self.canvas else {
            render::paint_loading(frame);
            return;
        };

        let (canvas_w, canvas_h) = canvas.board.dimensions();
        self.viewport
            .clamp(frame.width(), frame.height(), canvas_w, canvas_h, &self.policy);

        render::paint_canvas(frame, &canvas.board, &canvas.palette, &self.viewport);
        let status = render::status_line(&self.viewport, &self.state);
        render::paint_overlay(frame, &status, &self.log);
    }
}
