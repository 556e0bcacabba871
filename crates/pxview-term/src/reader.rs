// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Input thread.
//
// A dedicated thread polls stdin, feeds the bytes through the parser and
// sends finished events over a std channel. The main loop only ever does
// non-blocking receives on that channel.
//
// The poll timeout doubles as the escape timeout: if a poll expires while
// the parser still holds bytes (a lone ESC, typically), those bytes are
// flushed as literal keys. The same timeout bounds how long `stop` waits
// for the thread to notice the stop flag.

#[cfg(unix)]
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use crate::input::{Event, Parser};

const READ_BUF_SIZE: usize = 4096;

/// Stdin poll timeout in milliseconds.
const POLL_TIMEOUT_MS: i32 = 50;

/// Background thread turning stdin into [`Event`]s.
///
/// The thread exits on [`stop`](Self::stop), on drop, at EOF, when polling
/// stdin fails, or once the receiving side of the channel is gone.
///
/// # Example
///
/// ```no_run
/// use pxview_term::input::{Event, KeyCode};
/// use pxview_term::reader::InputReader;
///
/// let (mut reader, events) = InputReader::spawn();
/// for event in &events {
///     if let Event::Key(key) = event {
///         if key.code == KeyCode::Char('q') {
///             break;
///         }
///     }
/// }
/// reader.stop();
/// ```
pub struct InputReader {
    /// The reader thread; taken by the first `stop`.
    handle: Option<JoinHandle<()>>,
    /// Checked by the thread after every poll.
    stop: Arc<AtomicBool>,
}

impl InputReader {
    /// Spawn the reader thread.
    ///
    /// # Panics
    ///
    /// Panics if the OS cannot spawn a thread.
    #[must_use]
    pub fn spawn() -> (Self, Receiver<Event>) {
        let (tx, rx) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("input-reader".into())
            .spawn(move || reader_loop(&tx, &stop_flag))
            .expect("failed to spawn input reader thread");

        (
            Self {
                handle: Some(handle),
                stop,
            },
            rx,
        )
    }

    /// Signal the thread to stop and join it. Idempotent.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for InputReader {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Send every event; `false` once the receiver is gone.
fn forward(tx: &Sender<Event>, events: Vec<Event>) -> bool {
    events.into_iter().all(|event| tx.send(event).is_ok())
}

#[cfg(unix)]
fn reader_loop(tx: &Sender<Event>, stop: &AtomicBool) {
    use std::os::unix::io::AsRawFd;

    let stdin_fd = io::stdin().as_raw_fd();
    let mut buf = [0u8; READ_BUF_SIZE];
    let mut parser = Parser::new();

    while !stop.load(Ordering::Relaxed) {
        let ready = unsafe {
            let mut pfd = libc::pollfd {
                fd: stdin_fd,
                events: libc::POLLIN,
                revents: 0,
            };
            libc::poll(&raw mut pfd, 1, POLL_TIMEOUT_MS)
        };

        if ready < 0 {
            let err = io::Error::last_os_error();
            if retry_poll(&err) {
                continue;
            }
            tracing::warn!(error = %err, "polling stdin failed, input reader stopping");
            break;
        }
        if ready == 0 {
            if parser.has_pending() && !forward(tx, parser.flush()) {
                break;
            }
            continue;
        }

        let n = unsafe { libc::read(stdin_fd, buf.as_mut_ptr().cast(), buf.len()) };
        if n <= 0 {
            break;
        }

        #[allow(clippy::cast_sign_loss)] // n > 0 checked above.
        let events = parser.advance(&buf[..n as usize]);
        if !forward(tx, events) {
            break;
        }
    }
}

/// A signal interrupting poll is harmless; anything else will keep failing.
#[cfg(unix)]
fn retry_poll(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::Interrupted
}

/// Blocking fallback without poll: stop is only noticed between reads,
/// and a lone ESC waits for the next byte.
#[cfg(not(unix))]
fn reader_loop(tx: &Sender<Event>, stop: &AtomicBool) {
    use std::io::Read;

    let stdin = std::io::stdin();
    let mut buf = [0u8; READ_BUF_SIZE];
    let mut parser = Parser::new();

    while !stop.load(Ordering::Relaxed) {
        match stdin.lock().read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if !forward(tx, parser.advance(&buf[..n])) {
                    break;
                }
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
