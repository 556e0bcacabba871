// SPDX-License-Identifier: MIT
//
// Taking over the terminal and giving it back.
//
// `Terminal::enter` puts stdin into raw mode and writes the viewer's screen
// setup; `leave` (or drop) reverses both. The saved termios is also parked
// in a static so a panic hook can restore it: a panic unwinding out of the
// event loop would otherwise leave the user's shell without echo.
//
// The hook writes a prebuilt byte string straight to fd 1. A panic during
// a flush may hold the stdout lock, and the hook must not wait on it.
//
// Safety: termios, ioctl(TIOCGWINSZ), isatty and the raw write are libc
// calls with no std wrapper. Each unsafe block covers only the call.
#![allow(unsafe_code)]

use std::io::{self, Write};
use std::sync::{Mutex, Once};

use crate::ansi;

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub cols: u16,
    pub rows: u16,
}

impl Size {
    /// Used when the OS cannot report a size (pipes, CI).
    pub const FALLBACK: Self = Self { cols: 80, rows: 24 };
}

/// Current size of the terminal on stdout, if there is one.
#[cfg(unix)]
#[must_use]
pub fn get_size() -> Option<Size> {
    // SAFETY: winsize is plain data; ioctl fills it or fails.
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &raw mut ws) };
    (rc == 0 && ws.ws_col > 0 && ws.ws_row > 0).then_some(Size {
        cols: ws.ws_col,
        rows: ws.ws_row,
    })
}

#[cfg(not(unix))]
#[must_use]
pub fn get_size() -> Option<Size> {
    None
}

/// Whether stdin is a terminal. Raw mode is skipped when it is not.
#[cfg(unix)]
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

#[cfg(not(unix))]
#[must_use]
pub fn is_tty() -> bool {
    false
}

// ─── Raw Mode ───────────────────────────────────────────────────────────────

/// Termios as it was before raw mode, for the panic hook.
#[cfg(unix)]
static SAVED_TERMIOS: Mutex<Option<libc::termios>> = Mutex::new(None);

/// stdin in raw mode. Holds what to restore.
#[cfg(unix)]
struct RawMode {
    saved: libc::termios,
}

#[cfg(unix)]
impl RawMode {
    /// Switch stdin to raw mode. `Ok(None)` when stdin is not a terminal.
    fn enable() -> io::Result<Option<Self>> {
        if !is_tty() {
            return Ok(None);
        }

        let mut termios: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(libc::STDIN_FILENO, &raw mut termios) } != 0 {
            return Err(io::Error::last_os_error());
        }
        let saved = termios;

        // cfmakeraw, spelled out. With ISIG off Ctrl+C reaches the input
        // parser as 0x03 instead of killing the process mid-frame.
        termios.c_iflag &= !(libc::IGNBRK
            | libc::BRKINT
            | libc::PARMRK
            | libc::ISTRIP
            | libc::INLCR
            | libc::IGNCR
            | libc::ICRNL
            | libc::IXON);
        termios.c_oflag &= !libc::OPOST;
        termios.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
        termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
        termios.c_cflag |= libc::CS8;
        termios.c_cc[libc::VMIN] = 1;
        termios.c_cc[libc::VTIME] = 0;

        set_termios(&termios)?;
        if let Ok(mut slot) = SAVED_TERMIOS.lock() {
            *slot = Some(saved);
        }
        Ok(Some(Self { saved }))
    }

    fn disable(self) -> io::Result<()> {
        if let Ok(mut slot) = SAVED_TERMIOS.lock() {
            *slot = None;
        }
        set_termios(&self.saved)
    }
}

#[cfg(unix)]
fn set_termios(termios: &libc::termios) -> io::Result<()> {
    if unsafe { libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, termios) } == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

// ─── Panic Hook ─────────────────────────────────────────────────────────────

/// The bytes [`ansi::leave_viewer`] writes, prebuilt for the panic hook.
#[rustfmt::skip]
const EMERGENCY_RESTORE: &[u8] = b"\
    \x1b[?2026l\
    \x1b[?1006l\x1b[?1002l\x1b[?1000l\
    \x1b[0m\
    \x1b[?25h\
    \x1b[?1049l";

static PANIC_HOOK: Once = Once::new();

/// Restore the screen and termios ahead of the default panic message so
/// the message is readable.
fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let default_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            write_emergency_restore();
            #[cfg(unix)]
            if let Ok(slot) = SAVED_TERMIOS.lock() {
                if let Some(saved) = slot.as_ref() {
                    let _ = set_termios(saved);
                }
            }
            default_hook(info);
        }));
    });
}

fn write_emergency_restore() {
    #[cfg(unix)]
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
            EMERGENCY_RESTORE.len(),
        );
    }

    #[cfg(not(unix))]
    {
        let mut out = io::stdout();
        let _ = out.write_all(EMERGENCY_RESTORE);
        let _ = out.flush();
    }
}

// ─── Terminal ───────────────────────────────────────────────────────────────

/// Handle on the controlling terminal. Restores it on drop.
pub struct Terminal {
    #[cfg(unix)]
    raw: Option<RawMode>,
    size: Size,
    active: bool,
}

impl Terminal {
    /// Query the size. The screen is left alone until [`enter`](Self::enter).
    ///
    /// # Errors
    ///
    /// Infallible on unix. The `Result` is for platforms whose console
    /// setup can fail.
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            #[cfg(unix)]
            raw: None,
            size: get_size().unwrap_or(Size::FALLBACK),
            active: false,
        })
    }

    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// Ask the OS again, keeping the last known size if it cannot say.
    pub fn refresh_size(&mut self) -> Size {
        if let Some(size) = get_size() {
            self.size = size;
        }
        self.size
    }

    /// Raw mode plus [`ansi::enter_viewer`]. Does nothing if already active.
    ///
    /// # Errors
    ///
    /// Returns an error if termios or the write to stdout fails.
    pub fn enter(&mut self) -> io::Result<()> {
        if self.active {
            return Ok(());
        }
        install_panic_hook();

        #[cfg(unix)]
        {
            self.raw = RawMode::enable()?;
        }

        let mut out = io::stdout().lock();
        ansi::enter_viewer(&mut out)?;
        out.flush()?;

        self.active = true;
        Ok(())
    }

    /// [`ansi::leave_viewer`], then cooked mode. Does nothing if inactive.
    ///
    /// # Errors
    ///
    /// Returns an error if the write to stdout or termios fails.
    pub fn leave(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;

        {
            let mut out = io::stdout().lock();
            ansi::leave_viewer(&mut out)?;
            out.flush()?;
        }

        #[cfg(unix)]
        if let Some(raw) = self.raw.take() {
            raw.disable()?;
        }
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
