// SPDX-License-Identifier: MIT
//
// Escape sequences, written to any `impl Write`.
//
// Two groups. Per-cell output (cursor moves and SGR colors) is driven by
// `CellWriter`. Screen setup is a handful of DEC private modes that the
// viewer switches on when it takes over the terminal and off again when it
// hands the terminal back; `enter_viewer` and `leave_viewer` own that order.
//
// Coordinates are 0-indexed here and 1-indexed on the wire.

use std::io::{self, Write};

use crate::color::CellColor;

// ─── Cursor and SGR ──────────────────────────────────────────────────────────

/// CUP to `(x, y)`.
#[inline]
pub fn cursor_to(w: &mut impl Write, x: u16, y: u16) -> io::Result<()> {
    write!(w, "\x1b[{};{}H", u32::from(y) + 1, u32::from(x) + 1)
}

/// ED 2.
#[inline]
pub fn clear_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[2J")
}

/// SGR 0. Any color state tracked by the caller is stale afterwards.
#[inline]
pub fn reset_sgr(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[0m")
}

/// Foreground color. The 16 low colors use their short codes (30–37,
/// 90–97), everything else the `38;5;n` form.
pub fn fg(w: &mut impl Write, color: CellColor) -> io::Result<()> {
    sgr_color(w, color, 30, 90, 38)
}

/// Background color, as [`fg`] with 40–47, 100–107 and `48;5;n`.
pub fn bg(w: &mut impl Write, color: CellColor) -> io::Result<()> {
    sgr_color(w, color, 40, 100, 48)
}

fn sgr_color(
    w: &mut impl Write,
    color: CellColor,
    base: u8,
    bright_base: u8,
    extended: u8,
) -> io::Result<()> {
    match color {
        CellColor::Default => write!(w, "\x1b[{}m", base + 9),
        CellColor::Ansi256(idx @ 0..=7) => write!(w, "\x1b[{}m", base + idx),
        CellColor::Ansi256(idx @ 8..=15) => write!(w, "\x1b[{}m", bright_base + idx - 8),
        CellColor::Ansi256(idx) => write!(w, "\x1b[{extended};5;{idx}m"),
    }
}

// ─── DEC Private Modes ───────────────────────────────────────────────────────

/// The private modes the viewer touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecMode {
    CursorVisible,
    /// Button press and release reports.
    MouseClick,
    /// Motion reports while a button is held.
    MouseDrag,
    /// SGR encoding for mouse reports (no 223-column limit).
    MouseSgr,
    AltScreen,
    /// The terminal holds output until the mode is reset, so a frame is
    /// never shown half-written.
    SyncOutput,
}

impl DecMode {
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::CursorVisible => 25,
            Self::MouseClick => 1000,
            Self::MouseDrag => 1002,
            Self::MouseSgr => 1006,
            Self::AltScreen => 1049,
            Self::SyncOutput => 2026,
        }
    }
}

/// DECSET.
#[inline]
pub fn set_mode(w: &mut impl Write, mode: DecMode) -> io::Result<()> {
    write!(w, "\x1b[?{}h", mode.code())
}

/// DECRST.
#[inline]
pub fn reset_mode(w: &mut impl Write, mode: DecMode) -> io::Result<()> {
    write!(w, "\x1b[?{}l", mode.code())
}

const MOUSE_MODES: [DecMode; 3] = [DecMode::MouseClick, DecMode::MouseDrag, DecMode::MouseSgr];

/// Alternate screen, hidden cursor, blank screen, drag tracking.
pub fn enter_viewer(w: &mut impl Write) -> io::Result<()> {
    set_mode(w, DecMode::AltScreen)?;
    reset_mode(w, DecMode::CursorVisible)?;
    clear_screen(w)?;
    for mode in MOUSE_MODES {
        set_mode(w, mode)?;
    }
    Ok(())
}

/// Undo [`enter_viewer`] and any frame left open. Leaving the alternate
/// screen comes last so the shell's screen is not disturbed.
pub fn leave_viewer(w: &mut impl Write) -> io::Result<()> {
    reset_mode(w, DecMode::SyncOutput)?;
    for mode in MOUSE_MODES.iter().rev() {
        reset_mode(w, *mode)?;
    }
    reset_sgr(w)?;
    set_mode(w, DecMode::CursorVisible)?;
    reset_mode(w, DecMode::AltScreen)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn emit(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn cursor_to_is_one_based_and_wide() {
        assert_eq!(emit(|w| cursor_to(w, 10, 20)), "\x1b[21;11H");
        assert_eq!(emit(|w| cursor_to(w, u16::MAX, 0)), "\x1b[1;65536H");
    }

    #[test]
    fn color_encodings() {
        assert_eq!(emit(|w| fg(w, CellColor::Default)), "\x1b[39m");
        assert_eq!(emit(|w| fg(w, CellColor::WHITE)), "\x1b[37m");
        assert_eq!(emit(|w| fg(w, CellColor::Ansi256(9))), "\x1b[91m");
        assert_eq!(emit(|w| fg(w, CellColor::Ansi256(196))), "\x1b[38;5;196m");
        assert_eq!(emit(|w| bg(w, CellColor::Default)), "\x1b[49m");
        assert_eq!(emit(|w| bg(w, CellColor::BLACK)), "\x1b[40m");
        assert_eq!(emit(|w| bg(w, CellColor::Ansi256(15))), "\x1b[107m");
        assert_eq!(emit(|w| bg(w, CellColor::Ansi256(16))), "\x1b[48;5;16m");
    }

    #[test]
    fn enter_turns_on_drag_tracking() {
        assert_eq!(
            emit(|w| enter_viewer(w)),
            "\x1b[?1049h\x1b[?25l\x1b[2J\x1b[?1000h\x1b[?1002h\x1b[?1006h"
        );
    }

    #[test]
    fn leave_reverses_mouse_modes_and_exits_alt_screen_last() {
        assert_eq!(
            emit(|w| leave_viewer(w)),
            "\x1b[?2026l\x1b[?1006l\x1b[?1002l\x1b[?1000l\x1b[0m\x1b[?25h\x1b[?1049l"
        );
    }

    #[test]
    fn sync_output_mode() {
        let s = emit(|w| {
            set_mode(w, DecMode::SyncOutput)?;
            reset_mode(w, DecMode::SyncOutput)
        });
        assert_eq!(s, "\x1b[?2026h\x1b[?2026l");
    }
}
