// SPDX-License-Identifier: MIT
//
// Frame output.
//
// `OutputBuffer` collects a whole frame in memory; it reaches the terminal
// in one write. `CellWriter` turns cells into bytes while tracking where
// the terminal cursor is and which colors are active, and leaves out every
// sequence that would not change what is on screen.
//
// Most of a canvas frame is spaces with a background color. A space shows
// no foreground, so blank cells never emit a foreground change: a run of
// same-colored pixels costs one background SGR and then plain spaces,
// whatever the overlay text around it used.

use std::io::{self, Write};

use crate::ansi;
use crate::buffer::char_width;
use crate::cell::Cell;
use crate::color::CellColor;

// ─── OutputBuffer ────────────────────────────────────────────────────────────

/// One frame of terminal output, written in a single call.
pub struct OutputBuffer {
    /// Escape sequences and UTF-8 text, in order.
    bytes: Vec<u8>,
}

impl OutputBuffer {
    /// Enough for a full redraw of a typical terminal without regrowing.
    const INITIAL_CAPACITY: usize = 32 * 1024;

    #[must_use]
    pub fn new() -> Self {
        Self {
            bytes: Vec::with_capacity(Self::INITIAL_CAPACITY),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Append `cp` as UTF-8; `?` for 0 and invalid codepoints.
    pub fn write_codepoint(&mut self, cp: u32) {
        let ch = char::from_u32(cp).filter(|&c| c != '\0').unwrap_or('?');
        let mut utf8 = [0u8; 4];
        self.bytes.extend_from_slice(ch.encode_utf8(&mut utf8).as_bytes());
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    /// Hand everything to `w`, flush it, and empty the buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `w` fails. The buffer keeps its
    /// contents in that case.
    pub fn flush_to(&mut self, w: &mut impl Write) -> io::Result<()> {
        if self.bytes.is_empty() {
            return Ok(());
        }
        w.write_all(&self.bytes)?;
        w.flush()?;
        self.bytes.clear();
        Ok(())
    }
}

impl Write for OutputBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── CellWriter ──────────────────────────────────────────────────────────────

/// Turns cells into escape sequences, skipping redundant ones.
///
/// The cursor is only moved when the cell is not where the terminal will
/// print next. A continuation cell right after its wide glyph emits
/// nothing; a stray one becomes a space.
///
/// # Example
///
/// ```
/// use pxview_term::cell::Cell;
/// use pxview_term::color::CellColor;
/// use pxview_term::output::{CellWriter, OutputBuffer};
///
/// let mut out = OutputBuffer::new();
/// let mut writer = CellWriter::new();
/// let pixel = Cell::blank(CellColor::Ansi256(196));
///
/// // Two adjacent pixels of one color: one cursor move, one SGR.
/// writer.render_cell(&mut out, 0, 0, &pixel);
/// writer.render_cell(&mut out, 1, 0, &pixel);
/// assert_eq!(out.as_bytes(), b"\x1b[1;1H\x1b[48;5;196m  ");
/// ```
pub struct CellWriter {
    /// Where the next printed character lands, if known.
    next: Option<(u16, u16)>,
    /// Second column of the wide glyph printed last.
    covered: Option<(u16, u16)>,
    /// Foreground last sent; untouched by blank cells.
    fg: Option<CellColor>,
    /// Background last sent.
    bg: Option<CellColor>,
}

impl CellWriter {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: None,
            covered: None,
            fg: None,
            bg: None,
        }
    }

    /// Forget the cursor and colors. Call after anything else wrote to
    /// the terminal.
    pub const fn reset_state(&mut self) {
        *self = Self::new();
    }

    pub fn render_cell(&mut self, out: &mut OutputBuffer, x: u16, y: u16, cell: &Cell) {
        if cell.is_continuation() && self.covered == Some((x, y)) {
            return;
        }
        self.covered = None;

        if self.next != Some((x, y)) {
            ansi::cursor_to(out, x, y).ok();
        }

        if self.bg != Some(cell.bg) {
            ansi::bg(out, cell.bg).ok();
            self.bg = Some(cell.bg);
        }

        let glyph = cell.character().unwrap_or(' ');
        if glyph != ' ' && self.fg != Some(cell.fg) {
            ansi::fg(out, cell.fg).ok();
            self.fg = Some(cell.fg);
        }

        out.write_codepoint(u32::from(glyph));
        if char_width(glyph) == 2 {
            self.covered = Some((x.saturating_add(1), y));
            self.next = Some((x.saturating_add(2), y));
        } else {
            self.next = Some((x.saturating_add(1), y));
        }
    }
}

impl Default for CellWriter {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(out: &OutputBuffer) -> String {
        String::from_utf8(out.as_bytes().to_vec()).unwrap()
    }

    fn render(w: &mut CellWriter, out: &mut OutputBuffer, cells: &[(u16, u16, Cell)]) {
        for (x, y, cell) in cells {
            w.render_cell(out, *x, *y, cell);
        }
    }

    #[test]
    fn codepoints_encode_as_utf8_or_question_mark() {
        let mut out = OutputBuffer::new();
        for cp in ['é' as u32, '中' as u32, 0, 0xD800] {
            out.write_codepoint(cp);
        }
        assert_eq!(text(&out), "é中??");
    }

    #[test]
    fn flush_to_drains() {
        let mut out = OutputBuffer::new();
        out.write_all(b"abc").unwrap();
        let mut sink = Vec::new();
        out.flush_to(&mut sink).unwrap();
        assert_eq!(sink, b"abc");
        assert!(out.is_empty());
    }

    #[test]
    fn pixel_run_is_one_move_one_color() {
        let mut out = OutputBuffer::new();
        let mut w = CellWriter::new();
        let px = Cell::blank(CellColor::Ansi256(196));
        render(&mut w, &mut out, &[(2, 1, px), (3, 1, px), (4, 1, px)]);
        assert_eq!(text(&out), "\x1b[2;3H\x1b[48;5;196m   ");
    }

    #[test]
    fn blank_cells_never_set_foreground() {
        let mut out = OutputBuffer::new();
        let mut w = CellWriter::new();
        let a = Cell::blank(CellColor::WHITE).with_fg(CellColor::BLACK);
        let b = Cell::blank(CellColor::WHITE).with_fg(CellColor::Ansi256(9));
        render(&mut w, &mut out, &[(0, 0, a), (1, 0, b)]);
        assert_eq!(text(&out), "\x1b[1;1H\x1b[47m  ");
    }

    #[test]
    fn text_sets_foreground_once() {
        let mut out = OutputBuffer::new();
        let mut w = CellWriter::new();
        let c = |ch| Cell::new(ch).with_fg(CellColor::BLACK).with_bg(CellColor::WHITE);
        render(&mut w, &mut out, &[(0, 0, c('o')), (1, 0, c('k'))]);
        assert_eq!(text(&out), "\x1b[1;1H\x1b[47m\x1b[30mok");
    }

    #[test]
    fn gap_moves_cursor() {
        let mut out = OutputBuffer::new();
        let mut w = CellWriter::new();
        w.render_cell(&mut out, 0, 0, &Cell::EMPTY);
        out.clear();
        w.render_cell(&mut out, 5, 0, &Cell::EMPTY);
        assert_eq!(text(&out), "\x1b[1;6H ");
    }

    #[test]
    fn continuation_after_wide_glyph_is_skipped() {
        let mut out = OutputBuffer::new();
        let mut w = CellWriter::new();
        w.render_cell(&mut out, 0, 0, &Cell::new('中'));
        let len = out.len();
        w.render_cell(&mut out, 1, 0, &Cell::continuation(CellColor::Default, CellColor::Default));
        assert_eq!(out.len(), len);
        out.clear();
        w.render_cell(&mut out, 2, 0, &Cell::new('a'));
        assert_eq!(text(&out), "a");
    }

    #[test]
    fn stray_continuation_is_a_space() {
        let mut out = OutputBuffer::new();
        let mut w = CellWriter::new();
        w.render_cell(&mut out, 3, 0, &Cell::continuation(CellColor::Default, CellColor::Default));
        assert_eq!(text(&out), "\x1b[1;4H\x1b[49m ");
    }

    #[test]
    fn reset_state_forces_full_emit() {
        let mut out = OutputBuffer::new();
        let mut w = CellWriter::new();
        w.render_cell(&mut out, 0, 0, &Cell::EMPTY);
        w.reset_state();
        out.clear();
        w.render_cell(&mut out, 1, 0, &Cell::EMPTY);
        assert_eq!(text(&out), "\x1b[1;2H\x1b[49m ");
    }
}
