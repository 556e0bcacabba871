// SPDX-License-Identifier: MIT
//
// FrameBuffer: the 2D cell grid every frame is painted into.
//
// The viewer clears it, paints canvas pixels as background-only cells,
// lays the status and debug text over them, and hands the result to the
// diff renderer.
//
// Design:
//
//   - Flat `Vec<Cell>` with row-major indexing. A row's cells are
//     contiguous, so the renderer's left-to-right scan is linear.
//
//   - Two text painters. `paint_text` writes glyphs with explicit colors
//     on a single line. `overlay_text` writes glyphs but leaves each cell's
//     background alone, asks the caller for a readable foreground, and
//     wraps at the buffer edge or on `\n`.
//
//   - Wide characters take two columns: the glyph plus a continuation
//     cell (ch = 0). A wide glyph that would straddle the right edge is
//     wrapped (overlay) or replaced by a space (single line).

use unicode_width::UnicodeWidthChar;

use crate::cell::Cell;
use crate::color::CellColor;

/// A 2D buffer of terminal cells.
///
/// ```
/// use pxview_term::buffer::FrameBuffer;
/// use pxview_term::cell::Cell;
///
/// let mut buf = FrameBuffer::new(80, 24);
/// buf.set(5, 3, Cell::new('X'));
/// assert_eq!(buf.get(5, 3).unwrap().character(), Some('X'));
/// assert!(buf.get(80, 0).is_none());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    /// Create a buffer filled with empty cells.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        let size = usize::from(width) * usize::from(height);
        Self {
            width,
            height,
            cells: vec![Cell::EMPTY; size],
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    #[inline]
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    #[inline]
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    #[inline]
    #[must_use]
    pub const fn in_bounds(&self, x: u16, y: u16) -> bool {
        x < self.width && y < self.height
    }

    #[inline]
    const fn index(&self, x: u16, y: u16) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Get a cell, or `None` if out of bounds.
    #[inline]
    #[must_use]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        if self.in_bounds(x, y) {
            Some(&self.cells[self.index(x, y)])
        } else {
            None
        }
    }

    #[inline]
    pub fn get_mut(&mut self, x: u16, y: u16) -> Option<&mut Cell> {
        if self.in_bounds(x, y) {
            let idx = self.index(x, y);
            Some(&mut self.cells[idx])
        } else {
            None
        }
    }

    /// A single row as a slice. Returns `None` if `y` is out of bounds.
    #[inline]
    #[must_use]
    pub fn row(&self, y: u16) -> Option<&[Cell]> {
        if y < self.height {
            let start = self.index(0, y);
            Some(&self.cells[start..start + usize::from(self.width)])
        } else {
            None
        }
    }

    #[inline]
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    // ─── Clear & Resize ──────────────────────────────────────────────────

    /// Reset every cell to a space with default colors.
    pub fn clear(&mut self) {
        self.cells.fill(Cell::EMPTY);
    }

    /// Reset every cell to a blank filled with `bg`.
    pub fn clear_with_bg(&mut self, bg: CellColor) {
        self.cells.fill(Cell::blank(bg));
    }

    /// Resize the buffer, clearing all content.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        let size = usize::from(width) * usize::from(height);
        self.cells.clear();
        self.cells.resize(size, Cell::EMPTY);
    }

    /// Copy another buffer's cells into this one.
    ///
    /// # Panics
    ///
    /// Panics if the dimensions differ.
    pub fn copy_from(&mut self, other: &Self) {
        assert_eq!(
            (self.width, self.height),
            (other.width, other.height),
            "copy_from requires equal dimensions"
        );
        self.cells.copy_from_slice(&other.cells);
    }

    // ─── Cell Writes ─────────────────────────────────────────────────────

    /// Write a cell. Returns `true` if the position was in bounds.
    #[inline]
    pub fn set(&mut self, x: u16, y: u16, cell: Cell) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        let idx = self.index(x, y);
        self.cells[idx] = cell;
        true
    }

    // ─── Text ────────────────────────────────────────────────────────────

    /// Paint `text` on one line starting at `(x, y)` with fixed colors.
    ///
    /// Stops at the right edge. Zero-width characters are skipped.
    /// Returns the number of columns consumed.
    pub fn paint_text(&mut self, x: u16, y: u16, text: &str, fg: CellColor, bg: CellColor) -> u16 {
        if y >= self.height {
            return 0;
        }

        let mut col = x;
        for ch in text.chars() {
            if col >= self.width {
                break;
            }
            let w = char_width(ch);
            if w == 0 {
                continue;
            }
            if w == 2 && col + 1 >= self.width {
                self.set(col, y, Cell::new(' ').with_fg(fg).with_bg(bg));
                col += 1;
                break;
            }

            self.set(col, y, Cell::new(ch).with_fg(fg).with_bg(bg));
            if w == 2 {
                self.set(col + 1, y, Cell::continuation(fg, bg));
            }
            #[allow(clippy::cast_possible_truncation)]
            let w = w as u16;
            col = col.saturating_add(w);
        }

        col.saturating_sub(x)
    }

    /// Lay `text` over existing cells starting at `(x, y)`.
    ///
    /// Each glyph replaces only the character and foreground of its cell;
    /// the background stays whatever was painted before. `fg_for` receives
    /// that background and returns the foreground to draw with.
    ///
    /// Lines wrap back to column `x` when the next glyph would pass the
    /// right edge, and `\n` forces a break. Rows past the bottom edge are
    /// dropped. Returns the number of rows the text spans (0 for an empty
    /// string), counted even when some of them fall off screen.
    pub fn overlay_text(
        &mut self,
        x: u16,
        y: u16,
        text: &str,
        fg_for: impl Fn(CellColor) -> CellColor,
    ) -> u16 {
        if text.is_empty() {
            return 0;
        }

        let width = usize::from(self.width);
        let left = usize::from(x);
        let mut col = left;
        let mut rows: u16 = 1;

        for ch in text.chars() {
            if ch == '\n' {
                col = left;
                rows = rows.saturating_add(1);
                continue;
            }

            let w = char_width(ch);
            // A glyph wider than the space right of `x` can never be shown.
            if w == 0 || left + w > width {
                continue;
            }

            if col + w > width {
                col = left;
                rows = rows.saturating_add(1);
            }

            let row = y.saturating_add(rows - 1);
            #[allow(clippy::cast_possible_truncation)] // col + w <= width (u16)
            let c = col as u16;
            self.overlay_glyph(c, row, ch, w, &fg_for);
            col += w;
        }

        rows
    }

    /// Write one glyph (and its continuation) keeping the background.
    fn overlay_glyph(
        &mut self,
        x: u16,
        y: u16,
        ch: char,
        w: usize,
        fg_for: &impl Fn(CellColor) -> CellColor,
    ) {
        if let Some(cell) = self.get_mut(x, y) {
            cell.ch = ch as u32;
            cell.fg = fg_for(cell.bg);
        }
        if w == 2 {
            if let Some(cell) = self.get_mut(x + 1, y) {
                *cell = Cell::continuation(fg_for(cell.bg), cell.bg);
            }
        }
    }
}

impl std::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FrameBuffer({}x{})", self.width, self.height)
    }
}

/// Display width of a character in terminal columns (0, 1 or 2).
///
/// ```
/// use pxview_term::buffer::char_width;
///
/// assert_eq!(char_width('a'), 1);
/// assert_eq!(char_width('中'), 2);
/// assert_eq!(char_width('\n'), 0);
/// ```
#[inline]
#[must_use]
pub fn char_width(ch: char) -> usize {
    ch.width().unwrap_or(0)
}

/// Display width of a string in terminal columns.
#[must_use]
pub fn string_width(s: &str) -> usize {
    s.chars().map(char_width).sum()
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Row `y` as a string of characters (continuations skipped).
    fn row_text(buf: &FrameBuffer, y: u16) -> String {
        buf.row(y)
            .unwrap()
            .iter()
            .filter_map(Cell::character)
            .collect()
    }

    fn painted(width: u16, height: u16, bg: CellColor) -> FrameBuffer {
        let mut buf = FrameBuffer::new(width, height);
        buf.clear_with_bg(bg);
        buf
    }

    // ── Basics ──────────────────────────────────────────────────────────

    #[test]
    fn new_is_empty() {
        let buf = FrameBuffer::new(4, 3);
        assert_eq!(buf.cells().len(), 12);
        assert!(buf.cells().iter().all(|c| *c == Cell::EMPTY));
    }

    #[test]
    fn set_out_of_bounds_is_rejected() {
        let mut buf = FrameBuffer::new(4, 3);
        assert!(!buf.set(4, 0, Cell::new('x')));
        assert!(!buf.set(0, 3, Cell::new('x')));
        assert!(buf.set(3, 2, Cell::new('x')));
    }

    #[test]
    fn row_is_row_major() {
        let mut buf = FrameBuffer::new(3, 2);
        buf.set(2, 1, Cell::new('z'));
        assert_eq!(buf.row(1).unwrap()[2].character(), Some('z'));
        assert!(buf.row(2).is_none());
    }

    #[test]
    fn clear_with_bg_fills_everything() {
        let buf = painted(3, 3, CellColor::Ansi256(33));
        assert!(buf.cells().iter().all(|c| c.bg == CellColor::Ansi256(33)));
    }

    #[test]
    fn resize_clears() {
        let mut buf = painted(3, 3, CellColor::WHITE);
        buf.resize(5, 1);
        assert_eq!((buf.width(), buf.height()), (5, 1));
        assert!(buf.cells().iter().all(|c| *c == Cell::EMPTY));
    }

    #[test]
    fn copy_from_matches() {
        let src = painted(2, 2, CellColor::BLACK);
        let mut dst = FrameBuffer::new(2, 2);
        dst.copy_from(&src);
        assert_eq!(dst, src);
    }

    // ── paint_text ──────────────────────────────────────────────────────

    #[test]
    fn paint_text_sets_both_colors() {
        let mut buf = FrameBuffer::new(10, 1);
        let n = buf.paint_text(1, 0, "hi", CellColor::WHITE, CellColor::BLACK);
        assert_eq!(n, 2);
        let cell = buf.get(1, 0).unwrap();
        assert_eq!(cell.character(), Some('h'));
        assert_eq!(cell.fg, CellColor::WHITE);
        assert_eq!(cell.bg, CellColor::BLACK);
    }

    #[test]
    fn paint_text_clips_at_edge() {
        let mut buf = FrameBuffer::new(4, 1);
        assert_eq!(buf.paint_text(2, 0, "abcdef", CellColor::WHITE, CellColor::BLACK), 2);
        assert_eq!(row_text(&buf, 0), "  ab");
    }

    #[test]
    fn paint_text_wide_char_at_edge_becomes_space() {
        let mut buf = FrameBuffer::new(3, 1);
        buf.paint_text(2, 0, "中", CellColor::WHITE, CellColor::BLACK);
        assert_eq!(buf.get(2, 0).unwrap().character(), Some(' '));
    }

    #[test]
    fn paint_text_below_buffer_is_noop() {
        let mut buf = FrameBuffer::new(3, 1);
        assert_eq!(buf.paint_text(0, 1, "x", CellColor::WHITE, CellColor::BLACK), 0);
    }

    // ── overlay_text ────────────────────────────────────────────────────

    #[test]
    fn overlay_keeps_background() {
        let mut buf = FrameBuffer::new(6, 2);
        for x in 0..6 {
            let bg = CellColor::Ansi256(16 + u8::try_from(x).unwrap());
            buf.set(x, 0, Cell::blank(bg));
        }
        let before: Vec<CellColor> = buf.row(0).unwrap().iter().map(|c| c.bg).collect();

        buf.overlay_text(0, 0, "(3;4)", |_| CellColor::BLACK);

        let after: Vec<CellColor> = buf.row(0).unwrap().iter().map(|c| c.bg).collect();
        assert_eq!(before, after);
        assert_eq!(row_text(&buf, 0), "(3;4) ");
    }

    #[test]
    fn overlay_fg_is_chosen_from_background() {
        let mut buf = FrameBuffer::new(2, 1);
        buf.set(0, 0, Cell::blank(CellColor::BLACK));
        buf.set(1, 0, Cell::blank(CellColor::WHITE));

        buf.overlay_text(0, 0, "ab", |bg| {
            if bg == CellColor::BLACK { CellColor::WHITE } else { CellColor::BLACK }
        });

        assert_eq!(buf.get(0, 0).unwrap().fg, CellColor::WHITE);
        assert_eq!(buf.get(1, 0).unwrap().fg, CellColor::BLACK);
    }

    #[test]
    fn overlay_wraps_at_width_without_dropping() {
        let mut buf = painted(4, 3, CellColor::WHITE);
        let rows = buf.overlay_text(0, 0, "abcdef", |_| CellColor::BLACK);
        assert_eq!(rows, 2);
        assert_eq!(row_text(&buf, 0), "abcd");
        assert_eq!(row_text(&buf, 1), "ef  ");
    }

    #[test]
    fn overlay_newline_breaks_line() {
        let mut buf = painted(6, 3, CellColor::WHITE);
        let rows = buf.overlay_text(0, 1, "ab\ncd", |_| CellColor::BLACK);
        assert_eq!(rows, 2);
        assert_eq!(row_text(&buf, 1), "ab    ");
        assert_eq!(row_text(&buf, 2), "cd    ");
    }

    #[test]
    fn overlay_drops_rows_past_bottom() {
        let mut buf = painted(3, 1, CellColor::WHITE);
        let rows = buf.overlay_text(0, 0, "abc\ndef", |_| CellColor::BLACK);
        assert_eq!(rows, 2);
        assert_eq!(row_text(&buf, 0), "abc");
    }

    #[test]
    fn overlay_wraps_to_start_column() {
        let mut buf = painted(5, 2, CellColor::WHITE);
        buf.overlay_text(2, 0, "abcd", |_| CellColor::BLACK);
        assert_eq!(row_text(&buf, 0), "  abc");
        assert_eq!(row_text(&buf, 1), "  d  ");
    }

    #[test]
    fn overlay_empty_spans_no_rows() {
        let mut buf = painted(3, 1, CellColor::WHITE);
        assert_eq!(buf.overlay_text(0, 0, "", |_| CellColor::BLACK), 0);
    }

    #[test]
    fn overlay_wide_char_keeps_both_backgrounds() {
        let mut buf = FrameBuffer::new(4, 1);
        buf.set(0, 0, Cell::blank(CellColor::Ansi256(21)));
        buf.set(1, 0, Cell::blank(CellColor::Ansi256(46)));
        buf.overlay_text(0, 0, "中", |_| CellColor::WHITE);

        let first = buf.get(0, 0).unwrap();
        let second = buf.get(1, 0).unwrap();
        assert_eq!(first.character(), Some('中'));
        assert_eq!(first.bg, CellColor::Ansi256(21));
        assert!(second.is_continuation());
        assert_eq!(second.bg, CellColor::Ansi256(46));
    }

    // ── Width helpers ───────────────────────────────────────────────────

    #[test]
    fn string_width_counts_wide() {
        assert_eq!(string_width("a中b"), 4);
        assert_eq!(string_width("Loading..."), 10);
    }
}
