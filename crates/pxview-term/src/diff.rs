// SPDX-License-Identifier: MIT
//
// Differential renderer.
//
// The session repaints the whole frame buffer every iteration, but the
// terminal only hears about rows that changed. For each such row the
// renderer rewrites one span: from the first differing cell to the last.
// Pixel updates on a live canvas tend to land a few columns apart, so one
// cursor move plus a short run is cheaper than hopping between cells.
//
// Per frame:
//
//   1. The app paints a FrameBuffer.
//   2. render() compares it row by row with the frame flushed last time
//      and feeds the changed spans through CellWriter.
//   3. flush_to() hands the bytes to the terminal in one write.
//
// The first frame, a resize, or force_redraw() clears the screen and
// writes every row in full. Output is wrapped in synchronized-update
// markers.

use std::io::{self, Write};

use crate::ansi::{self, DecMode};
use crate::buffer::FrameBuffer;
use crate::cell::Cell;
use crate::output::{CellWriter, OutputBuffer};

/// What a render pass did. The event loop traces it per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    /// Cells inside a changed span, sent to the terminal.
    pub cells_rendered: usize,
    /// Cells identical to the previous frame and left alone.
    pub cells_skipped: usize,
    /// Size of the buffered output, escape sequences included.
    pub bytes_written: usize,
}

/// Sends the terminal only what changed since the last frame.
///
/// # Example
///
/// ```
/// use pxview_term::buffer::FrameBuffer;
/// use pxview_term::cell::Cell;
/// use pxview_term::color::CellColor;
/// use pxview_term::diff::DiffRenderer;
///
/// let mut renderer = DiffRenderer::new();
/// let mut frame = FrameBuffer::new(8, 2);
///
/// // The first frame is drawn in full.
/// assert_eq!(renderer.render(&frame).cells_rendered, 16);
///
/// // Afterwards only the changed span goes out.
/// frame.set(3, 1, Cell::blank(CellColor::Ansi256(196)));
/// let stats = renderer.render(&frame);
/// assert_eq!(stats.cells_rendered, 1);
///
/// let mut terminal = Vec::new();
/// renderer.flush_to(&mut terminal)?;
/// assert_eq!(terminal.len(), stats.bytes_written);
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct DiffRenderer {
    /// Escape sequences for the frame being rendered.
    output: OutputBuffer,
    /// Cursor and color tracking; reset at the start of every frame.
    writer: CellWriter,
    /// The frame last rendered. `None` forces a clear and full redraw.
    previous: Option<FrameBuffer>,
}

impl DiffRenderer {
    /// A renderer with no previous frame.
    #[must_use]
    pub fn new() -> Self {
        Self {
            output: OutputBuffer::new(),
            writer: CellWriter::new(),
            previous: None,
        }
    }

    /// Buffer the escape sequences that turn the previous frame into
    /// `current`. Nothing is written until [`flush_to`](Self::flush_to).
    pub fn render(&mut self, current: &FrameBuffer) -> RenderStats {
        self.output.clear();
        self.writer.reset_state();

        let (width, height) = (current.width(), current.height());
        let mut stats = RenderStats::default();
        if width == 0 || height == 0 {
            self.previous = None;
            return stats;
        }

        ansi::set_mode(&mut self.output, DecMode::SyncOutput).ok();

        let previous = self
            .previous
            .take()
            .filter(|prev| prev.width() == width && prev.height() == height);
        if previous.is_none() {
            ansi::clear_screen(&mut self.output).ok();
        }

        for y in 0..height {
            let row = current.row(y).unwrap_or_default();
            let span = match previous.as_ref().and_then(|p| p.row(y)) {
                Some(old) => changed_span(old, row),
                None => Some((0, row.len() - 1)),
            };
            let Some((first, last)) = span else {
                stats.cells_skipped += row.len();
                continue;
            };

            for (x, cell) in (first..=last).zip(&row[first..=last]) {
                #[allow(clippy::cast_possible_truncation)] // x < width (u16)
                self.writer.render_cell(&mut self.output, x as u16, y, cell);
            }
            stats.cells_rendered += last - first + 1;
            stats.cells_skipped += row.len() - (last - first + 1);
        }

        ansi::reset_sgr(&mut self.output).ok();
        ansi::reset_mode(&mut self.output, DecMode::SyncOutput).ok();

        stats.bytes_written = self.output.len();
        self.store(previous, current);
        stats
    }

    /// Write what the last render buffered to `w`, then empty the buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `w` fails.
    pub fn flush_to(&mut self, w: &mut impl Write) -> io::Result<()> {
        self.output.flush_to(w)
    }

    /// Draw everything on the next render.
    pub fn force_redraw(&mut self) {
        self.previous = None;
    }

    /// Keep a copy of `current`, reusing the old allocation when it fits.
    fn store(&mut self, previous: Option<FrameBuffer>, current: &FrameBuffer) {
        self.previous = Some(match previous {
            Some(mut prev) => {
                prev.copy_from(current);
                prev
            }
            None => current.clone(),
        });
    }
}

impl Default for DiffRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// First and last differing column of two equal-length rows. A span that
/// starts on the second half of a wide glyph is widened to include the
/// glyph itself.
fn changed_span(old: &[Cell], new: &[Cell]) -> Option<(usize, usize)> {
    let mut first = old.iter().zip(new).position(|(a, b)| a != b)?;
    let last = old.iter().zip(new).rposition(|(a, b)| a != b)?;
    if first > 0 && new[first].is_continuation() {
        first -= 1;
    }
    Some((first, last))
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::CellColor;
    use pretty_assertions::assert_eq;

    fn render_frame(renderer: &mut DiffRenderer, frame: &FrameBuffer) -> (RenderStats, String) {
        let stats = renderer.render(frame);
        let mut bytes = Vec::new();
        renderer.flush_to(&mut bytes).unwrap();
        let output = String::from_utf8(bytes).unwrap();
        (stats, output)
    }

    #[test]
    fn first_render_draws_all_cells() {
        let mut renderer = DiffRenderer::new();
        let (stats, out) = render_frame(&mut renderer, &FrameBuffer::new(10, 5));
        assert_eq!(stats.cells_rendered, 50);
        assert_eq!(stats.cells_skipped, 0);
        assert!(out.starts_with("\x1b[?2026h\x1b[2J"));
        assert!(out.ends_with("\x1b[0m\x1b[?2026l"));
    }

    #[test]
    fn identical_frame_renders_nothing() {
        let mut renderer = DiffRenderer::new();
        let frame = FrameBuffer::new(8, 4);
        renderer.render(&frame);
        let (stats, out) = render_frame(&mut renderer, &frame);
        assert_eq!(stats.cells_rendered, 0);
        assert_eq!(stats.cells_skipped, 32);
        assert_eq!(out, "\x1b[?2026h\x1b[0m\x1b[?2026l");
    }

    #[test]
    fn single_pixel_change_is_one_cell() {
        let mut renderer = DiffRenderer::new();
        let mut frame = FrameBuffer::new(8, 4);
        renderer.render(&frame);

        frame.set(3, 2, Cell::blank(CellColor::Ansi256(196)));
        let (stats, out) = render_frame(&mut renderer, &frame);
        assert_eq!(stats.cells_rendered, 1);
        assert_eq!(stats.cells_skipped, 31);
        assert!(out.contains("\x1b[3;4H"));
        assert!(out.contains("\x1b[48;5;196m"));
    }

    #[test]
    fn changes_in_one_row_share_a_span() {
        let mut renderer = DiffRenderer::new();
        let mut frame = FrameBuffer::new(10, 2);
        renderer.render(&frame);

        frame.set(2, 1, Cell::blank(CellColor::Ansi256(21)));
        frame.set(6, 1, Cell::blank(CellColor::Ansi256(21)));
        let (stats, out) = render_frame(&mut renderer, &frame);
        assert_eq!(stats.cells_rendered, 5);
        assert_eq!(out.matches('H').count(), 1, "one cursor move: {out:?}");
    }

    #[test]
    fn span_backs_up_to_wide_glyph() {
        let mut frame = FrameBuffer::new(4, 1);
        frame.paint_text(0, 0, "中", CellColor::Default, CellColor::Default);
        let old = frame.row(0).unwrap().to_vec();
        frame.set(1, 0, Cell::continuation(CellColor::WHITE, CellColor::Default));
        assert_eq!(changed_span(&old, frame.row(0).unwrap()), Some((0, 1)));
    }

    #[test]
    fn resize_forces_full_redraw() {
        let mut renderer = DiffRenderer::new();
        renderer.render(&FrameBuffer::new(4, 4));
        let (stats, out) = render_frame(&mut renderer, &FrameBuffer::new(5, 4));
        assert_eq!(stats.cells_rendered, 20);
        assert!(out.contains("\x1b[2J"));
    }

    #[test]
    fn force_redraw_repaints_everything() {
        let mut renderer = DiffRenderer::new();
        let frame = FrameBuffer::new(3, 3);
        renderer.render(&frame);
        renderer.force_redraw();
        let (stats, _) = render_frame(&mut renderer, &frame);
        assert_eq!(stats.cells_rendered, 9);
    }

    #[test]
    fn zero_size_frame_is_empty() {
        let mut renderer = DiffRenderer::new();
        let (stats, out) = render_frame(&mut renderer, &FrameBuffer::new(0, 0));
        assert_eq!(stats, RenderStats::default());
        assert!(out.is_empty());
    }

    #[test]
    fn flush_to_writes_and_clears() {
        let mut renderer = DiffRenderer::new();
        renderer.render(&FrameBuffer::new(2, 1));
        let mut sink = Vec::new();
        renderer.flush_to(&mut sink).unwrap();
        assert!(!sink.is_empty());

        let mut again = Vec::new();
        renderer.flush_to(&mut again).unwrap();
        assert!(again.is_empty());
    }
}
