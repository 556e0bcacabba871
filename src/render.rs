// SPDX-License-Identifier: MIT
//
// Frame painting.
//
// Two screens. Before the snapshot arrives: a centered "Loading..." on
// black. After: the visible part of the canvas, two terminal columns per
// canvas pixel, with the status line and debug log laid over it.
//
// Overlay text never changes a background. Each glyph takes black or
// white, whichever contrasts more with the pixel under it.

use pxview_board::{Board, Palette};
use pxview_term::buffer::{FrameBuffer, string_width};
use pxview_term::cell::Cell;
use pxview_term::color::{CellColor, Rgb};

use crate::debug_log::DebugLog;
use crate::session::ConnectionState;
use crate::viewport::Viewport;

/// Fill for everything outside the canvas.
pub const BACKGROUND: CellColor = CellColor::WHITE;
const FOREGROUND: CellColor = CellColor::BLACK;

const LOADING: &str = "Loading...";

// ─── Loading ─────────────────────────────────────────────────────────────────

pub fn paint_loading(frame: &mut FrameBuffer) {
    frame.clear_with_bg(CellColor::BLACK);
    let width = u16::try_from(string_width(LOADING)).unwrap_or(u16::MAX);
    let x = frame.width().saturating_sub(width) / 2;
    let y = frame.height() / 2;
    frame.paint_text(x, y, LOADING, CellColor::WHITE, CellColor::BLACK);
}

// ─── Canvas ──────────────────────────────────────────────────────────────────

/// Paint the canvas under `viewport` across the whole frame.
///
/// An odd last column keeps the background.
pub fn paint_canvas(frame: &mut FrameBuffer, board: &Board, palette: &Palette, viewport: &Viewport) {
    frame.clear_with_bg(BACKGROUND);

    for y in 0..frame.height() {
        let by = i64::from(viewport.offset_y) + i64::from(y);
        for px in 0..frame.width() / 2 {
            let bx = i64::from(viewport.offset_x) + i64::from(px);
            let cell = Cell::blank(pixel_color(board, palette, bx, by)).with_fg(FOREGROUND);
            frame.set(px * 2, y, cell);
            frame.set(px * 2 + 1, y, cell);
        }
    }
}

/// Terminal color of canvas pixel `(x, y)`; background when off the canvas
/// or when the index has no palette entry.
fn pixel_color(board: &Board, palette: &Palette, x: i64, y: i64) -> CellColor {
    if !board.contains(x, y) {
        return BACKGROUND;
    }
    let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y)) else {
        return BACKGROUND;
    };
    palette
        .get(board.color_at(x, y))
        .map_or(BACKGROUND, |entry| entry.term)
}

// ─── Overlay ─────────────────────────────────────────────────────────────────

/// Black or white, whichever has the higher WCAG contrast against `bg`.
/// The terminal default background is assumed dark.
#[must_use]
pub fn overlay_fg(bg: CellColor) -> CellColor {
    let lum = bg.to_rgb().unwrap_or(Rgb::BLACK).relative_luminance();
    let against_black = (lum + 0.05) / 0.05;
    let against_white = 1.05 / (lum + 0.05);
    if against_black >= against_white {
        CellColor::BLACK
    } else {
        CellColor::WHITE
    }
}

/// `(x;y)`, plus the reason once the stream has ended.
#[must_use]
pub fn status_line(viewport: &Viewport, state: &ConnectionState) -> String {
    let position = format!("({};{})", viewport.offset_x, viewport.offset_y);
    match state {
        ConnectionState::Closed => format!("{position} disconnected: connection closed"),
        ConnectionState::Errored(reason) => format!("{position} disconnected: {reason}"),
        ConnectionState::NotConnected | ConnectionState::Connected => position,
    }
}

/// Status at row 0, debug log beneath it.
pub fn paint_overlay(frame: &mut FrameBuffer, status: &str, log: &DebugLog) {
    let rows = frame.overlay_text(0, 0, status, overlay_fg);
    if !log.is_empty() {
        frame.overlay_text(0, rows.max(1), &log.text(), overlay_fg);
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
