// SPDX-License-Identifier: MIT
//
// Cell: one character position on screen.
//
// A cell is a codepoint plus foreground and background colors. Canvas
// pixels are blank cells with a background, overlay text is glyphs with a
// foreground laid over whatever background is already there.
//
// Wide characters (CJK, some emoji) occupy two columns. The first cell
// holds the codepoint, the second is a continuation cell (ch = 0) that
// the writer skips when its owner was just drawn.

use crate::color::CellColor;

/// A single terminal cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    /// Unicode codepoint, or 0 for a continuation cell.
    pub ch: u32,
    pub fg: CellColor,
    pub bg: CellColor,
}

impl Cell {
    /// A space with terminal default colors.
    pub const EMPTY: Self = Self {
        ch: b' ' as u32,
        fg: CellColor::Default,
        bg: CellColor::Default,
    };

    /// A cell holding `ch` with default colors.
    #[inline]
    #[must_use]
    pub const fn new(ch: char) -> Self {
        Self {
            ch: ch as u32,
            fg: CellColor::Default,
            bg: CellColor::Default,
        }
    }

    /// A blank cell filled with `bg`.
    #[inline]
    #[must_use]
    pub const fn blank(bg: CellColor) -> Self {
        Self {
            ch: b' ' as u32,
            fg: CellColor::Default,
            bg,
        }
    }

    /// The second column of a wide character.
    #[inline]
    #[must_use]
    pub const fn continuation(fg: CellColor, bg: CellColor) -> Self {
        Self { ch: 0, fg, bg }
    }

    #[inline]
    #[must_use]
    pub const fn with_fg(mut self, fg: CellColor) -> Self {
        self.fg = fg;
        self
    }

    #[inline]
    #[must_use]
    pub const fn with_bg(mut self, bg: CellColor) -> Self {
        self.bg = bg;
        self
    }

    #[inline]
    #[must_use]
    pub const fn is_continuation(&self) -> bool {
        self.ch == 0
    }

    /// The stored character, or `None` for continuation cells and
    /// invalid codepoints.
    #[inline]
    #[must_use]
    pub fn character(&self) -> Option<char> {
        if self.ch == 0 {
            None
        } else {
            char::from_u32(self.ch)
        }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::EMPTY
    }
}
