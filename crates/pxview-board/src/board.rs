// SPDX-License-Identifier: MIT
//
// Canvas state.
//
// A flat row-major grid of palette indices, built once from the snapshot
// and then patched one pixel at a time. The grid never changes size.
//
// Deltas come off the network with signed, unchecked coordinates, so
// `apply` bounds-checks and rejects. Reads through `color_at` are trusted
// (the renderer checks `contains` first) and panic when out of range.

use pxview_term::quantize::Quantizer;

use crate::error::{InitError, OutOfRangeDelta};
use crate::palette::Palette;
use crate::protocol::PaletteColor;

/// One pixel update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelDelta {
    pub x: i64,
    pub y: i64,
    pub color: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    width: usize,
    height: usize,
    cells: Vec<u8>,
}

impl Board {
    /// Build from raw snapshot bytes, where `data[x + y * width]` is `(x, y)`.
    ///
    /// # Errors
    ///
    /// [`InitError::DimensionsOverflow`] if `width * height` does not fit,
    /// [`InitError::SizeMismatch`] if `data` has any other length.
    pub fn from_snapshot(width: usize, height: usize, data: Vec<u8>) -> Result<Self, InitError> {
        let expected = width
            .checked_mul(height)
            .ok_or(InitError::DimensionsOverflow { width, height })?;
        if data.len() != expected {
            return Err(InitError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            cells: data,
        })
    }

    /// `(width, height)`.
    #[inline]
    #[must_use]
    pub const fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Whether signed canvas coordinates fall inside the grid.
    #[must_use]
    pub fn contains(&self, x: i64, y: i64) -> bool {
        let inside = |v: i64, len: usize| usize::try_from(v).is_ok_and(|v| v < len);
        inside(x, self.width) && inside(y, self.height)
    }

    /// Palette index at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the canvas.
    #[inline]
    #[must_use]
    pub fn color_at(&self, x: usize, y: usize) -> u8 {
        assert!(
            x < self.width && y < self.height,
            "({x}, {y}) outside {}x{} canvas",
            self.width,
            self.height
        );
        self.cells[x + y * self.width]
    }

    /// Write one delta.
    ///
    /// # Errors
    ///
    /// [`OutOfRangeDelta`] if the delta's coordinates are outside the
    /// canvas; the board is unchanged.
    pub fn apply(&mut self, delta: PixelDelta) -> Result<(), OutOfRangeDelta> {
        match (usize::try_from(delta.x), usize::try_from(delta.y)) {
            (Ok(x), Ok(y)) if x < self.width && y < self.height => {
                self.cells[x + y * self.width] = delta.color;
                Ok(())
            }
            _ => Err(OutOfRangeDelta {
                x: delta.x,
                y: delta.y,
                width: self.width,
                height: self.height,
            }),
        }
    }
}

/// Build the board and its quantized palette from a snapshot.
///
/// # Errors
///
/// Any [`InitError`] from the grid or the palette.
pub fn initialize(
    width: usize,
    height: usize,
    data: Vec<u8>,
    palette_colors: &[PaletteColor],
    quantizer: &dyn Quantizer,
) -> Result<(Board, Palette), InitError> {
    let board = Board::from_snapshot(width, height, data)?;
    let palette = Palette::from_colors(palette_colors, quantizer)?;
    tracing::info!(width, height, colors = palette.len(), "board initialized");
    Ok((board, palette))
}
