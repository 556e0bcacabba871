// SPDX-License-Identifier: MIT
//
// Canvas palette.
//
// Each entry keeps the server's RGB and the terminal color it quantized
// to. Quantization happens once, here, so painting a frame is a lookup.

use pxview_term::color::{CellColor, Rgb};
use pxview_term::quantize::Quantizer;

use crate::error::InitError;
use crate::protocol::PaletteColor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteEntry {
    pub rgb: Rgb,
    pub term: CellColor,
}

/// Ordered palette; a canvas cell's byte is an index into it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Palette {
    entries: Vec<PaletteEntry>,
}

impl Palette {
    /// Parse and quantize the palette from `/info`.
    ///
    /// # Errors
    ///
    /// [`InitError::InvalidPaletteColor`] for the first entry that is not a
    /// hex color.
    pub fn from_colors(colors: &[PaletteColor], quantizer: &dyn Quantizer) -> Result<Self, InitError> {
        let entries = colors
            .iter()
            .enumerate()
            .map(|(index, color)| {
                let value = color.hex();
                let rgb = Rgb::hex(value).ok_or_else(|| InitError::InvalidPaletteColor {
                    index,
                    value: value.to_owned(),
                })?;
                Ok(PaletteEntry {
                    rgb,
                    term: quantizer.quantize(rgb),
                })
            })
            .collect::<Result<Vec<_>, InitError>>()?;

        tracing::debug!(
            entries = entries.len(),
            quantizer = quantizer.name(),
            "palette quantized"
        );
        Ok(Self { entries })
    }

    /// Entry for a color index, if the palette has one.
    #[inline]
    #[must_use]
    pub fn get(&self, index: u8) -> Option<&PaletteEntry> {
        self.entries.get(usize::from(index))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PaletteEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use pxview_term::quantize::{CubeQuantizer, NearestQuantizer};

    fn hex(s: &str) -> PaletteColor {
        PaletteColor::Hex(s.to_owned())
    }

    #[test]
    fn quantizes_each_entry_in_order() {
        let palette =
            Palette::from_colors(&[hex("#000000"), hex("#FFFFFF")], &CubeQuantizer).unwrap();
        let terms: Vec<_> = palette.iter().map(|e| e.term).collect();
        assert_eq!(terms, vec![CellColor::Ansi256(16), CellColor::Ansi256(231)]);
        assert_eq!(palette.get(1).map(|e| e.rgb), Some(Rgb::WHITE));
    }

    #[test]
    fn named_entries_use_their_value() {
        let colors = [PaletteColor::Named {
            name: "Red".to_owned(),
            value: "ff0000".to_owned(),
        }];
        let palette = Palette::from_colors(&colors, &NearestQuantizer::basic()).unwrap();
        assert_eq!(palette.get(0).map(|e| e.term), Some(CellColor::Ansi256(1)));
    }

    #[test]
    fn invalid_color_reports_index() {
        let err = Palette::from_colors(&[hex("#fff"), hex("nope")], &CubeQuantizer).unwrap_err();
        assert!(matches!(
            err,
            InitError::InvalidPaletteColor { index: 1, ref value } if value == "nope"
        ));
    }

    #[test]
    fn missing_index_is_none() {
        let palette = Palette::from_colors(&[hex("#123456")], &CubeQuantizer).unwrap();
        assert_eq!(palette.len(), 1);
        assert!(palette.get(7).is_none());
    }
}
