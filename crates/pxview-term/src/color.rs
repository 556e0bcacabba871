// SPDX-License-Identifier: MIT
//
// Color types for the terminal layer.
//
// Two representations, one per side of the pipeline:
//
//   Rgb: a plain 24-bit color as it arrives from the outside world
//   (palette hex strings). Knows how to parse hex, project itself into
//   Oklab for perceptual distance, and report WCAG relative luminance.
//
//   CellColor: what a cell actually stores and what the ANSI writer
//   emits: an index into the terminal's 256-color table or the terminal
//   default. Small, `Copy`, cheap to compare in the diff loop.
//
// The `quantize` module bridges the two.

use std::fmt;

// ─── Rgb ─────────────────────────────────────────────────────────────────────

/// A 24-bit sRGB color.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    #[inline]
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RGB`, `#RRGGBB`, `RGB` or `RRGGBB`.
    ///
    /// Surrounding whitespace is ignored. Returns `None` for anything else,
    /// including alpha forms: a canvas palette has no use for transparency.
    ///
    /// ```
    /// use pxview_term::color::Rgb;
    ///
    /// assert_eq!(Rgb::hex("#ff8000"), Some(Rgb::new(255, 128, 0)));
    /// assert_eq!(Rgb::hex("fff"), Some(Rgb::WHITE));
    /// assert_eq!(Rgb::hex("#zzzzzz"), None);
    /// ```
    #[must_use]
    pub fn hex(s: &str) -> Option<Self> {
        let s = s.trim();
        let s = s.strip_prefix('#').unwrap_or(s);
        let bytes = s.as_bytes();

        match bytes.len() {
            3 => {
                let r = parse_hex_digit(bytes[0])?;
                let g = parse_hex_digit(bytes[1])?;
                let b = parse_hex_digit(bytes[2])?;
                Some(Self::new(r << 4 | r, g << 4 | g, b << 4 | b))
            }
            6 => Some(Self::new(
                parse_hex_byte(&bytes[0..2])?,
                parse_hex_byte(&bytes[2..4])?,
                parse_hex_byte(&bytes[4..6])?,
            )),
            _ => None,
        }
    }

    /// Channels as sRGB floats in `0.0..=1.0`.
    #[inline]
    #[must_use]
    pub fn to_srgb(self) -> (f32, f32, f32) {
        (
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        )
    }

    /// Project into Oklab `(L, a, b)`.
    #[must_use]
    pub fn to_oklab(self) -> (f32, f32, f32) {
        let (r, g, b) = self.to_srgb();
        linear_srgb_to_oklab(srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b))
    }

    /// Squared Euclidean distance in Oklab space.
    ///
    /// Squared is enough for nearest-match comparisons and keeps the
    /// ordering identical to the true distance.
    #[must_use]
    pub fn oklab_distance_sq(self, other: Self) -> f32 {
        let (l1, a1, b1) = self.to_oklab();
        let (l2, a2, b2) = other.to_oklab();
        let dl = l1 - l2;
        let da = a1 - a2;
        let db = b1 - b2;
        db.mul_add(db, dl.mul_add(dl, da * da))
    }

    /// WCAG 2.1 relative luminance in `[0.0, 1.0]`.
    #[must_use]
    pub fn relative_luminance(self) -> f64 {
        let (r, g, b) = self.to_srgb();
        let r_lin = f64::from(srgb_to_linear(r));
        let g_lin = f64::from(srgb_to_linear(g));
        let b_lin = f64::from(srgb_to_linear(b));
        0.2126f64.mul_add(r_lin, 0.7152f64.mul_add(g_lin, 0.0722 * b_lin))
    }
}

impl fmt::Debug for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ─── CellColor ───────────────────────────────────────────────────────────────

/// Compact color for terminal cell storage.
///
/// This is what gets written to the [`FrameBuffer`](crate::buffer::FrameBuffer)
/// and turned into SGR sequences on output.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellColor {
    /// ANSI 256-color palette index. Indices 0–7 are the basic colors every
    /// terminal understands.
    Ansi256(u8),

    /// Terminal default color.
    #[default]
    Default,
}

impl CellColor {
    pub const BLACK: Self = Self::Ansi256(0);
    pub const WHITE: Self = Self::Ansi256(7);

    /// Reference RGB for this color, using xterm's default table.
    ///
    /// Returns `None` for [`CellColor::Default`], whose actual value
    /// depends on the user's terminal theme.
    #[must_use]
    pub fn to_rgb(self) -> Option<Rgb> {
        match self {
            Self::Ansi256(idx) => {
                let (r, g, b) = ansi::ansi256_to_rgb(idx);
                Some(Rgb::new(r, g, b))
            }
            Self::Default => None,
        }
    }

    /// Whether this is the terminal default color.
    #[inline]
    #[must_use]
    pub const fn is_default(self) -> bool {
        matches!(self, Self::Default)
    }
}

impl fmt::Debug for CellColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ansi256(idx) => write!(f, "ansi({idx})"),
            Self::Default => write!(f, "default"),
        }
    }
}

impl fmt::Display for CellColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ─── Color Space Conversion ──────────────────────────────────────────────────
//
// Oklab math by Björn Ottosson. Linear sRGB goes through LMS cone response
// space, then a cube root, then the final Oklab matrix.

/// Convert linear sRGB to Oklab (L, a, b).
#[inline]
fn linear_srgb_to_oklab(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let l = 0.051_445_995f32.mul_add(b, 0.412_221_47f32.mul_add(r, 0.536_332_55 * g));
    let m = 0.107_396_96f32.mul_add(b, 0.211_903_5f32.mul_add(r, 0.680_699_5 * g));
    let s = 0.629_978_7f32.mul_add(b, 0.088_302_46f32.mul_add(r, 0.281_718_84 * g));

    let l_ = l.cbrt();
    let m_ = m.cbrt();
    let s_ = s.cbrt();

    let l_ok = 0.004_072_047f32.mul_add(-s_, 0.210_454_26f32.mul_add(l_, 0.793_617_8 * m_));
    let a = 0.450_593_7f32.mul_add(s_, 1.977_998_5f32.mul_add(l_, -(2.428_592_2 * m_)));
    let b_ok = 0.808_675_77f32.mul_add(-s_, 0.025_904_037f32.mul_add(l_, 0.782_771_77 * m_));

    (l_ok, a, b_ok)
}

/// Convert a single sRGB component to linear sRGB (remove gamma).
#[inline]
#[must_use]
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.040_45 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

// ─── Hex Parsing ─────────────────────────────────────────────────────────────

#[inline]
const fn parse_hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

#[inline]
fn parse_hex_byte(bytes: &[u8]) -> Option<u8> {
    let hi = parse_hex_digit(bytes[0])?;
    let lo = parse_hex_digit(bytes[1])?;
    Some(hi << 4 | lo)
}

// ─── ANSI Palette ────────────────────────────────────────────────────────────

pub mod ansi {
    //! Reference values for the xterm 256-color table.
    //!
    //! - 0–7: standard colors
    //! - 8–15: bright variants
    //! - 16–231: 6×6×6 color cube
    //! - 232–255: 24-step grayscale ramp

    /// The xterm defaults for the 16 low colors.
    pub const ANSI16_RGB: [(u8, u8, u8); 16] = [
        (0, 0, 0),       // 0: Black
        (128, 0, 0),     // 1: Red
        (0, 128, 0),     // 2: Green
        (128, 128, 0),   // 3: Yellow
        (0, 0, 128),     // 4: Blue
        (128, 0, 128),   // 5: Magenta
        (0, 128, 128),   // 6: Cyan
        (192, 192, 192), // 7: White
        (128, 128, 128), // 8: Bright Black
        (255, 0, 0),     // 9: Bright Red
        (0, 255, 0),     // 10: Bright Green
        (255, 255, 0),   // 11: Bright Yellow
        (0, 0, 255),     // 12: Bright Blue
        (255, 0, 255),   // 13: Bright Magenta
        (0, 255, 255),   // 14: Bright Cyan
        (255, 255, 255), // 15: Bright White
    ];

    /// Channel values of the six cube levels.
    pub const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

    /// Convert an ANSI-256 palette index to RGB values.
    #[must_use]
    pub const fn ansi256_to_rgb(idx: u8) -> (u8, u8, u8) {
        match idx {
            0..=15 => ANSI16_RGB[idx as usize],
            16..=231 => {
                let i = idx - 16;
                (
                    CUBE_LEVELS[(i / 36) as usize],
                    CUBE_LEVELS[((i % 36) / 6) as usize],
                    CUBE_LEVELS[(i % 6) as usize],
                )
            }
            232..=255 => {
                let v = 8 + 10 * (idx - 232);
                (v, v, v)
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
