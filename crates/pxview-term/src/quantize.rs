// SPDX-License-Identifier: MIT
//
// Color quantization: 24-bit RGB onto the terminal's color vocabulary.
//
// Canvas palettes are arbitrary RGB, terminals are not. Two strategies
// sit behind one trait and are picked once at startup:
//
//   CubeQuantizer: for 256-color terminals. Each channel is rounded to
//   one of six levels and the three levels index straight into the 6×6×6
//   cube at 16..=231. Integer math, no search.
//
//   NearestQuantizer: for terminals that only know the 8 basic colors.
//   Linear scan over a fixed candidate table, minimizing Oklab distance.
//   Ties keep the earlier candidate, so the result only depends on table
//   order.
//
// Both are pure and total: every RGB triple maps to some color.

use std::env;

use crate::color::{CellColor, Rgb};

// ─── Quantizer ───────────────────────────────────────────────────────────────

/// Maps an RGB color to the closest color the terminal can display.
pub trait Quantizer: Send + Sync {
    fn quantize(&self, rgb: Rgb) -> CellColor;

    /// Short name for logs and the `--colors` flag.
    fn name(&self) -> &'static str;
}

// ─── Cube ────────────────────────────────────────────────────────────────────

/// First palette index of the 6×6×6 cube (16 reserved low colors precede it).
const CUBE_BASE: u16 = 16;

/// 256-color strategy: round each channel into the 6×6×6 cube.
#[derive(Debug, Clone, Copy, Default)]
pub struct CubeQuantizer;

impl CubeQuantizer {
    /// Round an 8-bit channel to a cube level in `0..=5`.
    #[inline]
    const fn level(channel: u8) -> u16 {
        (channel as u16 * 5 + 127) / 255
    }
}

impl Quantizer for CubeQuantizer {
    fn quantize(&self, rgb: Rgb) -> CellColor {
        let idx = CUBE_BASE
            + 36 * Self::level(rgb.r)
            + 6 * Self::level(rgb.g)
            + Self::level(rgb.b);
        // Max is 16 + 215 = 231.
        #[allow(clippy::cast_possible_truncation)]
        CellColor::Ansi256(idx as u8)
    }

    fn name(&self) -> &'static str {
        "256"
    }
}

// ─── Nearest ─────────────────────────────────────────────────────────────────

/// The eight basic colors as pure primaries, in ANSI index order.
pub const BASIC_COLORS: [(Rgb, u8); 8] = [
    (Rgb::new(0, 0, 0), 0),
    (Rgb::new(255, 0, 0), 1),
    (Rgb::new(0, 255, 0), 2),
    (Rgb::new(255, 255, 0), 3),
    (Rgb::new(0, 0, 255), 4),
    (Rgb::new(255, 0, 255), 5),
    (Rgb::new(0, 255, 255), 6),
    (Rgb::new(255, 255, 255), 7),
];

/// Limited-color strategy: nearest candidate by Oklab distance.
#[derive(Debug, Clone)]
pub struct NearestQuantizer {
    candidates: Vec<(Rgb, u8)>,
}

impl NearestQuantizer {
    /// Quantizer over the eight basic colors.
    #[must_use]
    pub fn basic() -> Self {
        Self::with_candidates(BASIC_COLORS.to_vec())
    }

    /// Quantizer over an arbitrary `(reference RGB, ANSI index)` table.
    ///
    /// An empty table maps everything to the terminal default.
    #[must_use]
    pub const fn with_candidates(candidates: Vec<(Rgb, u8)>) -> Self {
        Self { candidates }
    }
}

impl Quantizer for NearestQuantizer {
    fn quantize(&self, rgb: Rgb) -> CellColor {
        let mut best: Option<(f32, u8)> = None;

        for &(candidate, idx) in &self.candidates {
            let dist = rgb.oklab_distance_sq(candidate);
            // Strict `<`: on a tie the earlier candidate stays.
            if best.is_none_or(|(best_dist, _)| dist < best_dist) {
                best = Some((dist, idx));
            }
        }

        best.map_or(CellColor::Default, |(_, idx)| CellColor::Ansi256(idx))
    }

    fn name(&self) -> &'static str {
        "8"
    }
}

// ─── Capability Detection ────────────────────────────────────────────────────

/// How many colors the output terminal can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSupport {
    /// xterm 256-color table.
    Ansi256,
    /// Only the 8 basic colors.
    Ansi8,
}

/// `TERM` values known to be limited to the basic colors.
const BASIC_TERMS: &[&str] = &["dumb", "linux", "vt100", "vt220", "ansi", "cons25"];

impl ColorSupport {
    /// Detect support from the process environment.
    #[must_use]
    pub fn detect() -> Self {
        let term = env::var("TERM").ok();
        let colorterm = env::var("COLORTERM").ok();
        Self::detect_from(term.as_deref(), colorterm.as_deref())
    }

    /// Detect support from explicit `TERM` / `COLORTERM` values.
    ///
    /// `COLORTERM` being set at all means a modern emulator. Without it,
    /// `TERM` decides: missing or a known console type means 8 colors,
    /// anything else is assumed to handle 256.
    #[must_use]
    pub fn detect_from(term: Option<&str>, colorterm: Option<&str>) -> Self {
        if colorterm.is_some_and(|c| !c.trim().is_empty()) {
            return Self::Ansi256;
        }

        let Some(term) = term.map(str::trim).filter(|t| !t.is_empty()) else {
            return Self::Ansi8;
        };

        if ["256color", "truecolor", "direct"]
            .iter()
            .any(|suffix| term.contains(suffix))
        {
            return Self::Ansi256;
        }

        if BASIC_TERMS.contains(&term) {
            Self::Ansi8
        } else {
            Self::Ansi256
        }
    }

    /// The quantizer matching this level of support.
    #[must_use]
    pub fn quantizer(self) -> Box<dyn Quantizer> {
        match self {
            Self::Ansi256 => Box::new(CubeQuantizer),
            Self::Ansi8 => Box::new(NearestQuantizer::basic()),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
