// SPDX-License-Identifier: MIT
//
// Wire format.
//
// `/info` answers with the canvas dimensions and palette. The websocket
// sends JSON messages tagged by `type`; only `pixel` messages matter to a
// viewer, everything else (user counts, alerts, cooldowns) is skipped.
//
// Servers differ in key casing, so every field also accepts its
// capitalized spelling.

use serde::Deserialize;

use crate::board::PixelDelta;

/// Body of `GET /info`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BoardInfo {
    #[serde(alias = "Width")]
    pub width: usize,
    #[serde(alias = "Height")]
    pub height: usize,
    #[serde(default, alias = "Palette")]
    pub palette: Vec<PaletteColor>,
}

/// One palette entry, either a bare hex string or a named object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PaletteColor {
    Hex(String),
    Named {
        #[serde(default, alias = "Name")]
        name: String,
        #[serde(alias = "Value")]
        value: String,
    },
}

impl PaletteColor {
    /// The hex text, `#` optional.
    #[must_use]
    pub fn hex(&self) -> &str {
        match self {
            Self::Hex(value) | Self::Named { value, .. } => value,
        }
    }
}

/// A websocket message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StreamMessage {
    #[serde(rename = "type", alias = "Type")]
    pub kind: String,
    #[serde(default, alias = "Count")]
    pub count: Option<u64>,
    #[serde(default, alias = "Pixels")]
    pub pixels: Vec<WirePixel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WirePixel {
    #[serde(alias = "X")]
    pub x: i64,
    #[serde(alias = "Y")]
    pub y: i64,
    #[serde(alias = "Color")]
    pub color: u8,
}

impl From<WirePixel> for PixelDelta {
    fn from(p: WirePixel) -> Self {
        Self {
            x: p.x,
            y: p.y,
            color: p.color,
        }
    }
}

pub const PIXEL_MESSAGE: &str = "pixel";

/// Decode one message.
///
/// `Ok(Some(batch))` for a pixel message, deltas in listed order.
/// `Ok(None)` for any other well-formed message.
///
/// # Errors
///
/// Malformed JSON or a pixel with out-of-type fields.
pub fn decode(text: &str) -> Result<Option<Vec<PixelDelta>>, serde_json::Error> {
    let msg: StreamMessage = serde_json::from_str(text)?;
    if msg.kind != PIXEL_MESSAGE {
        tracing::debug!(kind = %msg.kind, "ignoring stream message");
        return Ok(None);
    }
    Ok(Some(msg.pixels.into_iter().map(PixelDelta::from).collect()))
}
