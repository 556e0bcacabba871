// SPDX-License-Identifier: MIT
//
// Error types for board construction and the network clients.

use std::time::Duration;

use tokio_tungstenite::tungstenite;

/// Why a snapshot could not become a board.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("board data is {actual} bytes, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("board dimensions overflow: {width}x{height}")]
    DimensionsOverflow { width: usize, height: usize },

    #[error("palette entry {index} is not a hex color: {value:?}")]
    InvalidPaletteColor { index: usize, value: String },
}

/// A delta pointing outside the canvas. The board is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("pixel ({x}, {y}) outside {width}x{height} canvas")]
pub struct OutOfRangeDelta {
    pub x: i64,
    pub y: i64,
    pub width: usize,
    pub height: usize,
}

/// Failure fetching `/info` or `/boarddata`.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("malformed board info: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure on the live update stream.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("websocket connect failed: {0}")]
    Connect(Box<tungstenite::Error>),

    #[error("websocket connect timed out after {0:?}")]
    ConnectTimeout(Duration),

    #[error("websocket error: {0}")]
    Transport(Box<tungstenite::Error>),

    /// A single frame could not be decoded. The stream keeps going.
    #[error("undecodable message: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("connection closed by server")]
    Closed,
}

impl StreamError {
    /// Whether the reader stops after reporting this error.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::Decode(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_errors_are_not_fatal() {
        let err = serde_json::from_str::<u8>("x").unwrap_err();
        assert!(!StreamError::Decode(err).is_fatal());
        assert!(StreamError::Closed.is_fatal());
    }

    #[test]
    fn out_of_range_message_names_coordinates() {
        let err = OutOfRangeDelta {
            x: -1,
            y: 4,
            width: 2,
            height: 2,
        };
        assert_eq!(err.to_string(), "pixel (-1, 4) outside 2x2 canvas");
    }
}
