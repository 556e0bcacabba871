// SPDX-License-Identifier: MIT
//
// pxview-board: the canvas and everything that talks to the server.
//
// `board` and `palette` hold the canvas in memory. `protocol` describes
// the JSON the server speaks. `snapshot` fetches the initial state over
// HTTP and `stream` keeps it current over a websocket.
//
// Nothing here knows about screens or input. The only terminal concept
// that leaks in is the quantized color each palette entry carries, so the
// renderer never has to quantize per frame.

pub mod board;
pub mod error;
pub mod palette;
pub mod protocol;
pub mod snapshot;
pub mod stream;

pub use board::{Board, PixelDelta, initialize};
pub use error::{InitError, OutOfRangeDelta, SnapshotError, StreamError};
pub use palette::{Palette, PaletteEntry};
pub use snapshot::{CONNECT_TIMEOUT, Endpoints, REQUEST_TIMEOUT, Snapshot, fetch_snapshot};
pub use stream::{Connection, StreamChannels, connect};
