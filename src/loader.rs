// SPDX-License-Identifier: MIT
//
// Canvas loading, off the UI thread.
//
// Snapshot, board construction and the websocket handshake all block on
// the network. They run on a `canvas-loader` thread so the event loop can
// start right away: the session shows "Loading..." and still honors quit
// while the server is slow or silent. The outcome arrives once on a std
// channel. On success the connection has already moved to the stream
// reader thread.

use std::sync::mpsc::{self, Receiver};
use std::thread;

use pxview_board::{Board, Endpoints, Palette, StreamChannels, connect, fetch_snapshot, initialize};
use pxview_term::quantize::Quantizer;

use crate::error::ViewerError;

/// A ready canvas and its live stream.
pub struct Loaded {
    pub board: Board,
    pub palette: Palette,
    pub stream: StreamChannels,
}

/// Where the session waits for the loader.
pub type Pending = Receiver<Result<Loaded, ViewerError>>;

/// Start loading on a background thread.
///
/// If the receiver is dropped before the load finishes, the result is
/// discarded and the thread exits.
///
/// # Panics
///
/// Panics if the OS cannot spawn a thread.
#[must_use]
pub fn spawn(endpoints: Endpoints, quantizer: Box<dyn Quantizer>) -> Pending {
    let (tx, rx) = mpsc::channel();

    thread::Builder::new()
        .name("canvas-loader".into())
        .spawn(move || {
            let outcome = load(&endpoints, quantizer.as_ref());
            if let Err(e) = &outcome {
                tracing::warn!(error = %e, "loading canvas failed");
            }
            let _ = tx.send(outcome);
        })
        .expect("failed to spawn canvas loader thread");

    rx
}

fn load(endpoints: &Endpoints, quantizer: &dyn Quantizer) -> Result<Loaded, ViewerError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(ViewerError::Runtime)?;

    let snapshot = runtime.block_on(fetch_snapshot(endpoints))?;
    let (board, palette) = initialize(
        snapshot.info.width,
        snapshot.info.height,
        snapshot.data,
        &snapshot.info.palette,
        quantizer,
    )?;

    let connection = runtime.block_on(connect(endpoints))?;
    Ok(Loaded {
        board,
        palette,
        stream: connection.spawn(runtime),
    })
}
