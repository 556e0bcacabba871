// SPDX-License-Identifier: MIT
//
// Live update stream.
//
// After the snapshot, a websocket delivers pixel batches. The reader runs
// on its own thread driving a current-thread tokio runtime, and hands
// results to the UI thread over two std channels: decoded batches on one,
// errors on the other. The UI never awaits anything.
//
// A frame that fails to decode is reported and skipped. A transport error,
// a close frame or the end of the stream is reported once and ends the
// reader. There is no reconnect.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::board::PixelDelta;
use crate::error::StreamError;
use crate::protocol;
use crate::snapshot::Endpoints;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// An open websocket, not yet being read.
pub struct Connection {
    ws: WsStream,
}

/// Receiving ends handed to the UI thread.
pub struct StreamChannels {
    pub batches: Receiver<Vec<PixelDelta>>,
    pub errors: Receiver<StreamError>,
}

/// Open the websocket, giving up after `endpoints.connect_timeout`.
///
/// # Errors
///
/// [`StreamError::Connect`] if the handshake fails,
/// [`StreamError::ConnectTimeout`] if it does not finish in time.
pub async fn connect(endpoints: &Endpoints) -> Result<Connection, StreamError> {
    let limit = endpoints.connect_timeout;
    let (ws, response) = tokio::time::timeout(limit, connect_async(endpoints.ws_url.as_str()))
        .await
        .map_err(|_| StreamError::ConnectTimeout(limit))?
        .map_err(|e| StreamError::Connect(Box::new(e)))?;
    tracing::info!(url = %endpoints.ws_url, status = %response.status(), "stream connected");
    Ok(Connection { ws })
}

impl Connection {
    /// Read until the stream ends, forwarding batches and errors.
    ///
    /// Returns early if the UI side hangs up.
    pub async fn pump(self, batches: &Sender<Vec<PixelDelta>>, errors: &Sender<StreamError>) {
        let mut ws = self.ws;

        while let Some(next) = ws.next().await {
            let keep_going = match next {
                Ok(Message::Text(text)) => deliver(text.as_str(), batches, errors),
                Ok(Message::Binary(bytes)) => match std::str::from_utf8(&bytes) {
                    Ok(text) => deliver(text, batches, errors),
                    Err(_) => {
                        tracing::debug!(len = bytes.len(), "ignoring non-UTF-8 binary frame");
                        true
                    }
                },
                Ok(Message::Close(frame)) => {
                    tracing::info!(?frame, "stream closed by server");
                    let _ = errors.send(StreamError::Closed);
                    return;
                }
                Ok(_) => true,
                Err(e) => {
                    tracing::warn!(error = %e, "stream transport error");
                    let _ = errors.send(StreamError::Transport(Box::new(e)));
                    return;
                }
            };
            if !keep_going {
                tracing::debug!("stream receivers dropped, stopping reader");
                return;
            }
        }

        tracing::info!("stream ended");
        let _ = errors.send(StreamError::Closed);
    }

    /// Move the connection onto a `stream-reader` thread that drives
    /// `runtime` until the stream ends.
    ///
    /// The thread is detached; the process may exit while it is blocked.
    ///
    /// # Panics
    ///
    /// Panics if the OS cannot spawn a thread.
    #[must_use]
    pub fn spawn(self, runtime: tokio::runtime::Runtime) -> StreamChannels {
        let (batch_tx, batches) = mpsc::channel();
        let (error_tx, errors) = mpsc::channel();

        thread::Builder::new()
            .name("stream-reader".into())
            .spawn(move || runtime.block_on(self.pump(&batch_tx, &error_tx)))
            .expect("failed to spawn stream reader thread");

        StreamChannels { batches, errors }
    }
}

/// Decode one frame and forward the result. `false` once the UI is gone.
fn deliver(
    text: &str,
    batches: &Sender<Vec<PixelDelta>>,
    errors: &Sender<StreamError>,
) -> bool {
    match protocol::decode(text) {
        Ok(Some(batch)) => {
            tracing::trace!(pixels = batch.len(), "pixel batch");
            batches.send(batch).is_ok()
        }
        Ok(None) => true,
        Err(e) => {
            tracing::warn!(error = %e, "undecodable stream message");
            errors.send(StreamError::Decode(e)).is_ok()
        }
    }
}
