// SPDX-License-Identifier: MIT
//
// Initial state over HTTP: `/info` for dimensions and palette, then
// `/boarddata` for the raw grid. Any failure here is fatal to startup, so
// there is no retry. Both requests are bounded by the endpoint timeouts:
// a server that accepts and then stalls fails startup instead of hanging
// it.

use std::time::Duration;

use crate::error::SnapshotError;
use crate::protocol::BoardInfo;

/// Default bound on opening a TCP connection or websocket handshake.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default bound on one HTTP request, body included. `/boarddata` on a
/// large canvas is a few megabytes.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Server URLs derived from a host name, and how long to wait on them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub http_base: String,
    pub ws_url: String,
    /// TCP connect for HTTP; connect plus handshake for the websocket.
    pub connect_timeout: Duration,
    /// Whole HTTP request, from connect to the last body byte.
    pub request_timeout: Duration,
}

impl Endpoints {
    /// `https://host` and `wss://host/ws` when `secure`, plain otherwise.
    #[must_use]
    pub fn new(host: &str, secure: bool) -> Self {
        let host = host.trim().trim_end_matches('/');
        let (http, ws) = if secure { ("https", "wss") } else { ("http", "ws") };
        Self {
            http_base: format!("{http}://{host}"),
            ws_url: format!("{ws}://{host}/ws"),
            connect_timeout: CONNECT_TIMEOUT,
            request_timeout: REQUEST_TIMEOUT,
        }
    }

    /// Replace both timeouts.
    #[must_use]
    pub const fn with_timeouts(mut self, connect: Duration, request: Duration) -> Self {
        self.connect_timeout = connect;
        self.request_timeout = request;
        self
    }

    #[must_use]
    pub fn info_url(&self) -> String {
        format!("{}/info", self.http_base)
    }

    #[must_use]
    pub fn board_url(&self) -> String {
        format!("{}/boarddata", self.http_base)
    }
}

/// Everything needed to build the board.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub info: BoardInfo,
    pub data: Vec<u8>,
}

/// Fetch `/info` and `/boarddata`.
///
/// Byte length is not checked here; `initialize` does that.
///
/// # Errors
///
/// Network failures and timeouts, non-2xx responses and malformed
/// `/info` JSON.
pub async fn fetch_snapshot(endpoints: &Endpoints) -> Result<Snapshot, SnapshotError> {
    let client = reqwest::Client::builder()
        .connect_timeout(endpoints.connect_timeout)
        .timeout(endpoints.request_timeout)
        .build()?;

    let info_bytes = get_bytes(&client, &endpoints.info_url()).await?;
    let info: BoardInfo = serde_json::from_slice(&info_bytes)?;
    tracing::info!(
        width = info.width,
        height = info.height,
        colors = info.palette.len(),
        "fetched board info"
    );

    let data = get_bytes(&client, &endpoints.board_url()).await?;
    tracing::info!(bytes = data.len(), "fetched board data");

    Ok(Snapshot { info, data })
}

async fn get_bytes(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, SnapshotError> {
    tracing::debug!(url, "GET");
    let resp = client.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(SnapshotError::Status {
            url: url.to_owned(),
            status,
        });
    }
    Ok(resp.bytes().await?.to_vec())
}
