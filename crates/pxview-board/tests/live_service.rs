// SPDX-License-Identifier: MIT
//
// End-to-end against a local mock canvas server: snapshot over HTTP, then
// the websocket reader on its own thread.

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::routing::get;
use pretty_assertions::assert_eq;
use pxview_board::{
    Endpoints, PixelDelta, SnapshotError, StreamError, connect, fetch_snapshot, initialize,
};
use pxview_term::color::CellColor;
use pxview_term::quantize::CubeQuantizer;
use tokio::runtime::Runtime;

const INFO: &str = r##"{"width":2,"height":2,"palette":["#000000","#ffffff",{"name":"red","value":"ff0000"}]}"##;

const TIMEOUT: Duration = Duration::from_secs(5);

async fn stream_socket(mut socket: WebSocket) {
    let frames = [
        r#"{"type":"users","count":12}"#,
        "{ not json",
        r#"{"type":"pixel","count":2,"pixels":[{"x":1,"y":0,"color":2},{"x":0,"y":1,"color":1}]}"#,
    ];
    for frame in frames {
        if socket.send(Message::Text(frame.into())).await.is_err() {
            return;
        }
    }
    let _ = socket.send(Message::Close(None)).await;
}

fn canvas_app() -> Router {
    Router::new()
        .route(
            "/info",
            get(|| async { ([(CONTENT_TYPE, "application/json")], INFO) }),
        )
        .route("/boarddata", get(|| async { vec![0u8, 0, 0, 0] }))
        .route(
            "/ws",
            get(|ws: WebSocketUpgrade| async move {
                ws.on_upgrade(stream_socket).into_response()
            }),
        )
}

fn serve(app: Router) -> (Runtime, SocketAddr) {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap();
    let listener = rt
        .block_on(tokio::net::TcpListener::bind("127.0.0.1:0"))
        .unwrap();
    let addr = listener.local_addr().unwrap();
    rt.spawn(async move { axum::serve(listener, app).await.unwrap() });
    (rt, addr)
}

fn client_runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

#[test]
fn snapshot_then_stream_updates_board() {
    let (_server, addr) = serve(canvas_app());
    let endpoints = Endpoints::new(&addr.to_string(), false);
    let rt = client_runtime();

    let snapshot = rt.block_on(fetch_snapshot(&endpoints)).unwrap();
    assert_eq!((snapshot.info.width, snapshot.info.height), (2, 2));

    let (mut board, palette) = initialize(
        snapshot.info.width,
        snapshot.info.height,
        snapshot.data,
        &snapshot.info.palette,
        &CubeQuantizer,
    )
    .unwrap();
    assert_eq!(palette.get(2).map(|e| e.term), Some(CellColor::Ansi256(196)));

    let conn = rt.block_on(connect(&endpoints)).unwrap();
    let channels = conn.spawn(rt);

    let batch = channels.batches.recv_timeout(TIMEOUT).unwrap();
    assert_eq!(
        batch,
        vec![
            PixelDelta { x: 1, y: 0, color: 2 },
            PixelDelta { x: 0, y: 1, color: 1 },
        ]
    );
    for delta in batch {
        board.apply(delta).unwrap();
    }
    assert_eq!(board.color_at(1, 0), 2);
    assert_eq!(board.color_at(0, 1), 1);
    assert_eq!(board.color_at(1, 1), 0);

    let first = channels.errors.recv_timeout(TIMEOUT).unwrap();
    assert!(matches!(first, StreamError::Decode(_)), "got {first:?}");
    let last = channels.errors.recv_timeout(TIMEOUT).unwrap();
    assert!(matches!(last, StreamError::Closed), "got {last:?}");
}

#[test]
fn missing_info_is_a_status_error() {
    let (_server, addr) = serve(Router::new());
    let endpoints = Endpoints::new(&addr.to_string(), false);

    let err = client_runtime()
        .block_on(fetch_snapshot(&endpoints))
        .unwrap_err();
    match err {
        SnapshotError::Status { url, status } => {
            assert_eq!(status.as_u16(), 404);
            assert!(url.ends_with("/info"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[test]
fn connect_to_closed_port_fails() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let endpoints = Endpoints::new(&addr.to_string(), false);

    let result = client_runtime().block_on(connect(&endpoints));
    assert!(matches!(result, Err(StreamError::Connect(_))));
}

/// A server that completes the TCP handshake and then never says a word.
fn silent_server() -> (std::net::TcpListener, Endpoints) {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let endpoints = Endpoints::new(&addr.to_string(), false)
        .with_timeouts(Duration::from_millis(200), Duration::from_millis(200));
    (listener, endpoints)
}

#[test]
fn stalled_snapshot_times_out() {
    let (_listener, endpoints) = silent_server();

    let err = client_runtime()
        .block_on(fetch_snapshot(&endpoints))
        .unwrap_err();
    match err {
        SnapshotError::Http(e) => assert!(e.is_timeout(), "{e:?}"),
        other => panic!("expected http timeout, got {other:?}"),
    }
}

#[test]
fn stalled_handshake_times_out() {
    let (_listener, endpoints) = silent_server();

    let result = client_runtime().block_on(connect(&endpoints));
    match result {
        Err(StreamError::ConnectTimeout(limit)) => assert_eq!(limit, Duration::from_millis(200)),
        Err(other) => panic!("expected connect timeout, got {other:?}"),
        Ok(_) => panic!("handshake with a silent server succeeded"),
    }
}
