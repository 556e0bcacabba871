// SPDX-License-Identifier: MIT
//
// pxview: watch a pxls canvas live in the terminal.
//
// The binary wires the two library crates together:
//
//   pxview-term  → terminal control, input, frame diffing, event loop
//   pxview-board → canvas state, palette, HTTP snapshot, websocket stream
//
// Startup order:
//
//   1. enter the alternate screen
//   2. start the loader thread: GET /info and /boarddata, build the board
//      and quantized palette, open the websocket
//   3. run the event loop with the Session as the App; it shows
//      "Loading..." and accepts quit until the loader delivers
//
// A failed load ends the loop and is fatal. The terminal is always
// restored before an error is printed.

mod config;
mod debug_log;
mod error;
mod loader;
mod logging;
mod render;
mod session;
mod viewport;

use std::process;

use pxview_board::Endpoints;
use pxview_term::event_loop::EventLoop;

use crate::config::Config;
use crate::error::ViewerError;
use crate::session::Session;

fn main() {
    let config = Config::from_args();

    if let Err(e) = logging::init(config.log_file.as_deref(), config.log_level) {
        eprintln!("pxview: {e}");
        process::exit(1);
    }

    let mut event_loop = EventLoop::new(config.loop_config).unwrap_or_else(|e| {
        eprintln!("pxview: failed to initialize terminal: {e}");
        process::exit(1);
    });

    let result = run(&config, &mut event_loop);

    if let Err(e) = event_loop.leave() {
        eprintln!("pxview: failed to restore terminal: {e}");
    }

    if let Err(e) = result {
        tracing::error!(error = %e, "exiting");
        eprintln!("pxview: {e}");
        process::exit(1);
    }
}

fn run(config: &Config, event_loop: &mut EventLoop) -> Result<(), ViewerError> {
    let mut session = Session::new(config.viewport, config.debug_lines, config.exit_on_disconnect);

    event_loop.enter()?;

    let support = config.colors.support();
    let quantizer = support.quantizer();
    let endpoints = Endpoints::new(&config.host, config.secure);
    tracing::info!(
        http = %endpoints.http_base,
        ws = %endpoints.ws_url,
        colors = quantizer.name(),
        "connecting"
    );

    session.await_canvas(loader::spawn(endpoints, quantizer));

    event_loop.run(&mut session)?;
    tracing::info!(state = ?session.state(), "session finished");

    session.take_exit_error().map_or(Ok(()), Err)
}
