// SPDX-License-Identifier: MIT

use std::io;
use std::path::PathBuf;

use pxview_board::{InitError, SnapshotError, StreamError};

/// Anything that ends the viewer with a non-zero exit.
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("terminal: {0}")]
    Terminal(#[from] io::Error),

    #[error("async runtime: {0}")]
    Runtime(#[source] io::Error),

    #[error("could not open log file {}: {source}", path.display())]
    LogFile { path: PathBuf, source: io::Error },

    #[error("logging: {0}")]
    Logging(String),

    #[error("could not load canvas: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("invalid canvas: {0}")]
    Init(#[from] InitError),

    #[error("{0}")]
    Stream(#[from] StreamError),

    #[error("canvas loader stopped without a result")]
    LoaderGone,

    /// The stream ended and `--exit-on-disconnect` was set.
    #[error("disconnected: {0}")]
    Disconnected(String),
}
