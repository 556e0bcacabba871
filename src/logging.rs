// SPDX-License-Identifier: MIT
//
// The terminal belongs to the canvas, so tracing output only goes to a
// file, and only when one is asked for.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing::Level;

use crate::error::ViewerError;

/// Install the global subscriber writing to `path`. No-op without a path.
///
/// # Errors
///
/// The file cannot be opened, or a subscriber is already installed.
pub fn init(path: Option<&Path>, level: Level) -> Result<(), ViewerError> {
    let Some(path) = path else {
        return Ok(());
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| ViewerError::LogFile {
            path: path.to_path_buf(),
            source,
        })?;

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(level)
        .with_thread_names(true)
        .try_init()
        .map_err(|e| ViewerError::Logging(e.to_string()))?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), %level, "pxview starting");
    Ok(())
}
