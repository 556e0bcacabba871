// SPDX-License-Identifier: MIT
//
// Command line and environment.
//
// `Cli` is what clap parses; `Config` is what the rest of the binary
// reads. The split keeps clap attributes out of everything else.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use pxview_term::event_loop::LoopConfig;
use pxview_term::quantize::ColorSupport;
use tracing::Level;

use crate::viewport::ViewportPolicy;

#[derive(Parser, Debug)]
#[command(name = "pxview", version, about = "Watch a pxls canvas live in your terminal")]
pub struct Cli {
    /// Canvas server host, optionally with a port.
    #[arg(long, env = "PXVIEW_HOST", default_value = "pxls.space")]
    host: String,

    /// Use https/wss instead of http/ws.
    #[arg(long, env = "PXVIEW_SECURE", default_value_t = true, action = clap::ArgAction::Set)]
    secure: bool,

    /// Terminal color vocabulary; `auto` inspects TERM and COLORTERM.
    #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
    colors: ColorMode,

    /// Frame cap. 0 renders as fast as possible.
    #[arg(long, default_value_t = 120)]
    fps: u32,

    /// Canvas pixels moved per arrow key press.
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(i32).range(1..))]
    pan_step: i32,

    /// Lines kept in the on-screen debug log.
    #[arg(long, default_value_t = 8)]
    debug_lines: usize,

    /// Quit with an error when the update stream ends.
    #[arg(long)]
    exit_on_disconnect: bool,

    /// Write tracing output here. Without it nothing is logged.
    #[arg(long, env = "PXVIEW_LOG_FILE")]
    log_file: Option<PathBuf>,

    #[arg(long, default_value_t = Level::INFO)]
    log_level: Level,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    #[value(name = "256")]
    Ansi256,
    #[value(name = "8")]
    Ansi8,
}

impl ColorMode {
    /// Resolve `Auto` against the environment.
    #[must_use]
    pub fn support(self) -> ColorSupport {
        match self {
            Self::Auto => ColorSupport::detect(),
            Self::Ansi256 => ColorSupport::Ansi256,
            Self::Ansi8 => ColorSupport::Ansi8,
        }
    }
}

/// Resolved settings.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub secure: bool,
    pub colors: ColorMode,
    pub loop_config: LoopConfig,
    pub viewport: ViewportPolicy,
    pub debug_lines: usize,
    pub exit_on_disconnect: bool,
    pub log_file: Option<PathBuf>,
    pub log_level: Level,
}

impl Config {
    /// Parse the process arguments. Exits on `--help` or bad input.
    #[must_use]
    pub fn from_args() -> Self {
        Cli::parse().into()
    }
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Self {
            host: cli.host,
            secure: cli.secure,
            colors: cli.colors,
            loop_config: LoopConfig::with_fps(cli.fps),
            viewport: ViewportPolicy {
                pan_step: cli.pan_step,
                ..ViewportPolicy::default()
            },
            debug_lines: cli.debug_lines,
            exit_on_disconnect: cli.exit_on_disconnect,
            log_file: cli.log_file,
            log_level: cli.log_level,
        }
    }
}
