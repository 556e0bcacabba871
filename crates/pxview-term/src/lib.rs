// SPDX-License-Identifier: MIT
//
// pxview-term: Terminal engine for pxview.
//
// Owns every byte that goes to or comes from the terminal: raw mode and
// alternate screen setup, stdin parsing into key and mouse events, a flat
// cell grid that the viewer paints each frame, and a differential writer
// that only emits cells which changed since the last flush.
//
// Color handling lives here too. Canvas palettes arrive as 24-bit RGB, but
// most terminals speak a fixed 256 or 8 color vocabulary, so `quantize`
// maps RGB onto whatever the detected terminal can show.
//
// No TUI framework sits underneath. Escape sequences are written by hand
// in `ansi`, termios is driven through libc.

pub mod ansi;
pub mod buffer;
pub mod cell;
pub mod color;
pub mod diff;
pub mod event_loop;
pub mod input;
pub mod output;
pub mod quantize;
pub mod reader;
pub mod terminal;
