// SPDX-License-Identifier: MIT
//
// rawtty — raw terminal control and width-bounded rendering substrate.
//
// The byte-level foundation a text UI is built on: puts the controlling
// terminal into raw, byte-oriented input mode on the alternate screen,
// and exposes short-lived render frames whose writes are buffered,
// column-bounded, and flushed in a single synchronized-update-wrapped
// syscall. Higher layers own widgets, layout, and key decoding; this
// crate owns the device, the mode state machine, and the guarantee that
// nothing ever overflows a column budget or cuts an escape sequence in
// half.
//
// This crate intentionally avoids external TUI frameworks (ratatui,
// crossterm) in favor of direct terminal control via ANSI escape
// sequences and raw termios. Every byte sent to the terminal is
// accounted for.

pub mod ansi;
pub mod error;
pub mod output;
pub mod render;
pub mod style;
pub mod terminal;
pub mod width;

pub use error::{Error, Result};
pub use output::OutputBuffer;
pub use render::Frame;
pub use style::{Attr, Color, Style};
pub use terminal::{Mode, RawModeOptions, Size, Terminal};
pub use width::BoundedWriter;
