// SPDX-License-Identifier: MIT
//
// Error taxonomy for terminal control.
//
// Every variant wraps the underlying `io::Error` so callers can still
// inspect the OS error code. These cover *environmental* failures only —
// contract violations (double render, reading while a frame is open,
// raw-only operations while cooked) are assertions, not error values,
// and are documented on the methods that enforce them.

use std::io;

use thiserror::Error;

/// Errors surfaced by the terminal session and render path.
#[derive(Debug, Error)]
pub enum Error {
    /// The controlling terminal device could not be opened.
    #[error("failed to open terminal device: {0}")]
    DeviceOpen(#[source] io::Error),

    /// `tcgetattr`/`tcsetattr` failed while switching terminal modes.
    #[error("terminal configuration failed: {0}")]
    TermConfig(#[source] io::Error),

    /// The window-size ioctl (`TIOCGWINSZ`) failed.
    #[error("terminal size query failed: {0}")]
    Ioctl(#[source] io::Error),

    /// A read or write on the terminal device failed.
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Result type for terminal operations.
pub type Result<T> = std::result::Result<T, Error>;

// ─── Tests ───────────────────────────────────────────────────────────────────
