// SPDX-License-Identifier: MIT
//
// ANSI escape sequence generation.
//
// Pure functions that write escape sequences to any `impl Write`. No state,
// no decisions about when to emit — that's the session's and the frame's
// job. This module just knows the byte-level encoding of every terminal
// command we need.
//
// All cursor positions are 0-indexed in our API and converted to 1-indexed
// for the terminal (ANSI standard uses 1-based coordinates).
//
// All functions return `io::Result` propagated from the underlying writer.
// In practice they never fail when writing to `OutputBuffer` (backed by a Vec).

use std::io::{self, Write};

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Move the cursor to `(row, col)` using the CUP (Cursor Position) sequence.
///
/// Our coordinates are 0-indexed; ANSI CUP is 1-indexed.
#[inline]
pub fn cursor_to(w: &mut impl Write, row: u16, col: u16) -> io::Result<()> {
    write!(w, "\x1b[{};{}H", u32::from(row) + 1, u32::from(col) + 1)
}

/// Save the cursor position and attributes (DECSC).
#[inline]
pub fn cursor_save(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b7")
}

/// Restore the cursor position and attributes saved by [`cursor_save`] (DECRC).
#[inline]
pub fn cursor_restore(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b8")
}

/// Hide the cursor (DECTCEM reset).
#[inline]
pub fn cursor_hide(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25l")
}

/// Show the cursor (DECTCEM set).
#[inline]
pub fn cursor_show(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25h")
}

// ─── Screen ──────────────────────────────────────────────────────────────────

/// Clear the entire screen (ED 2).
#[inline]
pub fn clear_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[2J")
}

/// Reset all SGR attributes to terminal defaults (SGR 0).
#[inline]
pub fn reset(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[0m")
}

/// Enter the alternate screen buffer (DEC Private Mode 1049).
///
/// The alternate screen is a separate buffer that preserves the original
/// terminal content. On exit, the original content is restored — this is
/// what keeps full-screen rendering away from the shell's scrollback.
#[inline]
pub fn enter_alt_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1049h")
}

/// Exit the alternate screen buffer and restore original content.
#[inline]
pub fn exit_alt_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1049l")
}

/// Restore the screen saved by the legacy alternate-buffer mode (DEC 47).
///
/// Emitted during cooked-mode restore as a belt for terminals that honour
/// mode 47 but not the 1049 composite.
#[inline]
pub fn restore_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?47l")
}

// ─── Line Discipline Modes ───────────────────────────────────────────────────

/// Force overwrite (replace) mode — IRM reset (`CSI 4 l`).
///
/// Insert mode would shift existing cells right on every write, which
/// breaks cell-addressed rendering.
#[inline]
pub fn overwrite_mode(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[4l")
}

/// Enable auto-wrap at the right margin (DECAWM set).
#[inline]
pub fn autowrap_on(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?7h")
}

/// Disable auto-wrap at the right margin (DECAWM reset).
///
/// With auto-wrap off, writing into the last column never scrolls or
/// wraps — a requirement for drawing the bottom-right cell.
#[inline]
pub fn autowrap_off(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?7l")
}

/// Disable keyboard auto-repeat (DECARM reset).
#[inline]
pub fn autorepeat_off(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?8l")
}

/// Disable interlace mode (DECINLM reset).
#[inline]
pub fn interlace_off(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?9l")
}

// ─── Synchronized Update ─────────────────────────────────────────────────────

/// Begin synchronized update (DEC Private Mode 2026).
///
/// Tells the terminal to buffer all subsequent output until [`end_sync`],
/// so the whole frame paints atomically with no visible tearing.
/// Terminals without support treat the marker as a harmless no-op.
#[inline]
pub fn begin_sync(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?2026h")
}

/// End synchronized update — the terminal paints the buffered frame.
#[inline]
pub fn end_sync(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?2026l")
}

// ─── Mouse Protocol ─────────────────────────────────────────────────────────

/// Enable SGR mouse tracking (button + drag reporting).
///
/// Uses SGR format (DEC 1006) which supports coordinates beyond column 223
/// and distinguishes button press from release.
pub fn enable_mouse(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1000h")?;
    w.write_all(b"\x1b[?1002h")?;
    w.write_all(b"\x1b[?1006h")
}

/// Disable all mouse tracking.
pub fn disable_mouse(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1006l")?;
    w.write_all(b"\x1b[?1002l")?;
    w.write_all(b"\x1b[?1000l")
}

// ─── Kitty Keyboard Protocol ────────────────────────────────────────────────

/// Enable the Kitty keyboard protocol with progressive enhancement flags.
///
/// Flag `1` (disambiguate escape codes) is the minimum useful level for
/// byte-oriented input loops.
#[inline]
pub fn enable_kitty_keyboard(w: &mut impl Write, flags: u8) -> io::Result<()> {
    write!(w, "\x1b[>{flags}u")
}

/// Disable the Kitty keyboard protocol (pop enhancement from stack).
#[inline]
pub fn disable_kitty_keyboard(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[<u")
}

// ─── Window Title ───────────────────────────────────────────────────────────

/// Set the terminal window title (OSC 2, BEL-terminated).
#[inline]
pub fn window_title(w: &mut impl Write, title: &str) -> io::Result<()> {
    write!(w, "\x1b]2;{title}\x07")
}

// ─── Tests ───────────────────────────────────────────────────────────────────
