// SPDX-License-Identifier: MIT
//
// Terminal control — the session state machine over the controlling
// terminal device.
//
// Safety: This module necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr), ioctl (TIOCGWINSZ), isatty, and the panic hook's raw fd
// write. These are the standard POSIX interfaces for terminal control —
// there is no safe alternative. Each unsafe block is minimal.
#![allow(unsafe_code)]
//
// A `Terminal` owns the device handle (`/dev/tty`, opened read+write) for
// its whole lifetime and tracks three pieces of state: the cooked/raw mode
// flag, the termios snapshot taken at raw entry, and the cached geometry.
// Render exclusivity is a plain bool — there is no concurrency here, only
// a single-owner discipline enforced by assertions.
//
// The panic hook deserves special mention: it bypasses buffered I/O
// entirely, writing a pre-built restore sequence directly to the device
// fd. One raw write, everything restored, then the original panic handler
// prints its message to a working terminal.
//
// Why not crossterm? A substrate like this needs direct control over
// every terminal interaction, not an abstraction layer that might make
// different choices than we would.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
#[cfg(unix)]
use std::os::unix::io::AsRawFd;
#[cfg(unix)]
use std::sync::{Mutex, Once};

use tracing::{debug, trace};

use crate::ansi;
use crate::error::{Error, Result};
use crate::output::OutputBuffer;
use crate::render::Frame;

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Number of columns (width in character cells).
    pub cols: u16,
    /// Number of rows (height in character cells).
    pub rows: u16,
}

impl Size {
    /// Total number of cells (`cols × rows`).
    #[inline]
    #[must_use]
    pub const fn area(self) -> u32 {
        self.cols as u32 * self.rows as u32
    }
}

/// Fallback geometry when the device won't answer (tests, pipes).
const FALLBACK_SIZE: Size = Size { cols: 80, rows: 24 };

// ─── Mode ───────────────────────────────────────────────────────────────────

/// The session's input discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Line-buffered, echoing — the terminal's default.
    Cooked,
    /// Byte-oriented, no echo, no signal generation.
    Raw,
}

/// Optional protocols enabled alongside raw mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawModeOptions {
    /// Enable the Kitty keyboard protocol (disambiguate flag).
    pub kitty_keyboard: bool,
    /// Enable SGR mouse tracking (button + drag).
    pub mouse: bool,
}

// ─── Panic-Safe Terminal Restore ────────────────────────────────────────────

/// Global backup of the device fd and original termios for panic recovery.
///
/// The [`Terminal`] struct owns its own copy, but the panic hook can't
/// access it. This backup — behind a [`Mutex`], not `static mut` — lets
/// the hook restore the terminal without the struct.
#[cfg(unix)]
static TERMIOS_BACKUP: Mutex<Option<(i32, libc::termios)>> = Mutex::new(None);

/// Restore termios from the global backup. Best-effort, ignores errors.
#[cfg(unix)]
fn restore_termios_from_backup() {
    if let Ok(guard) = TERMIOS_BACKUP.lock() {
        if let Some((fd, ref original)) = *guard {
            unsafe {
                let _ = libc::tcsetattr(fd, libc::TCSANOW, original);
            }
        }
    }
}

/// Complete terminal restore sequence for emergency use.
///
/// Concatenation of: end synchronized update, disable mouse (SGR format +
/// drag + click), disable Kitty keyboard, reset SGR attributes, show
/// cursor, restore auto-wrap, exit alternate screen, restore cursor.
///
/// Alternate screen exit comes late so the restored shell content appears
/// with no TUI artifacts.
#[rustfmt::skip]
const EMERGENCY_RESTORE: &[u8] = b"\
    \x1b[?2026l\
    \x1b[?1006l\x1b[?1002l\x1b[?1000l\
    \x1b[<u\
    \x1b[0m\
    \x1b[?25h\
    \x1b[?7h\
    \x1b[?1049l\
    \x1b8";

/// Panic hook guard — ensures the hook is installed at most once per process.
#[cfg(unix)]
static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Install a panic hook that restores the terminal before printing the error.
///
/// Without this, a panic in raw mode leaves the user's terminal broken:
/// no echo, no line editing, no way to read the error message. The hook
/// writes [`EMERGENCY_RESTORE`] directly to the backed-up device fd,
/// restores termios, then delegates to the original panic handler so the
/// message prints to a working terminal.
#[cfg(unix)]
fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            emergency_restore();
            restore_termios_from_backup();
            original(info);
        }));
    });
}

#[cfg(not(unix))]
fn install_panic_hook() {}

/// Write the complete restore sequence directly to the device fd.
///
/// Bypasses all buffering to avoid deadlocking if the panic occurred
/// mid-flush.
#[cfg(unix)]
fn emergency_restore() {
    if let Ok(guard) = TERMIOS_BACKUP.lock() {
        if let Some((fd, _)) = *guard {
            unsafe {
                let _ = libc::write(
                    fd,
                    EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
                    EMERGENCY_RESTORE.len(),
                );
            }
        }
    }
}

// ─── Terminal ───────────────────────────────────────────────────────────────

/// Exclusive handle over the controlling terminal device.
///
/// Exactly one `Terminal` should exist per device; it owns the handle for
/// its lifetime. The caller drives a strict sequence: open → raw → render
/// frames / read input → cooked → drop. Dropping while still raw or while
/// a frame is open is a programming error, checked by a debug assertion.
///
/// # Example
///
/// ```no_run
/// use rawtty::{RawModeOptions, Terminal};
///
/// let mut term = Terminal::open()?;
/// term.enter_raw_mode(RawModeOptions::default())?;
/// if let Some(mut frame) = term.begin_frame() {
///     frame.clear();
///     frame.move_to(0, 0);
///     frame.write_bounded(10, b"hello")?;
///     frame.finish()?;
/// }
/// term.restore_cooked_mode()?;
/// # Ok::<(), rawtty::Error>(())
/// ```
pub struct Terminal {
    /// The controlling terminal device, opened read+write.
    dev: File,

    /// Current input discipline.
    mode: Mode,

    /// Original termios saved before entering raw mode.
    ///
    /// `Some` iff raw on a real tty; a non-tty device (tests, CI) has no
    /// settings to snapshot.
    #[cfg(unix)]
    saved: Option<libc::termios>,

    /// Cached geometry, refreshed via [`refresh_size`](Self::refresh_size).
    size: Size,

    /// Whether a [`Frame`] is currently open.
    pub(crate) rendering: bool,
}

impl Terminal {
    /// Open the controlling terminal device (`/dev/tty`) for read and write.
    ///
    /// The session starts in [`Mode::Cooked`]. Geometry is queried
    /// best-effort, falling back to 80×24 when the device won't answer.
    ///
    /// # Errors
    ///
    /// [`Error::DeviceOpen`] if the device cannot be opened.
    pub fn open() -> Result<Self> {
        let dev = OpenOptions::new()
            .read(true)
            .write(true)
            .open("/dev/tty")
            .map_err(Error::DeviceOpen)?;
        Ok(Self::from_device(dev))
    }

    /// Wrap an already-open device handle.
    pub(crate) fn from_device(dev: File) -> Self {
        let size = query_size(&dev).unwrap_or(FALLBACK_SIZE);
        Self {
            dev,
            mode: Mode::Cooked,
            #[cfg(unix)]
            saved: None,
            size,
            rendering: false,
        }
    }

    /// Current input discipline.
    #[inline]
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Cached terminal size (columns, rows).
    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// Whether the device is an actual tty.
    #[must_use]
    pub fn is_tty(&self) -> bool {
        is_tty(&self.dev)
    }

    /// Enter raw mode.
    ///
    /// Snapshots the current device settings, applies a raw flag set with
    /// immediate (non-blocking) reads, then switches to the alternate
    /// screen: save-cursor, enter-alt-screen, overwrite mode, auto-wrap
    /// off, auto-repeat off, interlace off, hide cursor, and the optional
    /// Kitty keyboard / mouse tracking enables.
    ///
    /// Idempotent: a no-op while already raw. On any failure after the
    /// settings snapshot, restoration to cooked is attempted before the
    /// original error propagates (a secondary failure during that rollback
    /// is ignored).
    ///
    /// # Errors
    ///
    /// [`Error::TermConfig`] if the settings snapshot or apply fails;
    /// [`Error::Io`] if emitting the mode-switch sequences fails.
    pub fn enter_raw_mode(&mut self, opts: RawModeOptions) -> Result<()> {
        if self.mode == Mode::Raw {
            return Ok(());
        }

        install_panic_hook();
        self.save_and_apply_termios().map_err(Error::TermConfig)?;

        if let Err(err) = self.emit_raw_prelude(opts) {
            // Best-effort rollback; the original error wins.
            let _ = self.restore_termios();
            return Err(Error::Io(err));
        }

        self.mode = Mode::Raw;
        debug!(
            kitty = opts.kitty_keyboard,
            mouse = opts.mouse,
            "entered raw mode"
        );
        Ok(())
    }

    /// Restore cooked mode.
    ///
    /// Disables the optional protocols, leaves the alternate screen,
    /// restores the cursor, and re-applies the snapshotted device
    /// settings. Idempotent: a no-op while already cooked, and callable
    /// after a partially failed raw entry.
    ///
    /// # Panics
    ///
    /// Panics if a frame is still open — mode transitions while rendering
    /// are a caller contract breach.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if emitting the restore sequences fails;
    /// [`Error::TermConfig`] if re-applying the saved settings fails.
    pub fn restore_cooked_mode(&mut self) -> Result<()> {
        if self.mode == Mode::Cooked {
            return Ok(());
        }
        assert!(
            !self.rendering,
            "restore_cooked_mode called with a frame still open"
        );

        self.emit_cooked_epilogue().map_err(Error::Io)?;
        self.restore_termios().map_err(Error::TermConfig)?;
        self.mode = Mode::Cooked;
        debug!("restored cooked mode");
        Ok(())
    }

    /// Re-query the terminal size from the device.
    ///
    /// While cooked this returns the stale cached geometry without a
    /// syscall — size queries are meaningless before the alternate screen
    /// is active. Call after a resize notification to pick up the new
    /// dimensions; the signal plumbing itself lives with the caller.
    ///
    /// # Errors
    ///
    /// [`Error::Ioctl`] if the window-size query fails while raw.
    pub fn refresh_size(&mut self) -> Result<Size> {
        if self.mode == Mode::Cooked {
            return Ok(self.size);
        }
        let size = query_size(&self.dev)
            .ok_or_else(|| Error::Ioctl(io::Error::last_os_error()))?;
        if size != self.size {
            trace!(cols = size.cols, rows = size.rows, "geometry changed");
        }
        self.size = size;
        Ok(size)
    }

    /// Read whatever input bytes are currently available.
    ///
    /// One non-blocking read attempt (raw mode configures `VMIN=0,
    /// VTIME=0`). Returns the number of bytes read; `0` means "nothing
    /// currently available", not EOF and not an error.
    ///
    /// # Panics
    ///
    /// Panics while cooked or while a frame is open — reading and
    /// rendering are mutually exclusive so byte ordering stays unambiguous.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the read syscall fails.
    pub fn read_input(&mut self, buf: &mut [u8]) -> Result<usize> {
        assert!(
            self.mode == Mode::Raw,
            "read_input requires raw mode"
        );
        assert!(
            !self.rendering,
            "read_input called with a frame still open"
        );
        let n = (&self.dev).read(buf)?;
        Ok(n)
    }

    /// Set the terminal window title (OSC 2).
    ///
    /// Works in either mode; the sequence goes straight to the device.
    ///
    /// # Panics
    ///
    /// Panics while a frame is open — title bytes must not interleave
    /// with a buffered frame.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the write fails.
    pub fn set_title(&mut self, title: &str) -> Result<()> {
        assert!(
            !self.rendering,
            "set_title called with a frame still open"
        );
        let mut dev = &self.dev;
        ansi::window_title(&mut dev, title)?;
        dev.flush()?;
        Ok(())
    }

    /// Begin a render frame, if the session is ready for one.
    ///
    /// Returns `None` while cooked or while another frame is still open —
    /// expected "try again later" conditions for a polling caller, not
    /// errors.
    pub fn begin_frame(&mut self) -> Option<Frame<'_>> {
        if self.mode != Mode::Raw || self.rendering {
            return None;
        }
        Some(Frame::new(self))
    }

    /// Begin a render frame, asserting the session is ready.
    ///
    /// # Panics
    ///
    /// Panics while cooked or while another frame is open. Use when the
    /// caller already knows both preconditions hold.
    pub fn begin_frame_unchecked(&mut self) -> Frame<'_> {
        assert!(self.mode == Mode::Raw, "begin_frame_unchecked while cooked");
        assert!(!self.rendering, "begin_frame_unchecked while already rendering");
        Frame::new(self)
    }

    /// Write a fully composed frame buffer to the device in one syscall.
    pub(crate) fn flush_frame(&mut self, out: &mut OutputBuffer) -> Result<()> {
        let mut dev = &self.dev;
        out.flush_to(&mut dev)?;
        Ok(())
    }

    // ── Mode-switch sequences ───────────────────────────────────────

    /// Emit the raw-mode entry sequences in one write.
    fn emit_raw_prelude(&mut self, opts: RawModeOptions) -> io::Result<()> {
        let mut out = OutputBuffer::new();
        ansi::cursor_save(&mut out)?;
        ansi::enter_alt_screen(&mut out)?;
        ansi::overwrite_mode(&mut out)?;
        ansi::autowrap_off(&mut out)?;
        ansi::autorepeat_off(&mut out)?;
        ansi::interlace_off(&mut out)?;
        ansi::cursor_hide(&mut out)?;
        if opts.kitty_keyboard {
            ansi::enable_kitty_keyboard(&mut out, 1)?;
        }
        if opts.mouse {
            ansi::enable_mouse(&mut out)?;
        }
        let mut dev = &self.dev;
        out.flush_to(&mut dev)
    }

    /// Emit the cooked-mode restore sequences in one write.
    ///
    /// The protocol disables are unconditional — harmless when the
    /// protocol was never enabled, and safer after a partial entry.
    /// Attributes are reset twice against partial attribute state.
    fn emit_cooked_epilogue(&mut self) -> io::Result<()> {
        let mut out = OutputBuffer::new();
        ansi::disable_kitty_keyboard(&mut out)?;
        ansi::disable_mouse(&mut out)?;
        ansi::clear_screen(&mut out)?;
        ansi::exit_alt_screen(&mut out)?;
        ansi::restore_screen(&mut out)?;
        ansi::cursor_restore(&mut out)?;
        ansi::cursor_show(&mut out)?;
        ansi::reset(&mut out)?;
        ansi::reset(&mut out)?;
        let mut dev = &self.dev;
        out.flush_to(&mut dev)
    }

    // ── Raw mode (termios) ──────────────────────────────────────────

    /// Snapshot the device settings and apply the raw flag set.
    ///
    /// Skipped on a non-tty device (tests, CI pipes): there are no line
    /// discipline settings to change, but the session state machine still
    /// advances.
    #[cfg(unix)]
    fn save_and_apply_termios(&mut self) -> io::Result<()> {
        if !self.is_tty() {
            return Ok(());
        }

        let fd = self.dev.as_raw_fd();

        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &raw mut termios) != 0 {
                return Err(io::Error::last_os_error());
            }

            // Save original for restore, plus the panic hook's backup.
            self.saved = Some(termios);
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = Some((fd, termios));
            }

            // cfmakeraw equivalent: no echo, no canonical input, no
            // keyboard signals, no extended preprocessing, no flow
            // control, no CR→LF translation, no parity, no bit
            // stripping, no output post-processing, 8-bit cells.
            termios.c_iflag &= !(libc::IGNBRK
                | libc::BRKINT
                | libc::PARMRK
                | libc::ISTRIP
                | libc::INLCR
                | libc::IGNCR
                | libc::ICRNL
                | libc::IXON);
            termios.c_oflag &= !libc::OPOST;
            termios.c_lflag &=
                !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
            termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
            termios.c_cflag |= libc::CS8;

            // VMIN=0, VTIME=0: read() returns immediately with whatever is
            // available — the caller drives its own poll loop.
            termios.c_cc[libc::VMIN] = 0;
            termios.c_cc[libc::VTIME] = 0;

            // TCSAFLUSH: apply after pending output drains, discarding
            // pending input.
            if libc::tcsetattr(fd, libc::TCSAFLUSH, &raw const termios) != 0 {
                self.saved = None;
                return Err(io::Error::last_os_error());
            }
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn save_and_apply_termios(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Re-apply the snapshotted settings, field for field.
    #[cfg(unix)]
    fn restore_termios(&mut self) -> io::Result<()> {
        if let Some(ref original) = self.saved {
            let fd = self.dev.as_raw_fd();

            unsafe {
                if libc::tcsetattr(fd, libc::TCSAFLUSH, original) != 0 {
                    return Err(io::Error::last_os_error());
                }
            }

            // Clear the panic hook's backup — we've restored successfully.
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = None;
            }

            self.saved = None;
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn restore_termios(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        // Destruction while raw or mid-frame is a programming error, not a
        // condition to recover from. Skipped during unwinding so the
        // original panic stays readable.
        if !std::thread::panicking() {
            debug_assert!(
                self.mode == Mode::Cooked,
                "Terminal dropped while still in raw mode"
            );
            debug_assert!(!self.rendering, "Terminal dropped with a frame still open");
        }
    }
}

// ─── Device Queries ─────────────────────────────────────────────────────────

/// Query the device size via `ioctl(TIOCGWINSZ)`.
///
/// Returns `None` if the device is not a terminal or the query fails.
#[cfg(unix)]
fn query_size(dev: &File) -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(dev.as_raw_fd(), libc::TIOCGWINSZ, &raw mut ws) };

    if result == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
        Some(Size {
            cols: ws.ws_col,
            rows: ws.ws_row,
        })
    } else {
        None
    }
}

#[cfg(not(unix))]
fn query_size(_dev: &File) -> Option<Size> {
    None
}

/// Check whether the device handle is connected to a terminal.
#[cfg(unix)]
fn is_tty(dev: &File) -> bool {
    unsafe { libc::isatty(dev.as_raw_fd()) != 0 }
}

#[cfg(not(unix))]
fn is_tty(_dev: &File) -> bool {
    false
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// A session over `/dev/null`: escape emissions are swallowed and the
    /// termios steps are skipped (not a tty), so the state machine can be
    /// exercised without touching the test runner's terminal.
    fn null_terminal() -> Terminal {
        let dev = OpenOptions::new()
            .read(true)
            .write(true)
            .open("/dev/null")
            .expect("open /dev/null");
        Terminal::from_device(dev)
    }

    // ── Size ──────────────────────────────────────────────────────────

    #[test]
    fn size_area() {
        assert_eq!(Size { cols: 80, rows: 24 }.area(), 1920);
    }

    #[test]
    fn size_area_zero() {
        assert_eq!(Size { cols: 0, rows: 24 }.area(), 0);
    }

    #[test]
    fn size_area_large() {
        assert_eq!(Size { cols: 500, rows: 200 }.area(), 100_000);
    }

    // ── Emergency restore sequence ──────────────────────────────────

    #[test]
    fn emergency_restore_is_valid_utf8() {
        std::str::from_utf8(EMERGENCY_RESTORE).unwrap();
    }

    #[test]
    fn emergency_restore_contains_all_sequences() {
        let s = std::str::from_utf8(EMERGENCY_RESTORE).unwrap();
        assert!(s.contains("\x1b[?2026l"), "must end synchronized update");
        assert!(s.contains("\x1b[?1000l"), "must disable mouse clicks");
        assert!(s.contains("\x1b[?1002l"), "must disable mouse drag");
        assert!(s.contains("\x1b[?1006l"), "must disable SGR mouse format");
        assert!(s.contains("\x1b[<u"), "must disable kitty keyboard");
        assert!(s.contains("\x1b[0m"), "must reset SGR attributes");
        assert!(s.contains("\x1b[?25h"), "must show cursor");
        assert!(s.contains("\x1b[?7h"), "must restore auto-wrap");
        assert!(s.contains("\x1b[?1049l"), "must exit alternate screen");
    }

    #[test]
    fn emergency_restore_exits_alt_screen_before_cursor_restore() {
        let s = std::str::from_utf8(EMERGENCY_RESTORE).unwrap();
        assert!(s.ends_with("\x1b[?1049l\x1b8"));
    }

    // ── Mode state machine ──────────────────────────────────────────

    #[test]
    fn starts_cooked() {
        let term = null_terminal();
        assert_eq!(term.mode(), Mode::Cooked);
        assert!(!term.rendering);
    }

    #[test]
    fn fallback_size_when_device_wont_answer() {
        let term = null_terminal();
        assert_eq!(term.size(), FALLBACK_SIZE);
    }

    #[test]
    fn enter_and_restore_cycle() {
        let mut term = null_terminal();
        term.enter_raw_mode(RawModeOptions::default()).unwrap();
        assert_eq!(term.mode(), Mode::Raw);
        term.restore_cooked_mode().unwrap();
        assert_eq!(term.mode(), Mode::Cooked);
    }

    #[test]
    fn double_enter_is_idempotent() {
        let mut term = null_terminal();
        term.enter_raw_mode(RawModeOptions::default()).unwrap();
        term.enter_raw_mode(RawModeOptions::default()).unwrap();
        assert_eq!(term.mode(), Mode::Raw);
        term.restore_cooked_mode().unwrap();
    }

    #[test]
    fn double_restore_is_idempotent() {
        let mut term = null_terminal();
        term.enter_raw_mode(RawModeOptions::default()).unwrap();
        term.restore_cooked_mode().unwrap();
        term.restore_cooked_mode().unwrap();
        assert_eq!(term.mode(), Mode::Cooked);
    }

    #[test]
    fn restore_without_enter_is_noop() {
        let mut term = null_terminal();
        term.restore_cooked_mode().unwrap();
        assert_eq!(term.mode(), Mode::Cooked);
    }

    #[test]
    fn multiple_cycles() {
        let mut term = null_terminal();
        for _ in 0..3 {
            term.enter_raw_mode(RawModeOptions::default()).unwrap();
            assert_eq!(term.mode(), Mode::Raw);
            term.restore_cooked_mode().unwrap();
            assert_eq!(term.mode(), Mode::Cooked);
        }
    }

    #[test]
    fn raw_options_with_protocols_enabled() {
        let mut term = null_terminal();
        term.enter_raw_mode(RawModeOptions {
            kitty_keyboard: true,
            mouse: true,
        })
        .unwrap();
        term.restore_cooked_mode().unwrap();
    }

    #[test]
    fn no_saved_settings_on_non_tty() {
        // /dev/null has no line discipline; the snapshot is skipped but
        // the mode flag still advances.
        let mut term = null_terminal();
        term.enter_raw_mode(RawModeOptions::default()).unwrap();
        #[cfg(unix)]
        assert!(term.saved.is_none());
        term.restore_cooked_mode().unwrap();
    }

    // ── Geometry ────────────────────────────────────────────────────

    #[test]
    fn refresh_size_while_cooked_returns_stale_cache() {
        let mut term = null_terminal();
        let size = term.refresh_size().unwrap();
        assert_eq!(size, FALLBACK_SIZE);
    }

    // ── Input ───────────────────────────────────────────────────────

    #[test]
    fn read_input_with_nothing_pending_returns_zero() {
        let mut term = null_terminal();
        term.enter_raw_mode(RawModeOptions::default()).unwrap();
        let mut buf = [0u8; 64];
        assert_eq!(term.read_input(&mut buf).unwrap(), 0);
        term.restore_cooked_mode().unwrap();
    }

    #[test]
    #[should_panic(expected = "read_input requires raw mode")]
    fn read_input_while_cooked_panics() {
        let mut term = null_terminal();
        let mut buf = [0u8; 8];
        let _ = term.read_input(&mut buf);
    }

    // ── Title ───────────────────────────────────────────────────────

    #[test]
    fn set_title_works_in_either_mode() {
        let mut term = null_terminal();
        term.set_title("cooked").unwrap();
        term.enter_raw_mode(RawModeOptions::default()).unwrap();
        term.set_title("raw").unwrap();
        term.restore_cooked_mode().unwrap();
    }

    // ── Render exclusivity ──────────────────────────────────────────

    #[test]
    fn begin_frame_while_cooked_returns_none() {
        let mut term = null_terminal();
        assert!(term.begin_frame().is_none());
    }

    #[test]
    fn begin_frame_while_raw_returns_frame() {
        let mut term = null_terminal();
        term.enter_raw_mode(RawModeOptions::default()).unwrap();
        let frame = term.begin_frame().expect("frame while raw");
        frame.finish().unwrap();
        term.restore_cooked_mode().unwrap();
    }

    #[test]
    fn begin_frame_succeeds_again_after_finish() {
        let mut term = null_terminal();
        term.enter_raw_mode(RawModeOptions::default()).unwrap();

        term.begin_frame().unwrap().finish().unwrap();
        let second = term.begin_frame();
        assert!(second.is_some());
        second.unwrap().finish().unwrap();

        term.restore_cooked_mode().unwrap();
    }

    #[test]
    fn abandoned_frame_blocks_further_rendering() {
        let mut term = null_terminal();
        term.enter_raw_mode(RawModeOptions::default()).unwrap();

        let frame = term.begin_frame().unwrap();
        drop(frame); // contract violation: dropped without finish

        assert!(term.begin_frame().is_none());

        // Clean up so Drop's debug assertions hold.
        term.rendering = false;
        term.restore_cooked_mode().unwrap();
    }

    #[test]
    #[should_panic(expected = "begin_frame_unchecked while cooked")]
    fn begin_frame_unchecked_while_cooked_panics() {
        let mut term = null_terminal();
        let _ = term.begin_frame_unchecked();
    }

    #[test]
    #[should_panic(expected = "restore_cooked_mode called with a frame still open")]
    fn restore_while_rendering_panics() {
        let mut term = null_terminal();
        term.enter_raw_mode(RawModeOptions::default()).unwrap();
        let frame = term.begin_frame().unwrap();
        drop(frame); // abandoned: rendering flag stays stuck
        let _ = term.restore_cooked_mode();
    }
}
