// SPDX-License-Identifier: MIT
//
// Width-bounded writing — the column-accounting core.
//
// A `BoundedWriter` wraps a sink with a budget of display columns. Text
// fed through it is truncated at the column level (never mid-code-point)
// and padded with spaces up to the budget at finish, so every bounded
// write occupies exactly its requested width on screen. Escape sequences
// embedded in the stream pass through uncounted and untruncated: they have
// no visible width, and cutting one mid-way would corrupt terminal state.
//
// The escape scanner is an explicit state machine, resumable across
// `write` calls, as is the UTF-8 decoder (a code point split across two
// feeds is reassembled before being measured or emitted).
//
// Malformed UTF-8 policy: an invalid or truncated sequence resolves to a
// single `?` at width 1 and scanning resumes at the next byte. The writer
// never panics on arbitrary input.

use std::io::{self, Write};

use unicode_width::UnicodeWidthChar;

// ─── Escape Scanner ──────────────────────────────────────────────────────────

/// Escape-sequence scanner state.
///
/// Covers the grammar the writer must not cut: CSI sequences end at a
/// final byte in `0x40..=0x7E`, OSC sequences end at BEL or ST (`ESC \`),
/// and any other byte after ESC closes a two-byte sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    /// Plain text.
    Ground,
    /// Saw ESC, dispatching on the next byte.
    Esc,
    /// Inside a CSI sequence (`ESC [`).
    Csi,
    /// Inside an OSC sequence (`ESC ]`).
    Osc,
    /// Saw ESC inside an OSC sequence — possible ST terminator.
    OscEsc,
}

const ESC: u8 = 0x1b;
const BEL: u8 = 0x07;

// ─── BoundedWriter ───────────────────────────────────────────────────────────

/// A writer that emits at most `budget` display columns of visible text.
///
/// Obtained from [`Frame::bounded`](crate::render::Frame::bounded) or
/// constructed directly over any sink. Feed it bytes via [`Write`], then
/// call [`finish`](Self::finish) to pad the remaining budget with spaces.
///
/// Escape sequences always pass through, even with the budget exhausted —
/// they may carry attribute resets the output still depends on. Only
/// visible glyphs are gated.
pub struct BoundedWriter<W: Write> {
    sink: W,
    /// Display columns still available for visible glyphs.
    budget: u16,
    /// Set once a glyph didn't fit; visible content is discarded from then on.
    discarding: bool,
    scan: Scan,
    /// Carry buffer for a UTF-8 code point split across `write` calls.
    pending: [u8; 4],
    pending_len: u8,
    /// Total encoded length of the pending code point.
    pending_need: u8,
}

impl<W: Write> BoundedWriter<W> {
    /// Wrap `sink` with a budget of `budget` display columns.
    #[must_use]
    pub const fn new(sink: W, budget: u16) -> Self {
        Self {
            sink,
            budget,
            discarding: false,
            scan: Scan::Ground,
            pending: [0; 4],
            pending_len: 0,
            pending_need: 0,
        }
    }

    /// Columns still available for visible glyphs.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> u16 {
        self.budget
    }

    /// Pad the remaining budget with spaces and return the sink.
    ///
    /// After this the bounded region occupies exactly the requested width.
    /// An incomplete code point still in the carry buffer is malformed
    /// input and resolves to `?` before padding.
    ///
    /// # Errors
    ///
    /// Propagates write failures from the sink.
    pub fn finish(mut self) -> io::Result<W> {
        if self.pending_len > 0 {
            self.pending_len = 0;
            self.emit_invalid()?;
        }
        for _ in 0..self.budget {
            self.sink.write_all(b" ")?;
        }
        self.budget = 0;
        Ok(self.sink)
    }

    /// Process one input byte.
    fn feed(&mut self, b: u8) -> io::Result<()> {
        match self.scan {
            Scan::Ground => self.feed_ground(b),
            Scan::Esc => {
                self.scan = match b {
                    b'[' => Scan::Csi,
                    b']' => Scan::Osc,
                    _ => Scan::Ground,
                };
                self.sink.write_all(&[b])
            }
            Scan::Csi => {
                if (0x40..=0x7e).contains(&b) {
                    self.scan = Scan::Ground;
                }
                self.sink.write_all(&[b])
            }
            Scan::Osc => {
                if b == BEL {
                    self.scan = Scan::Ground;
                } else if b == ESC {
                    self.scan = Scan::OscEsc;
                }
                self.sink.write_all(&[b])
            }
            Scan::OscEsc => {
                self.scan = if b == b'\\' { Scan::Ground } else { Scan::Osc };
                self.sink.write_all(&[b])
            }
        }
    }

    /// Process one byte of plain text (outside any escape sequence).
    fn feed_ground(&mut self, b: u8) -> io::Result<()> {
        if b == ESC {
            // An escape aborts any half-received code point.
            if self.pending_len > 0 {
                self.pending_len = 0;
                self.emit_invalid()?;
            }
            self.scan = Scan::Esc;
            return self.sink.write_all(&[ESC]);
        }

        if self.pending_len > 0 {
            if (0x80..=0xbf).contains(&b) {
                self.pending[self.pending_len as usize] = b;
                self.pending_len += 1;
                if self.pending_len == self.pending_need {
                    let len = self.pending_len as usize;
                    self.pending_len = 0;
                    return self.emit_sequence(len);
                }
                return Ok(());
            }
            // Truncated sequence: resolve it, then reprocess this byte.
            self.pending_len = 0;
            self.emit_invalid()?;
            return self.feed_ground(b);
        }

        match b {
            0x00..=0x7f => self.emit_char(b as char),
            0xc2..=0xdf => self.start_pending(b, 2),
            0xe0..=0xef => self.start_pending(b, 3),
            0xf0..=0xf4 => self.start_pending(b, 4),
            // Stray continuation byte or invalid leading byte.
            _ => self.emit_invalid(),
        }
    }

    fn start_pending(&mut self, b: u8, need: u8) -> io::Result<()> {
        self.pending[0] = b;
        self.pending_len = 1;
        self.pending_need = need;
        Ok(())
    }

    /// Validate and emit the completed multi-byte sequence in `pending`.
    fn emit_sequence(&mut self, len: usize) -> io::Result<()> {
        match std::str::from_utf8(&self.pending[..len]) {
            Ok(s) => {
                // Exactly one code point by construction.
                let ch = s.chars().next().unwrap_or('?');
                self.emit_char(ch)
            }
            // Overlong encoding or surrogate — structurally complete but invalid.
            Err(_) => self.emit_invalid(),
        }
    }

    /// Emit a decoded code point if its width fits the remaining budget.
    fn emit_char(&mut self, ch: char) -> io::Result<()> {
        if self.discarding {
            return Ok(());
        }
        // Control and unassigned code points measure 0 columns here; the
        // terminal is free to disagree, but 0 keeps them from eating budget.
        let width = ch.width().unwrap_or(0) as u16;
        if width > self.budget {
            self.discarding = true;
            return Ok(());
        }
        self.budget -= width;
        let mut enc = [0u8; 4];
        self.sink.write_all(ch.encode_utf8(&mut enc).as_bytes())
    }

    /// Emit the `?` replacement for one malformed byte (width 1).
    fn emit_invalid(&mut self) -> io::Result<()> {
        if self.discarding {
            return Ok(());
        }
        if self.budget == 0 {
            self.discarding = true;
            return Ok(());
        }
        self.budget -= 1;
        self.sink.write_all(b"?")
    }
}

impl<W: Write> Write for BoundedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for &b in buf {
            self.feed(b)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
