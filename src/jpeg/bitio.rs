// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Bit-level I/O for JPEG entropy-coded data.
//!
//! Provides [`BitReader`] for decoding and [`BitWriter`] for encoding the
//! entropy-coded scan data. Both handle JPEG byte-stuffing (0xFF -> 0xFF 0x00)
//! and operate in MSB-first bit order.

use super::error::{JpegError, Result};

/// Bit-level reader for JPEG entropy-coded data.
///
/// Handles JPEG byte-stuffing (0xFF00 → 0xFF) and marker detection.
/// Once a marker is reached the reader supplies zero bits, so the last
/// codes of a scan can be peeked past its final byte.
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    /// Bit buffer, MSB-aligned. Valid bits are in the low `bits_left` positions.
    buf: u32,
    bits_left: u8,
    /// Set when a marker (0xFF followed by non-zero byte) is found in the stream.
    marker_found: Option<u8>,
}

impl<'a> BitReader<'a> {
    /// Create a new BitReader over the given byte slice.
    /// `pos` should point to the first byte of entropy-coded data (after SOS header).
    pub fn new(data: &'a [u8], pos: usize) -> Self {
        Self {
            data,
            pos,
            buf: 0,
            bits_left: 0,
            marker_found: None,
        }
    }

    /// Read `count` bits (1–16) and return them right-aligned.
    pub fn read_bits(&mut self, count: u8) -> Result<u16> {
        let val = self.peek_bits(count)?;
        self.bits_left -= count;
        Ok(val)
    }

    /// Read a single bit.
    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? != 0)
    }

    /// Peek at the top `count` bits without consuming them.
    pub fn peek_bits(&mut self, count: u8) -> Result<u16> {
        debug_assert!((1..=16).contains(&count));
        while self.bits_left < count {
            self.fill_byte()?;
        }
        let val = (self.buf >> (self.bits_left - count)) & ((1u32 << count) - 1);
        Ok(val as u16)
    }

    /// Discard `count` bits (must have been peeked already).
    pub fn skip_bits(&mut self, count: u8) {
        debug_assert!(count <= self.bits_left);
        self.bits_left -= count;
    }

    /// Returns the marker byte if a marker was encountered during reading.
    pub fn marker_found(&self) -> Option<u8> {
        self.marker_found
    }

    /// Consume a restart marker (0xFFD0–0xFFD7) at the current position.
    ///
    /// Discards the remaining bits of the current byte, then accepts the RST
    /// either already latched by a look-ahead read or next in the stream.
    /// Returns the marker's low nibble (0–7), or `None` if no RST follows.
    pub fn check_restart_marker(&mut self) -> Result<Option<u8>> {
        self.bits_left = 0;
        self.buf = 0;

        if let Some(m) = self.marker_found {
            if (m & 0xF8) == 0xD0 {
                self.marker_found = None;
                return Ok(Some(m & 0x07));
            }
            return Ok(None);
        }

        while self.pos + 1 < self.data.len() && self.data[self.pos] == 0xFF {
            let next = self.data[self.pos + 1];
            if next == 0xFF {
                self.pos += 1;
                continue;
            }
            if (next & 0xF8) == 0xD0 {
                self.pos += 2;
                return Ok(Some(next & 0x07));
            }
            break;
        }

        Ok(None)
    }

    fn fill_byte(&mut self) -> Result<()> {
        if self.marker_found.is_some() {
            self.push_byte(0);
            return Ok(());
        }
        if self.pos >= self.data.len() {
            return Err(JpegError::UnexpectedEof);
        }
        let byte = self.data[self.pos];
        self.pos += 1;

        if byte == 0xFF {
            // Fill bytes may repeat before the byte that decides stuffing vs marker
            while self.pos < self.data.len() && self.data[self.pos] == 0xFF {
                self.pos += 1;
            }
            if self.pos >= self.data.len() {
                return Err(JpegError::UnexpectedEof);
            }
            let next = self.data[self.pos];
            self.pos += 1;
            if next != 0x00 {
                self.marker_found = Some(next);
                self.push_byte(0);
                return Ok(());
            }
        }

        self.push_byte(byte);
        Ok(())
    }

    fn push_byte(&mut self, byte: u8) {
        self.buf = (self.buf << 8) | (byte as u32);
        self.bits_left += 8;
    }
}

/// Bit-level writer for JPEG entropy-coded data.
///
/// Handles byte-stuffing (0xFF → 0xFF 0x00). MSB-first bit order.
#[derive(Default)]
pub struct BitWriter {
    output: Vec<u8>,
    /// Pending bits, right-aligned.
    acc: u32,
    bits_used: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `count` bits (0–16) from the low bits of `value`.
    pub fn write_bits(&mut self, value: u16, count: u8) {
        debug_assert!(count <= 16);
        if count == 0 {
            return;
        }
        let mask = (1u32 << count) - 1;
        self.acc = (self.acc << count) | (value as u32 & mask);
        self.bits_used += count;
        while self.bits_used >= 8 {
            self.bits_used -= 8;
            let byte = (self.acc >> self.bits_used) as u8;
            self.emit_byte(byte);
        }
        self.acc &= (1u32 << self.bits_used) - 1;
    }

    /// Pad remaining bits with 1s and return the stuffed bytes.
    pub fn flush(mut self) -> Vec<u8> {
        if self.bits_used > 0 {
            let remaining = 8 - self.bits_used;
            let byte = ((self.acc << remaining) | ((1u32 << remaining) - 1)) as u8;
            self.emit_byte(byte);
        }
        self.output
    }

    fn emit_byte(&mut self, byte: u8) {
        self.output.push(byte);
        if byte == 0xFF {
            self.output.push(0x00);
        }
    }
}
