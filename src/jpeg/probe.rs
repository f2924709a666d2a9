// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Header-only dimension probe.
//!
//! Walks marker segments up to the first SOF and parses it. Entropy-coded
//! data is never touched, so probing a large file costs only its header.

use super::error::{JpegError, Result};
use super::frame::{parse_sof_ext, FrameInfo};
use super::marker::{self, next_marker};

/// Parse the frame header of a JPEG stream.
pub fn probe_frame(data: &[u8]) -> Result<FrameInfo> {
    if data.len() < 2 || data[0] != 0xFF || data[1] != marker::SOI {
        return Err(JpegError::InvalidSoi);
    }
    let mut pos = 2;
    loop {
        let (entry, next) = next_marker(data, pos)?;
        match entry.marker {
            marker::SOF0 | marker::SOF1 => return parse_sof_ext(&entry.data, false),
            marker::SOF2 => return parse_sof_ext(&entry.data, true),
            marker::SOS | marker::EOI => return Err(JpegError::MissingSof),
            _ => pos = next,
        }
    }
}

/// Width and height in pixels, from the frame header alone.
pub fn probe(data: &[u8]) -> Result<(u16, u16)> {
    let frame = probe_frame(data)?;
    Ok((frame.width, frame.height))
}
