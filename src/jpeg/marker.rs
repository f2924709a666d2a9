// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! JPEG marker parsing and iteration.
//!
//! Walks the marker segments in a JPEG byte stream, extracting headers
//! (DQT, DHT, SOF, DRI, SOS) and keeping application/comment segments
//! verbatim. The header walk stops at the first SOS; the full walk steps
//! over every scan's entropy-coded data until EOI.

use super::error::{JpegError, Result};

/// JPEG marker constants.
pub const SOI: u8 = 0xD8;
pub const EOI: u8 = 0xD9;
pub const SOF0: u8 = 0xC0;
pub const SOF1: u8 = 0xC1;
pub const SOF2: u8 = 0xC2;
pub const DHT: u8 = 0xC4;
pub const DQT: u8 = 0xDB;
pub const DRI: u8 = 0xDD;
pub const SOS: u8 = 0xDA;
pub const APP0: u8 = 0xE0;
pub const APP15: u8 = 0xEF;
pub const COM: u8 = 0xFE;

/// Parsed marker with position information.
#[derive(Debug, Clone)]
pub struct MarkerEntry {
    /// The marker byte (e.g. 0xDB for DQT), without the 0xFF prefix.
    pub marker: u8,
    /// Segment data without the 2-byte length field.
    /// Empty for standalone markers like SOI, EOI, RST.
    pub data: Vec<u8>,
    /// Byte offset of the marker (the 0xFF byte) in the original data.
    pub offset: usize,
}

/// Result of walking a whole file.
pub struct MarkerMap {
    pub entries: Vec<MarkerEntry>,
    /// For each SOS entry, the offset where its entropy-coded data begins.
    pub scan_starts: Vec<usize>,
}

/// Walk the header markers, stopping right after the first SOS.
///
/// Returns the entries and the offset of the first scan's entropy-coded data.
/// A file without any scan ends at EOI, and the returned offset then points
/// past the EOI marker.
pub fn iterate_markers(data: &[u8]) -> Result<(Vec<MarkerEntry>, usize)> {
    let mut entries = Vec::new();
    let mut pos = check_soi(data, &mut entries)?;

    loop {
        let (entry, next) = next_marker(data, pos)?;
        let marker = entry.marker;
        entries.push(entry);
        pos = next;
        if marker == SOS || marker == EOI {
            return Ok((entries, pos));
        }
    }
}

/// Walk every marker of the file, stepping over the entropy-coded data of
/// each scan, until EOI.
pub fn iterate_markers_all(data: &[u8]) -> Result<MarkerMap> {
    let mut entries = Vec::new();
    let mut scan_starts = Vec::new();
    let mut pos = check_soi(data, &mut entries)?;

    loop {
        let (entry, next) = next_marker(data, pos)?;
        let marker = entry.marker;
        entries.push(entry);
        pos = next;
        match marker {
            EOI => return Ok(MarkerMap { entries, scan_starts }),
            SOS => {
                scan_starts.push(pos);
                pos = skip_scan_data(data, pos)?;
            }
            _ => {}
        }
    }
}

fn check_soi(data: &[u8], entries: &mut Vec<MarkerEntry>) -> Result<usize> {
    if data.len() < 2 || data[0] != 0xFF || data[1] != SOI {
        return Err(JpegError::InvalidSoi);
    }
    entries.push(MarkerEntry {
        marker: SOI,
        data: Vec::new(),
        offset: 0,
    });
    Ok(2)
}

/// Read the marker at or after `pos`. Returns the entry and the offset just
/// past its segment.
pub(crate) fn next_marker(data: &[u8], mut pos: usize) -> Result<(MarkerEntry, usize)> {
    loop {
        // Garbage between segments is skipped up to the next 0xFF
        while pos < data.len() && data[pos] != 0xFF {
            pos += 1;
        }
        // Fill bytes
        while pos + 1 < data.len() && data[pos + 1] == 0xFF {
            pos += 1;
        }
        if pos + 1 >= data.len() {
            return Err(JpegError::UnexpectedEof);
        }

        let offset = pos;
        let marker = data[pos + 1];
        pos += 2;

        if marker == 0x00 {
            continue;
        }

        if marker == EOI || is_rst(marker) {
            let entry = MarkerEntry { marker, data: Vec::new(), offset };
            return Ok((entry, pos));
        }

        if is_unsupported(marker) {
            return Err(JpegError::UnsupportedMarker(marker));
        }

        if pos + 2 > data.len() {
            return Err(JpegError::UnexpectedEof);
        }
        let length = u16::from_be_bytes([data[pos], data[pos + 1]]) as usize;
        if length < 2 {
            return Err(JpegError::InvalidMarkerData("invalid segment length"));
        }
        if pos + length > data.len() {
            return Err(JpegError::UnexpectedEof);
        }
        let entry = MarkerEntry {
            marker,
            data: data[pos + 2..pos + length].to_vec(),
            offset,
        };
        return Ok((entry, pos + length));
    }
}

fn is_rst(marker: u8) -> bool {
    (0xD0..=0xD7).contains(&marker)
}

/// True for APP0..APP15.
pub fn is_app(marker: u8) -> bool {
    (APP0..=APP15).contains(&marker)
}

/// Lossless, hierarchical and arithmetic-coded frames.
fn is_unsupported(marker: u8) -> bool {
    matches!(
        marker,
        0xC3 // SOF3 lossless
        | 0xC5..=0xC7 // SOF5-7 differential
        | 0xC9..=0xCB // SOF9-11 arithmetic
        | 0xCC // DAC
        | 0xCD..=0xCF // SOF13-15 differential arithmetic
        | 0xDC // DNL
        | 0xDE // DHP
    )
}

/// Spectral selection and successive approximation parameters from an SOS header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SosParams {
    /// Start of spectral selection (zigzag index 0-63).
    pub ss: u8,
    /// End of spectral selection (zigzag index 0-63).
    pub se: u8,
    /// Successive approximation high bit (0 = first scan for this band).
    pub ah: u8,
    /// Successive approximation low bit (point transform).
    pub al: u8,
}

impl SosParams {
    /// Parameters of a sequential scan covering the whole block.
    pub const SEQUENTIAL: SosParams = SosParams { ss: 0, se: 63, ah: 0, al: 0 };
}

/// A component entry of an SOS header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanComponent {
    pub id: u8,
    pub dc_table: u8,
    pub ac_table: u8,
}

/// Parse an SOS (Start of Scan) header into its component selectors and
/// spectral parameters.
pub fn parse_sos(data: &[u8]) -> Result<(Vec<ScanComponent>, SosParams)> {
    if data.is_empty() {
        return Err(JpegError::InvalidMarkerData("empty SOS"));
    }
    let num_components = data[0] as usize;
    if num_components == 0 || num_components > 4 {
        return Err(JpegError::InvalidMarkerData("bad SOS component count"));
    }
    let params_offset = 1 + num_components * 2;
    if data.len() < params_offset + 3 {
        return Err(JpegError::UnexpectedEof);
    }

    let selectors = data[1..params_offset]
        .chunks_exact(2)
        .map(|pair| ScanComponent {
            id: pair[0],
            dc_table: pair[1] >> 4,
            ac_table: pair[1] & 0x0F,
        })
        .collect();

    let ah_al = data[params_offset + 2];
    let params = SosParams {
        ss: data[params_offset],
        se: data[params_offset + 1],
        ah: ah_al >> 4,
        al: ah_al & 0x0F,
    };
    if params.ss > params.se || params.se > 63 || params.al > 13 {
        return Err(JpegError::InvalidMarkerData("bad SOS spectral parameters"));
    }
    Ok((selectors, params))
}

/// Skip past entropy-coded scan data to find the next marker.
///
/// Starting from `pos` (the first byte of entropy-coded data after an SOS header),
/// scans forward looking for a 0xFF byte followed by a non-zero, non-RST marker byte.
/// Returns the byte offset of the 0xFF byte of the next marker.
pub fn skip_scan_data(data: &[u8], mut pos: usize) -> Result<usize> {
    while pos < data.len() {
        if data[pos] != 0xFF {
            pos += 1;
            continue;
        }
        if pos + 1 >= data.len() {
            return Err(JpegError::UnexpectedEof);
        }
        match data[pos + 1] {
            0x00 => pos += 2,
            m if is_rst(m) => pos += 2,
            0xFF => pos += 1,
            _ => return Ok(pos),
        }
    }
    Err(JpegError::UnexpectedEof)
}

/// Parse DRI (Define Restart Interval) marker data.
pub fn parse_dri(data: &[u8]) -> Result<u16> {
    if data.len() < 2 {
        return Err(JpegError::UnexpectedEof);
    }
    Ok(u16::from_be_bytes([data[0], data[1]]))
}

/// Append a marker segment (marker, length, body) to `out`.
pub fn write_segment(out: &mut Vec<u8>, marker: u8, body: &[u8]) -> Result<()> {
    let length = u16::try_from(body.len() + 2)
        .map_err(|_| JpegError::InvalidMarkerData("segment too long"))?;
    out.extend_from_slice(&[0xFF, marker]);
    out.extend_from_slice(&length.to_be_bytes());
    out.extend_from_slice(body);
    Ok(())
}
