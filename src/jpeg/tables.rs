// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Zigzag order, quantization and Huffman table parsing/serialization.
//!
//! Handles DQT (Define Quantization Table) and DHT (Define Huffman Table)
//! marker segments. Supports both 8-bit and 16-bit quantization precision
//! and multiple tables per marker segment.

use super::dct::QuantTable;
use super::error::{JpegError, Result};

/// Maps zigzag index (0–63) to natural row-major index (0–63).
pub const ZIGZAG_TO_NATURAL: [usize; 64] = [
     0,  1,  8, 16,  9,  2,  3, 10,
    17, 24, 32, 25, 18, 11,  4,  5,
    12, 19, 26, 33, 40, 48, 41, 34,
    27, 20, 13,  6,  7, 14, 21, 28,
    35, 42, 49, 56, 57, 50, 43, 36,
    29, 22, 15, 23, 30, 37, 44, 51,
    58, 59, 52, 45, 38, 31, 39, 46,
    53, 60, 61, 54, 47, 55, 62, 63,
];

/// Parse a DQT marker segment body (after the 2-byte length).
///
/// Returns a list of (table_id, QuantTable) pairs. A single DQT segment
/// can contain multiple tables.
pub fn parse_dqt(data: &[u8]) -> Result<Vec<(u8, QuantTable)>> {
    let mut tables = Vec::new();
    let mut pos = 0;

    while pos < data.len() {
        let pq_tq = data[pos];
        pos += 1;
        let precision = pq_tq >> 4;
        let table_id = pq_tq & 0x0F;

        if table_id > 3 {
            return Err(JpegError::InvalidQuantTableId(table_id));
        }

        let mut values = [0u16; 64];
        match precision {
            0 => {
                if pos + 64 > data.len() {
                    return Err(JpegError::UnexpectedEof);
                }
                for (zi, &ni) in ZIGZAG_TO_NATURAL.iter().enumerate() {
                    values[ni] = data[pos + zi] as u16;
                }
                pos += 64;
            }
            1 => {
                if pos + 128 > data.len() {
                    return Err(JpegError::UnexpectedEof);
                }
                for (zi, &ni) in ZIGZAG_TO_NATURAL.iter().enumerate() {
                    values[ni] = u16::from_be_bytes([data[pos + zi * 2], data[pos + zi * 2 + 1]]);
                }
                pos += 128;
            }
            _ => return Err(JpegError::InvalidMarkerData("invalid DQT precision")),
        }

        if values.contains(&0) {
            return Err(JpegError::InvalidMarkerData("zero quantizer in DQT"));
        }
        tables.push((table_id, QuantTable::new(values)));
    }

    Ok(tables)
}

/// Build a DQT segment body holding every defined table.
///
/// Tables whose values all fit in a byte are written with 8-bit precision,
/// the rest with 16-bit precision.
pub fn dqt_body(tables: &[Option<QuantTable>; 4]) -> Vec<u8> {
    let mut out = Vec::new();
    for (id, qt) in tables.iter().enumerate() {
        let Some(qt) = qt else { continue };
        let precision = if qt.values.iter().all(|&v| v <= 255) { 0u8 } else { 1u8 };
        out.push((precision << 4) | id as u8);
        for &ni in &ZIGZAG_TO_NATURAL {
            if precision == 0 {
                out.push(qt.values[ni] as u8);
            } else {
                out.extend_from_slice(&qt.values[ni].to_be_bytes());
            }
        }
    }
    out
}

/// Parsed Huffman table specification.
#[derive(Debug, Clone)]
pub struct HuffmanSpec {
    /// Table class: 0 = DC, 1 = AC.
    pub class: u8,
    /// Table ID (0–3).
    pub id: u8,
    /// Number of codes of each length (1–16).
    pub bits: [u8; 16],
    /// Symbol values in order of increasing code length.
    pub huffval: Vec<u8>,
}

/// Huffman tables currently in effect, by class and ID.
///
/// A DHT segment may redefine a table between scans, so decoders install
/// each table as it is encountered.
#[derive(Debug, Clone, Default)]
pub struct HuffmanSlots {
    pub dc: [Option<HuffmanSpec>; 4],
    pub ac: [Option<HuffmanSpec>; 4],
}

impl HuffmanSlots {
    /// Store a table in the slot named by its class and ID.
    pub fn install(&mut self, spec: HuffmanSpec) {
        let id = (spec.id & 0x03) as usize;
        if spec.class == 0 {
            self.dc[id] = Some(spec);
        } else {
            self.ac[id] = Some(spec);
        }
    }

    /// All defined tables, DC tables first.
    pub fn iter(&self) -> impl Iterator<Item = &HuffmanSpec> {
        self.dc.iter().chain(self.ac.iter()).flatten()
    }
}

/// Parse a DHT marker segment body (after the 2-byte length).
///
/// Returns a list of HuffmanSpec. A single DHT segment can contain multiple tables.
pub fn parse_dht(data: &[u8]) -> Result<Vec<HuffmanSpec>> {
    let mut specs = Vec::new();
    let mut pos = 0;

    while pos < data.len() {
        let tc_th = data[pos];
        pos += 1;
        let class = tc_th >> 4;
        let id = tc_th & 0x0F;

        if class > 1 || id > 3 {
            return Err(JpegError::InvalidHuffmanTableId(tc_th));
        }

        if pos + 16 > data.len() {
            return Err(JpegError::UnexpectedEof);
        }
        let mut bits = [0u8; 16];
        bits.copy_from_slice(&data[pos..pos + 16]);
        pos += 16;

        let total: usize = bits.iter().map(|&b| b as usize).sum();
        if total > 256 {
            return Err(JpegError::InvalidMarkerData("too many Huffman symbols"));
        }
        if pos + total > data.len() {
            return Err(JpegError::UnexpectedEof);
        }
        let huffval = data[pos..pos + total].to_vec();
        pos += total;

        specs.push(HuffmanSpec {
            class,
            id,
            bits,
            huffval,
        });
    }

    Ok(specs)
}

/// Build a DHT segment body holding all the given tables.
pub fn dht_body<'a>(specs: impl IntoIterator<Item = &'a HuffmanSpec>) -> Vec<u8> {
    let mut out = Vec::new();
    for spec in specs {
        out.push((spec.class << 4) | (spec.id & 0x0F));
        out.extend_from_slice(&spec.bits);
        out.extend_from_slice(&spec.huffval);
    }
    out
}
