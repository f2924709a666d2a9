// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Huffman coding tables for JPEG entropy decoding and encoding, and the
//! optimal table generator used when re-encoding coefficients.

use super::bitio::BitReader;
use super::error::{JpegError, Result};
use super::tables::HuffmanSpec;

/// Bits covered by the fast decode lookup.
const FAST_BITS: u8 = 9;

/// Huffman decode table with two-level lookup.
///
/// Level 1: a 9-bit lookup table (covers most codes).
/// Level 2: canonical per-length comparison for longer codes.
pub struct HuffmanDecodeTable {
    /// Indexed by the next FAST_BITS bits: (symbol, code_length), length 0 = slow path.
    fast: Vec<(u8, u8)>,
    /// Largest code of each length (index = length), -1 if none.
    maxcode: [i32; 18],
    /// huffval index of the first code of each length minus that code.
    valoffset: [i32; 17],
    huffval: Vec<u8>,
}

impl HuffmanDecodeTable {
    /// Build a decode table from JPEG-style counts and symbols.
    ///
    /// `bits`: counts[i] = number of codes of length i+1 (16 entries).
    /// `huffval`: the symbols, in order of increasing code length.
    pub fn build(bits: &[u8; 16], huffval: &[u8]) -> Result<Self> {
        let total: usize = bits.iter().map(|&b| b as usize).sum();
        if total > huffval.len() || total > 256 {
            return Err(JpegError::InvalidMarkerData("DHT symbol count mismatch"));
        }

        let mut fast = vec![(0u8, 0u8); 1 << FAST_BITS];
        let mut maxcode = [-1i32; 18];
        let mut valoffset = [0i32; 17];

        // Canonical codes per ITU-T T.81 Annex C
        let mut code: i32 = 0;
        let mut si: usize = 0;
        for length in 1..=16u8 {
            let count = bits[(length - 1) as usize] as usize;
            if count > 0 {
                valoffset[length as usize] = si as i32 - code;
                for _ in 0..count {
                    if code >= 1i32 << length {
                        return Err(JpegError::InvalidMarkerData("overfull Huffman table"));
                    }
                    if length <= FAST_BITS {
                        let shift = FAST_BITS - length;
                        let base = (code as usize) << shift;
                        for slot in &mut fast[base..base + (1 << shift)] {
                            *slot = (huffval[si], length);
                        }
                    }
                    code += 1;
                    si += 1;
                }
                maxcode[length as usize] = code - 1;
            }
            code <<= 1;
        }
        // Sentinel so the slow path always terminates
        maxcode[17] = i32::MAX;

        Ok(Self {
            fast,
            maxcode,
            valoffset,
            huffval: huffval[..total].to_vec(),
        })
    }

    /// Build from a parsed DHT spec.
    pub fn from_spec(spec: &HuffmanSpec) -> Result<Self> {
        Self::build(&spec.bits, &spec.huffval)
    }

    /// Decode one Huffman symbol from the bit stream.
    pub fn decode(&self, reader: &mut BitReader) -> Result<u8> {
        let peek = reader.peek_bits(FAST_BITS)? as usize;
        let (symbol, length) = self.fast[peek];
        if length > 0 {
            reader.skip_bits(length);
            return Ok(symbol);
        }

        let mut code = reader.peek_bits(FAST_BITS + 1)? as i32;
        let mut length = FAST_BITS + 1;
        while length <= 16 && code > self.maxcode[length as usize] {
            length += 1;
            if length > 16 {
                break;
            }
            code = reader.peek_bits(length)? as i32;
        }
        if length > 16 {
            return Err(JpegError::HuffmanDecode);
        }
        reader.skip_bits(length);
        let idx = code + self.valoffset[length as usize];
        self.huffval
            .get(idx as usize)
            .copied()
            .ok_or(JpegError::HuffmanDecode)
    }
}

/// Huffman encode table: maps symbol → (code_bits, code_length).
pub struct HuffmanEncodeTable {
    /// For each of the 256 possible symbols: (code, length).
    /// Length 0 means the symbol is not in the table.
    table: [(u16, u8); 256],
}

impl HuffmanEncodeTable {
    /// Build an encode table from a DHT spec.
    pub fn from_spec(spec: &HuffmanSpec) -> Self {
        let mut table = [(0u16, 0u8); 256];
        let mut code: u32 = 0;
        let mut symbols = spec.huffval.iter();

        for length in 1..=16u8 {
            for _ in 0..spec.bits[(length - 1) as usize] {
                if let Some(&symbol) = symbols.next() {
                    table[symbol as usize] = (code as u16, length);
                }
                code += 1;
            }
            code <<= 1;
        }

        Self { table }
    }

    /// Encode a symbol: returns (code_bits, code_length).
    /// Returns `Err` if the symbol has no code in this table.
    pub fn encode(&self, symbol: u8) -> Result<(u16, u8)> {
        match self.table[symbol as usize] {
            (_, 0) => Err(JpegError::InvalidMarkerData(
                "Huffman table missing code for symbol",
            )),
            entry => Ok(entry),
        }
    }
}

/// Extend a signed value from its JPEG "additional bits" representation.
///
/// Per ITU-T T.81 Table F.1: if the high bit is 0, the value is negative.
pub fn extend_sign(value: u16, bits: u8) -> i16 {
    if bits == 0 {
        return 0;
    }
    let v = value as i32;
    if v < (1i32 << (bits - 1)) {
        (v - (1i32 << bits) + 1) as i16
    } else {
        v as i16
    }
}

/// Encode a signed value into JPEG "additional bits" representation.
/// Returns (magnitude_bits, category/size).
///
/// Takes an `i32` so DC differences spanning the full `i16` range keep their
/// sign; the category is capped at 15 (baseline limit for DC, 10 for AC).
pub fn encode_value(value: i32) -> (u16, u8) {
    if value == 0 {
        return (0, 0);
    }
    let size = (32 - value.unsigned_abs().leading_zeros()).min(15) as u8;
    let bits = if value > 0 { value } else { value - 1 };
    ((bits as u32 & ((1u32 << size) - 1)) as u16, size)
}

/// Generate an optimal Huffman table from symbol frequencies.
///
/// Follows the code-length procedure of ITU-T T.81 Annex K.2 with a reserved
/// pseudo-symbol of frequency 1, so no real symbol is assigned the all-ones
/// code, then limits code lengths to 16 bits. Symbols with zero frequency
/// get no code. If no symbol occurs at all, symbol 0 is given a code so the
/// table is never empty.
pub fn optimal_spec(class: u8, id: u8, freq: &[u32; 256]) -> HuffmanSpec {
    const PSEUDO: usize = 256;
    let mut weight = [0u64; 257];
    for (w, &f) in weight.iter_mut().zip(freq.iter()) {
        *w = f as u64;
    }
    if weight[..PSEUDO].iter().all(|&w| w == 0) {
        weight[0] = 1;
    }
    weight[PSEUDO] = 1;

    let mut codesize = [0usize; 257];
    let mut others = [usize::MAX; 257];

    loop {
        // Least frequent symbol; ties go to the highest index so the pseudo
        // symbol is merged first and ends up among the longest codes.
        let mut c1 = None;
        let mut best = u64::MAX;
        for (i, &w) in weight.iter().enumerate() {
            if w > 0 && w <= best {
                best = w;
                c1 = Some(i);
            }
        }
        let Some(c1) = c1 else { break };

        let mut c2 = None;
        let mut best = u64::MAX;
        for (i, &w) in weight.iter().enumerate() {
            if w > 0 && w <= best && i != c1 {
                best = w;
                c2 = Some(i);
            }
        }
        let Some(c2) = c2 else { break };

        weight[c1] += weight[c2];
        weight[c2] = 0;

        let mut node = c1;
        codesize[node] += 1;
        while others[node] != usize::MAX {
            node = others[node];
            codesize[node] += 1;
        }
        others[node] = c2;

        let mut node = c2;
        codesize[node] += 1;
        while others[node] != usize::MAX {
            node = others[node];
            codesize[node] += 1;
        }
    }

    let mut counts = [0u32; 258];
    for &size in codesize.iter().filter(|&&s| s > 0) {
        counts[size] += 1;
    }

    // Annex K.3: move codes longer than 16 bits up the tree
    for i in (17..counts.len()).rev() {
        while counts[i] > 0 {
            let mut j = i - 2;
            while counts[j] == 0 {
                j -= 1;
            }
            counts[i] -= 2;
            counts[i - 1] += 1;
            counts[j + 1] += 2;
            counts[j] -= 1;
        }
    }
    // Drop the pseudo symbol's code from the longest length in use
    if let Some(longest) = (1..=16).rev().find(|&i| counts[i] > 0) {
        counts[longest] -= 1;
    }

    let mut bits = [0u8; 16];
    for (dst, &count) in bits.iter_mut().zip(&counts[1..=16]) {
        *dst = count as u8;
    }

    let mut huffval = Vec::new();
    for size in 1..counts.len() {
        for (sym, &s) in codesize[..PSEUDO].iter().enumerate() {
            if s == size {
                huffval.push(sym as u8);
            }
        }
    }

    HuffmanSpec { class, id, bits, huffval }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jpeg::bitio::BitWriter;

    // Standard JPEG luminance DC Huffman table (ITU-T T.81 Table K.3)
    fn lum_dc_spec() -> HuffmanSpec {
        HuffmanSpec {
            class: 0,
            id: 0,
            bits: [0, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0],
            huffval: (0..12).collect(),
        }
    }

    fn decode_all(spec: &HuffmanSpec, symbols: &[u8]) -> Vec<u8> {
        let enc = HuffmanEncodeTable::from_spec(spec);
        let dec = HuffmanDecodeTable::from_spec(spec).unwrap();
        let mut w = BitWriter::new();
        for &sym in symbols {
            let (code, len) = enc.encode(sym).unwrap();
            w.write_bits(code, len);
        }
        let mut bytes = w.flush();
        // Trailing marker supplies zero bits for the last peeks
        bytes.extend_from_slice(&[0xFF, 0xD9]);
        let mut reader = BitReader::new(&bytes, 0);
        symbols.iter().map(|_| dec.decode(&mut reader).unwrap()).collect()
    }

    #[test]
    fn encode_decode_roundtrip() {
        let spec = lum_dc_spec();
        let symbols: Vec<u8> = (0..12).chain((0..12).rev()).collect();
        assert_eq!(decode_all(&spec, &symbols), symbols);
    }

    #[test]
    fn long_codes_use_slow_path() {
        // One code of each length 1..=15 plus two of length 16
        let mut bits = [1u8; 16];
        bits[15] = 2;
        let spec = HuffmanSpec { class: 1, id: 0, bits, huffval: (0..17).collect() };
        let symbols: Vec<u8> = (0..17).rev().collect();
        assert_eq!(decode_all(&spec, &symbols), symbols);
    }

    #[test]
    fn overfull_table_rejected() {
        let bits = [3, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        assert!(HuffmanDecodeTable::build(&bits, &[1, 2, 3]).is_err());
    }

    #[test]
    fn extend_sign_values() {
        assert_eq!(extend_sign(0, 1), -1);
        assert_eq!(extend_sign(1, 1), 1);
        assert_eq!(extend_sign(0, 3), -7);
        assert_eq!(extend_sign(3, 3), -4);
        assert_eq!(extend_sign(4, 3), 4);
        assert_eq!(extend_sign(7, 3), 7);
        assert_eq!(extend_sign(0, 0), 0);
    }

    #[test]
    fn encode_value_inverts_extend_sign() {
        for v in -2047i32..=2047 {
            let (bits, size) = encode_value(v);
            if v == 0 {
                assert_eq!(size, 0);
            } else {
                assert_eq!(extend_sign(bits, size) as i32, v, "value {v}");
            }
        }
    }

    #[test]
    fn optimal_spec_covers_used_symbols() {
        let mut freq = [0u32; 256];
        freq[0x00] = 500;
        freq[0x01] = 300;
        freq[0x11] = 40;
        freq[0xF0] = 3;
        freq[0x2A] = 1;
        let spec = optimal_spec(1, 0, &freq);
        let total: usize = spec.bits.iter().map(|&b| b as usize).sum();
        assert_eq!(total, 5);
        let mut syms = spec.huffval.clone();
        syms.sort_unstable();
        assert_eq!(syms, vec![0x00, 0x01, 0x11, 0x2A, 0xF0]);
        // Most frequent symbol gets the shortest code
        assert_eq!(spec.huffval[0], 0x00);
        HuffmanDecodeTable::from_spec(&spec).unwrap();
    }

    #[test]
    fn optimal_spec_single_symbol() {
        let mut freq = [0u32; 256];
        freq[3] = 10;
        let spec = optimal_spec(0, 1, &freq);
        assert_eq!(spec.huffval, vec![3]);
        assert_eq!(spec.bits[0], 1);
        let enc = HuffmanEncodeTable::from_spec(&spec);
        assert_eq!(enc.encode(3).unwrap(), (0, 1));
    }

    #[test]
    fn optimal_spec_limits_lengths() {
        // Fibonacci-like frequencies force a degenerate tree deeper than 16
        let mut freq = [0u32; 256];
        let (mut a, mut b) = (1u32, 1u32);
        for f in freq.iter_mut().take(30) {
            *f = a;
            let next = a.saturating_add(b);
            a = b;
            b = next;
        }
        let spec = optimal_spec(1, 0, &freq);
        let total: usize = spec.bits.iter().map(|&b| b as usize).sum();
        assert_eq!(total, 30);
        // Kraft sum strictly below one leaves room for the reserved code
        let kraft: f64 = spec
            .bits
            .iter()
            .enumerate()
            .map(|(i, &n)| n as f64 / (1u64 << (i + 1)) as f64)
            .sum();
        assert!(kraft < 1.0);
        let symbols: Vec<u8> = (0..30).collect();
        assert_eq!(decode_all(&spec, &symbols), symbols);
    }
}
