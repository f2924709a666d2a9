// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! JPEG scan data encoding and decoding.
//!
//! Decodes entropy-coded scans (sequential or progressive, interleaved or
//! not) into [`DctGrid`]s indexed by frame component, and encodes grids
//! into a single interleaved baseline scan. Encoding runs over an
//! [`EntropySink`], so the same traversal both gathers symbol statistics
//! for optimal tables and writes the final bits.

use super::bitio::{BitReader, BitWriter};
use super::dct::DctGrid;
use super::error::{JpegError, Result};
use super::frame::FrameInfo;
use super::huffman::{encode_value, extend_sign, HuffmanDecodeTable, HuffmanEncodeTable};
use super::marker::SosParams;
use super::tables::{HuffmanSlots, ZIGZAG_TO_NATURAL};

/// Component selector for one scan component.
#[derive(Debug, Clone)]
pub struct ScanComponent {
    /// Index into FrameInfo.components.
    pub comp_idx: usize,
    /// DC Huffman table index.
    pub dc_table: usize,
    /// AC Huffman table index.
    pub ac_table: usize,
}

/// A resolved SOS header.
#[derive(Debug, Clone)]
pub struct ScanSpec {
    pub components: Vec<ScanComponent>,
    pub params: SosParams,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanKind {
    Sequential,
    DcFirst,
    DcRefine,
    AcFirst,
    AcRefine,
}

impl ScanKind {
    fn classify(frame: &FrameInfo, scan: &ScanSpec) -> Result<Self> {
        let p = scan.params;
        if !frame.is_progressive {
            if p != SosParams::SEQUENTIAL {
                return Err(JpegError::InvalidMarkerData("sequential scan with spectral selection"));
            }
            return Ok(Self::Sequential);
        }
        if p.ss == 0 {
            if p.se != 0 {
                return Err(JpegError::InvalidMarkerData("progressive scan mixes DC and AC"));
            }
            return Ok(if p.ah == 0 { Self::DcFirst } else { Self::DcRefine });
        }
        if scan.components.len() != 1 {
            return Err(JpegError::InvalidMarkerData("interleaved progressive AC scan"));
        }
        Ok(if p.ah == 0 { Self::AcFirst } else { Self::AcRefine })
    }

    fn needs_dc_table(self) -> bool {
        matches!(self, Self::Sequential | Self::DcFirst)
    }

    fn needs_ac_table(self) -> bool {
        matches!(self, Self::Sequential | Self::AcFirst | Self::AcRefine)
    }
}

/// Decode one scan, accumulating into `grids` (indexed by frame component).
///
/// - `data`: full JPEG file bytes
/// - `scan_start`: byte offset of the first entropy-coded byte (right after SOS header)
/// - `slots`: Huffman tables in effect for this scan
/// - `restart_interval`: from DRI marker, 0 = no restarts
///
/// A scan with a single component is non-interleaved and covers only the
/// blocks that carry image data; multi-component scans walk whole MCUs.
pub fn decode_scan(
    data: &[u8],
    scan_start: usize,
    frame: &FrameInfo,
    scan: &ScanSpec,
    slots: &HuffmanSlots,
    restart_interval: u16,
    grids: &mut [DctGrid],
) -> Result<()> {
    let kind = ScanKind::classify(frame, scan)?;

    let mut dc_tables: [Option<HuffmanDecodeTable>; 4] = Default::default();
    let mut ac_tables: [Option<HuffmanDecodeTable>; 4] = Default::default();
    for sc in &scan.components {
        if sc.comp_idx >= grids.len() || sc.dc_table > 3 || sc.ac_table > 3 {
            return Err(JpegError::InvalidMarkerData("bad scan component selector"));
        }
        if kind.needs_dc_table() && dc_tables[sc.dc_table].is_none() {
            let spec = slots.dc[sc.dc_table]
                .as_ref()
                .ok_or(JpegError::InvalidHuffmanTableId(sc.dc_table as u8))?;
            dc_tables[sc.dc_table] = Some(HuffmanDecodeTable::from_spec(spec)?);
        }
        if kind.needs_ac_table() && ac_tables[sc.ac_table].is_none() {
            let spec = slots.ac[sc.ac_table]
                .as_ref()
                .ok_or(JpegError::InvalidHuffmanTableId(sc.ac_table as u8))?;
            ac_tables[sc.ac_table] = Some(HuffmanDecodeTable::from_spec(spec)?);
        }
    }

    let mut state = ScanState {
        reader: BitReader::new(data, scan_start),
        kind,
        params: scan.params,
        dc_tables: &dc_tables,
        ac_tables: &ac_tables,
        dc_pred: vec![0; scan.components.len()],
        eob_run: 0,
        restart_interval,
        units: 0,
    };

    if let [sc] = scan.components.as_slice() {
        let grid = &mut grids[sc.comp_idx];
        for br in 0..frame.height_in_blocks(sc.comp_idx) {
            for bc in 0..frame.width_in_blocks(sc.comp_idx) {
                state.begin_unit()?;
                state.decode_block(0, sc, grid.block_mut(br, bc))?;
            }
        }
    } else {
        for mcu_row in 0..frame.mcus_tall as usize {
            for mcu_col in 0..frame.mcus_wide as usize {
                state.begin_unit()?;
                for (sci, sc) in scan.components.iter().enumerate() {
                    let comp = &frame.components[sc.comp_idx];
                    let (h, v) = (comp.h_sampling as usize, comp.v_sampling as usize);
                    for y in 0..v {
                        for x in 0..h {
                            let block = grids[sc.comp_idx].block_mut(mcu_row * v + y, mcu_col * h + x);
                            state.decode_block(sci, sc, block)?;
                        }
                    }
                }
            }
        }
    }

    log::trace!("decoded {:?} scan of {} component(s), {} units", kind, scan.components.len(), state.units);
    Ok(())
}

struct ScanState<'a, 't> {
    reader: BitReader<'a>,
    kind: ScanKind,
    params: SosParams,
    dc_tables: &'t [Option<HuffmanDecodeTable>; 4],
    ac_tables: &'t [Option<HuffmanDecodeTable>; 4],
    /// DC predictors per scan component (i32 so accumulated diffs cannot overflow).
    dc_pred: Vec<i32>,
    eob_run: u32,
    restart_interval: u16,
    units: usize,
}

fn table(tables: &[Option<HuffmanDecodeTable>; 4], id: usize) -> Result<&HuffmanDecodeTable> {
    tables[id].as_ref().ok_or(JpegError::InvalidHuffmanTableId(id as u8))
}

fn clamp_i16(v: i32) -> i16 {
    v.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

impl ScanState<'_, '_> {
    /// Handle the restart boundary before the next MCU (or block, for
    /// non-interleaved scans). Restart numbering is not checked.
    fn begin_unit(&mut self) -> Result<()> {
        let interval = self.restart_interval as usize;
        if interval > 0 && self.units > 0 && self.units % interval == 0 {
            self.reader.check_restart_marker()?;
            self.dc_pred.fill(0);
            self.eob_run = 0;
        }
        self.units += 1;
        Ok(())
    }

    fn decode_block(&mut self, sci: usize, sc: &ScanComponent, block: &mut [i16]) -> Result<()> {
        match self.kind {
            ScanKind::Sequential => {
                self.decode_dc_first(sci, sc, block)?;
                self.decode_ac_first(sc, 1, block)
            }
            ScanKind::DcFirst => self.decode_dc_first(sci, sc, block),
            ScanKind::DcRefine => {
                if self.reader.read_bit()? {
                    block[0] |= 1i16 << self.params.al;
                }
                Ok(())
            }
            ScanKind::AcFirst => self.decode_ac_first(sc, self.params.ss as usize, block),
            ScanKind::AcRefine => self.decode_ac_refine(sc, block),
        }
    }

    fn read_magnitude(&mut self, size: u8) -> Result<i32> {
        match size {
            0 => Ok(0),
            1..=15 => Ok(extend_sign(self.reader.read_bits(size)?, size) as i32),
            _ => Err(JpegError::HuffmanDecode),
        }
    }

    /// DC coefficient: Huffman-decoded difference, scaled by the point transform.
    fn decode_dc_first(&mut self, sci: usize, sc: &ScanComponent, block: &mut [i16]) -> Result<()> {
        let size = table(self.dc_tables, sc.dc_table)?.decode(&mut self.reader)?;
        let diff = self.read_magnitude(size)?;
        self.dc_pred[sci] = self.dc_pred[sci]
            .checked_add(diff)
            .filter(|pred| i16::try_from(*pred).is_ok())
            .ok_or(JpegError::HuffmanDecode)?;
        block[0] = clamp_i16(self.dc_pred[sci] << self.params.al);
        Ok(())
    }

    /// AC coefficients of the band [start..se], with EOBn runs spanning blocks.
    fn decode_ac_first(&mut self, sc: &ScanComponent, start: usize, block: &mut [i16]) -> Result<()> {
        if self.eob_run > 0 {
            self.eob_run -= 1;
            return Ok(());
        }

        let se = self.params.se as usize;
        let ac = table(self.ac_tables, sc.ac_table)?;
        let mut k = start;
        while k <= se {
            let rs = ac.decode(&mut self.reader)?;
            let run = (rs >> 4) as usize;
            let size = rs & 0x0F;

            if size == 0 {
                if run == 15 {
                    k += 16;
                    continue;
                }
                // EOB (run 0) or, in progressive scans, EOBn over 2^run + extra blocks
                if run > 0 && self.kind == ScanKind::Sequential {
                    return Err(JpegError::HuffmanDecode);
                }
                let extra = if run > 0 { self.reader.read_bits(run as u8)? as u32 } else { 0 };
                self.eob_run = (1u32 << run) + extra - 1;
                return Ok(());
            }

            k += run;
            if k > se {
                return Err(JpegError::HuffmanDecode);
            }
            let value = self.read_magnitude(size)?;
            block[ZIGZAG_TO_NATURAL[k]] = clamp_i16(value << self.params.al);
            k += 1;
        }
        Ok(())
    }

    /// Successive-approximation refinement of the band [ss..se] (T.81 G.1.2.3).
    ///
    /// Correction bits for coefficients that are already nonzero are
    /// interleaved with newly nonzero coefficients of magnitude 1.
    fn decode_ac_refine(&mut self, sc: &ScanComponent, block: &mut [i16]) -> Result<()> {
        let ss = self.params.ss as usize;
        let se = self.params.se as usize;
        let p1 = 1i16 << self.params.al;
        let mut k = ss;

        if self.eob_run == 0 {
            let ac = table(self.ac_tables, sc.ac_table)?;
            while k <= se {
                let rs = ac.decode(&mut self.reader)?;
                let mut zeros = (rs >> 4) as usize;
                let size = rs & 0x0F;

                let new_value = match size {
                    0 if zeros < 15 => {
                        let extra = if zeros > 0 { self.reader.read_bits(zeros as u8)? as u32 } else { 0 };
                        self.eob_run = (1u32 << zeros) + extra;
                        break;
                    }
                    0 => None,
                    1 => Some(if self.reader.read_bit()? { p1 } else { -p1 }),
                    _ => return Err(JpegError::HuffmanDecode),
                };

                // Skip `zeros` zero-history coefficients, refining nonzero ones on the way
                while k <= se {
                    let coef = &mut block[ZIGZAG_TO_NATURAL[k]];
                    if *coef != 0 {
                        refine_coefficient(&mut self.reader, coef, p1)?;
                    } else if zeros == 0 {
                        if let Some(v) = new_value {
                            *coef = v;
                        }
                        break;
                    } else {
                        zeros -= 1;
                    }
                    k += 1;
                }
                k += 1;
            }
        }

        if self.eob_run > 0 {
            // Rest of the band is inside an EOB run: correction bits only
            while k <= se {
                let coef = &mut block[ZIGZAG_TO_NATURAL[k]];
                if *coef != 0 {
                    refine_coefficient(&mut self.reader, coef, p1)?;
                }
                k += 1;
            }
            self.eob_run -= 1;
        }
        Ok(())
    }
}

fn refine_coefficient(reader: &mut BitReader, coef: &mut i16, p1: i16) -> Result<()> {
    if reader.read_bit()? && (*coef & p1) == 0 {
        if *coef >= 0 {
            *coef = coef.saturating_add(p1);
        } else {
            *coef = coef.saturating_sub(p1);
        }
    }
    Ok(())
}

/// Receiver of the symbols produced while encoding a baseline scan.
pub trait EntropySink {
    /// A DC difference category and its magnitude bits.
    fn put_dc(&mut self, table: usize, size: u8, bits: u16) -> Result<()>;
    /// An AC run/size symbol and its magnitude bits (`size` = 0 for EOB/ZRL).
    fn put_ac(&mut self, table: usize, symbol: u8, bits: u16, size: u8) -> Result<()>;
}

/// Symbol frequencies per table, gathered by a dry run of the encoder.
pub struct SymbolCounts {
    pub dc: [[u32; 256]; 4],
    pub ac: [[u32; 256]; 4],
}

impl Default for SymbolCounts {
    fn default() -> Self {
        Self { dc: [[0; 256]; 4], ac: [[0; 256]; 4] }
    }
}

impl EntropySink for SymbolCounts {
    fn put_dc(&mut self, table: usize, size: u8, _bits: u16) -> Result<()> {
        self.dc[table][size as usize] += 1;
        Ok(())
    }

    fn put_ac(&mut self, table: usize, symbol: u8, _bits: u16, _size: u8) -> Result<()> {
        self.ac[table][symbol as usize] += 1;
        Ok(())
    }
}

/// Writes Huffman-coded symbols to a bit stream.
struct HuffmanWriter {
    writer: BitWriter,
    dc: [Option<HuffmanEncodeTable>; 4],
    ac: [Option<HuffmanEncodeTable>; 4],
}

impl HuffmanWriter {
    fn new(slots: &HuffmanSlots) -> Self {
        Self {
            writer: BitWriter::new(),
            dc: slots.dc.each_ref().map(|s| s.as_ref().map(HuffmanEncodeTable::from_spec)),
            ac: slots.ac.each_ref().map(|s| s.as_ref().map(HuffmanEncodeTable::from_spec)),
        }
    }
}

impl EntropySink for HuffmanWriter {
    fn put_dc(&mut self, table: usize, size: u8, bits: u16) -> Result<()> {
        let enc = self.dc[table]
            .as_ref()
            .ok_or(JpegError::InvalidHuffmanTableId(table as u8))?;
        let (code, len) = enc.encode(size)?;
        self.writer.write_bits(code, len);
        self.writer.write_bits(bits, size);
        Ok(())
    }

    fn put_ac(&mut self, table: usize, symbol: u8, bits: u16, size: u8) -> Result<()> {
        let enc = self.ac[table]
            .as_ref()
            .ok_or(JpegError::InvalidHuffmanTableId(table as u8))?;
        let (code, len) = enc.encode(symbol)?;
        self.writer.write_bits(code, len);
        self.writer.write_bits(bits, size);
        Ok(())
    }
}

/// Walk every block of every component in interleaved MCU order, feeding
/// the baseline symbols to `sink`. `table_ids[c]` selects the DC and AC
/// table of frame component `c`.
pub fn encode_blocks<S: EntropySink>(
    frame: &FrameInfo,
    grids: &[DctGrid],
    table_ids: &[usize],
    sink: &mut S,
) -> Result<()> {
    if grids.len() != frame.components.len() || table_ids.len() != grids.len() {
        return Err(JpegError::InvalidMarkerData("component count mismatch"));
    }
    for (ci, grid) in grids.iter().enumerate() {
        if grid.blocks_wide() < frame.blocks_wide(ci) || grid.blocks_tall() < frame.blocks_tall(ci) {
            return Err(JpegError::InvalidDimensions);
        }
    }

    let mut dc_pred = vec![0i32; grids.len()];
    for mcu_row in 0..frame.mcus_tall as usize {
        for mcu_col in 0..frame.mcus_wide as usize {
            for (ci, comp) in frame.components.iter().enumerate() {
                let (h, v) = (comp.h_sampling as usize, comp.v_sampling as usize);
                for y in 0..v {
                    for x in 0..h {
                        let block = grids[ci].block(mcu_row * v + y, mcu_col * h + x);
                        encode_block(block, &mut dc_pred[ci], table_ids[ci], sink)?;
                    }
                }
            }
        }
    }
    Ok(())
}

fn encode_block<S: EntropySink>(block: &[i16], pred: &mut i32, table: usize, sink: &mut S) -> Result<()> {
    let dc = block[0] as i32;
    let (bits, size) = encode_value(dc - *pred);
    *pred = dc;
    sink.put_dc(table, size, bits)?;

    let mut run = 0u8;
    for &ni in &ZIGZAG_TO_NATURAL[1..] {
        let coef = block[ni];
        if coef == 0 {
            run += 1;
            continue;
        }
        while run > 15 {
            sink.put_ac(table, 0xF0, 0, 0)?;
            run -= 16;
        }
        let (bits, size) = encode_value(coef as i32);
        sink.put_ac(table, (run << 4) | size, bits, size)?;
        run = 0;
    }
    if run > 0 {
        sink.put_ac(table, 0x00, 0, 0)?;
    }
    Ok(())
}

/// Encode grids as one interleaved baseline scan using the tables in `slots`.
///
/// Returns the entropy-coded bytes (without SOS header). No restart
/// markers are written.
pub fn encode_scan(frame: &FrameInfo, grids: &[DctGrid], table_ids: &[usize], slots: &HuffmanSlots) -> Result<Vec<u8>> {
    let mut sink = HuffmanWriter::new(slots);
    encode_blocks(frame, grids, table_ids, &mut sink)?;
    Ok(sink.writer.flush())
}
