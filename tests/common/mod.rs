// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Synthetic JPEG builders shared by the integration tests.
//!
//! Coefficient-level images come from the crate's own writer, so their
//! contents are known exactly. Pixel-level images come from the `image`
//! encoder and stand in for files produced by other software.

#![allow(dead_code)]

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, GrayImage, ImageEncoder, ImageFormat, Luma, Rgb, RgbImage};
use jpegtran_core::jpeg::bitio::BitWriter;
use jpegtran_core::jpeg::frame::{Component, FrameInfo};
use jpegtran_core::jpeg::huffman::{encode_value, optimal_spec, HuffmanEncodeTable};
use jpegtran_core::jpeg::marker::write_segment;
use jpegtran_core::jpeg::preserve::SavedMarker;
use jpegtran_core::jpeg::tables::{dht_body, dqt_body, HuffmanSpec, ZIGZAG_TO_NATURAL};
use jpegtran_core::jpeg::CriticalParameters;
use jpegtran_core::{DctGrid, JpegImage, QuantTable};

pub const S444: &[(u8, u8)] = &[(1, 1), (1, 1), (1, 1)];
pub const S422: &[(u8, u8)] = &[(2, 1), (1, 1), (1, 1)];
pub const S420: &[(u8, u8)] = &[(2, 2), (1, 1), (1, 1)];
pub const GRAY: &[(u8, u8)] = &[(1, 1)];

/// Components with the given sampling; luma uses table 0, chroma table 1.
pub fn params(sampling: &[(u8, u8)]) -> CriticalParameters {
    let mut quant_tables: [Option<QuantTable>; 4] = Default::default();
    let mut luma = [0u16; 64];
    for (i, q) in luma.iter_mut().enumerate() {
        // Asymmetric so a missed table transpose shows up
        *q = 1 + (i / 8) as u16 * 3 + (i % 8) as u16;
    }
    quant_tables[0] = Some(QuantTable::new(luma));
    if sampling.len() > 1 {
        let mut chroma = [0u16; 64];
        for (i, q) in chroma.iter_mut().enumerate() {
            *q = 4 + (i % 8) as u16 * 2;
        }
        quant_tables[1] = Some(QuantTable::new(chroma));
    }
    let components = sampling
        .iter()
        .enumerate()
        .map(|(i, &(h, v))| Component {
            id: i as u8 + 1,
            h_sampling: h,
            v_sampling: v,
            quant_table_id: (i as u8).min(1),
        })
        .collect();
    CriticalParameters { quant_tables, components }
}

/// Deterministic coefficients that differ from block to block and use
/// odd and even frequencies on both axes.
pub fn patterned_grids(frame: &FrameInfo) -> Vec<DctGrid> {
    (0..frame.components.len())
        .map(|c| {
            let mut g = DctGrid::new(frame.blocks_wide(c), frame.blocks_tall(c));
            for r in 0..g.blocks_tall() {
                for col in 0..g.blocks_wide() {
                    let b = g.block_mut(r, col);
                    b[0] = ((r * 37 + col * 11 + c * 101) % 500) as i16 - 250;
                    b[1] = ((r + 2 * col) % 7) as i16 - 3;
                    b[8] = ((2 * r + col) % 5) as i16 - 2;
                    b[9] = ((r * col) % 3) as i16 - 1;
                    b[2] = (col % 4) as i16;
                    b[19] = if (r + col) % 3 == 0 { -4 } else { 0 };
                    b[56] = (r % 2) as i16 * 2 - 1;
                    b[63] = if col % 5 == 1 { 1 } else { 0 };
                }
            }
            g
        })
        .collect()
}

pub fn synthetic_jpeg_with_metadata(
    width: u16,
    height: u16,
    sampling: &[(u8, u8)],
    metadata: Vec<SavedMarker>,
) -> Vec<u8> {
    let params = params(sampling);
    let frame = FrameInfo::new(width, height, params.components.clone(), false).unwrap();
    let grids = patterned_grids(&frame);
    JpegImage::with_coefficients(params, width, height, grids, metadata)
        .unwrap()
        .to_bytes()
        .unwrap()
}

/// Baseline JPEG with patterned coefficients and a JFIF header.
pub fn synthetic_jpeg(width: u16, height: u16, sampling: &[(u8, u8)]) -> Vec<u8> {
    synthetic_jpeg_with_metadata(width, height, sampling, vec![jfif()])
}

pub fn jfif() -> SavedMarker {
    SavedMarker {
        marker: 0xE0,
        data: b"JFIF\0\x01\x02\0\0\x01\0\x01\0\0".to_vec(),
    }
}

pub fn exif() -> SavedMarker {
    SavedMarker {
        marker: 0xE1,
        data: b"Exif\0\0MM\0\x2a\0\0\0\x08\0\0".to_vec(),
    }
}

pub fn icc() -> SavedMarker {
    SavedMarker {
        marker: 0xE2,
        data: b"ICC_PROFILE\0\x01\x01fake profile".to_vec(),
    }
}

pub fn comment(text: &str) -> SavedMarker {
    SavedMarker {
        marker: 0xFE,
        data: text.as_bytes().to_vec(),
    }
}

/// Progressive JPEG of patterned coefficients, returned with its grids.
///
/// Scans: interleaved DC first with point transform 1, DC refinement,
/// then one full-band AC scan per component. A non-zero
/// `restart_interval` adds DRI and RST markers to every scan. Dimensions
/// should be MCU-aligned so non-interleaved scans cover every block.
pub fn progressive_jpeg(
    width: u16,
    height: u16,
    sampling: &[(u8, u8)],
    restart_interval: u16,
) -> (Vec<u8>, Vec<DctGrid>) {
    let params = params(sampling);
    let frame = FrameInfo::new(width, height, params.components.clone(), true).unwrap();
    let grids = patterned_grids(&frame);

    let mut dc_freq = [0u32; 256];
    dc_freq[..12].fill(1);
    let mut ac_freq = [0u32; 256];
    ac_freq[0x00] = 1;
    ac_freq[0xF0] = 1;
    for run in 0..16usize {
        for size in 1..=10usize {
            ac_freq[(run << 4) | size] = 1;
        }
    }
    let dc_spec = optimal_spec(0, 0, &dc_freq);
    let ac_spec = optimal_spec(1, 0, &ac_freq);
    let dc = HuffmanEncodeTable::from_spec(&dc_spec);
    let ac = HuffmanEncodeTable::from_spec(&ac_spec);

    let mut out = vec![0xFF, 0xD8];
    write_segment(&mut out, 0xDB, &dqt_body(&params.quant_tables)).unwrap();
    write_segment(&mut out, 0xC2, &frame.sof_body()).unwrap();
    write_segment(&mut out, 0xC4, &dht_body([&dc_spec, &ac_spec])).unwrap();
    if restart_interval > 0 {
        write_segment(&mut out, 0xDD, &restart_interval.to_be_bytes()).unwrap();
    }

    let mcus_wide = frame.mcus_wide as usize;
    let mcus = mcus_wide * frame.mcus_tall as usize;
    let all_components = |tail: [u8; 3]| {
        let mut sos = vec![frame.components.len() as u8];
        for comp in &frame.components {
            sos.extend_from_slice(&[comp.id, 0x00]);
        }
        sos.extend_from_slice(&tail);
        sos
    };

    // DC first: Ss=0, Se=0, Ah=0, Al=1
    write_segment(&mut out, 0xDA, &all_components([0, 0, 0x01])).unwrap();
    let mut pred = vec![0i32; grids.len()];
    out.extend(segments(mcus, restart_interval, |w, unit| {
        if restart_interval > 0 && unit % restart_interval as usize == 0 {
            pred.fill(0);
        }
        let (mr, mc) = (unit / mcus_wide, unit % mcus_wide);
        for (ci, comp) in frame.components.iter().enumerate() {
            let (h, v) = (comp.h_sampling as usize, comp.v_sampling as usize);
            for y in 0..v {
                for x in 0..h {
                    let value = grids[ci].block(mr * v + y, mc * h + x)[0] as i32 >> 1;
                    let (bits, size) = encode_value(value - pred[ci]);
                    pred[ci] = value;
                    put(w, &dc, size);
                    w.write_bits(bits, size);
                }
            }
        }
    }));

    // DC refinement: Ah=1, Al=0, one raw bit per block
    write_segment(&mut out, 0xDA, &all_components([0, 0, 0x10])).unwrap();
    out.extend(segments(mcus, restart_interval, |w, unit| {
        let (mr, mc) = (unit / mcus_wide, unit % mcus_wide);
        for (ci, comp) in frame.components.iter().enumerate() {
            let (h, v) = (comp.h_sampling as usize, comp.v_sampling as usize);
            for y in 0..v {
                for x in 0..h {
                    let bit = grids[ci].block(mr * v + y, mc * h + x)[0] & 1;
                    w.write_bits(bit as u16, 1);
                }
            }
        }
    }));

    // AC first, one component at a time: Ss=1, Se=63, Ah=0, Al=0
    for (ci, comp) in frame.components.iter().enumerate() {
        write_segment(&mut out, 0xDA, &[1, comp.id, 0x00, 1, 63, 0]).unwrap();
        let bw = frame.width_in_blocks(ci);
        let bh = frame.height_in_blocks(ci);
        out.extend(segments(bw * bh, restart_interval, |w, unit| {
            encode_ac(w, &ac, grids[ci].block(unit / bw, unit % bw));
        }));
    }

    out.extend_from_slice(&[0xFF, 0xD9]);
    (out, grids)
}

/// Huffman table with `symbols` all coded at one length.
pub fn flat_table(class: u8, length: usize, symbols: &[u8]) -> HuffmanSpec {
    let mut bits = [0u8; 16];
    bits[length - 1] = symbols.len() as u8;
    HuffmanSpec { class, id: 0, bits, huffval: symbols.to_vec() }
}

/// Single-scan grayscale baseline JPEG with caller-chosen Huffman tables and
/// entropy-coded data. Nothing is validated, so it can describe broken files.
pub fn raw_gray_jpeg(width: u16, height: u16, tables: &[HuffmanSpec], scan: &[u8]) -> Vec<u8> {
    let params = params(GRAY);
    let frame = FrameInfo::new(width, height, params.components.clone(), false).unwrap();
    let mut out = vec![0xFF, 0xD8];
    write_segment(&mut out, 0xDB, &dqt_body(&params.quant_tables)).unwrap();
    write_segment(&mut out, 0xC0, &frame.sof_body()).unwrap();
    write_segment(&mut out, 0xC4, &dht_body(tables)).unwrap();
    write_segment(&mut out, 0xDA, &[1, frame.components[0].id, 0x00, 0, 63, 0]).unwrap();
    out.extend_from_slice(scan);
    out.extend_from_slice(&[0xFF, 0xD9]);
    out
}

fn put(w: &mut BitWriter, table: &HuffmanEncodeTable, symbol: u8) {
    let (code, len) = table.encode(symbol).unwrap();
    w.write_bits(code, len);
}

fn encode_ac(w: &mut BitWriter, table: &HuffmanEncodeTable, block: &[i16]) {
    let mut run = 0u8;
    for &ni in &ZIGZAG_TO_NATURAL[1..] {
        let coef = block[ni];
        if coef == 0 {
            run += 1;
            continue;
        }
        while run > 15 {
            put(w, table, 0xF0);
            run -= 16;
        }
        let (bits, size) = encode_value(coef as i32);
        put(w, table, (run << 4) | size);
        w.write_bits(bits, size);
        run = 0;
    }
    if run > 0 {
        put(w, table, 0x00);
    }
}

/// Entropy-coded data for `units` coding units, split by RST markers
/// every `interval` units (0 = no restarts).
fn segments(units: usize, interval: u16, mut unit: impl FnMut(&mut BitWriter, usize)) -> Vec<u8> {
    let interval = if interval == 0 { units.max(1) } else { interval as usize };
    let mut out = Vec::new();
    let mut rst = 0u8;
    let mut start = 0;
    while start < units {
        if start > 0 {
            out.extend_from_slice(&[0xFF, 0xD0 + rst]);
            rst = (rst + 1) % 8;
        }
        let mut w = BitWriter::new();
        for u in start..(start + interval).min(units) {
            unit(&mut w, u);
        }
        out.extend(w.flush());
        start += interval;
    }
    out
}

/// Grayscale photo-like JPEG from the `image` encoder.
pub fn gray_photo(width: u32, height: u32) -> Vec<u8> {
    let img = GrayImage::from_fn(width, height, |x, y| {
        let v = (x * 5 + y * 3) % 180 + ((x / 7 + y / 5) % 2) * 60;
        Luma([v as u8])
    });
    encode_with_image(img.as_raw(), width, height, ExtendedColorType::L8)
}

/// Color photo-like JPEG from the `image` encoder.
pub fn color_photo(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            ((x + y) * 2 % 256) as u8,
        ])
    });
    encode_with_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
}

fn encode_with_image(raw: &[u8], width: u32, height: u32, color: ExtendedColorType) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut out, 90)
        .write_image(raw, width, height, color)
        .unwrap();
    out.into_inner()
}

pub fn decode_gray(data: &[u8]) -> GrayImage {
    image::load_from_memory_with_format(data, ImageFormat::Jpeg)
        .unwrap()
        .into_luma8()
}

pub fn decode_rgb(data: &[u8]) -> RgbImage {
    image::load_from_memory_with_format(data, ImageFormat::Jpeg)
        .unwrap()
        .into_rgb8()
}

/// Largest per-sample difference between two equally sized images.
pub fn max_diff(a: &[u8], b: &[u8]) -> u8 {
    assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| x.abs_diff(*y)).max().unwrap_or(0)
}
