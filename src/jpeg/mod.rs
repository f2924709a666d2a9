// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Pure-Rust JPEG coefficient codec.
//!
//! Reads baseline, extended sequential and progressive JPEG files into
//! quantized DCT coefficients without any pixel-domain processing, and
//! writes coefficients back out without re-quantization. This is the
//! foundation for the lossless transforms, which operate entirely in the
//! DCT domain.
//!
//! Supports:
//! - Baseline and extended sequential DCT (SOF0/SOF1), 8-bit precision
//! - Progressive DCT (SOF2), read-only (always writes sequential output)
//! - Sequential files split over several scans
//! - YCbCr, grayscale, and arbitrary component counts up to 4
//! - Chroma subsampling: 4:2:0, 4:2:2, 4:4:4, 4:1:1, ...
//! - Restart markers (DRI/RST) on input
//! - Optimal Huffman tables rebuilt from the coefficients on output
//!
//! Does NOT support:
//! - Arithmetic coding (SOF9+) -- rejected at parse time
//! - Lossless and hierarchical modes -- rejected at parse time
//! - 12-bit precision -- rejected at parse time

pub mod error;
pub mod dct;
pub mod bitio;
pub mod tables;
pub mod huffman;
pub mod frame;
pub mod marker;
pub mod scan;
pub mod probe;
pub mod preserve;

use dct::{DctGrid, QuantTable};
use error::{JpegError, Result};
use frame::{parse_sof_ext, Component, FrameInfo};
use huffman::optimal_spec;
use marker::{iterate_markers, iterate_markers_all, parse_dri, parse_sos, write_segment};
use preserve::{is_metadata_marker, SavedMarker};
use scan::{ScanComponent, ScanSpec, SymbolCounts};
use tables::{dht_body, dqt_body, parse_dht, parse_dqt, HuffmanSlots};

/// Opened JPEG stream with its header parsed, ready to read coefficients.
///
/// Created with [`Decoder::open`]; geometry and metadata are available
/// before any entropy-coded data is touched.
pub struct Decoder<'a> {
    data: &'a [u8],
    frame: FrameInfo,
    metadata: Vec<SavedMarker>,
}

impl<'a> Decoder<'a> {
    /// Parse the header up to the first scan.
    pub fn open(data: &'a [u8]) -> Result<Self> {
        let (entries, _) = iterate_markers(data)?;

        let mut frame: Option<FrameInfo> = None;
        let mut metadata = Vec::new();
        let mut saw_scan = false;

        for entry in entries {
            match entry.marker {
                marker::SOF0 | marker::SOF1 | marker::SOF2 => {
                    if frame.is_some() {
                        return Err(JpegError::InvalidMarkerData("multiple SOF markers"));
                    }
                    frame = Some(parse_sof_ext(&entry.data, entry.marker == marker::SOF2)?);
                }
                marker::SOS => saw_scan = true,
                m if is_metadata_marker(m) => metadata.push(SavedMarker {
                    marker: m,
                    data: entry.data,
                }),
                _ => {}
            }
        }

        let frame = frame.ok_or(JpegError::MissingSof)?;
        if !saw_scan {
            return Err(JpegError::InvalidMarkerData("no scan in stream"));
        }
        log::trace!(
            "opened {}x{} JPEG, {} components, progressive={}",
            frame.width,
            frame.height,
            frame.components.len(),
            frame.is_progressive
        );
        Ok(Self { data, frame, metadata })
    }

    pub fn frame_info(&self) -> &FrameInfo {
        &self.frame
    }

    /// Entropy-decode every scan into coefficient grids.
    ///
    /// DQT, DHT and DRI segments between scans take effect for the scans
    /// that follow them. A component's quantization table is the one in
    /// effect when its first scan starts. APPn/COM segments after the first
    /// scan are appended to the header's metadata.
    pub fn read_coefficients(self) -> Result<JpegImage> {
        let Decoder { data, frame, mut metadata } = self;
        let map = iterate_markers_all(data)?;

        let mut grids: Vec<DctGrid> = (0..frame.components.len())
            .map(|c| DctGrid::new(frame.blocks_wide(c), frame.blocks_tall(c)))
            .collect();
        let mut current_qt: [Option<QuantTable>; 4] = Default::default();
        let mut latched_qt: [Option<QuantTable>; 4] = Default::default();
        let mut slots = HuffmanSlots::default();
        let mut restart_interval = 0u16;
        let mut scan_starts = map.scan_starts.iter();
        let mut scans = 0usize;

        for entry in &map.entries {
            match entry.marker {
                marker::DQT => {
                    for (id, qt) in parse_dqt(&entry.data)? {
                        current_qt[id as usize] = Some(qt);
                    }
                }
                marker::DHT => {
                    for spec in parse_dht(&entry.data)? {
                        slots.install(spec);
                    }
                }
                marker::DRI => restart_interval = parse_dri(&entry.data)?,
                m if scans > 0 && is_metadata_marker(m) => metadata.push(SavedMarker {
                    marker: m,
                    data: entry.data.clone(),
                }),
                marker::SOS => {
                    let start = *scan_starts
                        .next()
                        .ok_or(JpegError::InvalidMarkerData("scan without data"))?;
                    let scan = resolve_scan(&frame, &entry.data)?;
                    for sc in &scan.components {
                        let qid = frame.components[sc.comp_idx].quant_table_id as usize;
                        if latched_qt[qid].is_none() {
                            latched_qt[qid] = Some(
                                current_qt[qid]
                                    .clone()
                                    .ok_or(JpegError::InvalidQuantTableId(qid as u8))?,
                            );
                        }
                    }
                    scan::decode_scan(data, start, &frame, &scan, &slots, restart_interval, &mut grids)?;
                    scans += 1;
                }
                _ => {}
            }
        }

        // Components never coded by any scan still need their table
        for comp in &frame.components {
            let qid = comp.quant_table_id as usize;
            if latched_qt[qid].is_none() {
                latched_qt[qid] = Some(
                    current_qt[qid]
                        .clone()
                        .ok_or(JpegError::InvalidQuantTableId(qid as u8))?,
                );
            }
        }

        log::trace!("decoded {scans} scan(s)");
        Ok(JpegImage {
            frame,
            grids,
            quant_tables: latched_qt,
            metadata,
        })
    }
}

/// Map an SOS header onto frame component indices.
fn resolve_scan(frame: &FrameInfo, sos: &[u8]) -> Result<ScanSpec> {
    let (selectors, params) = parse_sos(sos)?;
    let components = selectors
        .iter()
        .map(|sel| {
            let comp_idx = frame
                .components
                .iter()
                .position(|c| c.id == sel.id)
                .ok_or(JpegError::UnknownComponentId(sel.id))?;
            Ok(ScanComponent {
                comp_idx,
                dc_table: sel.dc_table as usize,
                ac_table: sel.ac_table as usize,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(ScanSpec { components, params })
}

/// Quantization tables and component descriptors that must carry over
/// unchanged from source to destination for the coefficients to keep
/// their meaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CriticalParameters {
    /// Quantization tables by ID, natural order.
    pub quant_tables: [Option<QuantTable>; 4],
    /// Component IDs, sampling factors and table assignments, in frame order.
    pub components: Vec<Component>,
}

impl CriticalParameters {
    /// Parameters for a transposed image: each component's sampling
    /// factors swap and every table is transposed along with the blocks.
    pub fn transposed(&self) -> Self {
        Self {
            quant_tables: self.quant_tables.each_ref().map(|qt| qt.as_ref().map(QuantTable::transposed)),
            components: self
                .components
                .iter()
                .map(|c| Component {
                    h_sampling: c.v_sampling,
                    v_sampling: c.h_sampling,
                    ..c.clone()
                })
                .collect(),
        }
    }

    /// Parameters keeping only the first (luma) component.
    pub fn luma_only(&self) -> Self {
        let Some(luma) = self.components.first() else {
            return self.clone();
        };
        let qid = (luma.quant_table_id & 0x03) as usize;
        let mut quant_tables: [Option<QuantTable>; 4] = Default::default();
        quant_tables[qid] = self.quant_tables[qid].clone();
        Self {
            quant_tables,
            components: vec![luma.clone()],
        }
    }
}

/// Copy the parameters a destination needs to reuse the source coefficients.
pub fn copy_critical_parameters(src: &JpegImage) -> CriticalParameters {
    CriticalParameters {
        quant_tables: src.quant_tables.clone(),
        components: src.frame.components.clone(),
    }
}

/// A JPEG image held as quantized DCT coefficients.
///
/// Read with [`Decoder::read_coefficients`] (or [`JpegImage::from_bytes`]),
/// assembled from transformed grids with [`JpegImage::with_coefficients`],
/// and written with [`JpegImage::to_bytes`].
#[derive(Debug, Clone)]
pub struct JpegImage {
    /// Frame information (dimensions, components, sampling factors).
    frame: FrameInfo,
    /// DCT coefficient grids, one per frame component.
    grids: Vec<DctGrid>,
    /// Quantization tables, indexed by table ID (0–3).
    quant_tables: [Option<QuantTable>; 4],
    /// APPn/COM segments written right after SOI.
    metadata: Vec<SavedMarker>,
}

impl JpegImage {
    /// Parse a JPEG file and decode all of its coefficients.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Decoder::open(data)?.read_coefficients()
    }

    /// Assemble an image from coefficient grids.
    ///
    /// Each grid must cover its component padded to whole MCUs of the new
    /// frame, and every component's quantization table must be present.
    pub fn with_coefficients(
        params: CriticalParameters,
        width: u16,
        height: u16,
        grids: Vec<DctGrid>,
        metadata: Vec<SavedMarker>,
    ) -> Result<Self> {
        let frame = FrameInfo::new(width, height, params.components, false)?;
        if grids.len() != frame.components.len() {
            return Err(JpegError::InvalidMarkerData("one grid per component required"));
        }
        for (ci, grid) in grids.iter().enumerate() {
            if grid.blocks_wide() != frame.blocks_wide(ci) || grid.blocks_tall() != frame.blocks_tall(ci) {
                return Err(JpegError::InvalidDimensions);
            }
            let qid = frame.components[ci].quant_table_id;
            if params.quant_tables[qid as usize].is_none() {
                return Err(JpegError::InvalidQuantTableId(qid));
            }
        }
        Ok(Self {
            frame,
            grids,
            quant_tables: params.quant_tables,
            metadata,
        })
    }

    /// Encode the image as a sequential JPEG with optimal Huffman tables.
    ///
    /// Layout: SOI, metadata, DQT, SOF0 (SOF1 if a table needs 16-bit
    /// precision), DHT, SOS, scan data, EOI.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        // Luma takes table 0, all chroma components share table 1
        let table_ids: Vec<usize> = (0..self.grids.len()).map(|c| c.min(1)).collect();

        let mut counts = SymbolCounts::default();
        scan::encode_blocks(&self.frame, &self.grids, &table_ids, &mut counts)?;
        let mut slots = HuffmanSlots::default();
        for id in 0..=table_ids.iter().copied().max().unwrap_or(0) {
            slots.install(optimal_spec(0, id as u8, &counts.dc[id]));
            slots.install(optimal_spec(1, id as u8, &counts.ac[id]));
        }
        let scan_bytes = scan::encode_scan(&self.frame, &self.grids, &table_ids, &slots)?;

        let mut used_qt: [Option<QuantTable>; 4] = Default::default();
        for comp in &self.frame.components {
            let qid = comp.quant_table_id as usize;
            used_qt[qid] = self.quant_tables[qid].clone();
        }
        let extended = used_qt.iter().flatten().any(|qt| qt.values.iter().any(|&v| v > 255));
        let sof = if extended { marker::SOF1 } else { marker::SOF0 };

        let mut out = Vec::with_capacity(scan_bytes.len() + 1024);
        out.extend_from_slice(&[0xFF, marker::SOI]);
        for seg in &self.metadata {
            write_segment(&mut out, seg.marker, &seg.data)?;
        }
        write_segment(&mut out, marker::DQT, &dqt_body(&used_qt))?;
        write_segment(&mut out, sof, &self.frame.sof_body())?;
        write_segment(&mut out, marker::DHT, &dht_body(slots.iter()))?;

        let mut sos = vec![self.frame.components.len() as u8];
        for (comp, &t) in self.frame.components.iter().zip(&table_ids) {
            sos.push(comp.id);
            sos.push(((t as u8) << 4) | t as u8);
        }
        sos.extend_from_slice(&[0, 63, 0]);
        write_segment(&mut out, marker::SOS, &sos)?;

        out.extend_from_slice(&scan_bytes);
        out.extend_from_slice(&[0xFF, marker::EOI]);
        Ok(out)
    }

    /// Coefficient grid of a frame component (0 = Y for YCbCr).
    pub fn dct_grid(&self, component: usize) -> &DctGrid {
        &self.grids[component]
    }

    pub fn dct_grid_mut(&mut self, component: usize) -> &mut DctGrid {
        &mut self.grids[component]
    }

    pub fn grids(&self) -> &[DctGrid] {
        &self.grids
    }

    pub fn frame_info(&self) -> &FrameInfo {
        &self.frame
    }

    pub fn quant_table(&self, id: usize) -> Option<&QuantTable> {
        self.quant_tables.get(id).and_then(Option::as_ref)
    }

    pub fn num_components(&self) -> usize {
        self.grids.len()
    }

    pub fn metadata(&self) -> &[SavedMarker] {
        &self.metadata
    }
}
