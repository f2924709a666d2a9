// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! JPEG frame header (SOF0/SOF1/SOF2) parsing and writing.
//!
//! Extracts image dimensions, component information, and sampling factors
//! from the Start of Frame marker segment, and derives the MCU layout.

use super::error::{JpegError, Result};

/// Information about one image component from SOF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    /// Component ID (typically 1=Y, 2=Cb, 3=Cr).
    pub id: u8,
    /// Horizontal sampling factor (1–4).
    pub h_sampling: u8,
    /// Vertical sampling factor (1–4).
    pub v_sampling: u8,
    /// Quantization table ID (0–3).
    pub quant_table_id: u8,
}

/// Frame information parsed from a SOF marker.
#[derive(Debug, Clone)]
pub struct FrameInfo {
    /// Sample precision in bits (must be 8).
    pub precision: u8,
    /// Image height in pixels.
    pub height: u16,
    /// Image width in pixels.
    pub width: u16,
    /// Components in the frame.
    pub components: Vec<Component>,
    /// Maximum horizontal sampling factor across all components.
    pub max_h_sampling: u8,
    /// Maximum vertical sampling factor across all components.
    pub max_v_sampling: u8,
    /// MCU width in pixels (= max_h_sampling * 8).
    pub mcu_width: u16,
    /// MCU height in pixels (= max_v_sampling * 8).
    pub mcu_height: u16,
    /// Number of MCUs horizontally.
    pub mcus_wide: u16,
    /// Number of MCUs vertically.
    pub mcus_tall: u16,
    /// Whether this is a progressive JPEG (SOF2).
    pub is_progressive: bool,
}

impl FrameInfo {
    /// Build frame info from explicit components.
    ///
    /// A single-component frame is always coded non-interleaved, one block
    /// per MCU, so its sampling factors are normalized to 1×1.
    pub fn new(width: u16, height: u16, mut components: Vec<Component>, progressive: bool) -> Result<Self> {
        if width == 0 || height == 0 || components.is_empty() || components.len() > 4 {
            return Err(JpegError::InvalidDimensions);
        }
        if components.len() == 1 {
            components[0].h_sampling = 1;
            components[0].v_sampling = 1;
        }

        let mut max_h = 0u8;
        let mut max_v = 0u8;
        for comp in &components {
            if comp.h_sampling == 0 || comp.v_sampling == 0 || comp.h_sampling > 4 || comp.v_sampling > 4 {
                return Err(JpegError::InvalidDimensions);
            }
            if comp.quant_table_id > 3 {
                return Err(JpegError::InvalidQuantTableId(comp.quant_table_id));
            }
            max_h = max_h.max(comp.h_sampling);
            max_v = max_v.max(comp.v_sampling);
        }

        let mcu_width = (max_h as u16) * 8;
        let mcu_height = (max_v as u16) * 8;
        let mcus_wide = width.div_ceil(mcu_width);
        let mcus_tall = height.div_ceil(mcu_height);

        Ok(Self {
            precision: 8,
            height,
            width,
            components,
            max_h_sampling: max_h,
            max_v_sampling: max_v,
            mcu_width,
            mcu_height,
            mcus_wide,
            mcus_tall,
            is_progressive: progressive,
        })
    }

    /// Number of 8×8 blocks wide for a component, padded to whole MCUs.
    pub fn blocks_wide(&self, comp_idx: usize) -> usize {
        let comp = &self.components[comp_idx];
        (self.mcus_wide as usize) * (comp.h_sampling as usize)
    }

    /// Number of 8×8 blocks tall for a component, padded to whole MCUs.
    pub fn blocks_tall(&self, comp_idx: usize) -> usize {
        let comp = &self.components[comp_idx];
        (self.mcus_tall as usize) * (comp.v_sampling as usize)
    }

    /// Blocks that carry image data horizontally, without MCU padding.
    ///
    /// This is the block count of a non-interleaved scan of the component.
    pub fn width_in_blocks(&self, comp_idx: usize) -> usize {
        let comp = &self.components[comp_idx];
        let samples = (self.width as usize * comp.h_sampling as usize).div_ceil(self.max_h_sampling as usize);
        samples.div_ceil(8)
    }

    /// Blocks that carry image data vertically, without MCU padding.
    pub fn height_in_blocks(&self, comp_idx: usize) -> usize {
        let comp = &self.components[comp_idx];
        let samples = (self.height as usize * comp.v_sampling as usize).div_ceil(self.max_v_sampling as usize);
        samples.div_ceil(8)
    }

    /// Serialize as a baseline SOF0 segment body.
    pub fn sof_body(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(6 + self.components.len() * 3);
        out.push(self.precision);
        out.extend_from_slice(&self.height.to_be_bytes());
        out.extend_from_slice(&self.width.to_be_bytes());
        out.push(self.components.len() as u8);
        for comp in &self.components {
            out.push(comp.id);
            out.push((comp.h_sampling << 4) | comp.v_sampling);
            out.push(comp.quant_table_id);
        }
        out
    }
}

/// Parse a SOF marker segment body with explicit progressive flag.
pub fn parse_sof_ext(data: &[u8], progressive: bool) -> Result<FrameInfo> {
    if data.len() < 6 {
        return Err(JpegError::UnexpectedEof);
    }

    let precision = data[0];
    if precision != 8 {
        return Err(JpegError::UnsupportedPrecision(precision));
    }

    let height = u16::from_be_bytes([data[1], data[2]]);
    let width = u16::from_be_bytes([data[3], data[4]]);
    let num_components = data[5] as usize;

    // height == 0 means the height is deferred to a DNL marker, which is not supported
    if width == 0 || height == 0 {
        return Err(JpegError::InvalidDimensions);
    }
    if data.len() < 6 + num_components * 3 {
        return Err(JpegError::UnexpectedEof);
    }

    let components = (0..num_components)
        .map(|i| {
            let offset = 6 + i * 3;
            let sampling = data[offset + 1];
            Component {
                id: data[offset],
                h_sampling: sampling >> 4,
                v_sampling: sampling & 0x0F,
                quant_table_id: data[offset + 2],
            }
        })
        .collect();

    FrameInfo::new(width, height, components, progressive)
}
