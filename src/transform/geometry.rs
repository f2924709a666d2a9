// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Source image geometry as seen by the transform planner.

use crate::jpeg::frame::FrameInfo;

/// Dimensions, sampling and iMCU size of a source image.
///
/// The iMCU is the smallest unit a lossless transform can move: one MCU of
/// the output component set, or a single 8×8 block when only one component
/// is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageGeometry {
    pub width: u32,
    pub height: u32,
    /// (h, v) sampling factors of each output component, in frame order.
    pub sampling: Vec<(u8, u8)>,
    pub max_h_sampling: u8,
    pub max_v_sampling: u8,
    pub imcu_width: u32,
    pub imcu_height: u32,
}

impl ImageGeometry {
    /// Geometry of `frame`, restricted to luma when `grayscale_output`.
    pub fn from_frame(frame: &FrameInfo, grayscale_output: bool) -> Self {
        let count = if grayscale_output { 1 } else { frame.components.len() };
        let sampling: Vec<(u8, u8)> = frame
            .components
            .iter()
            .take(count)
            .map(|c| (c.h_sampling, c.v_sampling))
            .collect();

        let (max_h, max_v, imcu_width, imcu_height) = if count == 1 {
            (1, 1, 8, 8)
        } else {
            (
                frame.max_h_sampling,
                frame.max_v_sampling,
                frame.max_h_sampling as u32 * 8,
                frame.max_v_sampling as u32 * 8,
            )
        };

        Self {
            width: frame.width as u32,
            height: frame.height as u32,
            sampling,
            max_h_sampling: max_h,
            max_v_sampling: max_v,
            imcu_width,
            imcu_height,
        }
    }

    /// Whether every component's horizontal sampling divides the maximum.
    ///
    /// Mirroring an axis moves whole iMCUs; a component that does not tile
    /// the iMCU evenly cannot follow.
    pub fn tiles_horizontally(&self) -> bool {
        self.sampling.len() == 1 || self.sampling.iter().all(|&(h, _)| self.max_h_sampling % h == 0)
    }

    pub fn tiles_vertically(&self) -> bool {
        self.sampling.len() == 1 || self.sampling.iter().all(|&(_, v)| self.max_v_sampling % v == 0)
    }
}
