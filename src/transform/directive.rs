// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Transform directives and the options that govern them.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TransformError};
use crate::jpeg::preserve::CopyMarkers;

/// Crop rectangle in source pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// One lossless geometric transform.
///
/// Rotations are clockwise. Build rotations and crops through
/// [`TransformDirective::rotate`] and [`TransformDirective::crop`], which
/// reject angles and rectangles that can never be valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformDirective {
    /// Re-encode the coefficients unchanged.
    None,
    Rotate90,
    Rotate180,
    Rotate270,
    FlipHorizontal,
    FlipVertical,
    /// Mirror across the top-left to bottom-right diagonal.
    Transpose,
    /// Mirror across the top-right to bottom-left diagonal.
    Transverse,
    Crop(CropRegion),
}

/// How destination blocks are found in the source.
///
/// Expressed in destination orientation: `transpose` swaps the block grid
/// axes, then `mirror_x` / `mirror_y` reverse the destination columns / rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockMapping {
    pub transpose: bool,
    pub mirror_x: bool,
    pub mirror_y: bool,
}

impl TransformDirective {
    /// Clockwise rotation by 90, 180 or 270 degrees (-90 is accepted as 270).
    pub fn rotate(angle: i32) -> Result<Self> {
        match angle {
            90 => Ok(Self::Rotate90),
            180 => Ok(Self::Rotate180),
            270 | -90 => Ok(Self::Rotate270),
            _ => Err(TransformError::InvalidDirective(format!(
                "rotation angle must be 90, 180, 270 or -90, got {angle}"
            ))),
        }
    }

    /// Mirror left-to-right, or top-to-bottom when `vertical`.
    pub fn flip(vertical: bool) -> Self {
        if vertical {
            Self::FlipVertical
        } else {
            Self::FlipHorizontal
        }
    }

    /// Crop to a non-empty rectangle. Bounds are checked against the image
    /// when the transform runs.
    pub fn crop(x: u32, y: u32, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(TransformError::InvalidDirective(format!(
                "crop size must be positive, got {width}x{height}"
            )));
        }
        Ok(Self::Crop(CropRegion { x, y, width, height }))
    }

    pub fn mapping(&self) -> BlockMapping {
        let (transpose, mirror_x, mirror_y) = match self {
            Self::None | Self::Crop(_) => (false, false, false),
            Self::FlipHorizontal => (false, true, false),
            Self::FlipVertical => (false, false, true),
            Self::Rotate180 => (false, true, true),
            Self::Transpose => (true, false, false),
            Self::Rotate90 => (true, true, false),
            Self::Rotate270 => (true, false, true),
            Self::Transverse => (true, true, true),
        };
        BlockMapping {
            transpose,
            mirror_x,
            mirror_y,
        }
    }
}

/// Policy flags for a transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformOptions {
    /// Fail with `UnsupportedGeometry` instead of leaving a partial edge
    /// iMCU untransformed.
    pub perfect: bool,
    /// Drop partial edge iMCUs that cannot be transformed.
    pub trim: bool,
    /// Keep only the luma component.
    pub force_grayscale: bool,
    /// Which metadata segments to copy.
    pub copy_markers: CopyMarkers,
}
