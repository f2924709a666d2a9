// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Transform planning: what the destination looks like before any
//! coefficient is moved.
//!
//! [`request_workspace`] decides whether the transform is perfect and what
//! buffer it needs. [`adjust_parameters`] then fixes the destination size
//! and, for crops, where in the source the destination starts.

use super::directive::{BlockMapping, CropRegion, TransformDirective, TransformOptions};
use super::geometry::ImageGeometry;
use crate::error::{Result, TransformError};

/// Decisions taken before the coefficients are read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspacePlan {
    pub mapping: BlockMapping,
    /// Source size in destination orientation.
    pub transformed_width: u32,
    pub transformed_height: u32,
    /// iMCU size in destination orientation.
    pub imcu_width: u32,
    pub imcu_height: u32,
    /// True when every mirrored axis is a whole number of iMCUs.
    pub perfect: bool,
    /// Transposing and cropping write to a fresh coefficient buffer;
    /// flips could be done in place.
    pub separate_buffer: bool,
}

impl WorkspacePlan {
    /// True when a mirrored axis of the destination ends in a partial
    /// iMCU, whose blocks stay unmirrored.
    pub fn leaves_partial_edge(&self, adjusted: &AdjustedGeometry) -> bool {
        (self.mapping.mirror_x && adjusted.width % self.imcu_width != 0)
            || (self.mapping.mirror_y && adjusted.height % self.imcu_height != 0)
    }
}

/// Final destination size and its offset into the transformed source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdjustedGeometry {
    pub width: u32,
    pub height: u32,
    /// Pixel offset, always a multiple of the iMCU size.
    pub x_offset: u32,
    pub y_offset: u32,
}

/// Check the transform against the source geometry and plan the workspace.
pub fn request_workspace(
    geometry: &ImageGeometry,
    directive: &TransformDirective,
    options: &TransformOptions,
) -> Result<WorkspacePlan> {
    let mapping = directive.mapping();
    let (transformed_width, transformed_height, imcu_width, imcu_height, tiles_x, tiles_y) = if mapping.transpose {
        (
            geometry.height,
            geometry.width,
            geometry.imcu_height,
            geometry.imcu_width,
            geometry.tiles_vertically(),
            geometry.tiles_horizontally(),
        )
    } else {
        (
            geometry.width,
            geometry.height,
            geometry.imcu_width,
            geometry.imcu_height,
            geometry.tiles_horizontally(),
            geometry.tiles_vertically(),
        )
    };

    let x_ok = !mapping.mirror_x || (transformed_width % imcu_width == 0 && tiles_x);
    let y_ok = !mapping.mirror_y || (transformed_height % imcu_height == 0 && tiles_y);
    let perfect = x_ok && y_ok;

    if options.perfect && !perfect {
        return Err(TransformError::UnsupportedGeometry(format!(
            "{directive:?} of a {}x{} image is not perfect: mirrored edges must be whole {}x{} iMCUs",
            geometry.width, geometry.height, imcu_width, imcu_height
        )));
    }

    let plan = WorkspacePlan {
        mapping,
        transformed_width,
        transformed_height,
        imcu_width,
        imcu_height,
        perfect,
        separate_buffer: mapping.transpose || matches!(directive, TransformDirective::Crop(_)),
    };
    log::debug!(
        "workspace for {directive:?}: {}x{} iMCU, perfect={}, separate buffer={}",
        imcu_width,
        imcu_height,
        plan.perfect,
        plan.separate_buffer
    );
    Ok(plan)
}

/// Settle the destination size, applying trim and crop rules.
pub fn adjust_parameters(
    geometry: &ImageGeometry,
    plan: &WorkspacePlan,
    directive: &TransformDirective,
    options: &TransformOptions,
) -> Result<AdjustedGeometry> {
    let adjusted = match directive {
        TransformDirective::Crop(region) => adjust_crop(geometry, plan, region, options)?,
        _ => {
            let mut width = plan.transformed_width;
            let mut height = plan.transformed_height;
            if options.trim {
                if plan.mapping.mirror_x && width >= plan.imcu_width {
                    width -= width % plan.imcu_width;
                }
                if plan.mapping.mirror_y && height >= plan.imcu_height {
                    height -= height % plan.imcu_height;
                }
            }
            AdjustedGeometry {
                width,
                height,
                x_offset: 0,
                y_offset: 0,
            }
        }
    };
    log::debug!(
        "destination {}x{} at offset ({}, {})",
        adjusted.width,
        adjusted.height,
        adjusted.x_offset,
        adjusted.y_offset
    );
    Ok(adjusted)
}

fn adjust_crop(
    geometry: &ImageGeometry,
    plan: &WorkspacePlan,
    region: &CropRegion,
    options: &TransformOptions,
) -> Result<AdjustedGeometry> {
    let fits = |offset: u32, extent: u32, limit: u32| extent > 0 && offset as u64 + extent as u64 <= limit as u64;
    if !fits(region.x, region.width, geometry.width) || !fits(region.y, region.height, geometry.height) {
        return Err(TransformError::UnsupportedGeometry(format!(
            "crop {}x{}+{}+{} lies outside the {}x{} image",
            region.width, region.height, region.x, region.y, geometry.width, geometry.height
        )));
    }

    let (width, x_offset) = crop_axis(region.x, region.width, geometry.width, plan.imcu_width, options, "x")?;
    let (height, y_offset) = crop_axis(region.y, region.height, geometry.height, plan.imcu_height, options, "y")?;
    Ok(AdjustedGeometry {
        width,
        height,
        x_offset,
        y_offset,
    })
}

/// Snap one crop axis to the iMCU grid, returning (extent, offset).
///
/// The offset snaps down. The extent grows to keep the requested span
/// covered and rounds up to whole iMCUs (down under `trim`), never past
/// the image edge.
fn crop_axis(
    offset: u32,
    extent: u32,
    limit: u32,
    imcu: u32,
    options: &TransformOptions,
    axis: &str,
) -> Result<(u32, u32)> {
    let snapped = offset - offset % imcu;
    if options.perfect && snapped != offset {
        return Err(TransformError::UnsupportedGeometry(format!(
            "crop {axis} offset {offset} is not a multiple of the {imcu}-pixel iMCU"
        )));
    }
    let span = extent + (offset - snapped);
    let available = limit - snapped;
    if options.perfect && span % imcu != 0 && span != available {
        return Err(TransformError::UnsupportedGeometry(format!(
            "crop {axis} extent {extent} is neither whole iMCUs nor reaches the image edge"
        )));
    }

    let rounded = if options.trim {
        (span - span % imcu).max(imcu)
    } else {
        span.div_ceil(imcu) * imcu
    };
    Ok((rounded.min(available), snapped))
}
