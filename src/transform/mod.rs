// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Lossless transforms in the DCT coefficient domain.
//!
//! Pipeline:
//! 1. Open the stream and parse its header
//! 2. Plan the workspace and check the transform is possible
//! 3. Settle destination size (trim, crop snapping)
//! 4. Entropy-decode all coefficients
//! 5. Copy quantization tables and component layout to the destination
//! 6. Remap coefficient blocks
//! 7. Write the destination with the selected metadata
//!
//! No step leaves the frequency domain, so the transformed image carries
//! exactly the source's quantized coefficients.

pub mod directive;
pub mod execute;
pub mod geometry;
pub mod plan;

pub use directive::{CropRegion, TransformDirective, TransformOptions};

use crate::error::{Result, TransformError};
use crate::jpeg::frame::FrameInfo;
use crate::jpeg::preserve::select_markers;
use crate::jpeg::{copy_critical_parameters, Decoder, JpegImage};
use geometry::ImageGeometry;
use plan::{adjust_parameters, request_workspace};

/// Apply one lossless transform to a JPEG stream.
pub fn transform_jpeg(data: &[u8], directive: &TransformDirective, options: &TransformOptions) -> Result<Vec<u8>> {
    let decoder = Decoder::open(data)?;
    let source_frame = decoder.frame_info();

    let grayscale = options.force_grayscale && source_frame.components.len() != 1;
    if grayscale && source_frame.components.len() != 3 {
        return Err(TransformError::InvalidDirective(format!(
            "grayscale conversion needs YCbCr input, got {} components",
            source_frame.components.len()
        )));
    }

    let geometry = ImageGeometry::from_frame(source_frame, grayscale);
    let plan = request_workspace(&geometry, directive, options)?;
    let adjusted = adjust_parameters(&geometry, &plan, directive, options)?;
    if plan.leaves_partial_edge(&adjusted) {
        log::warn!(
            "{directive:?}: {}x{} is not a whole number of {}x{} iMCUs, edge blocks left unmirrored",
            adjusted.width,
            adjusted.height,
            plan.imcu_width,
            plan.imcu_height
        );
    }
    let source = decoder.read_coefficients()?;
    let metadata = select_markers(source.metadata(), options.copy_markers, grayscale);
    let mut params = copy_critical_parameters(&source);
    if grayscale {
        params = params.luma_only();
    }
    if plan.mapping.transpose {
        params = params.transposed();
    }

    let (width, height) = destination_size(&adjusted)?;
    let dest_frame = FrameInfo::new(width, height, params.components.clone(), false).map_err(encode_failure)?;
    let grids = execute::execute(&source, &plan, &adjusted, &dest_frame);
    log::debug!(
        "{directive:?}: {}x{} -> {}x{}",
        geometry.width,
        geometry.height,
        width,
        height
    );

    let image = JpegImage::with_coefficients(params, width, height, grids, metadata).map_err(encode_failure)?;
    image.to_bytes().map_err(encode_failure)
}

fn destination_size(adjusted: &plan::AdjustedGeometry) -> Result<(u16, u16)> {
    let width = u16::try_from(adjusted.width);
    let height = u16::try_from(adjusted.height);
    match (width, height) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => Err(TransformError::EncodeFailure(format!(
            "destination {}x{} exceeds the JPEG size limit",
            adjusted.width, adjusted.height
        ))),
    }
}

fn encode_failure(e: crate::jpeg::error::JpegError) -> TransformError {
    TransformError::EncodeFailure(e.to_string())
}
