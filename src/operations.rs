// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Public byte-in, byte-out operations.
//!
//! Every function takes the whole JPEG file and returns a new one. All are
//! stateless and safe to call from any number of threads at once.

use crate::downscale::{downscale_jpeg, DownscaleOptions};
use crate::error::{Result, TransformError};
use crate::jpeg::probe::probe;
use crate::transform::{transform_jpeg, TransformDirective, TransformOptions};

/// Image width in pixels, read from the frame header.
pub fn get_width(data: &[u8]) -> Result<u32> {
    Ok(dimensions(data)?.0)
}

/// Image height in pixels, read from the frame header.
pub fn get_height(data: &[u8]) -> Result<u32> {
    Ok(dimensions(data)?.1)
}

/// (width, height) in pixels, without decoding any scan data.
pub fn dimensions(data: &[u8]) -> Result<(u32, u32)> {
    let (w, h) = probe(data)?;
    Ok((w as u32, h as u32))
}

/// Resize to `width` × `height` at the given JPEG quality (0 is treated as 1).
pub fn downscale(data: &[u8], width: u32, height: u32, quality: u8) -> Result<Vec<u8>> {
    let options = DownscaleOptions {
        quality,
        ..Default::default()
    };
    downscale_jpeg(data, width, height, &options)
}

/// Resize with explicit filter and upscale policy.
pub fn downscale_with(data: &[u8], width: u32, height: u32, options: &DownscaleOptions) -> Result<Vec<u8>> {
    downscale_jpeg(data, width, height, options)
}

/// Lossless crop. Offsets snap down to the iMCU grid and the extent rounds
/// up to whole iMCUs, clipped at the image edge.
pub fn crop(data: &[u8], x: u32, y: u32, width: u32, height: u32) -> Result<Vec<u8>> {
    transform(data, &TransformDirective::crop(x, y, width, height)?, &TransformOptions::default())
}

/// Mirror across the main diagonal.
pub fn transpose(data: &[u8]) -> Result<Vec<u8>> {
    transform(data, &TransformDirective::Transpose, &TransformOptions::default())
}

/// Mirror across the anti-diagonal.
pub fn transverse(data: &[u8]) -> Result<Vec<u8>> {
    transform(data, &TransformDirective::Transverse, &TransformOptions::default())
}

/// Mirror left-to-right, or top-to-bottom when `vertical`.
pub fn flip(data: &[u8], vertical: bool) -> Result<Vec<u8>> {
    transform(data, &TransformDirective::flip(vertical), &TransformOptions::default())
}

/// Rotate clockwise by 90, 180 or 270 degrees (-90 is 270).
pub fn rotate(data: &[u8], angle: i32) -> Result<Vec<u8>> {
    transform(data, &TransformDirective::rotate(angle)?, &TransformOptions::default())
}

/// Apply any lossless transform with explicit options.
pub fn transform(data: &[u8], directive: &TransformDirective, options: &TransformOptions) -> Result<Vec<u8>> {
    transform_jpeg(data, directive, options)
}

/// [`transform`] into a caller buffer, returning the byte count.
///
/// Fails with [`TransformError::BufferTooSmall`] and leaves `out` untouched
/// when the result does not fit.
pub fn transform_into(
    data: &[u8],
    directive: &TransformDirective,
    options: &TransformOptions,
    out: &mut [u8],
) -> Result<usize> {
    copy_out(&transform(data, directive, options)?, out)
}

/// [`downscale_with`] into a caller buffer, returning the byte count.
pub fn downscale_into(
    data: &[u8],
    width: u32,
    height: u32,
    options: &DownscaleOptions,
    out: &mut [u8],
) -> Result<usize> {
    copy_out(&downscale_jpeg(data, width, height, options)?, out)
}

fn copy_out(bytes: &[u8], out: &mut [u8]) -> Result<usize> {
    if bytes.len() > out.len() {
        return Err(TransformError::BufferTooSmall {
            required: bytes.len(),
            capacity: out.len(),
        });
    }
    out[..bytes.len()].copy_from_slice(bytes);
    Ok(bytes.len())
}
