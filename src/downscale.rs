// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Lossy resize through the pixel domain.
//!
//! Unlike the lossless transforms this decodes to pixels, resamples and
//! re-encodes with fresh quantization, so the output is a new JPEG.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, GrayImage, ImageEncoder, ImageFormat, ImageReader, RgbImage};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TransformError};
use crate::jpeg::marker::iterate_markers_all;
use crate::jpeg::probe::probe;

/// Quality used when the caller does not pick one.
pub const DEFAULT_QUALITY: u8 = 75;

/// Resampling filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    /// Nearest neighbor (fastest, blocky).
    Nearest,
    /// Bilinear.
    Triangle,
    /// Bicubic.
    CatmullRom,
    /// Lanczos with window 3 (sharpest).
    #[default]
    Lanczos3,
}

impl FilterType {
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            FilterType::Nearest => image::imageops::FilterType::Nearest,
            FilterType::Triangle => image::imageops::FilterType::Triangle,
            FilterType::CatmullRom => image::imageops::FilterType::CatmullRom,
            FilterType::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

/// Settings for [`downscale_jpeg`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownscaleOptions {
    /// JPEG quality, 1–100. Zero is treated as 1.
    pub quality: u8,
    pub filter: FilterType,
    /// Permit a target larger than the source.
    pub allow_upscale: bool,
}

impl Default for DownscaleOptions {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            filter: FilterType::default(),
            allow_upscale: false,
        }
    }
}

/// Decoded samples, grayscale sources stay single channel.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelBuffer {
    Rgb(RgbImage),
    Luma(GrayImage),
}

impl PixelBuffer {
    pub fn width(&self) -> u32 {
        match self {
            PixelBuffer::Rgb(img) => img.width(),
            PixelBuffer::Luma(img) => img.width(),
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            PixelBuffer::Rgb(img) => img.height(),
            PixelBuffer::Luma(img) => img.height(),
        }
    }
}

/// Decode a JPEG to 8-bit samples.
pub fn decode_to_pixels(data: &[u8]) -> Result<PixelBuffer> {
    let reader = ImageReader::with_format(Cursor::new(data), ImageFormat::Jpeg);
    let img = reader
        .decode()
        .map_err(|e| TransformError::DecodeFailure(e.to_string()))?;
    Ok(match img {
        DynamicImage::ImageLuma8(gray) => PixelBuffer::Luma(gray),
        other => PixelBuffer::Rgb(other.into_rgb8()),
    })
}

/// Resize to exactly `width` × `height`.
pub fn resample(buffer: &PixelBuffer, width: u32, height: u32, filter: FilterType) -> Result<PixelBuffer> {
    if width == 0 || height == 0 {
        return Err(TransformError::InvalidDirective(format!(
            "target size must be positive, got {width}x{height}"
        )));
    }
    let filter = filter.to_image_filter();
    Ok(match buffer {
        PixelBuffer::Rgb(img) => PixelBuffer::Rgb(image::imageops::resize(img, width, height, filter)),
        PixelBuffer::Luma(img) => PixelBuffer::Luma(image::imageops::resize(img, width, height, filter)),
    })
}

/// Encode samples as a baseline JPEG.
pub fn encode(buffer: &PixelBuffer, quality: u8) -> Result<Vec<u8>> {
    let quality = quality.clamp(1, 100);
    let mut out = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut out, quality);
    let written = match buffer {
        PixelBuffer::Rgb(img) => encoder.write_image(img.as_raw(), img.width(), img.height(), ExtendedColorType::Rgb8),
        PixelBuffer::Luma(img) => encoder.write_image(img.as_raw(), img.width(), img.height(), ExtendedColorType::L8),
    };
    written.map_err(|e| TransformError::EncodeFailure(e.to_string()))?;
    Ok(out.into_inner())
}

/// Resize a JPEG to `width` × `height` and re-encode it.
pub fn downscale_jpeg(data: &[u8], width: u32, height: u32, options: &DownscaleOptions) -> Result<Vec<u8>> {
    if width == 0 || height == 0 {
        return Err(TransformError::InvalidDirective(format!(
            "target size must be positive, got {width}x{height}"
        )));
    }

    // Reject broken structure before handing the stream to the pixel decoder
    let (src_width, src_height) = probe(data)?;
    iterate_markers_all(data)?;

    let upscaling = width > src_width as u32 || height > src_height as u32;
    if upscaling && !options.allow_upscale {
        return Err(TransformError::UnsupportedGeometry(format!(
            "target {width}x{height} is larger than the {src_width}x{src_height} source"
        )));
    }

    let pixels = decode_to_pixels(data)?;
    let resized = resample(&pixels, width, height, options.filter)?;
    let out = encode(&resized, options.quality)?;
    log::debug!(
        "downscaled {src_width}x{src_height} -> {width}x{height} at quality {}, {} bytes",
        options.quality.max(1),
        out.len()
    );
    Ok(out)
}
