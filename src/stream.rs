// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Owned JPEG buffer with chainable transforms.
//!
//! ```rust,ignore
//! use jpegtran_core::JpegStream;
//!
//! let thumb = JpegStream::new(std::fs::read("photo.jpg")?)?
//!     .rotate(90)?
//!     .crop(0, 0, 256, 256)?
//!     .downscale(128, 128)?;
//! std::fs::write("thumb.jpg", thumb.as_bytes())?;
//! ```

use crate::downscale::{DownscaleOptions, DEFAULT_QUALITY};
use crate::error::{Result, TransformError};
use crate::jpeg::error::JpegError;
use crate::operations;

/// A JPEG file held in memory. Every operation returns a new stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JpegStream {
    data: Vec<u8>,
}

impl JpegStream {
    /// Wrap `data`, which must begin with an SOI marker.
    pub fn new(data: Vec<u8>) -> Result<Self> {
        if data.len() < 2 || data[0] != 0xFF || data[1] != 0xD8 {
            return Err(TransformError::MalformedStream(JpegError::InvalidSoi));
        }
        Ok(Self { data })
    }

    pub fn width(&self) -> Result<u32> {
        operations::get_width(&self.data)
    }

    pub fn height(&self) -> Result<u32> {
        operations::get_height(&self.data)
    }

    /// Clockwise rotation by 90, 180 or 270 degrees.
    pub fn rotate(&self, angle: i32) -> Result<Self> {
        if !matches!(angle, 90 | 180 | 270) {
            return Err(TransformError::InvalidDirective(format!(
                "rotation angle must be 90, 180 or 270, got {angle}"
            )));
        }
        Ok(Self { data: operations::rotate(&self.data, angle)? })
    }

    pub fn flip_horizontal(&self) -> Result<Self> {
        Ok(Self { data: operations::flip(&self.data, false)? })
    }

    pub fn flip_vertical(&self) -> Result<Self> {
        Ok(Self { data: operations::flip(&self.data, true)? })
    }

    pub fn transpose(&self) -> Result<Self> {
        Ok(Self { data: operations::transpose(&self.data)? })
    }

    pub fn transverse(&self) -> Result<Self> {
        Ok(Self { data: operations::transverse(&self.data)? })
    }

    /// Lossless crop; the region must lie inside the image.
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> Result<Self> {
        Ok(Self { data: operations::crop(&self.data, x, y, width, height)? })
    }

    /// Resize down to `width` × `height` at quality 75.
    pub fn downscale(&self, width: u32, height: u32) -> Result<Self> {
        self.downscale_with_quality(width, height, DEFAULT_QUALITY)
    }

    pub fn downscale_with_quality(&self, width: u32, height: u32, quality: u8) -> Result<Self> {
        let options = DownscaleOptions {
            quality,
            ..Default::default()
        };
        Ok(Self { data: operations::downscale_with(&self.data, width, height, &options)? })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

impl AsRef<[u8]> for JpegStream {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl TryFrom<Vec<u8>> for JpegStream {
    type Error = TransformError;

    fn try_from(data: Vec<u8>) -> Result<Self> {
        Self::new(data)
    }
}
