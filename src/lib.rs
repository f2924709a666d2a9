// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! # jpegtran-core
//!
//! Pure-Rust lossless JPEG transforms. Rotations, flips, transposition and
//! crops are carried out on the quantized DCT coefficients, so the image is
//! never decoded to pixels and never loses quality. A pixel-domain
//! downscale and a header-only dimension probe round out the set.
//!
//! - **Lossless** (`transform` module): coefficient blocks are moved and
//!   sign-flipped inside the frequency domain; quantization tables travel
//!   with them. Edges that are not a whole number of iMCUs are left alone,
//!   trimmed, or rejected, depending on [`TransformOptions`].
//! - **Lossy** (`downscale` module): decode, resample, re-encode through
//!   the `image` crate.
//!
//! The coefficient codec (`jpeg` module) reads baseline, extended and
//! progressive files and always writes sequential JPEG with optimal
//! Huffman tables.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use jpegtran_core::{rotate, crop, dimensions};
//!
//! let photo = std::fs::read("photo.jpg").unwrap();
//! let turned = rotate(&photo, 90).unwrap();
//! let (w, h) = dimensions(&turned).unwrap();
//! let corner = crop(&turned, 0, 0, w / 2, h / 2).unwrap();
//! ```

pub mod downscale;
pub mod error;
pub mod jpeg;
pub mod operations;
pub mod stream;
pub mod transform;

pub use downscale::{DownscaleOptions, FilterType, DEFAULT_QUALITY};
pub use error::{Result, TransformError};
pub use jpeg::dct::{DctGrid, QuantTable};
pub use jpeg::error::{JpegError, Result as JpegResult};
pub use jpeg::frame::FrameInfo;
pub use jpeg::preserve::CopyMarkers;
pub use jpeg::JpegImage;
pub use operations::{
    crop, dimensions, downscale, downscale_into, downscale_with, flip, get_height, get_width, rotate, transform,
    transform_into, transpose, transverse,
};
pub use stream::JpegStream;
pub use transform::{CropRegion, TransformDirective, TransformOptions};
