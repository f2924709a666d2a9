// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Error types for the transform and downscale operations.
//!
//! [`TransformError`] covers every failure an operation can report, from a
//! stream that is not a JPEG through geometry that cannot be honored to a
//! destination buffer that is too small.

use thiserror::Error;

use crate::jpeg::error::JpegError;

/// Errors returned by the public operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// Not a valid JPEG, or a coding mode this crate does not handle
    /// (arithmetic, lossless, hierarchical, 12-bit).
    #[error("malformed JPEG stream: {0}")]
    MalformedStream(#[source] JpegError),

    /// The transform cannot be performed as requested, e.g. under `perfect`
    /// when the image is not a whole number of iMCUs, or a crop outside the
    /// image.
    #[error("unsupported geometry: {0}")]
    UnsupportedGeometry(String),

    /// The request itself is invalid (bad rotation angle, empty crop,
    /// zero target size).
    #[error("invalid directive: {0}")]
    InvalidDirective(String),

    /// Entropy-coded data could not be decoded, or the pixel decoder failed.
    #[error("decode failure: {0}")]
    DecodeFailure(String),

    /// The output could not be encoded.
    #[error("encode failure: {0}")]
    EncodeFailure(String),

    /// The caller's buffer cannot hold the output. Nothing was written.
    #[error("destination buffer too small: need {required} bytes, have {capacity}")]
    BufferTooSmall { required: usize, capacity: usize },
}

impl From<JpegError> for TransformError {
    fn from(e: JpegError) -> Self {
        if e.is_entropy_error() {
            Self::DecodeFailure(e.to_string())
        } else {
            Self::MalformedStream(e)
        }
    }
}

pub type Result<T> = std::result::Result<T, TransformError>;
