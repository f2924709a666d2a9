// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Error types for JPEG parsing and encoding.

use thiserror::Error;

/// Errors that can occur during JPEG parsing or encoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JpegError {
    /// Input data is too short or truncated.
    #[error("unexpected end of JPEG data")]
    UnexpectedEof,
    /// Missing SOI (0xFFD8) at start of data.
    #[error("missing SOI marker (not a JPEG)")]
    InvalidSoi,
    /// No SOF marker before the first scan.
    #[error("no SOF marker found")]
    MissingSof,
    /// Encountered an unsupported JPEG marker (arithmetic, lossless, hierarchical).
    #[error("unsupported JPEG marker: 0xFF{0:02X}")]
    UnsupportedMarker(u8),
    /// A marker segment has invalid or inconsistent length/content.
    #[error("invalid marker data: {0}")]
    InvalidMarkerData(&'static str),
    /// Huffman decode error (invalid code encountered in scan data).
    #[error("Huffman decode error")]
    HuffmanDecode,
    /// Quantization table ID out of range (0–3) or missing.
    #[error("invalid quantization table ID: {0}")]
    InvalidQuantTableId(u8),
    /// Huffman table ID out of range or missing.
    #[error("invalid Huffman table ID: {0}")]
    InvalidHuffmanTableId(u8),
    /// Component ID referenced in SOS not found in SOF.
    #[error("unknown component ID in SOS: {0}")]
    UnknownComponentId(u8),
    /// Image dimensions or sampling factors are invalid.
    #[error("invalid image dimensions or sampling factors")]
    InvalidDimensions,
    /// 12-bit precision is not supported.
    #[error("unsupported sample precision: {0}-bit")]
    UnsupportedPrecision(u8),
}

impl JpegError {
    /// True for errors raised by the entropy decoder itself rather than by
    /// the stream structure.
    pub fn is_entropy_error(&self) -> bool {
        matches!(self, Self::HuffmanDecode)
    }
}

pub type Result<T> = std::result::Result<T, JpegError>;
