// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Dimension probing, malformed input, and concurrent use.

mod common;

use std::sync::Arc;
use std::thread;

use common::*;
use jpegtran_core::jpeg::bitio::BitWriter;
use jpegtran_core::jpeg::marker;
use jpegtran_core::{
    crop, dimensions, downscale, flip, get_height, get_width, rotate, transform, transpose, transverse, JpegError,
    TransformDirective, TransformError, TransformOptions,
};

/// Offset just past the frame header segment.
fn end_of_sof(data: &[u8]) -> usize {
    let pos = data
        .windows(2)
        .position(|w| w == [0xFF, marker::SOF0])
        .expect("frame header");
    let len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
    pos + 2 + len
}

#[test]
fn probe_reads_header_only() {
    let data = synthetic_jpeg(333, 111, S420);
    assert_eq!(get_width(&data).unwrap(), 333);
    assert_eq!(get_height(&data).unwrap(), 111);
    assert_eq!(dimensions(&data).unwrap(), (333, 111));
    // Everything after the frame header can be missing
    assert_eq!(dimensions(&data[..end_of_sof(&data)]).unwrap(), (333, 111));
}

#[test]
fn probe_is_idempotent() {
    let data = gray_photo(50, 20);
    let first = dimensions(&data).unwrap();
    for _ in 0..3 {
        assert_eq!(dimensions(&data).unwrap(), first);
    }
    assert_eq!(first, (50, 20));
}

#[test]
fn progressive_probe() {
    let (data, _) = progressive_jpeg(48, 32, S420, 0);
    assert_eq!(dimensions(&data).unwrap(), (48, 32));
}

#[test]
fn header_truncation_is_malformed() {
    let data = synthetic_jpeg(64, 64, S420);
    let cut = &data[..end_of_sof(&data) - 4];
    assert!(matches!(get_width(cut), Err(TransformError::MalformedStream(JpegError::UnexpectedEof))));
    assert!(matches!(get_height(&data[..1]), Err(TransformError::MalformedStream(_))));
}

#[test]
fn truncated_scan_is_malformed_everywhere() {
    let data = synthetic_jpeg(64, 64, S420);
    let half = &data[..data.len() / 2];
    let results = [
        ("rotate", rotate(half, 90)),
        ("flip", flip(half, false)),
        ("transpose", transpose(half)),
        ("transverse", transverse(half)),
        ("crop", crop(half, 0, 0, 16, 16)),
        ("none", transform(half, &TransformDirective::None, &TransformOptions::default())),
        ("downscale", downscale(half, 16, 16, 75)),
    ];
    for (name, result) in results {
        assert!(
            matches!(result, Err(TransformError::MalformedStream(_))),
            "{name}: {result:?}"
        );
    }
}

#[test]
fn not_a_jpeg() {
    let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    assert!(matches!(
        dimensions(png),
        Err(TransformError::MalformedStream(JpegError::InvalidSoi))
    ));
    assert!(matches!(rotate(png, 90), Err(TransformError::MalformedStream(_))));
    assert!(matches!(downscale(png, 1, 1, 75), Err(TransformError::MalformedStream(_))));
}

#[test]
fn arithmetic_coding_is_rejected() {
    let mut data = synthetic_jpeg(16, 16, GRAY);
    let pos = data.windows(2).position(|w| w == [0xFF, marker::SOF0]).unwrap();
    data[pos + 1] = 0xC9;
    let err = flip(&data, true).unwrap_err();
    assert_eq!(err, TransformError::MalformedStream(JpegError::UnsupportedMarker(0xC9)));
}

#[test]
fn twelve_bit_is_rejected() {
    let mut data = synthetic_jpeg(16, 16, GRAY);
    let pos = data.windows(2).position(|w| w == [0xFF, marker::SOF0]).unwrap();
    data[pos + 4] = 12;
    assert_eq!(
        dimensions(&data).unwrap_err(),
        TransformError::MalformedStream(JpegError::UnsupportedPrecision(12))
    );
}

#[test]
fn corrupt_entropy_data_is_a_decode_failure() {
    let data = synthetic_jpeg(64, 64, GRAY);
    let sos = data.windows(2).rposition(|w| w == [0xFF, marker::SOS]).unwrap();
    let scan = sos + 2 + u16::from_be_bytes([data[sos + 2], data[sos + 3]]) as usize;
    let mut broken = data.clone();
    // A run of one bits longer than any code is never valid in an optimal table
    broken[scan..scan + 6].copy_from_slice(&[0xFF, 0x00, 0xFF, 0x00, 0xFF, 0x00]);
    let err = rotate(&broken, 180).unwrap_err();
    assert!(matches!(err, TransformError::DecodeFailure(_)), "{err:?}");
}

#[test]
fn overfull_huffman_table_is_malformed() {
    // Three one-bit codes cannot exist
    let dc = flat_table(0, 1, &[0, 1, 2]);
    let ac = flat_table(1, 1, &[0x00]);
    let data = raw_gray_jpeg(8, 8, &[dc, ac], &[0x00]);
    let err = rotate(&data, 90).unwrap_err();
    assert!(
        matches!(err, TransformError::MalformedStream(JpegError::InvalidMarkerData(_))),
        "{err:?}"
    );
}

#[test]
fn runaway_dc_predictor_is_a_decode_failure() {
    // Every block adds +32767 to the DC predictor
    let dc = flat_table(0, 1, &[15]);
    let ac = flat_table(1, 1, &[0x00]);
    let mut w = BitWriter::new();
    for _ in 0..4 {
        w.write_bits(0, 1);
        w.write_bits(0x7FFF, 15);
        w.write_bits(0, 1);
    }
    let data = raw_gray_jpeg(32, 8, &[dc, ac], &w.flush());
    let err = rotate(&data, 180).unwrap_err();
    assert!(matches!(err, TransformError::DecodeFailure(_)), "{err:?}");
}

#[test]
fn concurrent_transforms_agree() {
    let data = Arc::new(synthetic_jpeg(128, 96, S420));
    let rotated = rotate(&data, 90).unwrap();
    let cropped = crop(&data, 16, 16, 64, 32).unwrap();
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let data = Arc::clone(&data);
            thread::spawn(move || {
                if i % 2 == 0 {
                    rotate(&data, 90).unwrap()
                } else {
                    crop(&data, 16, 16, 64, 32).unwrap()
                }
            })
        })
        .collect();
    for (i, h) in handles.into_iter().enumerate() {
        let expected = if i % 2 == 0 { &rotated } else { &cropped };
        assert_eq!(&h.join().unwrap(), expected);
    }
}
