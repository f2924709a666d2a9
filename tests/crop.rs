// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Lossless crop: size rounding, content, and bounds.

mod common;

use common::*;
use jpegtran_core::{
    crop, dimensions, transform, JpegImage, JpegStream, TransformDirective, TransformError, TransformOptions,
};
use proptest::prelude::*;

/// Expected output extent for one axis of a default-options crop.
fn rounded(offset: u32, extent: u32, limit: u32, imcu: u32) -> (u32, u32) {
    let snapped = offset - offset % imcu;
    let span = extent + offset - snapped;
    ((span.div_ceil(imcu) * imcu).min(limit - snapped), snapped)
}

/// Every block of the crop must equal the source block at the snapped offset.
fn assert_same_blocks(src: &JpegImage, dst: &JpegImage, x0: u32, y0: u32) {
    let frame = src.frame_info();
    for c in 0..dst.num_components() {
        let comp = &frame.components[c];
        let col_off = (x0 / frame.mcu_width as u32) as usize * comp.h_sampling as usize;
        let row_off = (y0 / frame.mcu_height as u32) as usize * comp.v_sampling as usize;
        let d = dst.frame_info();
        for r in 0..d.height_in_blocks(c) {
            for col in 0..d.width_in_blocks(c) {
                assert_eq!(
                    dst.dct_grid(c).block(r, col),
                    src.dct_grid(c).block(r + row_off, col + col_off),
                    "component {c} block ({r}, {col})"
                );
            }
        }
    }
}

#[test]
fn crop_rounds_up_to_whole_mcus() {
    let data = synthetic_jpeg(200, 200, S420);
    let out = crop(&data, 0, 0, 100, 100).unwrap();
    assert_eq!(dimensions(&out).unwrap(), (112, 112));
}

#[test]
fn crop_keeps_source_blocks() {
    let data = synthetic_jpeg(200, 200, S420);
    let out = crop(&data, 32, 48, 64, 40).unwrap();
    assert_eq!(dimensions(&out).unwrap(), (64, 48));
    let src = JpegImage::from_bytes(&data).unwrap();
    let dst = JpegImage::from_bytes(&out).unwrap();
    assert_same_blocks(&src, &dst, 32, 48);
    // Quantization tables carry over untouched
    assert_eq!(dst.quant_table(0), src.quant_table(0));
    assert_eq!(dst.quant_table(1), src.quant_table(1));
}

#[test]
fn crop_snaps_unaligned_offset() {
    let data = synthetic_jpeg(200, 200, S422);
    let out = crop(&data, 21, 3, 10, 10).unwrap();
    // 4:2:2 MCU is 16x8: x snaps to 16, y to 0
    assert_eq!(dimensions(&out).unwrap(), (16, 16));
    let src = JpegImage::from_bytes(&data).unwrap();
    let dst = JpegImage::from_bytes(&out).unwrap();
    assert_same_blocks(&src, &dst, 16, 0);
}

#[test]
fn crop_at_edge_is_clipped() {
    let data = synthetic_jpeg(100, 75, S420);
    let out = crop(&data, 90, 70, 10, 5).unwrap();
    // Offsets snap to (80, 64); the rest of the image is 20x11
    assert_eq!(dimensions(&out).unwrap(), (20, 11));
}

#[test]
fn grayscale_crop_uses_single_blocks() {
    let data = synthetic_jpeg(64, 64, GRAY);
    let out = crop(&data, 8, 8, 9, 1).unwrap();
    assert_eq!(dimensions(&out).unwrap(), (16, 8));
}

#[test]
fn crop_outside_image_fails() {
    let data = synthetic_jpeg(64, 64, S444);
    for (x, y, w, h) in [(60, 0, 8, 8), (0, 64, 1, 1), (0, 0, 65, 10)] {
        assert!(
            matches!(crop(&data, x, y, w, h), Err(TransformError::UnsupportedGeometry(_))),
            "crop {w}x{h}+{x}+{y}"
        );
    }
    assert!(matches!(crop(&data, 0, 0, 0, 8), Err(TransformError::InvalidDirective(_))));
}

#[test]
fn perfect_crop_requires_alignment() {
    let data = synthetic_jpeg(64, 64, S420);
    let opts = TransformOptions { perfect: true, ..Default::default() };
    let aligned = TransformDirective::crop(16, 16, 32, 48).unwrap();
    assert_eq!(dimensions(&transform(&data, &aligned, &opts).unwrap()).unwrap(), (32, 48));
    let unaligned = TransformDirective::crop(4, 0, 16, 16).unwrap();
    assert!(matches!(transform(&data, &unaligned, &opts), Err(TransformError::UnsupportedGeometry(_))));
}

#[test]
fn trim_crop_rounds_down() {
    let data = synthetic_jpeg(200, 200, S420);
    let opts = TransformOptions { trim: true, ..Default::default() };
    let d = TransformDirective::crop(0, 0, 100, 100).unwrap();
    assert_eq!(dimensions(&transform(&data, &d, &opts).unwrap()).unwrap(), (96, 96));
}

#[test]
fn stream_crop_checks_bounds() {
    let data = synthetic_jpeg(64, 64, S444);
    let stream = JpegStream::new(data.clone()).unwrap();
    // Same error kind as the free function
    assert_eq!(stream.crop(32, 0, 40, 8).unwrap_err(), crop(&data, 32, 0, 40, 8).unwrap_err());
    assert!(matches!(stream.crop(32, 0, 40, 8), Err(TransformError::UnsupportedGeometry(_))));
    let cropped = stream.crop(8, 8, 16, 16).unwrap();
    assert_eq!((cropped.width().unwrap(), cropped.height().unwrap()), (16, 16));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Output size follows the rounding rule and the kept blocks are the
    /// source blocks of the snapped region.
    #[test]
    fn prop_crop_dims_and_content(
        (x, w) in (0u32..200).prop_flat_map(|x| (Just(x), 1u32..=200 - x)),
        (y, h) in (0u32..120).prop_flat_map(|y| (Just(y), 1u32..=120 - y)),
    ) {
        let data = synthetic_jpeg(200, 120, S420);
        let out = crop(&data, x, y, w, h).unwrap();
        let (ew, x0) = rounded(x, w, 200, 16);
        let (eh, y0) = rounded(y, h, 120, 16);
        prop_assert_eq!(dimensions(&out).unwrap(), (ew, eh));
        prop_assert!(ew >= w && eh >= h);

        let src = JpegImage::from_bytes(&data).unwrap();
        let dst = JpegImage::from_bytes(&out).unwrap();
        assert_same_blocks(&src, &dst, x0, y0);
    }
}
