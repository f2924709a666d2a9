// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Coefficient remapping.
//!
//! Every destination block is pulled from exactly one source block, then
//! transposed and sign-flipped as the mapping requires. Working in
//! destination order keeps the loop identical for all eight orientations
//! and for crops.
//!
//! Mirroring only covers whole iMCUs of the transformed image. A partial
//! iMCU at the mirrored edge stays where it is, transposed if needed but
//! not mirrored, which is what an untrimmed imperfect transform produces.

use super::plan::{AdjustedGeometry, WorkspacePlan};
use crate::jpeg::dct::{mirror_block_horizontal, mirror_block_vertical, transpose_block, DctGrid};
use crate::jpeg::frame::FrameInfo;
use crate::jpeg::JpegImage;

/// Build destination grids for `dest` from `source`.
///
/// Destination component `c` takes its coefficients from source component
/// `c`. Positions outside the source grid come out as zero blocks.
pub fn execute(source: &JpegImage, plan: &WorkspacePlan, adjusted: &AdjustedGeometry, dest: &FrameInfo) -> Vec<DctGrid> {
    let mapping = plan.mapping;
    (0..dest.components.len())
        .map(|c| {
            let comp = &dest.components[c];
            let h = comp.h_sampling as usize;
            let v = comp.v_sampling as usize;
            let src = source.dct_grid(c);

            // Mirror extents and offsets in this component's blocks
            let mirror_cols = (plan.transformed_width / plan.imcu_width) as usize * h;
            let mirror_rows = (plan.transformed_height / plan.imcu_height) as usize * v;
            let col_offset = (adjusted.x_offset / plan.imcu_width) as usize * h;
            let row_offset = (adjusted.y_offset / plan.imcu_height) as usize * v;

            let mut grid = DctGrid::new(dest.blocks_wide(c), dest.blocks_tall(c));
            let mut block = [0i16; 64];
            for dy in 0..grid.blocks_tall() {
                let y = dy + row_offset;
                let flip_y = mapping.mirror_y && y < mirror_rows;
                let ty = if flip_y { mirror_rows - 1 - y } else { y };

                for dx in 0..grid.blocks_wide() {
                    let x = dx + col_offset;
                    let flip_x = mapping.mirror_x && x < mirror_cols;
                    let tx = if flip_x { mirror_cols - 1 - x } else { x };

                    let (src_row, src_col) = if mapping.transpose { (tx, ty) } else { (ty, tx) };
                    if src_row >= src.blocks_tall() || src_col >= src.blocks_wide() {
                        continue;
                    }

                    block.copy_from_slice(src.block(src_row, src_col));
                    if mapping.transpose {
                        transpose_block(&mut block);
                    }
                    if flip_x {
                        mirror_block_horizontal(&mut block);
                    }
                    if flip_y {
                        mirror_block_vertical(&mut block);
                    }
                    grid.block_mut(dy, dx).copy_from_slice(&block);
                }
            }
            grid
        })
        .collect()
}
