// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! DCT coefficient storage and quantization tables.
//!
//! Provides [`DctGrid`] for storing quantized DCT coefficients in block-raster
//! order, [`QuantTable`] for the 64-entry quantization matrices, and the
//! per-block coefficient operations that mirror or transpose an 8×8 block
//! without leaving the frequency domain.

/// Quantization table: 64 values in natural (row-major) order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantTable {
    /// Quantization values, indexed by row * 8 + col.
    pub values: [u16; 64],
}

impl QuantTable {
    pub fn new(values: [u16; 64]) -> Self {
        Self { values }
    }

    /// The table with rows and columns swapped.
    ///
    /// A transposed coefficient block must be paired with the transposed
    /// table so every coefficient keeps its original quantizer.
    pub fn transposed(&self) -> Self {
        let mut values = [0u16; 64];
        for i in 0..8 {
            for j in 0..8 {
                values[j * 8 + i] = self.values[i * 8 + j];
            }
        }
        Self { values }
    }
}

/// Grid of quantized DCT coefficients for one image component.
///
/// Coefficients are stored in block-raster order. Within each block,
/// the 64 coefficients are in natural (row-major) order, i.e. index = row * 8 + col.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DctGrid {
    /// Number of 8×8 blocks horizontally.
    blocks_wide: usize,
    /// Number of 8×8 blocks vertically.
    blocks_tall: usize,
    /// Flat storage: blocks_tall * blocks_wide * 64 coefficients.
    coeffs: Vec<i16>,
}

impl DctGrid {
    /// Create a new grid initialized to zero.
    pub fn new(blocks_wide: usize, blocks_tall: usize) -> Self {
        Self {
            blocks_wide,
            blocks_tall,
            coeffs: vec![0i16; blocks_wide * blocks_tall * 64],
        }
    }

    pub fn blocks_wide(&self) -> usize {
        self.blocks_wide
    }

    pub fn blocks_tall(&self) -> usize {
        self.blocks_tall
    }

    /// Get a coefficient value.
    /// - `br`, `bc`: block row and column (0-based)
    /// - `i`, `j`: frequency row and column within the block (0–7)
    pub fn get(&self, br: usize, bc: usize, i: usize, j: usize) -> i16 {
        self.coeffs[self.index(br, bc, i, j)]
    }

    /// Set a coefficient value.
    pub fn set(&mut self, br: usize, bc: usize, i: usize, j: usize, val: i16) {
        let idx = self.index(br, bc, i, j);
        self.coeffs[idx] = val;
    }

    /// Get a mutable reference to the 64-coefficient block at (br, bc).
    pub fn block_mut(&mut self, br: usize, bc: usize) -> &mut [i16] {
        let start = (br * self.blocks_wide + bc) * 64;
        &mut self.coeffs[start..start + 64]
    }

    /// Get a reference to the 64-coefficient block at (br, bc).
    pub fn block(&self, br: usize, bc: usize) -> &[i16] {
        let start = (br * self.blocks_wide + bc) * 64;
        &self.coeffs[start..start + 64]
    }

    /// Raw read-only access to all coefficients.
    pub fn coeffs(&self) -> &[i16] {
        &self.coeffs
    }

    fn index(&self, br: usize, bc: usize, i: usize, j: usize) -> usize {
        debug_assert!(br < self.blocks_tall, "block row {br} >= {}", self.blocks_tall);
        debug_assert!(bc < self.blocks_wide, "block col {bc} >= {}", self.blocks_wide);
        debug_assert!(i < 8 && j < 8);
        (br * self.blocks_wide + bc) * 64 + i * 8 + j
    }
}

/// Swap frequency rows and columns of a block.
pub fn transpose_block(block: &mut [i16; 64]) {
    for i in 0..8 {
        for j in (i + 1)..8 {
            block.swap(i * 8 + j, j * 8 + i);
        }
    }
}

/// Mirror a block left-to-right: negates every odd horizontal frequency.
pub fn mirror_block_horizontal(block: &mut [i16; 64]) {
    for i in 0..8 {
        for j in (1..8).step_by(2) {
            block[i * 8 + j] = block[i * 8 + j].wrapping_neg();
        }
    }
}

/// Mirror a block top-to-bottom: negates every odd vertical frequency.
pub fn mirror_block_vertical(block: &mut [i16; 64]) {
    for i in (1..8).step_by(2) {
        for j in 0..8 {
            block[i * 8 + j] = block[i * 8 + j].wrapping_neg();
        }
    }
}
