// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Flatten: reshapes `H x W x C` into a length-`H*W*C` vector in row-major
//! `(h, w, c)` order, per spec.md §4.3, grounded in
//! `examples/original_source/ppcnn/ppcnn_server/cnn/flatten.cpp`. Consumes
//! no multiplicative level.

use crate::tensor::{Tensor3, Vector1};

pub struct FlattenOp {
    pub in_height: usize,
    pub in_width: usize,
    pub in_channels: usize,
}

impl FlattenOp {
    pub fn new(in_height: usize, in_width: usize, in_channels: usize) -> Self {
        Self {
            in_height,
            in_width,
            in_channels,
        }
    }

    pub fn out_units(&self) -> usize {
        self.in_height * self.in_width * self.in_channels
    }

    pub fn forward(&self, input: &Tensor3) -> Vector1 {
        let mut flattened = Vec::with_capacity(self.out_units());
        for ih in 0..self.in_height {
            for iw in 0..self.in_width {
                for ic in 0..self.in_channels {
                    flattened.push(input[[ih, iw, ic]].clone());
                }
            }
        }
        flattened
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_units_is_the_product_of_dims() {
        let op = FlattenOp::new(4, 4, 8);
        assert_eq!(op.out_units(), 128);
    }
}
