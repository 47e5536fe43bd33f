// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Dense (matrix-vector multiply), per spec.md §4.3, grounded in
//! `examples/original_source/ppcnn/ppcnn_server/cnn/dense.cpp`.

use ndarray::Array2;
use rayon::prelude::*;

use hecnn_fhe::{Ciphertext, FheCapability, FheResult, Plaintext};

use crate::tensor::Vector1;

pub struct DenseOp {
    pub in_units: usize,
    pub out_units: usize,
    /// `[in_units][out_units]`
    pub plain_weights: Array2<Plaintext>,
    pub plain_biases: Vec<Plaintext>,
}

impl DenseOp {
    pub fn new(in_units: usize, out_units: usize, plain_weights: Array2<Plaintext>, plain_biases: Vec<Plaintext>) -> Self {
        Self {
            in_units,
            out_units,
            plain_weights,
            plain_biases,
        }
    }

    /// One level consumed: the rescale after the accumulated dot product.
    pub fn forward(&self, fhe: &dyn FheCapability, scale_bits: u32, input: &Vector1) -> FheResult<Vector1> {
        (0..self.out_units)
            .into_par_iter()
            .map(|ou| {
                let mut acc: Option<Ciphertext> = None;
                for iu in 0..self.in_units {
                    let weighted = fhe.multiply_plain(&input[iu], &self.plain_weights[[iu, ou]])?;
                    acc = Some(match acc {
                        None => weighted,
                        Some(running) => fhe.add(&running, &weighted)?,
                    });
                }
                let acc = acc.expect("dense layer always has at least one input unit");
                let acc = fhe.rescale_to_next(&acc)?;
                let mut acc = acc;
                fhe.reassign_scale(&mut acc, scale_bits);
                fhe.add_plain(&acc, &self.plain_biases[ou])
            })
            .collect()
    }
}
