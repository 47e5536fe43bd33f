// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Standalone BatchNormalization, per spec.md §4.3. Only emitted when
//! `FuseConvBN` is off, or when a BN layer has no preceding Conv2D/Dense to
//! fuse into — grounded in
//! `examples/original_source/ppcnn/ppcnn_server/cnn/batch_normalization.cpp`.

use rayon::prelude::*;

use hecnn_fhe::{Ciphertext, FheCapability, FheResult, Plaintext};

use crate::tensor::{Tensor3, Vector1};

/// ε used in `w = gamma / sqrt(moving_variance + eps)`, per spec.md §4.3.
pub const BN_EPSILON: f64 = 0.001;

pub struct BatchNormOp {
    pub plain_weights: Vec<Plaintext>,
    pub plain_biases: Vec<Plaintext>,
}

impl BatchNormOp {
    pub fn new(plain_weights: Vec<Plaintext>, plain_biases: Vec<Plaintext>) -> Self {
        Self {
            plain_weights,
            plain_biases,
        }
    }

    fn apply_one(&self, fhe: &dyn FheCapability, scale_bits: u32, x: &Ciphertext, idx: usize) -> FheResult<Ciphertext> {
        let y = fhe.multiply_plain(x, &self.plain_weights[idx])?;
        let y = fhe.rescale_to_next(&y)?;
        let mut y = y;
        fhe.reassign_scale(&mut y, scale_bits);
        fhe.add_plain(&y, &self.plain_biases[idx])
    }

    pub fn forward_tensor(&self, fhe: &dyn FheCapability, scale_bits: u32, input: &Tensor3) -> FheResult<Tensor3> {
        let (h, w, c) = input.dim();
        let mut output = input.clone();
        let results: Vec<FheResult<(usize, usize, usize, Ciphertext)>> = (0..h)
            .flat_map(|ih| (0..w).flat_map(move |iw| (0..c).map(move |ic| (ih, iw, ic))))
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|(ih, iw, ic)| Ok((ih, iw, ic, self.apply_one(fhe, scale_bits, &input[[ih, iw, ic]], ic)?)))
            .collect();
        for r in results {
            let (ih, iw, ic, ct) = r?;
            output[[ih, iw, ic]] = ct;
        }
        Ok(output)
    }

    pub fn forward_vector(&self, fhe: &dyn FheCapability, scale_bits: u32, input: &Vector1) -> FheResult<Vector1> {
        input
            .par_iter()
            .enumerate()
            .map(|(u, x)| self.apply_one(fhe, scale_bits, x, u))
            .collect()
    }
}

/// Computes `(weight, bias)` from trained γ/β/moving-mean/moving-variance,
/// per spec.md §4.3: `w = gamma / sqrt(var + eps)`, `b = beta - w * mean`.
pub fn fold_bn_params(gamma: f64, beta: f64, moving_mean: f64, moving_variance: f64) -> (f64, f64) {
    let weight = gamma / (moving_variance + BN_EPSILON).sqrt();
    let bias = beta - weight * moving_mean;
    (weight, bias)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_bn_params_matches_spec_formula() {
        let (w, b) = fold_bn_params(2.0, 0.5, 1.0, 3.0);
        let expected_w = 2.0 / (3.0 + BN_EPSILON).sqrt();
        assert!((w - expected_w).abs() < 1e-12);
        assert!((b - (0.5 - expected_w)).abs() < 1e-12);
    }
}
