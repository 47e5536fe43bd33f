// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! AveragePooling2D and GlobalAveragePooling2D, per spec.md §4.3, grounded in
//! `examples/original_source/ppcnn/ppcnn_server/cnn/average_pooling2d.hpp`
//! and `global_average_pooling2d.cpp`.

use rayon::prelude::*;

use hecnn_fhe::{Ciphertext, FheCapability, FheResult, Plaintext};

use crate::shapes::{compute_spatial_shape, is_out_of_range, Padding, SpatialShape};
use crate::tensor::{Tensor3, Vector1};

/// AveragePooling2D. `plain_mul_factor` is `None` when `OptPooling` folded
/// the `1/(pool_h*pool_w)` multiply into the next trainable layer instead —
/// in that case `forward` only sums the window, consuming no level.
pub struct AveragePoolingOp {
    pub in_height: usize,
    pub in_width: usize,
    pub in_channels: usize,
    pub pool_height: usize,
    pub pool_width: usize,
    pub stride_height: usize,
    pub stride_width: usize,
    pub shape: SpatialShape,
    pub plain_mul_factor: Option<Plaintext>,
}

impl AveragePoolingOp {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        in_height: usize,
        in_width: usize,
        in_channels: usize,
        pool_height: usize,
        pool_width: usize,
        stride_height: usize,
        stride_width: usize,
        padding: Padding,
        plain_mul_factor: Option<Plaintext>,
    ) -> Self {
        let shape = compute_spatial_shape(
            in_height,
            in_width,
            pool_height,
            pool_width,
            stride_height,
            stride_width,
            padding,
        );
        Self {
            in_height,
            in_width,
            in_channels,
            pool_height,
            pool_width,
            stride_height,
            stride_width,
            shape,
            plain_mul_factor,
        }
    }

    pub fn out_channels(&self) -> usize {
        self.in_channels
    }

    pub fn forward(&self, fhe: &dyn FheCapability, scale_bits: u32, input: &Tensor3) -> FheResult<Tensor3> {
        let out_h = self.shape.out_height;
        let out_w = self.shape.out_width;
        let out_c = self.in_channels;

        let positions: Vec<(usize, usize)> = (0..out_h)
            .flat_map(|oh| (0..out_w).map(move |ow| (oh, ow)))
            .collect();

        let rows: Vec<FheResult<Vec<(usize, usize, usize, Ciphertext)>>> = positions
            .par_iter()
            .map(|&(oh, ow)| {
                let target_top = oh as isize * self.stride_height as isize - self.shape.pad_top as isize;
                let target_left = ow as isize * self.stride_width as isize - self.shape.pad_left as isize;
                let mut cell_results = Vec::with_capacity(out_c);
                for oc in 0..out_c {
                    let mut acc: Option<Ciphertext> = None;
                    for ph in 0..self.pool_height {
                        for pw in 0..self.pool_width {
                            let target_x = target_left + pw as isize;
                            let target_y = target_top + ph as isize;
                            if is_out_of_range(target_x, target_y, self.in_width, self.in_height) {
                                continue;
                            }
                            let pixel = &input[[target_y as usize, target_x as usize, oc]];
                            acc = Some(match acc {
                                None => pixel.clone(),
                                Some(running) => fhe.add(&running, pixel)?,
                            });
                        }
                    }
                    let mut acc = acc.expect("pooling window is never fully out of range");
                    if let Some(mul) = &self.plain_mul_factor {
                        acc = fhe.multiply_plain(&acc, mul)?;
                        acc = fhe.rescale_to_next(&acc)?;
                        fhe.reassign_scale(&mut acc, scale_bits);
                    }
                    cell_results.push((oh, ow, oc, acc));
                }
                Ok(cell_results)
            })
            .collect();

        let mut output = Tensor3::from_elem((out_h, out_w, out_c), input[[0, 0, 0]].clone());
        for row in rows {
            for (oh, ow, oc, ct) in row? {
                output[[oh, ow, oc]] = ct;
            }
        }
        Ok(output)
    }
}

/// GlobalAveragePooling2D. Folding is handled identically to
/// `AveragePoolingOp`; `plain_mul_factor` is `None` whenever the compiler's
/// `gap_always_folds` flag is on (the default — see spec.md §9's "known
/// anomaly" and `hecnn-compiler`'s `CompileOptions`).
pub struct GlobalAveragePoolingOp {
    pub in_height: usize,
    pub in_width: usize,
    pub in_channels: usize,
    pub plain_mul_factor: Option<Plaintext>,
}

impl GlobalAveragePoolingOp {
    pub fn new(in_height: usize, in_width: usize, in_channels: usize, plain_mul_factor: Option<Plaintext>) -> Self {
        Self {
            in_height,
            in_width,
            in_channels,
            plain_mul_factor,
        }
    }

    /// Sums every spatial position per channel into one ciphertext,
    /// matching `GlobalAveragePooling2D::flatten` in the original.
    pub fn forward(&self, fhe: &dyn FheCapability, scale_bits: u32, input: &Tensor3) -> FheResult<Vector1> {
        let channels = self.in_channels;
        let results: Vec<FheResult<Ciphertext>> = (0..channels)
            .into_par_iter()
            .map(|c| {
                let mut acc = input[[0, 0, c]].clone();
                for ih in 0..self.in_height {
                    for iw in 0..self.in_width {
                        if ih == 0 && iw == 0 {
                            continue;
                        }
                        acc = fhe.add(&acc, &input[[ih, iw, c]])?;
                    }
                }
                if let Some(mul) = &self.plain_mul_factor {
                    acc = fhe.multiply_plain(&acc, mul)?;
                    acc = fhe.rescale_to_next(&acc)?;
                    fhe.reassign_scale(&mut acc, scale_bits);
                }
                Ok(acc)
            })
            .collect();
        results.into_iter().collect()
    }
}
