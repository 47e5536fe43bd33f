// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Conv2D and its fused-with-BatchNormalization variant, per spec.md §4.3,
//! grounded in `examples/original_source/ppcnn/ppcnn_server/cnn/conv2d.cpp`
//! and `conv2d_fused_bn.cpp`.

use ndarray::Array4;
use rayon::prelude::*;

use hecnn_fhe::{Ciphertext, FheCapability, FheResult, Plaintext};

use crate::shapes::{compute_spatial_shape, is_out_of_range, Padding, SpatialShape};
use crate::tensor::Tensor3;

/// Encoded filter/bias operand material for one Conv2D (or fused Conv2D+BN)
/// node, already mod-switched to the level it executes at (spec.md §9's
/// "plaintext weights as pre-lowered operand material").
pub struct Conv2DOp {
    pub in_height: usize,
    pub in_width: usize,
    pub in_channels: usize,
    pub filter_height: usize,
    pub filter_width: usize,
    pub filter_count: usize,
    pub stride_height: usize,
    pub stride_width: usize,
    pub shape: SpatialShape,
    /// `[fh][fw][ic][fs]`
    pub plain_filters: Array4<Plaintext>,
    pub plain_biases: Vec<Plaintext>,
}

impl Conv2DOp {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        in_height: usize,
        in_width: usize,
        in_channels: usize,
        filter_height: usize,
        filter_width: usize,
        filter_count: usize,
        stride_height: usize,
        stride_width: usize,
        padding: Padding,
        plain_filters: Array4<Plaintext>,
        plain_biases: Vec<Plaintext>,
    ) -> Self {
        let shape = compute_spatial_shape(
            in_height,
            in_width,
            filter_height,
            filter_width,
            stride_height,
            stride_width,
            padding,
        );
        Self {
            in_height,
            in_width,
            in_channels,
            filter_height,
            filter_width,
            filter_count,
            stride_height,
            stride_width,
            shape,
            plain_filters,
            plain_biases,
        }
    }

    pub fn out_channels(&self) -> usize {
        self.filter_count
    }

    /// One level consumed: the rescale after the accumulated sum, matching
    /// `Conv2D::forward` in the original.
    pub fn forward(&self, fhe: &dyn FheCapability, scale_bits: u32, input: &Tensor3) -> FheResult<Tensor3> {
        let out_h = self.shape.out_height;
        let out_w = self.shape.out_width;
        let out_c = self.filter_count;

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
                    for fh in 0..self.filter_height {
                        for fw in 0..self.filter_width {
                            let target_x = target_left + fw as isize;
                            let target_y = target_top + fh as isize;
                            if is_out_of_range(target_x, target_y, self.in_width, self.in_height) {
                                continue;
                            }
                            for ic in 0..self.in_channels {
                                let pixel = &input[[target_y as usize, target_x as usize, ic]];
                                let filter = &self.plain_filters[[fh, fw, ic, oc]];
                                let weighted = fhe.multiply_plain(pixel, filter)?;
                                acc = Some(match acc {
                                    None => weighted,
                                    Some(running) => fhe.add(&running, &weighted)?,
                                });
                            }
                        }
                    }
                    let acc = acc.expect("conv2d window is never fully out of range");
                    let acc = fhe.rescale_to_next(&acc)?;
                    let mut acc = acc;
                    fhe.reassign_scale(&mut acc, scale_bits);
                    let acc = fhe.add_plain(&acc, &self.plain_biases[oc])?;
                    cell_results.push((oh, ow, oc, acc));
                }
                Ok(cell_results)
            })
            .collect();

        let mut output = Tensor3::from_elem((out_h, out_w, out_c), placeholder(input)?);
        for row in rows {
            for (oh, ow, oc, ct) in row? {
                output[[oh, ow, oc]] = ct;
            }
        }
        Ok(output)
    }
}

/// `ndarray::Array3::from_elem` needs a concrete `Ciphertext` to seed the
/// buffer; every cell is immediately overwritten by `forward`, so any
/// already-existing ciphertext works as a throwaway placeholder.
fn placeholder(input: &Tensor3) -> FheResult<Ciphertext> {
    Ok(input[[0, 0, 0]].clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::compute_spatial_shape;

    #[test]
    fn spatial_shape_matches_filter_count_independent_layout() {
        // Conv2D's output-channel count is the filter count regardless of
        // spatial shape; exercise the shared shape helper directly since
        // `Plaintext` is only constructible against a live SEAL context.
        let shape = compute_spatial_shape(4, 4, 2, 2, 1, 1, Padding::Valid);
        assert_eq!(shape.out_height, 3);
        assert_eq!(shape.out_width, 3);
    }
}
