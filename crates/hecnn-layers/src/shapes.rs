// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use serde::{Deserialize, Serialize};

/// Shared by Conv2D and AveragePooling2D: both slide a `k_h x k_w` window
/// over `H x W` with the same padding arithmetic, per spec.md §4.3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Padding {
    Valid,
    Same,
}

impl Padding {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "valid" => Some(Self::Valid),
            "same" => Some(Self::Same),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpatialShape {
    pub out_height: usize,
    pub out_width: usize,
    pub pad_top: usize,
    pub pad_bottom: usize,
    pub pad_left: usize,
    pub pad_right: usize,
}

fn ceil_div(a: usize, b: usize) -> usize {
    (a + b - 1) / b
}

/// Computes output spatial dims and padding for a windowed op (Conv2D,
/// AveragePooling2D), matching `pp_cnn/src/cnn/{conv2d,average_pooling2d}.cpp`.
pub fn compute_spatial_shape(
    in_height: usize,
    in_width: usize,
    window_height: usize,
    window_width: usize,
    stride_height: usize,
    stride_width: usize,
    padding: Padding,
) -> SpatialShape {
    match padding {
        Padding::Valid => {
            let out_height = ceil_div(in_height - window_height + 1, stride_height);
            let out_width = ceil_div(in_width - window_width + 1, stride_width);
            SpatialShape {
                out_height,
                out_width,
                pad_top: 0,
                pad_bottom: 0,
                pad_left: 0,
                pad_right: 0,
            }
        }
        Padding::Same => {
            let out_height = ceil_div(in_height, stride_height);
            let out_width = ceil_div(in_width, stride_width);

            let rem_h = in_height % stride_height;
            let pad_along_height = if rem_h == 0 {
                window_height.saturating_sub(stride_height)
            } else {
                window_height.saturating_sub(rem_h)
            };
            let rem_w = in_width % stride_width;
            let pad_along_width = if rem_w == 0 {
                window_width.saturating_sub(stride_width)
            } else {
                window_width.saturating_sub(rem_w)
            };

            let pad_top = pad_along_height / 2;
            let pad_bottom = pad_along_height - pad_top;
            let pad_left = pad_along_width / 2;
            let pad_right = pad_along_width - pad_left;

            SpatialShape {
                out_height,
                out_width,
                pad_top,
                pad_bottom,
                pad_left,
                pad_right,
            }
        }
    }
}

/// True when `(target_x, target_y)` falls outside the `in_width x in_height`
/// input plane, i.e. the window position reads padding rather than a real
/// pixel.
pub fn is_out_of_range(target_x: isize, target_y: isize, in_width: usize, in_height: usize) -> bool {
    target_x < 0 || target_y < 0 || target_x as usize >= in_width || target_y as usize >= in_height
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_padding_matches_spec_formula() {
        // in_h=28, filter=5, stride=2: rem = 28 % 2 = 0 -> pad_along = max(5-2,0) = 3
        let shape = compute_spatial_shape(28, 28, 5, 5, 2, 2, Padding::Same);
        assert_eq!(shape.out_height, 14);
        assert_eq!(shape.out_width, 14);
        assert_eq!(shape.pad_top + shape.pad_bottom, 3);
        assert_eq!(shape.pad_top, 1);
        assert_eq!(shape.pad_bottom, 2);
    }

    #[test]
    fn valid_padding_has_no_pad() {
        let shape = compute_spatial_shape(28, 28, 5, 5, 1, 1, Padding::Valid);
        assert_eq!(shape.out_height, 24);
        assert_eq!(shape.pad_top, 0);
        assert_eq!(shape.pad_bottom, 0);
    }

    #[test]
    fn out_of_range_detects_all_four_edges() {
        assert!(is_out_of_range(-1, 0, 10, 10));
        assert!(is_out_of_range(0, -1, 10, 10));
        assert!(is_out_of_range(10, 0, 10, 10));
        assert!(is_out_of_range(0, 10, 10, 10));
        assert!(!is_out_of_range(5, 5, 10, 10));
    }
}
