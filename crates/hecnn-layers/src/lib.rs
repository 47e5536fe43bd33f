// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Homomorphic CNN layer operators, per spec.md §4.3: Conv2D,
//! AveragePooling2D, BatchNormalization, Dense, Activation, Flatten,
//! GlobalAveragePooling2D, plus the fused Conv2D+BN / Dense+BN variants.

pub mod activation;
pub mod batch_norm;
pub mod conv2d;
pub mod dense;
pub mod flatten;
pub mod operator;
pub mod pooling;
pub mod shapes;
pub mod tensor;

pub use activation::EncodedActivation;
pub use batch_norm::BatchNormOp;
pub use conv2d::Conv2DOp;
pub use dense::DenseOp;
pub use flatten::FlattenOp;
pub use operator::OperatorNode;
pub use pooling::{AveragePoolingOp, GlobalAveragePoolingOp};
pub use shapes::{compute_spatial_shape, is_out_of_range, Padding, SpatialShape};
pub use tensor::{Tensor3, Vector1};
