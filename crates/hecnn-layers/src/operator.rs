// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Tagged-union operator node, per spec.md §9's "Layer polymorphism" design
//! note: one variant per operator kind instead of the original's virtual
//! `Layer` base class and downcast-at-Flatten pattern. `hecnn-executor`
//! matches on the tag to choose the right tensor/vector slot.

use crate::activation::EncodedActivation;
use crate::batch_norm::BatchNormOp;
use crate::conv2d::Conv2DOp;
use crate::dense::DenseOp;
use crate::flatten::FlattenOp;
use crate::pooling::{AveragePoolingOp, GlobalAveragePoolingOp};

/// One compiled layer, in execution order. The plan owning a `Vec<OperatorNode>`
/// also owns every pre-encoded plaintext operand within it (spec.md §9's
/// "arena of pre-lowered operands"); dropping the plan frees them together.
pub enum OperatorNode {
    Conv2D { name: String, op: Conv2DOp },
    /// `FuseConvBN`-fused Conv2D+BatchNormalization.
    ConvFusedBN { name: String, op: Conv2DOp },
    AveragePooling2D { name: String, op: AveragePoolingOp },
    BatchNormalization { name: String, op: BatchNormOp },
    Dense { name: String, op: DenseOp },
    /// `FuseConvBN`-fused Dense+BatchNormalization.
    DenseFusedBN { name: String, op: DenseOp },
    Activation {
        name: String,
        op: EncodedActivation,
        relin_key: hecnn_fhe::RelinKey,
    },
    Flatten { name: String, op: FlattenOp },
    GlobalAveragePooling2D { name: String, op: GlobalAveragePoolingOp },
}

impl OperatorNode {
    pub fn name(&self) -> &str {
        match self {
            Self::Conv2D { name, .. }
            | Self::ConvFusedBN { name, .. }
            | Self::AveragePooling2D { name, .. }
            | Self::BatchNormalization { name, .. }
            | Self::Dense { name, .. }
            | Self::DenseFusedBN { name, .. }
            | Self::Activation { name, .. }
            | Self::Flatten { name, .. }
            | Self::GlobalAveragePooling2D { name, .. } => name,
        }
    }

    /// True for the two nodes that transition the executor's state from the
    /// rank-3 tensor slot to the rank-1 vector slot, per spec.md §4.5.
    pub fn flips_to_vector_mode(&self) -> bool {
        matches!(self, Self::Flatten { .. } | Self::GlobalAveragePooling2D { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::FlattenOp;

    #[test]
    fn flatten_node_reports_name_and_flips_mode() {
        let node = OperatorNode::Flatten {
            name: "flatten_1".to_string(),
            op: FlattenOp::new(4, 4, 8),
        };
        assert_eq!(node.name(), "flatten_1");
        assert!(node.flips_to_vector_mode());
    }
}
