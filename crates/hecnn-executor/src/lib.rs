// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Forward Executor: walks a compiled [`hecnn_compiler::NetworkPlan`] over
//! ciphertext state, per spec.md §4.5, grounded in
//! `examples/original_source/ppcnn/ppcnn_server/cnn/network_builder.cpp`'s
//! forward-pass loop. Maintains two state slots — a rank-3 tensor and a
//! rank-1 vector — and a mode flag that flips exactly once, at Flatten or
//! GlobalAveragePooling2D, matching spec.md §9's "Layer polymorphism" note:
//! the tagged `OperatorNode` union lets this module match on the operator
//! kind instead of the original's virtual-dispatch-plus-downcast.

use ndarray::Array3;
use thiserror::Error;
use tracing::{debug, instrument};

use hecnn_compiler::NetworkPlan;
use hecnn_fhe::{Ciphertext, FheCapability};
use hecnn_layers::{OperatorNode, Tensor3, Vector1};

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("forward pass has no nodes to execute")]
    EmptyPlan,
    #[error("input ciphertext count {actual} does not match declared shape {expected} (H*W*C)")]
    ShapeMismatch { expected: usize, actual: usize },
    #[error("executor never reached vector mode: plan has no Flatten/GlobalAveragePooling2D")]
    NeverFlattened,
    #[error("layer '{layer}' expects {expected} state but the plan left the executor in the other mode")]
    InvalidStateTransition { layer: String, expected: &'static str },
    #[error("fhe backend error: {0}")]
    Fhe(#[from] hecnn_fhe::FheError),
}

pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// Rank-3-vs-rank-1 executor state, per spec.md §4.5's state table. Flips
/// from `Tensor` to `Vector` exactly once, at Flatten or
/// GlobalAveragePooling2D, and never flips back.
enum ExecState {
    Tensor(Tensor3),
    Vector(Vector1),
}

/// Reshapes the query's flat, row-major `(h, w, c)` input ciphertexts into
/// the rank-3 tensor the first operator expects.
pub fn input_tensor(
    ciphertexts: Vec<Ciphertext>,
    height: usize,
    width: usize,
    channels: usize,
) -> ExecutorResult<Tensor3> {
    let expected = height * width * channels;
    if ciphertexts.len() != expected {
        return Err(ExecutorError::ShapeMismatch {
            expected,
            actual: ciphertexts.len(),
        });
    }
    Array3::from_shape_vec((height, width, channels), ciphertexts)
        .map_err(|_| ExecutorError::ShapeMismatch { expected, actual: 0 })
}

/// Runs the forward pass of `plan` against `input`, returning the final
/// rank-1 output vector (length = label count), per spec.md §4.5: "Result on
/// exit is `T1`".
#[instrument(skip_all, fields(nodes = plan.nodes.len()))]
pub fn execute(fhe: &dyn FheCapability, scale_bits: u32, plan: &NetworkPlan, input: Tensor3) -> ExecutorResult<Vector1> {
    if plan.nodes.is_empty() {
        return Err(ExecutorError::EmptyPlan);
    }

    let mut state = ExecState::Tensor(input);

    for node in &plan.nodes {
        debug!(layer = node.name(), "executing layer");
        state = step(fhe, scale_bits, node, state)?;
    }

    match state {
        ExecState::Vector(v) => Ok(v),
        ExecState::Tensor(_) => Err(ExecutorError::NeverFlattened),
    }
}

fn step(fhe: &dyn FheCapability, scale_bits: u32, node: &OperatorNode, state: ExecState) -> ExecutorResult<ExecState> {
    match node {
        OperatorNode::Conv2D { op, .. } | OperatorNode::ConvFusedBN { op, .. } => {
            let t3 = expect_tensor(state, node.name())?;
            Ok(ExecState::Tensor(op.forward(fhe, scale_bits, &t3)?))
        }
        OperatorNode::AveragePooling2D { op, .. } => {
            let t3 = expect_tensor(state, node.name())?;
            Ok(ExecState::Tensor(op.forward(fhe, scale_bits, &t3)?))
        }
        OperatorNode::BatchNormalization { op, .. } => match state {
            ExecState::Tensor(t3) => Ok(ExecState::Tensor(op.forward_tensor(fhe, scale_bits, &t3)?)),
            ExecState::Vector(v1) => Ok(ExecState::Vector(op.forward_vector(fhe, scale_bits, &v1)?)),
        },
        OperatorNode::Activation { op, relin_key, .. } => match state {
            ExecState::Tensor(t3) => {
                let mut out = t3.clone();
                for cell in out.iter_mut() {
                    *cell = op.activate(fhe, relin_key, cell, scale_bits)?;
                }
                Ok(ExecState::Tensor(out))
            }
            ExecState::Vector(v1) => {
                let out: Result<Vector1, _> = v1.iter().map(|x| op.activate(fhe, relin_key, x, scale_bits)).collect();
                Ok(ExecState::Vector(out?))
            }
        },
        OperatorNode::Flatten { op, .. } => {
            let t3 = expect_tensor(state, node.name())?;
            Ok(ExecState::Vector(op.forward(&t3)))
        }
        OperatorNode::GlobalAveragePooling2D { op, .. } => {
            let t3 = expect_tensor(state, node.name())?;
            Ok(ExecState::Vector(op.forward(fhe, scale_bits, &t3)?))
        }
        OperatorNode::Dense { op, .. } | OperatorNode::DenseFusedBN { op, .. } => {
            let v1 = expect_vector(state, node.name())?;
            Ok(ExecState::Vector(op.forward(fhe, scale_bits, &v1)?))
        }
    }
}

fn expect_tensor(state: ExecState, layer: &str) -> ExecutorResult<Tensor3> {
    match state {
        ExecState::Tensor(t3) => Ok(t3),
        ExecState::Vector(_) => Err(ExecutorError::InvalidStateTransition {
            layer: layer.to_string(),
            expected: "tensor",
        }),
    }
}

fn expect_vector(state: ExecState, layer: &str) -> ExecutorResult<Vector1> {
    match state {
        ExecState::Vector(v1) => Ok(v1),
        ExecState::Tensor(_) => Err(ExecutorError::InvalidStateTransition {
            layer: layer.to_string(),
            expected: "vector",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_tensor_rejects_mismatched_ciphertext_count() {
        // `Ciphertext` is only constructible against a live SEAL context, so
        // this exercises the length check alone via an empty input.
        let result = input_tensor(Vec::new(), 2, 2, 1);
        assert!(matches!(result, Err(ExecutorError::ShapeMismatch { expected: 4, actual: 0 })));
    }
}
