// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! The per-layer build functions, per spec.md §4.4, grounded line-for-line
//! in `examples/original_source/pp_cnn/src/cnn/load_model.cpp`'s
//! `buildConv2D`/`buildAveragePooling2D`/`buildBatchNormalization`/
//! `buildDense`/`buildActivation`/`buildGlobalAveragePooling2D`/
//! `buildConv2DFusedBN`/`buildDenseFusedBN`, reimplemented as pure functions
//! over an explicit `CompileState` rather than mutable globals.

use ndarray::{Array2, Array4};

use hecnn_fhe::{FheCapability, Plaintext, RelinKey};
use hecnn_layers::{
    batch_norm::fold_bn_params, activation, AveragePoolingOp, BatchNormOp, Conv2DOp, DenseOp, EncodedActivation,
    FlattenOp, GlobalAveragePoolingOp, OperatorNode,
};
use hecnn_model::{ActivationFamily, CoreError, CoreResult};

use crate::state::{CompileOptions, CompileState};
use crate::topology::LayerConfig;
use crate::weights::{layer_path, WeightsStore, BETA_KEY, BIAS_KEY, GAMMA_KEY, KERNEL_KEY, MOVING_MEAN_KEY, MOVING_VARIANCE_KEY};

/// Weight-rounding epsilon for the `(50, 30)` modulus profile this system
/// ships, per spec.md §6 and SPEC_FULL.md §4.1.
pub use hecnn_model::WEIGHT_ROUND_EPSILON as EPSILON;

/// Rounds a folded weight whose magnitude underflows `EPSILON`, matching
/// `roundValue` in the original — the sign of an exact zero is taken as
/// `+1` (spec.md §4.4's edge case / §9's "Underflow rounding sign" note).
fn round_if_underflowing(value: f64) -> f64 {
    if value.abs() < EPSILON {
        let sign = if value == 0.0 { 1.0 } else { value.signum() };
        EPSILON * sign
    } else {
        value
    }
}

fn encode_weight_at(fhe: &dyn FheCapability, scale_bits: u32, value: f64, switches: u32) -> CoreResult<Plaintext> {
    let mut plain = fhe.encode_value(value, scale_bits, 0).map_err(fhe_err)?;
    for _ in 0..switches {
        plain = fhe.mod_switch_plaintext_to_next(&plain).map_err(fhe_err)?;
    }
    Ok(plain)
}

fn fhe_err(e: hecnn_fhe::FheError) -> CoreError {
    CoreError::Fhe(e.to_string())
}

fn check_budget(layer: &str, consumed: u32, cost: u32, budget: u32) -> CoreResult<()> {
    if consumed + cost > budget {
        return Err(CoreError::LevelBudgetExhausted {
            layer: layer.to_string(),
            needed: cost,
            available: budget.saturating_sub(consumed),
        });
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn build_conv2d(
    fhe: &dyn FheCapability,
    cfg: &LayerConfig,
    weights: &WeightsStore,
    state: &mut CompileState,
    options: &CompileOptions,
    scale_bits: u32,
    level_budget: u32,
) -> CoreResult<OperatorNode> {
    let name = cfg.name()?.to_string();
    let (in_h, in_w, in_c) = cfg
        .batch_input_shape()
        .unwrap_or((state.next_layer_in_height, state.next_layer_in_width, state.next_layer_in_channels));
    let filter_count = cfg.filters_or_err()?;
    let (filter_h, filter_w) = cfg.kernel_size_or_err()?;
    let (stride_h, stride_w) = cfg.strides_or_err()?;
    let padding = cfg.padding_or_err()?;

    check_budget(&name, state.consumed_level, 1, level_budget)?;

    let raw_filters = weights.tensor(&layer_path(&name, KERNEL_KEY))?;
    let raw_biases = weights.tensor(&layer_path(&name, BIAS_KEY))?;

    let folding = state.take_folding(options);

    let mut plain_filters = Array4::from_elem((filter_h, filter_w, in_c, filter_count), None::<Plaintext>);
    for fh in 0..filter_h {
        for fw in 0..filter_w {
            for ic in 0..in_c {
                for fs in 0..filter_count {
                    let idx = ((fh * filter_w + fw) * in_c + ic) * filter_count + fs;
                    let weight = round_if_underflowing(folding.value * raw_filters[idx] as f64);
                    let plain = encode_weight_at(fhe, scale_bits, weight, state.consumed_level)?;
                    plain_filters[[fh, fw, ic, fs]] = Some(plain);
                }
            }
        }
    }
    let plain_filters = plain_filters.mapv(|p| p.expect("every filter cell was written above"));

    let mut plain_biases = Vec::with_capacity(filter_count);
    for fs in 0..filter_count {
        plain_biases.push(encode_weight_at(fhe, scale_bits, raw_biases[fs] as f64, state.consumed_level + 1)?);
    }

    let op = Conv2DOp::new(
        in_h, in_w, in_c, filter_h, filter_w, filter_count, stride_h, stride_w, padding, plain_filters, plain_biases,
    );
    state.next_layer_in_height = op.shape.out_height;
    state.next_layer_in_width = op.shape.out_width;
    state.next_layer_in_channels = op.out_channels();
    state.consumed_level += 1;

    Ok(OperatorNode::Conv2D { name, op })
}

pub fn build_average_pooling2d(
    fhe: &dyn FheCapability,
    cfg: &LayerConfig,
    state: &mut CompileState,
    options: &CompileOptions,
    scale_bits: u32,
) -> CoreResult<OperatorNode> {
    let name = cfg.name()?.to_string();
    let (pool_h, pool_w) = cfg.pool_size_or_err()?;
    let (stride_h, stride_w) = cfg.strides_or_err()?;
    let padding = cfg.padding_or_err()?;

    let pool_factor = 1.0 / (pool_h * pool_w) as f64;

    // spec.md §4.4's edge case: an AveragePooling2D sitting under
    // `OptActivation` with `should_multiply_coeff` still pending (no
    // trainable layer between the activation and the pool) folds the
    // activation's leading coefficient into the pool's own multiplier
    // instead of deferring it further, then clears the flag.
    let plain_mul_factor = if options.opt_pooling() {
        state.current_pooling_mul_factor = pool_factor;
        state.should_multiply_pool = true;
        None
    } else if options.opt_activation() && state.should_multiply_coeff {
        let value = state.highest_deg_coeff * pool_factor;
        state.should_multiply_coeff = false;
        Some(encode_weight_at(fhe, scale_bits, value, state.consumed_level)?)
    } else {
        Some(encode_weight_at(fhe, scale_bits, pool_factor, state.consumed_level)?)
    };

    let op = AveragePoolingOp::new(
        state.next_layer_in_height,
        state.next_layer_in_width,
        state.next_layer_in_channels,
        pool_h,
        pool_w,
        stride_h,
        stride_w,
        padding,
        plain_mul_factor,
    );
    let consumed_level_bump = if op.plain_mul_factor.is_some() { 1 } else { 0 };
    state.next_layer_in_height = op.shape.out_height;
    state.next_layer_in_width = op.shape.out_width;
    state.next_layer_in_channels = op.out_channels();
    state.consumed_level += consumed_level_bump;

    Ok(OperatorNode::AveragePooling2D { name, op })
}

pub fn build_batch_normalization(
    fhe: &dyn FheCapability,
    cfg: &LayerConfig,
    weights: &WeightsStore,
    state: &mut CompileState,
    scale_bits: u32,
    level_budget: u32,
) -> CoreResult<OperatorNode> {
    let name = cfg.name()?.to_string();
    check_budget(&name, state.consumed_level, 1, level_budget)?;

    let dim = if state.next_layer_in_units != 0 {
        state.next_layer_in_units
    } else {
        state.next_layer_in_channels
    };

    let beta = weights.tensor(&layer_path(&name, BETA_KEY))?;
    let gamma = weights.tensor(&layer_path(&name, GAMMA_KEY))?;
    let moving_mean = weights.tensor(&layer_path(&name, MOVING_MEAN_KEY))?;
    let moving_variance = weights.tensor(&layer_path(&name, MOVING_VARIANCE_KEY))?;

    let mut plain_weights = Vec::with_capacity(dim);
    let mut plain_biases = Vec::with_capacity(dim);
    for i in 0..dim {
        let (weight, bias) = fold_bn_params(gamma[i] as f64, beta[i] as f64, moving_mean[i] as f64, moving_variance[i] as f64);
        plain_weights.push(encode_weight_at(fhe, scale_bits, weight, state.consumed_level)?);
        // Bias travels one further level than the weight, per spec.md §4.3
        // ("with bias pre-mod-switched one further level to match the
        // post-rescale scale").
        plain_biases.push(encode_weight_at(fhe, scale_bits, bias, state.consumed_level + 1)?);
    }

    state.consumed_level += 1;
    Ok(OperatorNode::BatchNormalization {
        name,
        op: BatchNormOp::new(plain_weights, plain_biases),
    })
}

pub fn build_flatten(cfg: &LayerConfig, state: &mut CompileState) -> CoreResult<OperatorNode> {
    let name = cfg.name()?.to_string();
    let op = FlattenOp::new(state.next_layer_in_height, state.next_layer_in_width, state.next_layer_in_channels);
    state.next_layer_in_units = op.out_units();
    Ok(OperatorNode::Flatten { name, op })
}

pub fn build_dense(
    fhe: &dyn FheCapability,
    cfg: &LayerConfig,
    weights: &WeightsStore,
    state: &mut CompileState,
    options: &CompileOptions,
    scale_bits: u32,
    level_budget: u32,
) -> CoreResult<OperatorNode> {
    let name = cfg.name()?.to_string();
    let out_units = cfg.units_or_err()?;
    let in_units = state.next_layer_in_units;

    check_budget(&name, state.consumed_level, 1, level_budget)?;

    let raw_weights = weights.tensor(&layer_path(&name, KERNEL_KEY))?;
    let raw_biases = weights.tensor(&layer_path(&name, BIAS_KEY))?;

    let folding = state.take_folding(options);

    let mut plain_weights = Array2::from_elem((in_units, out_units), None::<Plaintext>);
    for iu in 0..in_units {
        for ou in 0..out_units {
            let weight = round_if_underflowing(folding.value * raw_weights[iu * out_units + ou] as f64);
            plain_weights[[iu, ou]] = Some(encode_weight_at(fhe, scale_bits, weight, state.consumed_level)?);
        }
    }
    let plain_weights = plain_weights.mapv(|p| p.expect("every weight cell was written above"));

    let mut plain_biases = Vec::with_capacity(out_units);
    for ou in 0..out_units {
        plain_biases.push(encode_weight_at(fhe, scale_bits, raw_biases[ou] as f64, state.consumed_level + 1)?);
    }

    let op = DenseOp::new(in_units, out_units, plain_weights, plain_biases);
    state.next_layer_in_units = out_units;
    state.consumed_level += 1;

    Ok(OperatorNode::Dense { name, op })
}

pub fn build_activation(
    fhe: &dyn FheCapability,
    cfg: &LayerConfig,
    state: &mut CompileState,
    options: &CompileOptions,
    relin_key: RelinKey,
    scale_bits: u32,
    level_budget: u32,
) -> CoreResult<OperatorNode> {
    let name = cfg.name()?.to_string();
    let activation_name = cfg
        .activation
        .as_deref()
        .ok_or_else(|| CoreError::InvalidTopology(format!("{name}: missing 'activation'")))?;
    let family = ActivationFamily::parse(activation_name)
        .ok_or_else(|| CoreError::UnsupportedActivation(activation_name.to_string()))?;

    let optimized = options.opt_activation();
    let cost = activation::level_cost(family, optimized);
    check_budget(&name, state.consumed_level, cost, level_budget)?;

    let op = EncodedActivation::build(fhe, family, optimized, state.consumed_level, scale_bits).map_err(fhe_err)?;

    if optimized {
        state.should_multiply_coeff = true;
        state.highest_deg_coeff = activation::highest_degree_coeff(family);
    }
    state.consumed_level += cost;

    Ok(OperatorNode::Activation { name, op, relin_key })
}

pub fn build_global_average_pooling2d(
    fhe: &dyn FheCapability,
    cfg: &LayerConfig,
    state: &mut CompileState,
    options: &CompileOptions,
    scale_bits: u32,
) -> CoreResult<OperatorNode> {
    let name = cfg.name()?.to_string();
    state.next_layer_in_units = state.next_layer_in_channels;
    let pool_factor = 1.0 / (state.next_layer_in_height * state.next_layer_in_width) as f64;

    // spec.md §9's "known anomaly": the original always takes the folding
    // path for GlobalAveragePooling2D regardless of `enable_optimize_pooling()`.
    // `CompileOptions::gap_always_folds` makes that choice an explicit,
    // documented flag instead of silently reproducing the override.
    let plain_mul_factor = if options.gap_always_folds || options.opt_pooling() {
        if state.should_multiply_pool {
            state.current_pooling_mul_factor *= pool_factor;
        } else {
            state.current_pooling_mul_factor = pool_factor;
        }
        state.should_multiply_pool = true;
        None
    } else {
        Some(encode_weight_at(fhe, scale_bits, pool_factor, state.consumed_level)?)
    };

    let consumed_level_bump = if plain_mul_factor.is_some() { 1 } else { 0 };
    let op = GlobalAveragePoolingOp::new(
        state.next_layer_in_height,
        state.next_layer_in_width,
        state.next_layer_in_channels,
        plain_mul_factor,
    );
    state.consumed_level += consumed_level_bump;

    Ok(OperatorNode::GlobalAveragePooling2D { name, op })
}

#[allow(clippy::too_many_arguments)]
pub fn build_conv2d_fused_bn(
    fhe: &dyn FheCapability,
    conv_cfg: &LayerConfig,
    bn_cfg: &LayerConfig,
    weights: &WeightsStore,
    state: &mut CompileState,
    options: &CompileOptions,
    scale_bits: u32,
    level_budget: u32,
) -> CoreResult<OperatorNode> {
    let conv_name = conv_cfg.name()?.to_string();
    let bn_name = bn_cfg.name()?.to_string();
    let fused_name = format!("{conv_name}-fused-with-{bn_name}");

    let (in_h, in_w, in_c) = conv_cfg
        .batch_input_shape()
        .unwrap_or((state.next_layer_in_height, state.next_layer_in_width, state.next_layer_in_channels));
    let filter_count = conv_cfg.filters_or_err()?;
    let (filter_h, filter_w) = conv_cfg.kernel_size_or_err()?;
    let (stride_h, stride_w) = conv_cfg.strides_or_err()?;
    let padding = conv_cfg.padding_or_err()?;

    check_budget(&fused_name, state.consumed_level, 1, level_budget)?;

    let raw_filters = weights.tensor(&layer_path(&conv_name, KERNEL_KEY))?;
    let raw_biases = weights.tensor(&layer_path(&conv_name, BIAS_KEY))?;
    let beta = weights.tensor(&layer_path(&bn_name, BETA_KEY))?;
    let gamma = weights.tensor(&layer_path(&bn_name, GAMMA_KEY))?;
    let moving_mean = weights.tensor(&layer_path(&bn_name, MOVING_MEAN_KEY))?;
    let moving_variance = weights.tensor(&layer_path(&bn_name, MOVING_VARIANCE_KEY))?;

    let mut weights_bn = vec![0.0f64; filter_count];
    let mut plain_biases = Vec::with_capacity(filter_count);
    for fs in 0..filter_count {
        let (w_bn, b_bn) = fold_bn_params(gamma[fs] as f64, beta[fs] as f64, moving_mean[fs] as f64, moving_variance[fs] as f64);
        weights_bn[fs] = w_bn;
        let bias = raw_biases[fs] as f64 * w_bn + b_bn;
        plain_biases.push(encode_weight_at(fhe, scale_bits, bias, state.consumed_level + 1)?);
    }

    let folding = state.take_folding(options);

    let mut plain_filters = Array4::from_elem((filter_h, filter_w, in_c, filter_count), None::<Plaintext>);
    for fh in 0..filter_h {
        for fw in 0..filter_w {
            for ic in 0..in_c {
                for fs in 0..filter_count {
                    let idx = ((fh * filter_w + fw) * in_c + ic) * filter_count + fs;
                    let weight = round_if_underflowing(folding.value * raw_filters[idx] as f64 * weights_bn[fs]);
                    plain_filters[[fh, fw, ic, fs]] = Some(encode_weight_at(fhe, scale_bits, weight, state.consumed_level)?);
                }
            }
        }
    }
    let plain_filters = plain_filters.mapv(|p| p.expect("every filter cell was written above"));

    let op = Conv2DOp::new(
        in_h, in_w, in_c, filter_h, filter_w, filter_count, stride_h, stride_w, padding, plain_filters, plain_biases,
    );
    state.next_layer_in_height = op.shape.out_height;
    state.next_layer_in_width = op.shape.out_width;
    state.next_layer_in_channels = op.out_channels();
    state.consumed_level += 1;

    Ok(OperatorNode::ConvFusedBN { name: fused_name, op })
}

#[allow(clippy::too_many_arguments)]
pub fn build_dense_fused_bn(
    fhe: &dyn FheCapability,
    dense_cfg: &LayerConfig,
    bn_cfg: &LayerConfig,
    weights: &WeightsStore,
    state: &mut CompileState,
    options: &CompileOptions,
    scale_bits: u32,
    level_budget: u32,
) -> CoreResult<OperatorNode> {
    let dense_name = dense_cfg.name()?.to_string();
    let bn_name = bn_cfg.name()?.to_string();
    let fused_name = format!("{dense_name}-fused-with-{bn_name}");
    let out_units = dense_cfg.units_or_err()?;
    let in_units = state.next_layer_in_units;

    check_budget(&fused_name, state.consumed_level, 1, level_budget)?;

    let raw_weights = weights.tensor(&layer_path(&dense_name, KERNEL_KEY))?;
    let raw_biases = weights.tensor(&layer_path(&dense_name, BIAS_KEY))?;
    let beta = weights.tensor(&layer_path(&bn_name, BETA_KEY))?;
    let gamma = weights.tensor(&layer_path(&bn_name, GAMMA_KEY))?;
    let moving_mean = weights.tensor(&layer_path(&bn_name, MOVING_MEAN_KEY))?;
    let moving_variance = weights.tensor(&layer_path(&bn_name, MOVING_VARIANCE_KEY))?;

    let mut weights_bn = vec![0.0f64; out_units];
    let mut plain_biases = Vec::with_capacity(out_units);
    for ou in 0..out_units {
        let (w_bn, b_bn) = fold_bn_params(gamma[ou] as f64, beta[ou] as f64, moving_mean[ou] as f64, moving_variance[ou] as f64);
        weights_bn[ou] = w_bn;
        let bias = raw_biases[ou] as f64 * w_bn + b_bn;
        plain_biases.push(encode_weight_at(fhe, scale_bits, bias, state.consumed_level + 1)?);
    }

    let folding = state.take_folding(options);

    let mut plain_weights = Array2::from_elem((in_units, out_units), None::<Plaintext>);
    for iu in 0..in_units {
        for ou in 0..out_units {
            let weight = round_if_underflowing(folding.value * raw_weights[iu * out_units + ou] as f64 * weights_bn[ou]);
            plain_weights[[iu, ou]] = Some(encode_weight_at(fhe, scale_bits, weight, state.consumed_level)?);
        }
    }
    let plain_weights = plain_weights.mapv(|p| p.expect("every weight cell was written above"));

    let op = DenseOp::new(in_units, out_units, plain_weights, plain_biases);
    state.next_layer_in_units = out_units;
    state.consumed_level += 1;

    Ok(OperatorNode::DenseFusedBN { name: fused_name, op })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_if_underflowing_picks_positive_sign_for_exact_zero() {
        assert_eq!(round_if_underflowing(0.0), EPSILON);
    }

    #[test]
    fn round_if_underflowing_preserves_sign_of_tiny_negative() {
        assert_eq!(round_if_underflowing(-1e-10), -EPSILON);
    }

    #[test]
    fn round_if_underflowing_leaves_normal_values_alone() {
        assert_eq!(round_if_underflowing(0.25), 0.25);
    }
}
