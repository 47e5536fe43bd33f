// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! `CompileState`: the pure-reducer replacement for the original's mutable
//! compiler globals (`gConsumedLevel`, `gShouldMultiplyCoeff`,
//! `gShouldMultiplyPool`, `gCurrentPoolingMulFactor`, `gHighestDegCoeff`),
//! per spec.md §9's "Level-budget tracking as a compiler pass" design note
//! and spec.md §4.2's Plan & Option Model. Each operator-builder in
//! `hecnn-compiler::builders` consumes a `CompileState` and returns the
//! updated one; nothing here is mutated through a shared reference.

use hecnn_model::OptLevel;

/// Compile-time optimization switches, threaded alongside `CompileState`.
/// `gap_always_folds` documents spec.md §9's "known anomaly": the original
/// always takes GlobalAveragePooling2D's folding path regardless of
/// `enable_optimize_pooling()`. Default `true` to match observed behavior.
#[derive(Debug, Clone, Copy)]
pub struct CompileOptions {
    pub opt_level: OptLevel,
    pub gap_always_folds: bool,
}

impl CompileOptions {
    pub fn new(opt_level: OptLevel) -> Self {
        Self {
            opt_level,
            gap_always_folds: true,
        }
    }

    pub fn fuse_conv_bn(&self) -> bool {
        self.opt_level.fuse_conv_bn()
    }

    pub fn opt_activation(&self) -> bool {
        self.opt_level.opt_activation()
    }

    pub fn opt_pooling(&self) -> bool {
        self.opt_level.opt_pooling()
    }
}

/// The running shape and folding state threaded through the builder
/// functions, per spec.md §4.2/§4.4.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompileState {
    pub consumed_level: u32,
    pub should_multiply_coeff: bool,
    pub should_multiply_pool: bool,
    pub current_pooling_mul_factor: f64,
    pub highest_deg_coeff: f64,
    pub next_layer_in_height: usize,
    pub next_layer_in_width: usize,
    pub next_layer_in_channels: usize,
    pub next_layer_in_units: usize,
}

/// The `folding_value` a trainable layer should multiply its weights by,
/// and the cleared state after consuming it — per spec.md §4.4 step 3's
/// "compute a `folding_value`... clear the flags that contributed".
pub struct Folding {
    pub value: f64,
}

impl CompileState {
    /// Resolves and clears the folding flags this state currently carries,
    /// matching the `if/else if` cascade repeated in `buildConv2D`,
    /// `buildDense`, `buildConv2DFusedBN`, `buildDenseFusedBN` in the
    /// original: both coefficient and pool factor combine multiplicatively
    /// when both are pending; either alone contributes its own factor;
    /// neither pending yields a folding value of `1.0`.
    pub fn take_folding(&mut self, options: &CompileOptions) -> Folding {
        let coeff_pending = options.opt_activation() && self.should_multiply_coeff;
        let pool_pending = options.opt_pooling() && self.should_multiply_pool;

        let value = match (coeff_pending, pool_pending) {
            (true, true) => self.highest_deg_coeff * self.current_pooling_mul_factor,
            (true, false) => self.highest_deg_coeff,
            (false, true) => self.current_pooling_mul_factor,
            (false, false) => 1.0,
        };
        if coeff_pending {
            self.should_multiply_coeff = false;
        }
        if pool_pending {
            self.should_multiply_pool = false;
        }
        Folding { value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folding_combines_both_pending_factors() {
        let options = CompileOptions::new(OptLevel::All);
        let mut state = CompileState {
            should_multiply_coeff: true,
            should_multiply_pool: true,
            highest_deg_coeff: 2.0,
            current_pooling_mul_factor: 0.25,
            ..Default::default()
        };
        let folding = state.take_folding(&options);
        assert_eq!(folding.value, 0.5);
        assert!(!state.should_multiply_coeff);
        assert!(!state.should_multiply_pool);
    }

    #[test]
    fn folding_is_identity_when_nothing_pending() {
        let options = CompileOptions::new(OptLevel::None);
        let mut state = CompileState::default();
        assert_eq!(state.take_folding(&options).value, 1.0);
    }
}
