// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Polynomial activation families, per spec.md §4.3's "Activation" operator.
//! Coefficients are the least-squares degree-4 fits shipped by the original
//! implementation (`examples/original_source/.../cnn_utils/define.h`); this
//! system additionally carries the Mish family alongside Swish, per
//! SPEC_FULL.md §4.3's supplement.

use hecnn_fhe::{Ciphertext, FheCapability, FheResult};
use hecnn_model::ActivationFamily;

/// `ax^4 + bx^2 + cx + d` naive-form coefficients, in `[a, b, c, d]` order.
fn naive_coeffs(family: ActivationFamily) -> Option<[f64; 4]> {
    match family {
        ActivationFamily::Square => None,
        ActivationFamily::SwishRg4Deg4 => Some([-0.005075, 0.19566, 0.5, 0.03347]),
        ActivationFamily::SwishRg6Deg4 => Some([-0.002012, 0.1473, 0.5, 0.1198]),
        ActivationFamily::MishRg4Deg4 => Some([-0.00609, 0.21051, 0.565775, 0.06021]),
        ActivationFamily::MishRg6Deg4 => Some([-0.002096, 0.148529, 0.53663, 0.169]),
    }
}

/// Monic-form coefficients `x^4 + b'x^2 + c'x + d'` used under `OptActivation`,
/// in `[b', c', d']` order. The leading coefficient `a` is folded into the
/// next trainable layer's weights (see `hecnn-compiler`'s folding logic) and
/// is returned separately by [`highest_degree_coeff`].
fn opt_coeffs(family: ActivationFamily) -> Option<[f64; 3]> {
    match family {
        ActivationFamily::Square => None,
        ActivationFamily::SwishRg4Deg4 => Some([-38.5537, -98.52222, -6.59507]),
        ActivationFamily::SwishRg6Deg4 => Some([-73.2107, -248.5089, -59.5427]),
        ActivationFamily::MishRg4Deg4 => Some([-34.5665, -92.9023, -9.8867]),
        ActivationFamily::MishRg6Deg4 => Some([-70.86307, -256.02576, -80.62977]),
    }
}

/// The degree-4 coefficient `a` that `OptActivation` folds into the next
/// trainable layer's weights, per spec.md §4.2's `highest_deg_coeff`.
pub fn highest_degree_coeff(family: ActivationFamily) -> f64 {
    naive_coeffs(family).map(|c| c[0]).unwrap_or(1.0)
}

/// Multiplicative levels an Activation consumes, per spec.md §4.3/§8.
pub fn level_cost(family: ActivationFamily, optimized: bool) -> u32 {
    match family {
        ActivationFamily::Square => 1,
        _ => {
            if optimized {
                2
            } else {
                3
            }
        }
    }
}

/// Pre-encoded polynomial coefficients for one Activation node, each
/// mod-switched to the level it is consumed at during `activate`.
pub struct EncodedActivation {
    family: ActivationFamily,
    optimized: bool,
    /// Naive form: `[a, b, c, d]` at levels `[l+2, l+2, l+2, l+2]` before the
    /// final mod-switch on the last coefficient (see ctor). Optimized form:
    /// `[b', c', d']` at the same pattern with one fewer mod-switch.
    coeffs: Vec<hecnn_fhe::Plaintext>,
}

impl EncodedActivation {
    /// Builds the encoded coefficients for `family` at the plan's current
    /// `consumed_level`, matching `Activation::Activation` in the original:
    /// naive coefficients are mod-switched down `consumed_level + 2` times
    /// (the constant term one further, to match the post-rescale level),
    /// optimized coefficients `consumed_level + 1` times.
    pub fn build(
        fhe: &dyn FheCapability,
        family: ActivationFamily,
        optimized: bool,
        consumed_level: u32,
        scale_bits: u32,
    ) -> FheResult<Self> {
        let raw: Vec<f64> = if optimized {
            opt_coeffs(family)
                .map(|c| c.to_vec())
                .unwrap_or_default()
        } else {
            naive_coeffs(family).map(|c| c.to_vec()).unwrap_or_default()
        };

        let switches_per_coeff = if optimized {
            consumed_level + 1
        } else {
            consumed_level + 2
        };

        let mut coeffs = Vec::with_capacity(raw.len());
        for &value in &raw {
            let mut plain = fhe.encode_value(value, scale_bits, 0)?;
            for _ in 0..switches_per_coeff {
                plain = fhe.mod_switch_plaintext_to_next(&plain)?;
            }
            coeffs.push(plain);
        }
        // The constant term travels one level lower, added after the
        // running sum's own rescale.
        if let Some(last) = coeffs.pop() {
            coeffs.push(fhe.mod_switch_plaintext_to_next(&last)?);
        }

        Ok(Self {
            family,
            optimized,
            coeffs,
        })
    }

    /// Applies the activation to one ciphertext slot, matching
    /// `Activation::activate` / `square` / `swishDeg4` / `swishDeg4Opt` in
    /// the original (Mish follows the identical squaring shape; only the
    /// coefficient table differs).
    pub fn activate(
        &self,
        fhe: &dyn FheCapability,
        relin_key: &hecnn_fhe::RelinKey,
        x: &Ciphertext,
        scale_bits: u32,
    ) -> FheResult<Ciphertext> {
        match self.family {
            ActivationFamily::Square => {
                let y = fhe.square(x)?;
                let y = fhe.relinearize(&y, relin_key)?;
                fhe.rescale_to_next(&y)
            }
            _ if self.optimized => self.activate_opt(fhe, relin_key, x, scale_bits),
            _ => self.activate_naive(fhe, relin_key, x, scale_bits),
        }
    }

    fn activate_naive(
        &self,
        fhe: &dyn FheCapability,
        relin_key: &hecnn_fhe::RelinKey,
        x: &Ciphertext,
        scale_bits: u32,
    ) -> FheResult<Ciphertext> {
        let x2 = fhe.square(x)?;
        let x2 = fhe.relinearize(&x2, relin_key)?;
        let x2 = fhe.rescale_to_next(&x2)?;

        let x4 = fhe.square(&x2)?;
        let x4 = fhe.relinearize(&x4, relin_key)?;
        let mut x4 = fhe.rescale_to_next(&x4)?;

        let x2 = fhe.mod_switch_ciphertext_to_next(&x2)?;
        let x = fhe.mod_switch_ciphertext_to_next(x)?;
        let x = fhe.mod_switch_ciphertext_to_next(&x)?;

        let ax4 = fhe.multiply_plain(&x4, &self.coeffs[0])?;
        let bx2 = fhe.multiply_plain(&x2, &self.coeffs[1])?;
        let cx = fhe.multiply_plain(&x, &self.coeffs[2])?;

        let mut ax4 = ax4;
        let mut bx2 = bx2;
        let mut cx = cx;
        fhe.reassign_scale(&mut ax4, scale_bits);
        fhe.reassign_scale(&mut bx2, scale_bits);
        fhe.reassign_scale(&mut cx, scale_bits);
        fhe.reassign_scale(&mut x4, scale_bits);

        let y = fhe.add(&ax4, &bx2)?;
        let y = fhe.add(&y, &cx)?;
        let mut y = fhe.rescale_to_next(&y)?;
        fhe.reassign_scale(&mut y, scale_bits);
        fhe.add_plain(&y, &self.coeffs[3])
    }

    fn activate_opt(
        &self,
        fhe: &dyn FheCapability,
        relin_key: &hecnn_fhe::RelinKey,
        x: &Ciphertext,
        scale_bits: u32,
    ) -> FheResult<Ciphertext> {
        let x2 = fhe.square(x)?;
        let x2 = fhe.relinearize(&x2, relin_key)?;
        let x2 = fhe.rescale_to_next(&x2)?;

        let x4 = fhe.square(&x2)?;
        let mut x4 = fhe.relinearize(&x4, relin_key)?;

        let x = fhe.mod_switch_ciphertext_to_next(x)?;

        let bx2 = fhe.multiply_plain(&x2, &self.coeffs[0])?;
        let cx = fhe.multiply_plain(&x, &self.coeffs[1])?;

        let mut bx2 = bx2;
        let mut cx = cx;
        fhe.reassign_scale(&mut x4, scale_bits);
        fhe.reassign_scale(&mut bx2, scale_bits);
        fhe.reassign_scale(&mut cx, scale_bits);

        let y = fhe.add(&x4, &bx2)?;
        let y = fhe.add(&y, &cx)?;
        let mut y = fhe.rescale_to_next(&y)?;
        fhe.reassign_scale(&mut y, scale_bits);
        fhe.add_plain(&y, &self.coeffs[2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_cost_matches_spec_table() {
        assert_eq!(level_cost(ActivationFamily::Square, false), 1);
        assert_eq!(level_cost(ActivationFamily::SwishRg4Deg4, false), 3);
        assert_eq!(level_cost(ActivationFamily::SwishRg4Deg4, true), 2);
        assert_eq!(level_cost(ActivationFamily::MishRg6Deg4, true), 2);
    }

    #[test]
    fn highest_degree_coeff_is_the_naive_leading_term() {
        assert_eq!(highest_degree_coeff(ActivationFamily::SwishRg4Deg4), -0.005075);
        assert_eq!(highest_degree_coeff(ActivationFamily::Square), 1.0);
    }
}
