// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use serde::{Deserialize, Serialize};

/// Coefficient-modulus chain shape: head and tail primes are wide
/// (precision for the first encode and the last decode), interior primes are
/// narrow and each one backs a single multiplicative level.
pub const HEAD_TAIL_PRIME_BITS: u32 = 50;
pub const INTERIOR_PRIME_BITS: u32 = 30;

/// Weight-rounding epsilon for the `(50, 30)` modulus profile this system
/// ships. Kept as a named constant rather than folded into `EncryptionParameters`
/// because the profile is fixed platform-wide, not per key-id.
pub const WEIGHT_ROUND_EPSILON: f64 = 1e-7;

/// Client-supplied, server-stored description of a CKKS-style scheme
/// instance. Owned by a `KeyBundle`; cheap to clone, typically shared via
/// `Arc` once registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncryptionParameters {
    /// Ring degree; must be a power of two. Slot count is `degree / 2`.
    pub degree: u64,
    /// Ordered coefficient-modulus chain, head to tail, bit sizes only —
    /// the actual primes are generated by the FHE backend from this shape.
    pub modulus_chain_bits: Vec<u32>,
    /// Nominal scale, as a bit count (`scale = 2^scale_bits`), reasserted on
    /// every ciphertext after a rescale to keep the scale-matching invariant.
    pub scale_bits: u32,
}

impl EncryptionParameters {
    /// Number of interior (level-bearing) primes, i.e. the multiplicative
    /// level budget available to a compiled plan under this parameter set.
    pub fn level_budget(&self) -> u32 {
        self.modulus_chain_bits.len().saturating_sub(2) as u32
    }

    pub fn slot_count(&self) -> u64 {
        self.degree / 2
    }

    /// Builds the standard `[50, 30, 30, ..., 30, 50]` chain for a given
    /// level count, matching this system's fixed modulus-chain profile.
    pub fn standard_profile(degree: u64, level: u32) -> Self {
        let mut chain = Vec::with_capacity(level as usize + 2);
        chain.push(HEAD_TAIL_PRIME_BITS);
        chain.extend(std::iter::repeat(INTERIOR_PRIME_BITS).take(level as usize));
        chain.push(HEAD_TAIL_PRIME_BITS);
        Self {
            degree,
            modulus_chain_bits: chain,
            scale_bits: INTERIOR_PRIME_BITS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_budget_is_interior_prime_count() {
        let params = EncryptionParameters::standard_profile(16384, 4);
        assert_eq!(params.modulus_chain_bits, vec![50, 30, 30, 30, 30, 50]);
        assert_eq!(params.level_budget(), 4);
    }

    #[test]
    fn slot_count_is_half_degree() {
        let params = EncryptionParameters::standard_profile(8192, 2);
        assert_eq!(params.slot_count(), 4096);
    }
}
