// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::error::FheResult;
use crate::types::{Ciphertext, Plaintext, PublicKey, RelinKey, SecretKey};

/// Abstract contract for the underlying ciphertext arithmetic, per
/// spec.md §4.1. Every crate above `hecnn-fhe` (layers, compiler, executor)
/// depends only on this trait; swapping the concrete scheme backend
/// requires no change above this line.
pub trait FheCapability: Send + Sync {
    fn encode_value(&self, value: f64, scale_bits: u32, level: u32) -> FheResult<Plaintext>;
    fn encode_vector(&self, values: &[f64], scale_bits: u32, level: u32) -> FheResult<Plaintext>;

    fn encrypt(&self, plaintext: &Plaintext, public_key: &PublicKey) -> FheResult<Ciphertext>;
    /// Client-only: decrypting requires the secret key.
    fn decrypt(&self, ciphertext: &Ciphertext, secret_key: &SecretKey) -> FheResult<Plaintext>;
    /// Client-only.
    fn decode(&self, plaintext: &Plaintext) -> FheResult<Vec<f64>>;

    fn mod_switch_ciphertext_to_next(&self, ciphertext: &Ciphertext) -> FheResult<Ciphertext>;
    fn mod_switch_plaintext_to_next(&self, plaintext: &Plaintext) -> FheResult<Plaintext>;

    fn add(&self, a: &Ciphertext, b: &Ciphertext) -> FheResult<Ciphertext>;
    fn add_plain(&self, a: &Ciphertext, b: &Plaintext) -> FheResult<Ciphertext>;
    fn multiply_plain(&self, a: &Ciphertext, b: &Plaintext) -> FheResult<Ciphertext>;
    fn square(&self, a: &Ciphertext) -> FheResult<Ciphertext>;
    fn relinearize(&self, a: &Ciphertext, relin_key: &RelinKey) -> FheResult<Ciphertext>;
    /// Normalizes scale after a multiply; consumes one level. Callers are
    /// expected to re-assign the canonical `scale_bits` afterward via
    /// `reassign_scale` to restore the matching-scale invariant.
    fn rescale_to_next(&self, a: &Ciphertext) -> FheResult<Ciphertext>;
    /// Re-tags a ciphertext's nominal scale after rescale, per spec.md
    /// §4.1's scale discipline. Does not touch the underlying ring element.
    fn reassign_scale(&self, a: &mut Ciphertext, scale_bits: u32);

    fn slot_count(&self) -> u64;
}
