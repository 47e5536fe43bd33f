// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use sealy::{CkksEvaluator, Decryptor, Encryptor, Evaluator};

use crate::capability::FheCapability;
use crate::context::SchemeContext;
use crate::error::{FheError, FheResult};
use crate::types::{Ciphertext, Plaintext, PublicKey, RelinKey, SecretKey};

/// Concrete `FheCapability` backed by Microsoft SEAL's CKKS scheme via the
/// `sealy` crate. One instance is built per registered `EncryptionParameters`
/// shape and shared (read-only) across worker threads.
pub struct SealCkksEngine {
    ctx: SchemeContext,
    evaluator: CkksEvaluator,
}

impl SealCkksEngine {
    pub fn new(ctx: SchemeContext) -> FheResult<Self> {
        let evaluator =
            CkksEvaluator::new(&ctx.context).map_err(|e| FheError::Backend(format!("evaluator: {e}")))?;
        Ok(Self { ctx, evaluator })
    }

    fn scale_for(&self, scale_bits: u32) -> f64 {
        2f64.powi(scale_bits as i32)
    }
}

impl FheCapability for SealCkksEngine {
    fn encode_value(&self, value: f64, scale_bits: u32, level: u32) -> FheResult<Plaintext> {
        let scale = self.scale_for(scale_bits);
        let inner = self
            .ctx
            .encoder
            .encode_f64(&[value], scale)
            .map_err(|e| FheError::Backend(format!("encode_value: {e}")))?;
        Ok(Plaintext { inner, level, scale_bits })
    }

    fn encode_vector(&self, values: &[f64], scale_bits: u32, level: u32) -> FheResult<Plaintext> {
        let scale = self.scale_for(scale_bits);
        let inner = self
            .ctx
            .encoder
            .encode_f64(values, scale)
            .map_err(|e| FheError::Backend(format!("encode_vector: {e}")))?;
        Ok(Plaintext { inner, level, scale_bits })
    }

    fn encrypt(&self, plaintext: &Plaintext, public_key: &PublicKey) -> FheResult<Ciphertext> {
        let encryptor = Encryptor::new(&self.ctx.context, &public_key.inner)
            .map_err(|e| FheError::Backend(format!("encryptor: {e}")))?;
        let inner = encryptor
            .encrypt(&plaintext.inner)
            .map_err(|e| FheError::Backend(format!("encrypt: {e}")))?;
        Ok(Ciphertext {
            inner,
            level: plaintext.level,
            scale_bits: plaintext.scale_bits,
        })
    }

    fn decrypt(&self, ciphertext: &Ciphertext, secret_key: &SecretKey) -> FheResult<Plaintext> {
        let decryptor = Decryptor::new(&self.ctx.context, &secret_key.inner)
            .map_err(|e| FheError::Backend(format!("decryptor: {e}")))?;
        let inner = decryptor
            .decrypt(&ciphertext.inner)
            .map_err(|e| FheError::Backend(format!("decrypt: {e}")))?;
        Ok(Plaintext {
            inner,
            level: ciphertext.level,
            scale_bits: ciphertext.scale_bits,
        })
    }

    fn decode(&self, plaintext: &Plaintext) -> FheResult<Vec<f64>> {
        self.ctx
            .encoder
            .decode_f64(&plaintext.inner)
            .map_err(|e| FheError::Backend(format!("decode: {e}")))
    }

    fn mod_switch_ciphertext_to_next(&self, ciphertext: &Ciphertext) -> FheResult<Ciphertext> {
        if ciphertext.level == 0 {
            return Err(FheError::LevelExhausted { level: 0 });
        }
        let inner = self
            .evaluator
            .mod_switch_to_next(&ciphertext.inner)
            .map_err(|e| FheError::Backend(format!("mod_switch_to_next (ct): {e}")))?;
        Ok(Ciphertext {
            inner,
            level: ciphertext.level - 1,
            scale_bits: ciphertext.scale_bits,
        })
    }

    fn mod_switch_plaintext_to_next(&self, plaintext: &Plaintext) -> FheResult<Plaintext> {
        if plaintext.level == 0 {
            return Err(FheError::LevelExhausted { level: 0 });
        }
        let inner = self
            .evaluator
            .mod_switch_to_next_plain(&plaintext.inner)
            .map_err(|e| FheError::Backend(format!("mod_switch_to_next (pt): {e}")))?;
        Ok(Plaintext {
            inner,
            level: plaintext.level - 1,
            scale_bits: plaintext.scale_bits,
        })
    }

    fn add(&self, a: &Ciphertext, b: &Ciphertext) -> FheResult<Ciphertext> {
        if a.level != b.level {
            return Err(FheError::SchemeMismatch(format!(
                "add at mismatched levels {} vs {}",
                a.level, b.level
            )));
        }
        let inner = self
            .evaluator
            .add(&a.inner, &b.inner)
            .map_err(|e| FheError::Backend(format!("add: {e}")))?;
        Ok(Ciphertext {
            inner,
            level: a.level,
            scale_bits: a.scale_bits,
        })
    }

    fn add_plain(&self, a: &Ciphertext, b: &Plaintext) -> FheResult<Ciphertext> {
        if a.level != b.level {
            return Err(FheError::SchemeMismatch(format!(
                "add_plain at mismatched levels {} vs {}",
                a.level, b.level
            )));
        }
        let inner = self
            .evaluator
            .add_plain(&a.inner, &b.inner)
            .map_err(|e| FheError::Backend(format!("add_plain: {e}")))?;
        Ok(Ciphertext {
            inner,
            level: a.level,
            scale_bits: a.scale_bits,
        })
    }

    fn multiply_plain(&self, a: &Ciphertext, b: &Plaintext) -> FheResult<Ciphertext> {
        if a.level != b.level {
            return Err(FheError::SchemeMismatch(format!(
                "multiply_plain at mismatched levels {} vs {}",
                a.level, b.level
            )));
        }
        let inner = self
            .evaluator
            .multiply_plain(&a.inner, &b.inner)
            .map_err(|e| FheError::Backend(format!("multiply_plain: {e}")))?;
        Ok(Ciphertext {
            inner,
            level: a.level,
            scale_bits: a.scale_bits.saturating_mul(2),
        })
    }

    fn square(&self, a: &Ciphertext) -> FheResult<Ciphertext> {
        let inner = self
            .evaluator
            .square(&a.inner)
            .map_err(|e| FheError::Backend(format!("square: {e}")))?;
        Ok(Ciphertext {
            inner,
            level: a.level,
            scale_bits: a.scale_bits.saturating_mul(2),
        })
    }

    fn relinearize(&self, a: &Ciphertext, relin_key: &RelinKey) -> FheResult<Ciphertext> {
        let inner = self
            .evaluator
            .relinearize(&a.inner, &relin_key.inner)
            .map_err(|e| FheError::Backend(format!("relinearize: {e}")))?;
        Ok(Ciphertext {
            inner,
            level: a.level,
            scale_bits: a.scale_bits,
        })
    }

    fn rescale_to_next(&self, a: &Ciphertext) -> FheResult<Ciphertext> {
        if a.level == 0 {
            return Err(FheError::LevelExhausted { level: 0 });
        }
        let inner = self
            .evaluator
            .rescale_to_next(&a.inner)
            .map_err(|e| FheError::Backend(format!("rescale_to_next: {e}")))?;
        Ok(Ciphertext {
            inner,
            level: a.level - 1,
            scale_bits: a.scale_bits,
        })
    }

    fn reassign_scale(&self, a: &mut Ciphertext, scale_bits: u32) {
        a.scale_bits = scale_bits;
    }

    fn slot_count(&self) -> u64 {
        self.ctx.params.slot_count()
    }
}
