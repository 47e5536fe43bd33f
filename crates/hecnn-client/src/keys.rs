// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Client-side key material: wraps `hecnn_fhe::generate_keys` and bundles
//! the secret key, the wire-ready `KeyBundle`, and a scheme context/engine
//! for encrypting queries and decrypting results, grounded in
//! `examples/original_source/ppcnn/ppcnn_client/ppcnn_client.cpp`'s
//! `Client::keygen`.

use hecnn_fhe::{codec, FheCapability, FheResult, SchemeContext, SealCkksEngine};
use hecnn_model::{EncryptionParameters, KeyBundle};

/// Everything one key-id needs on the client: the secret key (zeroized on
/// drop via `hecnn_fhe::types::SecretKey`), the registerable `KeyBundle`,
/// and a ready-to-use engine/context pair for this key's parameter shape.
pub struct ClientKeys {
    pub key_id: i64,
    pub bundle: KeyBundle,
    engine: SealCkksEngine,
    secret_key: hecnn_fhe::SecretKey,
}

impl ClientKeys {
    pub fn generate(key_id: i64, params: EncryptionParameters) -> FheResult<Self> {
        let ctx = SchemeContext::new(&params)?;
        let generated = hecnn_fhe::generate_keys(&ctx)?;

        let public_key_bytes = codec::public_key_to_bytes(&generated.public_key)?;
        let relin_key_bytes = codec::relin_key_to_bytes(&generated.relin_key)?;
        let bundle = KeyBundle::new(key_id, params, public_key_bytes, relin_key_bytes);

        let engine = SealCkksEngine::new(ctx)?;

        Ok(Self {
            key_id,
            bundle,
            engine,
            secret_key: generated.secret_key,
        })
    }

    /// Encrypts one real value per input pixel/channel, packed independently
    /// (no SIMD batching across images) at the scheme's nominal scale and
    /// full starting level — the shape `hecnn_executor::input_tensor` expects.
    pub fn encrypt_inputs(&self, values: &[f64]) -> FheResult<Vec<Vec<u8>>> {
        let public_key = self.decode_public_key()?;
        let level = self.bundle.params.level_budget();
        let scale_bits = self.bundle.params.scale_bits;

        values
            .iter()
            .map(|&v| {
                let plaintext = self.engine.encode_value(v, scale_bits, level)?;
                let ciphertext = self.engine.encrypt(&plaintext, &public_key)?;
                codec::ciphertext_to_bytes(&ciphertext)
            })
            .collect()
    }

    /// Decrypts a server result's output ciphertexts back to real scores.
    pub fn decrypt_outputs(&self, output_ciphertexts: &[Vec<u8>]) -> FheResult<Vec<f64>> {
        let ctx = SchemeContext::new(&self.bundle.params)?;
        output_ciphertexts
            .iter()
            .map(|blob| {
                let ciphertext = codec::ciphertext_from_bytes(&ctx, blob)?;
                let plaintext = self.engine.decrypt(&ciphertext, &self.secret_key)?;
                let decoded = self.engine.decode(&plaintext)?;
                Ok(decoded.into_iter().next().unwrap_or(0.0))
            })
            .collect()
    }

    fn decode_public_key(&self) -> FheResult<hecnn_fhe::PublicKey> {
        let ctx = SchemeContext::new(&self.bundle.params)?;
        codec::public_key_from_bytes(&ctx, &self.bundle.public_key)
    }
}
