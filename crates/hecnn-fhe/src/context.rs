// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use hecnn_model::EncryptionParameters;
use sealy::{CkksEncoder, CoefficientModulus, Context, EncryptionParametersBuilder, SchemeType, SecurityLevel};

use crate::error::{FheError, FheResult};

/// Owns the SEAL context and CKKS encoder for one registered `EncryptionParameters`
/// shape. Cheap to share via `Arc`: SEAL's own context object is itself
/// reference-counted internally, mirroring the teacher's `Arc<BfvParameters>`
/// convention in `crates/fhe/src/fhe.rs`.
pub struct SchemeContext {
    pub(crate) context: Context,
    pub(crate) encoder: CkksEncoder,
    pub params: EncryptionParameters,
}

impl SchemeContext {
    pub fn new(params: &EncryptionParameters) -> FheResult<Self> {
        let bit_sizes: Vec<i32> = params.modulus_chain_bits.iter().map(|&b| b as i32).collect();
        let coeff_modulus = CoefficientModulus::create(params.degree, &bit_sizes)
            .map_err(|e| FheError::Backend(format!("coefficient modulus: {e}")))?;

        let encryption_parameters = EncryptionParametersBuilder::new()
            .set_scheme(SchemeType::Ckks)
            .set_poly_modulus_degree(params.degree)
            .set_coefficient_modulus(coeff_modulus)
            .build()
            .map_err(|e| FheError::Backend(format!("encryption parameters: {e}")))?;

        let context = Context::new(&encryption_parameters, true, SecurityLevel::TC128)
            .map_err(|e| FheError::Backend(format!("context: {e}")))?;

        let encoder = CkksEncoder::new(&context).map_err(|e| FheError::Backend(format!("encoder: {e}")))?;

        Ok(Self {
            context,
            encoder,
            params: params.clone(),
        })
    }

    pub fn level_budget(&self) -> u32 {
        self.params.level_budget()
    }
}
