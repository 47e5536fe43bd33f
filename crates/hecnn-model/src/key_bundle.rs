// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use serde::{Deserialize, Serialize};

use crate::params::EncryptionParameters;

/// Wire-level representation of a registered key. The public key and
/// relinearization key travel as opaque, backend-serialized blobs; only
/// `hecnn-fhe` knows how to interpret them against `params`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyBundle {
    pub key_id: i64,
    pub params: EncryptionParameters,
    pub public_key: Vec<u8>,
    pub relin_key: Vec<u8>,
}

impl KeyBundle {
    pub fn new(key_id: i64, params: EncryptionParameters, public_key: Vec<u8>, relin_key: Vec<u8>) -> Self {
        Self {
            key_id,
            params,
            public_key,
            relin_key,
        }
    }
}
