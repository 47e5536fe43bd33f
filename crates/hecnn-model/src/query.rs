// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use serde::{Deserialize, Serialize};

use crate::computation::ComputationParams;
use crate::error::{CoreError, CoreResult};
use crate::ids::QueryId;

/// A submitted inference request. `input_ciphertexts` are opaque,
/// backend-serialized blobs; their count must equal
/// `params.input_len()`, checked at `Query::new`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    pub key_id: i64,
    pub params: ComputationParams,
    pub input_ciphertexts: Vec<Vec<u8>>,
}

impl Query {
    pub fn new(key_id: i64, params: ComputationParams, input_ciphertexts: Vec<Vec<u8>>) -> CoreResult<Self> {
        let expected = params.input_len();
        if input_ciphertexts.len() != expected {
            return Err(CoreError::CiphertextCountMismatch {
                expected,
                actual: input_ciphertexts.len(),
            });
        }
        Ok(Self {
            key_id,
            params,
            input_ciphertexts,
        })
    }
}

/// A `Query` once assigned a server-side id and queued for a worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedQuery {
    pub id: QueryId,
    pub query: Query,
}
