// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::QueryId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultStatus {
    Success,
    Failed,
}

/// Produced by a worker after compiling and executing one query. Evicted
/// either by the Result Lifetime Manager or by a client poll that consumes
/// it, whichever happens first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub key_id: i64,
    pub query_id: QueryId,
    pub status: ResultStatus,
    pub output_ciphertexts: Vec<Vec<u8>>,
    pub created_at: DateTime<Utc>,
}

impl QueryResult {
    pub fn success(key_id: i64, query_id: QueryId, output_ciphertexts: Vec<Vec<u8>>) -> Self {
        Self {
            key_id,
            query_id,
            status: ResultStatus::Success,
            output_ciphertexts,
            created_at: Utc::now(),
        }
    }

    pub fn failed(key_id: i64, query_id: QueryId) -> Self {
        Self {
            key_id,
            query_id,
            status: ResultStatus::Failed,
            output_ciphertexts: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn age_secs(&self) -> i64 {
        (Utc::now() - self.created_at).num_seconds()
    }
}
