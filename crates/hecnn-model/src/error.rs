// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use thiserror::Error;

/// Error taxonomy shared by every crate on the server side of the
/// inference service. Client-facing wire errors are mapped from this
/// type at the protocol boundary (see `hecnn_protocol::ProtocolError`,
/// produced from a `CoreError` by `payloads::core_error_to_wire`).
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("key bundle {0} is not registered")]
    UnknownKey(String),

    #[error("query {0} is not known to the server")]
    UnknownQuery(String),

    #[error("query queue is full (capacity {capacity})")]
    QueryQueueFull { capacity: usize },

    #[error("result queue is full (capacity {capacity})")]
    ResultQueueFull { capacity: usize },

    #[error("result for query {0} has not been produced yet")]
    ResultNotReady(String),

    #[error("result for query {0} has already been evicted")]
    ResultEvicted(String),

    #[error("layer topology is invalid: {0}")]
    InvalidTopology(String),

    #[error("weights store is missing tensor at {0}")]
    MissingWeights(String),

    #[error("ciphertext count mismatch: expected {expected}, got {actual}")]
    CiphertextCountMismatch { expected: usize, actual: usize },

    #[error("multiplicative level budget exhausted at layer '{layer}' (needed {needed}, had {available})")]
    LevelBudgetExhausted {
        layer: String,
        needed: u32,
        available: u32,
    },

    #[error("unsupported activation kind: {0}")]
    UnsupportedActivation(String),

    #[error("fhe backend error: {0}")]
    Fhe(String),

    #[error("(de)serialization error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
