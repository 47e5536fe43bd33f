// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use thiserror::Error;

/// Failure modes of the FHE Capability Interface, per spec.md §4.1: every
/// operation may fail with one of these three, plus a catch-all for the
/// underlying backend surfacing something this layer doesn't model.
#[derive(Debug, Error)]
pub enum FheError {
    #[error("operand parameters disagree with the registered scheme ({0})")]
    SchemeMismatch(String),

    #[error("multiplicative level budget exhausted (current level {level})")]
    LevelExhausted { level: u32 },

    #[error("ciphertext/plaintext scale mismatch: {lhs} vs {rhs}")]
    ScaleMismatch { lhs: f64, rhs: f64 },

    #[error("backend error: {0}")]
    Backend(String),
}

pub type FheResult<T> = std::result::Result<T, FheError>;
