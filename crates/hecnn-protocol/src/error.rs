// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Wire-level failure taxonomy, per spec.md §7's `ProtocolError`. This is
/// the payload carried by the `PROTOCOL_ERROR` (`0xE01`) frame the
/// SPEC_FULL.md §4.10 supplement adds, as well as the in-process error type
/// frame encode/decode can fail with.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum ProtocolError {
    #[error("frame payload length {declared} exceeds the {limit} byte cap")]
    PayloadTooLarge { declared: u64, limit: u64 },

    #[error("unknown control code 0x{0:x}")]
    UnknownControlCode(u64),

    #[error("invalid state transition: event '{event}' is not valid in state '{state}'")]
    InvalidTransition { state: String, event: String },

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("connection closed before a complete frame was read")]
    ConnectionClosed,
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;

impl From<bincode::Error> for ProtocolError {
    fn from(err: bincode::Error) -> Self {
        ProtocolError::Malformed(err.to_string())
    }
}
