// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Payload structs, per spec.md §4.10/§6: "a small serialized struct,
//! followed by the binary-serialized ciphertexts/keys". Rather than the
//! original's hand-rolled `operator<<`/`operator>>` pairs splitting a fixed
//! header from separately-length-prefixed sub-streams
//! (`C2SEnckeyParam`/`C2SQueryParam`/`C2SResreqParam`/`Srv2CliParam`), these
//! payloads reuse `hecnn-model`'s own wire types directly and let `bincode`
//! (the teacher-wide serialization convention) handle both the struct and
//! its `Vec<u8>` blobs in one pass — a `Vec<u8>` already carries its own
//! length prefix under `bincode`, so no separate `*_stream_sz` fields are
//! needed.

use hecnn_model::{CoreError, KeyBundle, Query, QueryId, QueryResult};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::ProtocolResult;

pub fn encode<T: Serialize>(value: &T) -> ProtocolResult<Vec<u8>> {
    Ok(bincode::serialize(value)?)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> ProtocolResult<T> {
    Ok(bincode::deserialize(bytes)?)
}

/// `REGISTER_KEYS` (`0x401`) payload: corresponds to the original's
/// `C2SEnckeyParam` header plus its three trailing streams.
pub type RegisterKeysPayload = KeyBundle;

/// `SUBMIT_QUERY` (`0x1001`) request payload: corresponds to `C2SQueryParam`
/// plus its trailing ciphertext stream.
pub type SubmitQueryRequest = Query;

/// `QUERY_ID_RESPONSE` (`0x403`) payload.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SubmitQueryResponse {
    pub query_id: QueryId,
}

/// `POLL_RESULT` (`0x1002`) request payload: corresponds to `C2SResreqParam`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PollResultRequest {
    pub query_id: QueryId,
}

/// `RESULT_RESPONSE` (`0x404`) payload: corresponds to `Srv2CliParam`.
pub type PollResultResponse = QueryResult;

/// `PROTOCOL_ERROR` (`0xE01`) payload: the SPEC_FULL.md §4.10 supplement.
pub type ProtocolErrorPayload = crate::error::ProtocolError;

/// Maps the server's internal error taxonomy onto the wire-level
/// `ProtocolError` sent back on the `PROTOCOL_ERROR` frame, per spec.md §7's
/// note that "client-facing wire errors are mapped from [`CoreError`] at the
/// protocol boundary".
pub fn core_error_to_wire(err: &CoreError) -> crate::error::ProtocolError {
    crate::error::ProtocolError::Malformed(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_query_response_round_trips() {
        let response = SubmitQueryResponse { query_id: QueryId::new() };
        let bytes = encode(&response).unwrap();
        let decoded: SubmitQueryResponse = decode(&bytes).unwrap();
        assert_eq!(decoded.query_id, response.query_id);
    }

    #[test]
    fn poll_result_request_round_trips() {
        let request = PollResultRequest { query_id: QueryId::new() };
        let bytes = encode(&request).unwrap();
        let decoded: PollResultRequest = decode(&bytes).unwrap();
        assert_eq!(decoded.query_id, request.query_id);
    }
}
