// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Control codes, per spec.md §4.10's table, grounded in
//! `examples/original_source/ppcnn/ppcnn_share/ppcnn_cli2srvparam.hpp` and
//! `ppcnn_srv2cliparam.hpp`.

/// C→S (data): register encryption keys.
pub const REGISTER_KEYS: u64 = 0x401;
/// C↔S (req/rep): submit query, receive query-id.
pub const SUBMIT_QUERY: u64 = 0x1001;
/// C↔S (req/rep): poll result by query-id.
pub const POLL_RESULT: u64 = 0x1002;
/// S→C (data): query-id response payload tag.
pub const QUERY_ID_RESPONSE: u64 = 0x403;
/// S→C (data): result response payload tag.
pub const RESULT_RESPONSE: u64 = 0x404;
/// S→C (data), SPEC_FULL.md §4.10 supplement: a serialized `ProtocolError`
/// sent once before this system resets a connection it would otherwise
/// have silently dropped.
pub const PROTOCOL_ERROR: u64 = 0xE01;

pub fn name(code: u64) -> &'static str {
    match code {
        REGISTER_KEYS => "REGISTER_KEYS",
        SUBMIT_QUERY => "SUBMIT_QUERY",
        POLL_RESULT => "POLL_RESULT",
        QUERY_ID_RESPONSE => "QUERY_ID_RESPONSE",
        RESULT_RESPONSE => "RESULT_RESPONSE",
        PROTOCOL_ERROR => "PROTOCOL_ERROR",
        _ => "UNKNOWN",
    }
}
