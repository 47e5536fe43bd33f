// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Wire protocol: frame codec, payload structs, control codes, and the
//! server-side connection state machine, per spec.md §4.10.

pub mod codes;
pub mod error;
pub mod frame;
pub mod payloads;
pub mod state;

pub use error::{ProtocolError, ProtocolResult};
pub use frame::{Frame, MAX_PAYLOAD_LEN};
pub use state::{Event, ServerState};
