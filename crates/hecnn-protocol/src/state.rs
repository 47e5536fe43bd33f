// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Server-side connection state machine, per spec.md §4.10 ("states
//! `Ready`, `Exit`; events `Query`, `ResultRequest`"), grounded in
//! `examples/original_source/ppcnn/ppcnn_server/ppcnn_server_state.{hpp,cpp}`'s
//! `StateId_t`/`Event_t`/`StateReady`. The original's `StateReady::set`
//! accepted every event unconditionally (a bare `switch` with only a
//! `default: break`); this system keeps that permissiveness for `Ready` but
//! makes `Exit` genuinely terminal, so a dispatch loop that already closed
//! out a connection can't be driven to process another frame on it.

use crate::error::{ProtocolError, ProtocolResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Ready,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Query,
    ResultRequest,
}

impl Event {
    fn name(self) -> &'static str {
        match self {
            Event::Query => "Query",
            Event::ResultRequest => "ResultRequest",
        }
    }
}

impl ServerState {
    fn name(self) -> &'static str {
        match self {
            ServerState::Ready => "Ready",
            ServerState::Exit => "Exit",
        }
    }

    /// Validates that `event` is legal in the current state, per spec.md
    /// §4.10's "handlers refuse out-of-state frames". Never itself
    /// transitions the state — `Ready` accepts both events and stays
    /// `Ready`; callers move to `Exit` explicitly via [`ServerState::close`]
    /// when the connection is done.
    pub fn handle(&self, event: Event) -> ProtocolResult<()> {
        match self {
            ServerState::Ready => Ok(()),
            ServerState::Exit => Err(ProtocolError::InvalidTransition {
                state: self.name().to_string(),
                event: event.name().to_string(),
            }),
        }
    }

    pub fn close(&mut self) {
        *self = ServerState::Exit;
    }

    pub fn is_exit(self) -> bool {
        self == ServerState::Exit
    }
}

impl Default for ServerState {
    fn default() -> Self {
        ServerState::Ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_state_accepts_both_events() {
        let state = ServerState::Ready;
        assert!(state.handle(Event::Query).is_ok());
        assert!(state.handle(Event::ResultRequest).is_ok());
    }

    #[test]
    fn exit_state_refuses_every_event() {
        let mut state = ServerState::Ready;
        state.close();
        assert!(matches!(state.handle(Event::Query), Err(ProtocolError::InvalidTransition { .. })));
    }
}
