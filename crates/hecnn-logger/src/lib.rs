// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Structured logging setup, per SPEC_FULL.md §2's ambient-stack item 13,
//! grounded in `examples/gnosisguild-enclave/crates/cli/src/helpers/telemetry.rs`'s
//! `setup_simple_tracing` — a `tracing_subscriber::registry()` wired to a
//! `fmt` layer and a level filter. This system has no OpenTelemetry
//! exporter to forward spans to, so only the `fmt`/`EnvFilter` half of the
//! teacher's `setup_tracing` is carried; see DESIGN.md for the dropped-half
//! note.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initializes the global `tracing` subscriber for a binary entrypoint.
/// `default_level` seeds the `EnvFilter` when `RUST_LOG` is unset (e.g.
/// `"hecnn_server=info,hecnn_worker=info"`); callers pass a directive
/// string scoped to their own crates rather than a global level, matching
/// the teacher's per-binary call site.
pub fn init(default_directives: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_does_not_panic_when_called_once() {
        // Calling `init` a second time in the same test binary process
        // would panic ("global subscriber already set"); this module only
        // exercises the `EnvFilter` construction path that precedes it.
        let _ = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    }
}
