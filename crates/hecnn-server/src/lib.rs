// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Server-side wiring: the TCP accept loop, per-connection dispatch, and
//! the Result Lifetime Manager's background sweep, per spec.md §4.9/§4.10.
//! Kept as a library in addition to the `main` binary so the dispatch loop
//! can be exercised in tests against an in-memory duplex pipe rather than a
//! real socket, matching `hecnn-protocol::frame`'s own test style.

mod dispatch;
mod sweep;

pub use dispatch::{handle_connection, ServerContext};
pub use sweep::spawn_result_sweep;

use std::sync::Arc;
use std::time::Duration;

use hecnn_queue::{QueryQueue, ResultQueue};
use hecnn_registry::KeyRegistry;
use tokio::net::TcpListener;
use tracing::info;

/// Accepts connections on `listener` forever, spawning one
/// [`handle_connection`] task per socket. Returns only if `accept` itself
/// errors in a way that isn't worth retrying (the teacher's
/// `CalcManager`/`Session` accept loop has no analogous "give up" path,
/// since the original's accept loop ran for the lifetime of the process
/// inside one OS thread dedicated to it).
pub async fn accept_loop(listener: TcpListener, ctx: ServerContext) -> std::io::Result<()> {
    loop {
        let (socket, peer) = listener.accept().await?;
        info!(%peer, "accepted connection");
        let ctx = ctx.clone();
        tokio::spawn(async move {
            handle_connection(ctx, socket).await;
            info!(%peer, "connection closed");
        });
    }
}

/// Convenience constructor bundling the registry/queues a binary entrypoint
/// needs, with the queue capacities and poll timing named by
/// [`hecnn_config::ServerArgs`].
pub fn build_context(
    max_concurrent_queries: usize,
    max_results: usize,
    max_result_lifetime_sec: i64,
    poll_wait: Duration,
) -> ServerContext {
    ServerContext {
        registry: KeyRegistry::new(),
        query_queue: Arc::new(QueryQueue::new(max_concurrent_queries)),
        result_queue: Arc::new(ResultQueue::new(max_results, max_result_lifetime_sec)),
        poll_wait,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn accept_loop_serves_more_than_one_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let ctx = build_context(4, 4, 3600, Duration::from_millis(20));

        tokio::spawn(accept_loop(listener, ctx));

        for _ in 0..2 {
            let stream = tokio::net::TcpStream::connect(addr).await.unwrap();
            drop(stream);
        }
    }
}
