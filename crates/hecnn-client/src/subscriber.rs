// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Client Result Subscriber, per spec.md §4.11: "a per-query background
//! task that blocks on a request-result exchange and invokes a user
//! callback", grounded in
//! `examples/original_source/ppcnn/ppcnn_client/ppcnn_client.cpp`'s
//! `Client::subscribe_result`, which ran this on its own `std::thread`.
//! Here it is a `tokio` task; "cancellation is not supported, the only
//! exit is task completion" is preserved by never exposing an abort handle
//! other than the raw `JoinHandle` itself.

use std::time::Duration;

use hecnn_model::{QueryId, ResultStatus};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::connection::{ClientConnection, ClientError};

/// Invoked once, on task completion, with `(query_id, succeeded, output_ciphertexts)`.
pub type ResultCallback = Box<dyn FnOnce(QueryId, bool, Vec<Vec<u8>>) + Send + 'static>;

pub struct SubscriberHandle {
    join: JoinHandle<()>,
}

impl SubscriberHandle {
    /// Joins the subscriber task, matching spec.md §4.11's "the task is
    /// joined when the caller waits on the query-id".
    pub async fn join(self) {
        if let Err(err) = self.join.await {
            warn!(error = %err, "result subscriber task panicked");
        }
    }
}

/// Spawns a subscriber that opens one connection and issues `POLL_RESULT`
/// for `query_id`, then invokes `callback` exactly once with whatever the
/// server blocked and returned. `retry_interval` only comes into play if
/// that attempt doesn't get a clean reply at all — the connection attempt
/// fails, or the server answers with a genuine `PROTOCOL_ERROR` rather than
/// a result — in which case a fresh connection is opened after the pause.
pub fn spawn_result_subscriber(
    host: String,
    port: u16,
    query_id: QueryId,
    retry_interval: Duration,
    callback: ResultCallback,
) -> SubscriberHandle {
    let join = tokio::spawn(async move {
        loop {
            match ClientConnection::connect(&host, port).await {
                Ok(mut conn) => match conn.poll_result(query_id).await {
                    Ok(result) => {
                        callback(query_id, result.status == ResultStatus::Success, result.output_ciphertexts);
                        return;
                    }
                    Err(ClientError::Server(err)) => {
                        debug!(query_id = %query_id, error = %err, "server reported a protocol error, retrying");
                    }
                    Err(err) => {
                        warn!(query_id = %query_id, error = %err, "poll attempt failed, retrying");
                    }
                },
                Err(err) => {
                    warn!(query_id = %query_id, error = %err, "could not reach server, retrying");
                }
            }
            tokio::time::sleep(retry_interval).await;
        }
    });

    SubscriberHandle { join }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn subscriber_invokes_callback_once_result_is_ready() {
        // Exercised end-to-end in hecnn-server's integration style tests;
        // here we only check that a subscriber against an unreachable host
        // keeps retrying rather than panicking or returning early.
        let invoked = Arc::new(Mutex::new(false));
        let invoked_clone = invoked.clone();
        let handle = spawn_result_subscriber(
            "127.0.0.1".to_string(),
            1, // port 1 is reserved and will refuse the connection
            QueryId::new(),
            Duration::from_millis(5),
            Box::new(move |_id, _ok, _bytes| {
                *invoked_clone.lock().unwrap() = true;
            }),
        );

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!*invoked.lock().unwrap());
        drop(handle);
    }
}
