// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Query & Result Queues (spec.md §4.7) and the Result Lifetime Manager
//! (spec.md §4.9), grounded in
//! `examples/original_source/ppcnn/ppcnn_server/ppcnn_server_calcmanager.cpp`'s
//! `CalcManager::push_query` / `pop_result` / `cleanup_results`.

mod bounded;

pub use bounded::{BoundedQueue, DEFAULT_POLL_INTERVAL};

use std::time::Duration;

use hecnn_model::{CoreError, CoreResult, Query, QueryId, QueryResult};
use tracing::{debug, warn};

/// Queue of queries awaiting a worker, bounded by `max_concurrent_queries`.
pub struct QueryQueue {
    inner: BoundedQueue<Query>,
}

impl QueryQueue {
    pub fn new(capacity: usize) -> Self {
        Self { inner: BoundedQueue::new(capacity) }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Accepts `query`, assigning it a fresh [`QueryId`], or rejects it with
    /// `QueryQueueFull` if the queue is already at `max_concurrent_queries`
    /// — spec.md §8's boundary behavior.
    pub fn submit(&self, query: Query) -> CoreResult<QueryId> {
        self.inner.push_new(query).map_err(|err| match err {
            CoreError::QueryQueueFull { capacity } => CoreError::QueryQueueFull { capacity },
            other => other,
        })
    }

    /// Blocks until any query is available, for a worker to claim.
    pub async fn claim(&self, poll_interval: Duration) -> (QueryId, Query) {
        self.inner.pop_any_blocking(poll_interval).await
    }
}

impl Default for QueryQueue {
    fn default() -> Self {
        Self::new(16)
    }
}

/// Queue of completed results awaiting client pickup, bounded by
/// `max_results`, with lifetime-based eviction per spec.md §4.9.
pub struct ResultQueue {
    inner: BoundedQueue<QueryResult>,
    result_lifetime_sec: i64,
}

impl ResultQueue {
    pub fn new(capacity: usize, result_lifetime_sec: i64) -> Self {
        Self {
            inner: BoundedQueue::new(capacity),
            result_lifetime_sec,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Pushes `result` under `id`. If the queue is at capacity, first runs
    /// the Result Lifetime Manager's sweep — evicting every entry whose age
    /// is `>= result_lifetime_sec` — then retries exactly once, grounded in
    /// `CalcManager::cleanup_results`:
    /// `if (rque_.size() >= max_results_) { ...sweep...; }` followed by the
    /// original push. If the queue is still full after the sweep, the push
    /// is rejected with `ResultQueueFull`.
    pub fn push(&self, id: QueryId, result: QueryResult) -> CoreResult<()> {
        if self.inner.is_full() {
            let evicted = self.sweep_expired();
            if evicted > 0 {
                debug!(evicted, "result lifetime manager evicted expired results");
            }
        }
        self.inner.push(id, result).map(|_| ()).map_err(|err| match err {
            CoreError::QueryQueueFull { capacity } => CoreError::ResultQueueFull { capacity },
            other => other,
        })
    }

    /// Removes and returns the result for `id`, if present and not yet
    /// evicted. Callers distinguish "not ready yet" from "evicted" by
    /// separately checking whether the id was ever pushed; this queue alone
    /// cannot tell the two apart once the entry is gone, matching the
    /// original `rque_.pop` contract.
    pub fn try_take(&self, id: QueryId) -> Option<QueryResult> {
        self.inner.try_pop(id)
    }

    /// Blocks indefinitely until `id`'s result is available, waking up to
    /// re-check every `poll_interval` in case a push was missed — grounded
    /// in `CalcManager::pop_result`'s own indefinite retry loop.
    pub async fn take_blocking(&self, id: QueryId, poll_interval: Duration) -> Option<QueryResult> {
        self.inner.pop_blocking(id, poll_interval).await
    }

    /// Evicts every result whose age is `>= result_lifetime_sec`, returning
    /// the number evicted. Exposed directly so a background sweep task can
    /// run this on a timer in addition to the push-triggered sweep.
    pub fn sweep_expired(&self) -> usize {
        let expired = self.inner.ids_older_than(self.result_lifetime_sec, QueryResult::age_secs);
        for id in &expired {
            if self.inner.try_pop(*id).is_none() {
                warn!(query_id = ?id, "result lifetime sweep raced a concurrent take");
            }
        }
        expired.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hecnn_model::{ActivationFamily, ComputationParams, OptLevel};

    fn sample_query() -> Query {
        let params = ComputationParams {
            img_height: 0,
            img_width: 0,
            img_channels: 0,
            label_count: 10,
            dataset: "mnist".to_string(),
            model: "CKKS-square".to_string(),
            opt_level: OptLevel::All,
            activation: ActivationFamily::Square,
        };
        Query::new(1, params, vec![]).expect("zero-shape query always validates")
    }

    #[test]
    fn submit_rejects_once_at_capacity() {
        let queue = QueryQueue::new(1);
        queue.submit(sample_query()).unwrap();
        assert!(matches!(queue.submit(sample_query()), Err(CoreError::QueryQueueFull { capacity: 1 })));
    }

    #[test]
    fn result_push_rejects_when_full_and_nothing_expired() {
        let queue = ResultQueue::new(1, 3600);
        let id_a = QueryId::new();
        let id_b = QueryId::new();
        queue.push(id_a, QueryResult::success(1, id_a, vec![])).unwrap();
        assert!(matches!(queue.push(id_b, QueryResult::success(1, id_b, vec![])), Err(CoreError::ResultQueueFull { capacity: 1 })));
    }

    #[test]
    fn result_push_sweeps_expired_entries_before_rejecting() {
        let queue = ResultQueue::new(1, -1); // result_lifetime_sec < 0: everything is immediately "expired"
        let id_a = QueryId::new();
        let id_b = QueryId::new();
        queue.push(id_a, QueryResult::success(1, id_a, vec![])).unwrap();
        // id_a is already older than a negative lifetime, so the sweep
        // evicts it and the second push succeeds.
        queue.push(id_b, QueryResult::success(1, id_b, vec![])).unwrap();
        assert!(queue.try_take(id_a).is_none());
        assert!(queue.try_take(id_b).is_some());
    }

    #[test]
    fn try_take_removes_the_entry_once() {
        let queue = ResultQueue::new(4, 3600);
        let id = QueryId::new();
        queue.push(id, QueryResult::success(1, id, vec![])).unwrap();
        assert!(queue.try_take(id).is_some());
        assert!(queue.try_take(id).is_none());
    }
}
