// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! `BoundedQueue<T>`: the shared shape behind both the query queue and the
//! result queue, per spec.md §4.7, grounded in
//! `examples/original_source/ppcnn/ppcnn_server/ppcnn_server_query.hpp`'s
//! `QueryQueue`/`ResultQueue` (a `std::map<int32_t, T>` behind a mutex).
//! Per spec.md §9's "Concurrency correctness" note, blocking pop uses
//! `tokio::sync::Notify` rather than the original's `usleep`-based retry
//! polling; the observable contract — block until available, or return
//! `None` on a bounded timeout — is unchanged.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use hecnn_model::{CoreError, CoreResult, QueryId};
use tokio::sync::Notify;
use tokio::time::timeout;

/// Default retry interval used by callers that don't supply their own,
/// mirroring `CalcManager::pop_result`'s `retry_interval_msec = 100`
/// default — now a timeout on a single `Notify::notified()` wait rather
/// than a sleep-and-recheck loop.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct BoundedQueue<T> {
    capacity: usize,
    entries: Mutex<HashMap<QueryId, T>>,
    notify: Notify,
}

impl<T> BoundedQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(HashMap::new()),
            notify: Notify::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("queue lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// Inserts `value` under a freshly generated id, rejecting the push
    /// with `CapacityRejected` if the queue is already at capacity — spec.md
    /// §4.7 / §8's boundary behavior ("Query submission when the queue is
    /// exactly at `max_concurrent_queries` is rejected").
    pub fn push_new(&self, value: T) -> CoreResult<QueryId> {
        let id = QueryId::new();
        self.push(id, value)?;
        Ok(id)
    }

    /// Inserts `value` under an explicit id (used by the result queue, whose
    /// id is the query's own id, not a fresh one).
    pub fn push(&self, id: QueryId, value: T) -> CoreResult<QueryId> {
        let mut guard = self.entries.lock().expect("queue lock poisoned");
        if guard.len() >= self.capacity {
            return Err(CoreError::QueryQueueFull { capacity: self.capacity });
        }
        guard.insert(id, value);
        drop(guard);
        self.notify.notify_waiters();
        Ok(id)
    }

    /// Inserts `value` under an explicit id without capacity checking, for
    /// use by callers (the Result Lifetime Manager's sweep-then-retry path)
    /// that have already verified room exists.
    pub fn push_unchecked(&self, id: QueryId, value: T) {
        let mut guard = self.entries.lock().expect("queue lock poisoned");
        guard.insert(id, value);
        drop(guard);
        self.notify.notify_waiters();
    }

    /// Removes and returns the entry at `id` if present, without blocking.
    pub fn try_pop(&self, id: QueryId) -> Option<T> {
        self.entries.lock().expect("queue lock poisoned").remove(&id)
    }

    /// Pops any single entry (arbitrary order), used by worker threads
    /// draining the query queue — spec.md §5: "queries are popped in
    /// arbitrary order".
    pub fn try_pop_any(&self) -> Option<(QueryId, T)> {
        let mut guard = self.entries.lock().expect("queue lock poisoned");
        let id = *guard.keys().next()?;
        guard.remove(&id).map(|v| (id, v))
    }

    /// Blocks until `id` is present, re-checking every time a push wakes
    /// the queue or `interval` elapses with nothing pushed — matching the
    /// indefinite blocking contract of `CalcManager::pop_result`, with its
    /// `usleep` retry loop replaced by a `Notify` wait per retry round.
    /// Never returns `None`; the `Option` only reflects `try_pop`'s shape.
    pub async fn pop_blocking(&self, id: QueryId, interval: Duration) -> Option<T> {
        loop {
            if let Some(value) = self.try_pop(id) {
                return Some(value);
            }
            let notified = self.notify.notified();
            if timeout(interval, notified).await.is_err() {
                continue;
            }
        }
    }

    /// Blocks until any entry is available, used by worker threads.
    pub async fn pop_any_blocking(&self, interval: Duration) -> (QueryId, T) {
        loop {
            if let Some(entry) = self.try_pop_any() {
                return entry;
            }
            let notified = self.notify.notified();
            let _ = timeout(interval, notified).await;
        }
    }

    /// Returns the ids and ages of every entry for which `age_secs` (via the
    /// caller-supplied accessor) is `>= min_age_secs`, without removing
    /// them — the read-only half of the Result Lifetime Manager's sweep
    /// (spec.md §4.9).
    pub fn ids_older_than<F>(&self, min_age_secs: i64, age_of: F) -> Vec<QueryId>
    where
        F: Fn(&T) -> i64,
    {
        self.entries
            .lock()
            .expect("queue lock poisoned")
            .iter()
            .filter(|(_, value)| age_of(value) >= min_age_secs)
            .map(|(id, _)| *id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_rejects_once_at_capacity() {
        let queue: BoundedQueue<u32> = BoundedQueue::new(2);
        queue.push_new(1).unwrap();
        queue.push_new(2).unwrap();
        assert!(matches!(queue.push_new(3), Err(CoreError::QueryQueueFull { capacity: 2 })));
    }

    #[test]
    fn try_pop_removes_the_entry() {
        let queue: BoundedQueue<&str> = BoundedQueue::new(4);
        let id = queue.push_new("hello").unwrap();
        assert_eq!(queue.try_pop(id), Some("hello"));
        assert_eq!(queue.try_pop(id), None);
    }

    #[tokio::test]
    async fn pop_blocking_returns_once_pushed_from_another_task() {
        use std::sync::Arc;

        let queue = Arc::new(BoundedQueue::<u32>::new(4));
        let id = QueryId::new();
        let writer = queue.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            writer.push(id, 42).unwrap();
        });

        let value = queue.pop_blocking(id, Duration::from_millis(10)).await;
        assert_eq!(value, Some(42));
    }

    #[test]
    fn ids_older_than_finds_only_expired_entries() {
        let queue: BoundedQueue<i64> = BoundedQueue::new(4);
        let young = queue.push_new(1).unwrap();
        let old = queue.push_new(100).unwrap();
        let expired = queue.ids_older_than(50, |age| *age);
        assert_eq!(expired, vec![old]);
        let _ = young;
    }
}
