// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Background half of the Result Lifetime Manager, per spec.md §4.9.
//! `hecnn_queue::ResultQueue::push` already sweeps expired results when it
//! finds the queue full; this task additionally sweeps on a fixed interval
//! so a result can be evicted even if no new result ever pushes the queue
//! to capacity, matching `CalcManager`'s own timer-driven cleanup alongside
//! its push-triggered one.

use std::sync::Arc;
use std::time::Duration;

use hecnn_queue::ResultQueue;
use tracing::debug;

pub fn spawn_result_sweep(result_queue: Arc<ResultQueue>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let evicted = result_queue.sweep_expired();
            if evicted > 0 {
                debug!(evicted, "periodic result lifetime sweep");
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use hecnn_model::QueryResult;

    #[tokio::test]
    async fn periodic_sweep_evicts_expired_results() {
        let queue = Arc::new(ResultQueue::new(4, -1));
        let id = hecnn_model::QueryId::new();
        queue.push(id, QueryResult::success(1, id, vec![])).unwrap();

        spawn_result_sweep(queue.clone(), Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(queue.try_take(id).is_none());
    }
}
