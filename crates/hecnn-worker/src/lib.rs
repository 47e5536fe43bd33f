// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Calculation worker pool: a fixed number of tasks, each looping
//! claim-compile-execute-push, per spec.md §4.8, grounded in
//! `examples/original_source/ppcnn/ppcnn_server/ppcnn_server_calcthread.cpp`'s
//! `CalcThread::Impl::exec`/`compute`. `CalcManager::start_threads` spun up
//! one OS thread per `CalcThread`; here each worker is a `tokio` task that
//! blocks on the query queue's `Notify` and off-loads the CPU-bound
//! compile+execute step onto a shared `rayon` pool, following the teacher's
//! `multithread::TaskPool` split between async scheduling and CPU work.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use hecnn_compiler::{CompileOptions, TopologyDescriptor, WeightsStore};
use hecnn_fhe::{codec, SchemeContext, SealCkksEngine};
use hecnn_model::{CoreError, Query, QueryId, QueryResult};
use hecnn_queue::{QueryQueue, ResultQueue};
use hecnn_registry::KeyRegistry;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Fhe(#[from] hecnn_fhe::FheError),
    #[error(transparent)]
    Executor(#[from] hecnn_executor::ExecutorError),
    #[error("reading model file {path}: {source}")]
    ModelIo { path: PathBuf, source: std::io::Error },
}

/// Thread-pool sizing and filesystem layout, grounded in
/// `CalcThreadParam`'s `retry_interval_msec` / `plaintext_experiment_path`
/// defaults.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub thread_num: usize,
    pub plaintext_experiment_path: PathBuf,
    pub poll_interval: Duration,
}

impl WorkerConfig {
    pub fn new(thread_num: usize, plaintext_experiment_path: impl Into<PathBuf>) -> Self {
        Self {
            thread_num,
            plaintext_experiment_path: plaintext_experiment_path.into(),
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self::new(2, "./experiments/")
    }
}

fn model_structure_path(root: &Path, dataset: &str, model: &str) -> PathBuf {
    root.join(dataset).join("saved_models").join(format!("{model}_structure.json"))
}

fn model_weights_path(root: &Path, dataset: &str, model: &str) -> PathBuf {
    root.join(dataset).join("saved_models").join(format!("{model}_weights.bin"))
}

/// Bounded CPU-work dispatcher: a `rayon` thread pool gated by a
/// `tokio::sync::Semaphore`, adapted from the teacher's
/// `multithread::TaskPool`. Each of `spawn_workers`'s claim-loops submits
/// its one in-flight query's compile+execute work here rather than running
/// it on a `tokio` executor thread directly.
struct ComputePool {
    semaphore: Arc<Semaphore>,
    thread_pool: rayon::ThreadPool,
}

impl ComputePool {
    fn new(threads: usize) -> Self {
        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .expect("failed to build calculation thread pool");
        Self {
            semaphore: Arc::new(Semaphore::new(threads)),
            thread_pool,
        }
    }

    async fn run<F, T>(&self, op: F) -> T
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let _permit = self.semaphore.acquire().await.expect("compute pool semaphore is never closed");
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.thread_pool.spawn(move || {
            let _ = tx.send(op());
        });
        rx.await.expect("calculation task dropped its result sender")
    }
}

/// Starts `config.thread_num` worker tasks on the current `tokio` runtime,
/// backed by one shared [`ComputePool`] sized to the same thread count.
/// Each task runs until the process exits; there is no `stop_threads`
/// equivalent because nothing in this system ever shuts a worker down
/// independently of the server process itself.
pub fn spawn_workers(
    config: WorkerConfig,
    query_queue: Arc<QueryQueue>,
    result_queue: Arc<ResultQueue>,
    registry: KeyRegistry,
) {
    info!(threads = config.thread_num, "starting calculation worker pool");
    let compute_pool = Arc::new(ComputePool::new(config.thread_num));
    for worker_id in 0..config.thread_num {
        let query_queue = query_queue.clone();
        let result_queue = result_queue.clone();
        let registry = registry.clone();
        let config = config.clone();
        let compute_pool = compute_pool.clone();
        tokio::spawn(async move {
            worker_loop(worker_id, config, query_queue, result_queue, registry, compute_pool).await;
        });
    }
}

async fn worker_loop(
    worker_id: usize,
    config: WorkerConfig,
    query_queue: Arc<QueryQueue>,
    result_queue: Arc<ResultQueue>,
    registry: KeyRegistry,
    compute_pool: Arc<ComputePool>,
) {
    loop {
        let (query_id, query) = query_queue.claim(config.poll_interval).await;
        info!(worker_id, query_id = %query_id, "claimed query");

        let key_id = query.key_id;
        let config = config.clone();
        let registry = registry.clone();
        let outcome = compute_pool
            .run(move || process_query(&config, &registry, query_id, &query))
            .await;

        let result = match outcome {
            Ok(output_ciphertexts) => QueryResult::success(key_id, query_id, output_ciphertexts),
            Err(err) => {
                warn!(worker_id, query_id = %query_id, error = %err, "query failed");
                QueryResult::failed(key_id, query_id)
            }
        };

        if let Err(err) = result_queue.push(query_id, result) {
            warn!(worker_id, query_id = %query_id, error = %err, "could not push result");
        }
    }
}

/// Compiles and executes one query end to end: resolve the key, decode
/// ciphertexts, load the topology/weights for `query.params.{dataset,model}`,
/// compile a plan, run the forward pass, re-encode the outputs. Mirrors
/// `CalcThread::Impl::compute`.
#[instrument(skip(config, registry, query), fields(dataset = %query.params.dataset, model = %query.params.model))]
fn process_query(
    config: &WorkerConfig,
    registry: &KeyRegistry,
    query_id: QueryId,
    query: &Query,
) -> Result<Vec<Vec<u8>>, WorkerError> {
    let bundle = registry.get(query.key_id)?;

    let scheme_ctx = SchemeContext::new(&bundle.params)?;
    let relin_key = codec::relin_key_from_bytes(&scheme_ctx, &bundle.relin_key)?;
    let scale_bits = bundle.params.scale_bits;
    let level_budget = bundle.params.level_budget();
    let engine = SealCkksEngine::new(scheme_ctx)?;

    let scheme_ctx_for_decode = SchemeContext::new(&bundle.params)?;
    let input_ciphertexts: Result<Vec<_>, _> = query
        .input_ciphertexts
        .iter()
        .map(|blob| codec::ciphertext_from_bytes(&scheme_ctx_for_decode, blob))
        .collect();
    let input_ciphertexts = input_ciphertexts?;

    let input_tensor = hecnn_executor::input_tensor(
        input_ciphertexts,
        query.params.img_height as usize,
        query.params.img_width as usize,
        query.params.img_channels as usize,
    )?;

    let structure_path = model_structure_path(&config.plaintext_experiment_path, &query.params.dataset, &query.params.model);
    let weights_path = model_weights_path(&config.plaintext_experiment_path, &query.params.dataset, &query.params.model);

    let structure_json = std::fs::read_to_string(&structure_path).map_err(|source| WorkerError::ModelIo {
        path: structure_path.clone(),
        source,
    })?;
    let descriptor = TopologyDescriptor::parse(&structure_json)?;
    let weights = WeightsStore::load(&weights_path)?;

    let mut options = CompileOptions::new(query.params.opt_level);
    options.gap_always_folds = true;

    let plan = hecnn_compiler::compile(&engine, &descriptor, &weights, options, scale_bits, level_budget, &relin_key)?;

    let output = hecnn_executor::execute(&engine, scale_bits, &plan, input_tensor)?;

    let output_bytes: Result<Vec<_>, _> = output.iter().map(codec::ciphertext_to_bytes).collect();
    Ok(output_bytes?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_paths_match_dataset_model_saved_models_layout() {
        let root = Path::new("./experiments");
        assert_eq!(
            model_structure_path(root, "MNIST", "HCNN-DA"),
            root.join("MNIST").join("saved_models").join("HCNN-DA_structure.json")
        );
        assert_eq!(
            model_weights_path(root, "MNIST", "HCNN-DA"),
            root.join("MNIST").join("saved_models").join("HCNN-DA_weights.bin")
        );
    }

    #[test]
    fn default_worker_config_runs_two_threads_with_a_hundred_millisecond_retry() {
        let config = WorkerConfig::default();
        assert_eq!(config.thread_num, 2);
        assert_eq!(config.poll_interval, Duration::from_millis(100));
    }
}
