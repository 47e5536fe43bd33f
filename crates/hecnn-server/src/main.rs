// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Server binary entrypoint: parses [`hecnn_config::ServerArgs`], wires up
//! the key registry, query/result queues, calculation worker pool, and the
//! TCP accept loop, then runs until `SIGTERM`. Graceful shutdown is
//! grounded in
//! `examples/gnosisguild-enclave/crates/entrypoint/src/helpers/shutdown.rs`'s
//! `listen_for_shutdown`, adapted from its actor-bus `Shutdown` dispatch to
//! this system's plain `tokio::task::JoinHandle` abort.

use std::time::Duration;

use clap::Parser;
use hecnn_config::ServerArgs;
use tokio::net::TcpListener;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServerArgs::parse();
    hecnn_logger::init("hecnn_server=info,hecnn_worker=info,hecnn_queue=info");

    info!(
        port = args.port,
        max_concurrent_queries = args.max_concurrent_queries,
        max_results = args.max_results,
        worker_threads = args.worker_threads,
        "starting hecnn-server"
    );

    let ctx = hecnn_server::build_context(
        args.max_concurrent_queries,
        args.max_results,
        args.max_result_lifetime_sec,
        Duration::from_millis(100),
    );

    hecnn_worker::spawn_workers(
        hecnn_worker::WorkerConfig::new(args.worker_threads, args.plaintext_experiment_path.clone()),
        ctx.query_queue.clone(),
        ctx.result_queue.clone(),
        ctx.registry.clone(),
    );
    hecnn_server::spawn_result_sweep(ctx.result_queue.clone(), Duration::from_secs(60));

    let listener = TcpListener::bind(("0.0.0.0", args.port)).await?;
    info!(addr = %listener.local_addr()?, "listening");

    let accept_handle = tokio::spawn(async move { hecnn_server::accept_loop(listener, ctx).await });

    listen_for_shutdown(accept_handle).await;
    Ok(())
}

async fn listen_for_shutdown(mut handle: tokio::task::JoinHandle<std::io::Result<()>>) {
    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    tokio::select! {
        _ = sigterm.recv() => {
            info!("SIGTERM received, shutting down");
            handle.abort();
            let _ = handle.await;
        }
        result = &mut handle => {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(err)) => error!(error = %err, "accept loop exited with an error"),
                Err(err) => error!(error = %err, "accept loop task panicked"),
            }
        }
    }
}
