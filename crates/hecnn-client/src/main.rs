// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Client binary entrypoint. Dataset loading is explicitly out of scope
//! per spec.md §1 ("dataset loaders" named as an external collaborator),
//! so this binary encrypts a zero-valued input of the declared shape
//! rather than reading a real image — enough to exercise key-gen,
//! registration, submission, and the result subscriber end to end.

use std::time::Duration;

use clap::Parser;
use hecnn_client::ClientKeys;
use hecnn_config::{ClientArgs, ClientConfig};
use hecnn_model::{ComputationParams, EncryptionParameters, Query};
use tracing::info;

/// Demo input shape used when no dataset loader is wired in: MNIST's
/// 28×28 grayscale images, 10 output classes.
const DEMO_IMG_HEIGHT: u32 = 28;
const DEMO_IMG_WIDTH: u32 = 28;
const DEMO_IMG_CHANNELS: u32 = 1;
const DEMO_LABEL_COUNT: u32 = 10;

const DEFAULT_RING_DEGREE_POWER: u32 = 14;
const DEFAULT_LEVEL_COUNT: u32 = 4;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ClientArgs::parse();
    hecnn_logger::init("hecnn_client=info");

    let opt_level = args
        .parsed_opt_level()
        .ok_or_else(|| anyhow::anyhow!("invalid --opt-level {}", args.opt_level))?;
    let activation = args
        .resolved_activation()
        .ok_or_else(|| anyhow::anyhow!("could not resolve an activation family from --activation or --model"))?;

    let (power, level) = match &args.config_filepath {
        Some(path) => {
            let config = ClientConfig::load(path)?;
            (config.power.unwrap_or(DEFAULT_RING_DEGREE_POWER), config.level.unwrap_or(DEFAULT_LEVEL_COUNT))
        }
        None => (DEFAULT_RING_DEGREE_POWER, DEFAULT_LEVEL_COUNT),
    };
    let params = EncryptionParameters::standard_profile(1u64 << power, level);

    info!(degree = params.degree, level_budget = params.level_budget(), "generating key pair");
    let key_id = 1;
    let keys = ClientKeys::generate(key_id, params)?;

    let computation_params = ComputationParams {
        img_height: DEMO_IMG_HEIGHT,
        img_width: DEMO_IMG_WIDTH,
        img_channels: DEMO_IMG_CHANNELS,
        label_count: DEMO_LABEL_COUNT,
        dataset: args.dataset.clone(),
        model: args.model.clone(),
        opt_level,
        activation,
    };

    let zero_input = vec![0.0_f64; computation_params.input_len()];
    let input_ciphertexts = keys.encrypt_inputs(&zero_input)?;
    let query = Query::new(key_id, computation_params, input_ciphertexts)?;

    let mut conn = hecnn_client::ClientConnection::connect(&args.host, args.port).await?;
    conn.register_keys(&keys.bundle).await?;
    let query_id = conn.submit_query(&query).await?;
    info!(query_id = %query_id, "query submitted");

    let (tx, rx) = tokio::sync::oneshot::channel();
    let subscriber = hecnn_client::spawn_result_subscriber(
        args.host.clone(),
        args.port,
        query_id,
        Duration::from_millis(200),
        Box::new(move |_id, success, outputs| {
            let _ = tx.send((success, outputs));
        }),
    );

    let (success, output_ciphertexts) = rx.await?;
    subscriber.join().await;

    if !success {
        anyhow::bail!("query {query_id} failed on the server");
    }

    let scores = keys.decrypt_outputs(&output_ciphertexts)?;
    let argmax = scores
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(idx, _)| idx);

    println!("scores: {scores:?}");
    println!("predicted label: {argmax:?}");

    Ok(())
}
