// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Weights store: this system's own flat binary format, replacing the
//! original's HDF5 file (`examples/original_source/pp_cnn/src/cnn/load_model.cpp`'s
//! `H5File`/`Group`/`DataSet`), which is not in the teacher's or pack's
//! dependency stack — see SPEC_FULL.md §6's Open Question resolution.
//!
//! Layout: a `bincode`-encoded index (`HashMap<String, TensorMeta>`) length
//! prefixed by a little-endian `u64`, followed by the concatenated raw
//! little-endian `f32` bodies the index's offsets point into. Tensors are
//! addressed by the same `/<layer-name>/<layer-name>/<key>` path convention
//! as the original (e.g. `/conv2d/conv2d/kernel:0`).

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use hecnn_model::CoreError;
use serde::{Deserialize, Serialize};

pub const KERNEL_KEY: &str = "kernel:0";
pub const BIAS_KEY: &str = "bias:0";
pub const BETA_KEY: &str = "beta:0";
pub const GAMMA_KEY: &str = "gamma:0";
pub const MOVING_MEAN_KEY: &str = "moving_mean:0";
pub const MOVING_VARIANCE_KEY: &str = "moving_variance:0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TensorMeta {
    pub shape: Vec<usize>,
    pub offset: usize,
    pub len: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WeightsIndex {
    pub tensors: HashMap<String, TensorMeta>,
}

pub struct WeightsStore {
    index: WeightsIndex,
    body: Vec<u8>,
}

pub fn layer_path(layer_name: &str, key: &str) -> String {
    format!("/{layer_name}/{layer_name}/{key}")
}

impl WeightsStore {
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let raw = fs::read(path)?;
        if raw.len() < 8 {
            return Err(CoreError::MissingWeights(format!(
                "{}: file shorter than index length prefix",
                path.display()
            )));
        }
        let index_len = u64::from_le_bytes(raw[0..8].try_into().unwrap()) as usize;
        let index_bytes = raw
            .get(8..8 + index_len)
            .ok_or_else(|| CoreError::MissingWeights(format!("{}: truncated index", path.display())))?;
        let index: WeightsIndex = bincode::deserialize(index_bytes).map_err(CoreError::Codec)?;
        let body = raw[8 + index_len..].to_vec();
        Ok(Self { index, body })
    }

    /// Serializes `(index, body)` into the on-disk layout this loader reads.
    /// Used by test fixtures and the offline weight-export tooling.
    pub fn write(path: &Path, index: &WeightsIndex, body: &[u8]) -> Result<(), CoreError> {
        let index_bytes = bincode::serialize(index).map_err(CoreError::Codec)?;
        let mut out = Vec::with_capacity(8 + index_bytes.len() + body.len());
        out.extend_from_slice(&(index_bytes.len() as u64).to_le_bytes());
        out.extend_from_slice(&index_bytes);
        out.extend_from_slice(body);
        fs::write(path, out).map_err(CoreError::Io)
    }

    pub fn tensor(&self, path: &str) -> Result<Vec<f32>, CoreError> {
        let meta = self
            .index
            .tensors
            .get(path)
            .ok_or_else(|| CoreError::MissingWeights(path.to_string()))?;
        let start = meta.offset;
        let end = start + meta.len * 4;
        let bytes = self
            .body
            .get(start..end)
            .ok_or_else(|| CoreError::MissingWeights(format!("{path}: tensor body out of range")))?;
        Ok(bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes(c.try_into().unwrap()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_index(entries: &[(&str, Vec<usize>, Vec<f32>)]) -> (WeightsIndex, Vec<u8>) {
        let mut index = WeightsIndex::default();
        let mut body = Vec::new();
        for (name, shape, values) in entries {
            let offset = body.len();
            for v in values {
                body.extend_from_slice(&v.to_le_bytes());
            }
            index.tensors.insert(
                name.to_string(),
                TensorMeta {
                    shape: shape.clone(),
                    offset,
                    len: values.len(),
                },
            );
        }
        (index, body)
    }

    #[test]
    fn round_trips_a_tensor_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.bin");
        let (index, body) = make_index(&[(&layer_path("conv2d", KERNEL_KEY), vec![2, 2], vec![1.0, 2.0, 3.0, 4.0])]);
        WeightsStore::write(&path, &index, &body).unwrap();

        let store = WeightsStore::load(&path).unwrap();
        let tensor = store.tensor(&layer_path("conv2d", KERNEL_KEY)).unwrap();
        assert_eq!(tensor, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn missing_tensor_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.bin");
        let (index, body) = make_index(&[]);
        WeightsStore::write(&path, &index, &body).unwrap();
        let store = WeightsStore::load(&path).unwrap();
        assert!(store.tensor("/nope/nope/kernel:0").is_err());
    }
}
