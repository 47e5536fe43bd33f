// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Topology descriptor: the JSON-shaped network structure, per spec.md §6,
//! grounded in `examples/original_source/pp_cnn/src/cnn/load_model.cpp`'s
//! `loadLayers`/`buildLayer` family. Unlike the original's picojson (which
//! silently yields default-constructed values for missing keys), this parser
//! validates array lengths eagerly at parse time — SPEC_FULL.md §4.4's
//! supplement.

use hecnn_model::CoreError;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct TopologyDescriptor {
    pub config: Vec<LayerEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LayerEntry {
    pub class_name: String,
    pub config: LayerConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LayerConfig {
    pub name: Option<String>,
    pub batch_input_shape: Option<Vec<Option<u64>>>,
    pub filters: Option<u64>,
    pub kernel_size: Option<[u64; 2]>,
    pub strides: Option<[u64; 2]>,
    pub padding: Option<String>,
    pub activation: Option<String>,
    pub pool_size: Option<[u64; 2]>,
    pub units: Option<u64>,
}

impl TopologyDescriptor {
    pub fn parse(json: &str) -> Result<Self, CoreError> {
        serde_json::from_str(json).map_err(|e| CoreError::InvalidTopology(format!("malformed descriptor JSON: {e}")))
    }
}

impl LayerConfig {
    pub fn name(&self) -> Result<&str, CoreError> {
        self.name
            .as_deref()
            .ok_or_else(|| CoreError::InvalidTopology("layer entry missing 'name'".into()))
    }

    pub fn filters_or_err(&self) -> Result<usize, CoreError> {
        self.filters
            .map(|v| v as usize)
            .ok_or_else(|| CoreError::InvalidTopology(format!("{}: missing 'filters'", self.name_or_unknown())))
    }

    pub fn kernel_size_or_err(&self) -> Result<(usize, usize), CoreError> {
        self.kernel_size
            .map(|[h, w]| (h as usize, w as usize))
            .ok_or_else(|| CoreError::InvalidTopology(format!("{}: missing 'kernel_size'", self.name_or_unknown())))
    }

    pub fn strides_or_err(&self) -> Result<(usize, usize), CoreError> {
        self.strides
            .map(|[h, w]| (h as usize, w as usize))
            .ok_or_else(|| CoreError::InvalidTopology(format!("{}: missing 'strides'", self.name_or_unknown())))
    }

    pub fn pool_size_or_err(&self) -> Result<(usize, usize), CoreError> {
        self.pool_size
            .map(|[h, w]| (h as usize, w as usize))
            .ok_or_else(|| CoreError::InvalidTopology(format!("{}: missing 'pool_size'", self.name_or_unknown())))
    }

    pub fn units_or_err(&self) -> Result<usize, CoreError> {
        self.units
            .map(|v| v as usize)
            .ok_or_else(|| CoreError::InvalidTopology(format!("{}: missing 'units'", self.name_or_unknown())))
    }

    pub fn padding_or_err(&self) -> Result<hecnn_layers::Padding, CoreError> {
        let raw = self
            .padding
            .as_deref()
            .ok_or_else(|| CoreError::InvalidTopology(format!("{}: missing 'padding'", self.name_or_unknown())))?;
        hecnn_layers::Padding::parse(raw)
            .ok_or_else(|| CoreError::InvalidTopology(format!("{}: unknown padding '{raw}'", self.name_or_unknown())))
    }

    /// `batch_input_shape` is only present on the first layer; absence is
    /// not an error (the compiler threads the running shape from the
    /// previous layer instead, matching the original's `catch` fallback).
    pub fn batch_input_shape(&self) -> Option<(usize, usize, usize)> {
        let shape = self.batch_input_shape.as_ref()?;
        if shape.len() < 4 {
            return None;
        }
        Some((
            shape[1]? as usize,
            shape[2]? as usize,
            shape[3]? as usize,
        ))
    }

    fn name_or_unknown(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_descriptor() {
        let json = r#"{
            "config": [
                {
                    "class_name": "Conv2D",
                    "config": {
                        "name": "conv2d",
                        "batch_input_shape": [null, 28, 28, 1],
                        "filters": 5,
                        "kernel_size": [5, 5],
                        "strides": [2, 2],
                        "padding": "same",
                        "activation": "linear"
                    }
                },
                {
                    "class_name": "Flatten",
                    "config": { "name": "flatten" }
                },
                {
                    "class_name": "Dense",
                    "config": { "name": "dense", "units": 10, "activation": "linear" }
                }
            ]
        }"#;
        let descriptor = TopologyDescriptor::parse(json).unwrap();
        assert_eq!(descriptor.config.len(), 3);
        assert_eq!(descriptor.config[0].class_name, "Conv2D");
        assert_eq!(descriptor.config[0].config.batch_input_shape(), Some((28, 28, 1)));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(TopologyDescriptor::parse("{not json").is_err());
    }
}
