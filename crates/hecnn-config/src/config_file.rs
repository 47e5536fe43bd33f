// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Client-side config file: `key = value` lines, `#` comments, per spec.md
//! §6, grounded in `examples/original_source/ppcnn/ppcnn_client/ppcnn_config.cpp`'s
//! hand-rolled line parser. SPEC_FULL.md §4 calls this out explicitly as
//! *not* the teacher's layered `figment`/YAML config (`e3-config`) — this
//! system's client surface is one flat file with two recognized keys, too
//! small to justify a config-layering crate.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("reading config file {path}: {source}")]
    Io { path: String, source: std::io::Error },

    #[error("{path}:{line}: expected 'key = value', found '{text}'")]
    Malformed { path: String, line: usize, text: String },

    #[error("{path}: key '{key}' value '{value}' is not a valid integer")]
    NotAnInteger { path: String, key: String, value: String },
}

/// Parsed client config file. `power` is the ring-degree exponent (the
/// actual degree is `2^power`); `level` is the multiplicative level count
/// used to build the standard `[50, 30, ..., 30, 50]` modulus-chain profile
/// — both per spec.md §6's recognized-keys list. Unrecognized keys are kept
/// verbatim in `extra` rather than rejected, matching the original's
/// tolerant `unordered_map<string,string>` store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
    pub power: Option<u32>,
    pub level: Option<u32>,
    pub extra: HashMap<String, String>,
}

impl ClientConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigFileError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigFileError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text, &path.display().to_string())
    }

    /// Parses the `key = value` grammar directly, for use by tests and by
    /// `load` alike.
    pub fn parse(text: &str, path_label: &str) -> Result<Self, ConfigFileError> {
        let mut config = ClientConfig::default();

        for (idx, raw_line) in text.lines().enumerate() {
            let line = raw_line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(ConfigFileError::Malformed {
                    path: path_label.to_string(),
                    line: idx + 1,
                    text: raw_line.to_string(),
                });
            };
            let key = key.trim();
            let value = value.trim().trim_matches(',').trim();

            match key {
                "power" => {
                    config.power = Some(parse_u32(path_label, key, value)?);
                }
                "level" => {
                    config.level = Some(parse_u32(path_label, key, value)?);
                }
                other => {
                    config.extra.insert(other.to_string(), value.to_string());
                }
            }
        }

        Ok(config)
    }
}

fn parse_u32(path_label: &str, key: &str, value: &str) -> Result<u32, ConfigFileError> {
    value.parse::<u32>().map_err(|_| ConfigFileError::NotAnInteger {
        path: path_label.to_string(),
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_recognized_keys() {
        let text = "# a comment\npower = 14\nlevel = 4\n";
        let config = ClientConfig::parse(text, "<test>").unwrap();
        assert_eq!(config.power, Some(14));
        assert_eq!(config.level, Some(4));
        assert!(config.extra.is_empty());
    }

    #[test]
    fn tolerates_trailing_comment_and_comma() {
        let text = "level = 8, # interior primes\n";
        let config = ClientConfig::parse(text, "<test>").unwrap();
        assert_eq!(config.level, Some(8));
    }

    #[test]
    fn unrecognized_keys_land_in_extra() {
        let text = "dataset = mnist\n";
        let config = ClientConfig::parse(text, "<test>").unwrap();
        assert_eq!(config.extra.get("dataset"), Some(&"mnist".to_string()));
    }

    #[test]
    fn blank_and_comment_only_lines_are_skipped() {
        let text = "\n# just a comment\n   \nlevel = 2\n";
        let config = ClientConfig::parse(text, "<test>").unwrap();
        assert_eq!(config.level, Some(2));
    }

    #[test]
    fn malformed_line_without_equals_errors() {
        let text = "not-a-kv-pair\n";
        let result = ClientConfig::parse(text, "<test>");
        assert!(matches!(result, Err(ConfigFileError::Malformed { line: 1, .. })));
    }

    #[test]
    fn non_integer_value_for_recognized_key_errors() {
        let text = "power = not-a-number\n";
        let result = ClientConfig::parse(text, "<test>");
        assert!(matches!(result, Err(ConfigFileError::NotAnInteger { .. })));
    }

    #[test]
    fn loads_from_a_real_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.conf");
        fs::write(&path, "power = 13\nlevel = 3\n").unwrap();
        let config = ClientConfig::load(&path).unwrap();
        assert_eq!(config.power, Some(13));
        assert_eq!(config.level, Some(3));
    }
}
