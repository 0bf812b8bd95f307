//! Consensus-specific types
//!
//! This module defines the configuration of a consensus instance and the
//! result returned for every connected block.

use std::fs;
use std::path::Path;

use consensus_core::config::params::Params;
use consensus_core::errors::ConfigError;
use consensus_core::{BlueWorkType, Hash};
use serde::{Deserialize, Serialize};

/// Capacities of the per-store read caches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSizes {
    pub headers: usize,
    pub relations: usize,
    pub ghostdag: usize,
    pub reachability: usize,
    pub utxo_set: usize,
}

impl Default for CacheSizes {
    fn default() -> Self {
        Self { headers: 10_000, relations: 50_000, ghostdag: 50_000, reachability: 100_000, utxo_set: 100_000 }
    }
}

/// Consensus configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    pub params: Params,
    pub cache: CacheSizes,
}

impl ConsensusConfig {
    pub fn new(params: Params) -> Self {
        Self { params, cache: CacheSizes::default() }
    }

    /// Load configuration from a TOML file, falling back to defaults when the file is absent
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ConsensusConfig = toml::from_str(content)?;
        config.params.validate()?;
        Ok(config)
    }
}

/// Block processing result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockProcessingResult {
    pub hash: Hash,
    pub selected_parent: Hash,
    pub blue_score: u64,
    pub blue_work: BlueWorkType,
    pub mergeset_blues: Vec<Hash>,
    pub mergeset_reds: Vec<Hash>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_overrides_nested_sections() {
        let config = ConsensusConfig::from_toml_str("[params]\nghostdag_k = 7\n\n[cache]\nheaders = 12").unwrap();
        assert_eq!(config.params.ghostdag_k, 7);
        assert_eq!(config.cache.headers, 12);
        assert_eq!(config.cache.ghostdag, CacheSizes::default().ghostdag);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConsensusConfig::load(&dir.path().join("consensus.toml")).unwrap();
        assert_eq!(config, ConsensusConfig::default());
    }

    #[test]
    fn invalid_params_are_rejected() {
        assert!(matches!(ConsensusConfig::from_toml_str("[params]\nmax_block_parents = 0"), Err(ConfigError::InvalidValue(..))));
    }
}
