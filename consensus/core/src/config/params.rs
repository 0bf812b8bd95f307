use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::{
    config::genesis::GenesisBlock,
    constants::{GHOSTDAG_K, MAX_BLOCK_LEVEL, MAX_BLOCK_PARENTS, PAST_MEDIAN_TIME_WINDOW},
    errors::ConfigError,
    BlockLevel, KType,
};

/// Consensus parameters consumed by the DAG engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// The name of the network (e.g. "mainnet", "devnet")
    pub network: String,
    /// GHOSTDAG K: the maximum number of blue blocks in the anticone of a blue block
    pub ghostdag_k: KType,
    /// Maximum number of direct parents per block
    pub max_block_parents: usize,
    /// Highest DAG level a block may claim
    pub max_block_level: BlockLevel,
    /// Blocks sampled, from the block back along its selected chain, for the past median time
    pub past_median_time_window: usize,
    pub genesis: GenesisBlock,
}

impl Default for Params {
    fn default() -> Self {
        Self::mainnet()
    }
}

impl Params {
    pub fn mainnet() -> Self {
        Self {
            network: "mainnet".to_string(),
            ghostdag_k: GHOSTDAG_K,
            max_block_parents: MAX_BLOCK_PARENTS,
            max_block_level: MAX_BLOCK_LEVEL,
            past_median_time_window: PAST_MEDIAN_TIME_WINDOW,
            genesis: GenesisBlock::default(),
        }
    }

    /// Small K and an easy genesis target, for local networks and tests
    pub fn devnet() -> Self {
        Self {
            network: "devnet".to_string(),
            ghostdag_k: 3,
            max_block_parents: MAX_BLOCK_PARENTS,
            max_block_level: MAX_BLOCK_LEVEL,
            past_median_time_window: PAST_MEDIAN_TIME_WINDOW,
            genesis: GenesisBlock { bits: 0x207f_ffff, coinbase_payload: b"coinsec devnet genesis".to_vec(), ..GenesisBlock::default() },
        }
    }

    /// Load parameters from a TOML file if it exists, otherwise use the mainnet defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let params: Params = toml::from_str(content)?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ghostdag_k == 0 {
            return Err(ConfigError::InvalidValue("ghostdag_k", "must be positive".to_string()));
        }
        if self.max_block_parents == 0 {
            return Err(ConfigError::InvalidValue("max_block_parents", "must be positive".to_string()));
        }
        if self.past_median_time_window == 0 {
            return Err(ConfigError::InvalidValue("past_median_time_window", "must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_mainnet() {
        let dir = tempfile::tempdir().unwrap();
        let params = Params::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(params, Params::mainnet());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "network = \"devnet\"\nghostdag_k = 5\n\n[genesis]\nnonce = 42").unwrap();

        let params = Params::load(&path).unwrap();
        assert_eq!(params.network, "devnet");
        assert_eq!(params.ghostdag_k, 5);
        assert_eq!(params.max_block_parents, MAX_BLOCK_PARENTS);
        assert_eq!(params.past_median_time_window, PAST_MEDIAN_TIME_WINDOW);
        assert_eq!(params.genesis.nonce, 42);
        assert_eq!(params.genesis.bits, GenesisBlock::default().bits);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(Params::from_toml_str("ghostdag_k = 0"), Err(ConfigError::InvalidValue("ghostdag_k", _))));
        assert!(matches!(Params::from_toml_str("ghostdag_k = \"x\""), Err(ConfigError::Parse(_))));
        assert!(matches!(Params::from_toml_str("past_median_time_window = 0"), Err(ConfigError::InvalidValue("past_median_time_window", _))));
    }

    #[test]
    fn presets_differ() {
        assert_ne!(Params::mainnet().genesis.hash(), Params::devnet().genesis.hash());
        assert!(Params::devnet().validate().is_ok());
    }
}
