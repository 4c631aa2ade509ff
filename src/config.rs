//! RAID system configuration
//!
//! Shard geometry for a [`RaidSystem`](crate::ec::RaidSystem). Can be built
//! in code or loaded from YAML:
//!
//! ```yaml
//! dataShards: 5
//! parityShards: 5
//! shardCapacity: 4096
//! ```

use crate::ec::galois::FIELD_SIZE;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default per-shard buffer capacity in bytes
pub const DEFAULT_SHARD_CAPACITY: usize = 4096;

/// Shard geometry of an erasure-coded disk array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaidConfig {
    /// Number of data shards (k)
    pub data_shards: usize,

    /// Number of parity shards (m)
    pub parity_shards: usize,

    /// Maximum size of a single shard buffer in bytes
    #[serde(default = "default_shard_capacity")]
    pub shard_capacity: usize,
}

fn default_shard_capacity() -> usize {
    DEFAULT_SHARD_CAPACITY
}

impl RaidConfig {
    /// Create a configuration with the default shard capacity
    pub fn new(data_shards: usize, parity_shards: usize) -> Self {
        Self {
            data_shards,
            parity_shards,
            shard_capacity: DEFAULT_SHARD_CAPACITY,
        }
    }

    /// Override the shard capacity
    pub fn with_shard_capacity(mut self, shard_capacity: usize) -> Self {
        self.shard_capacity = shard_capacity;
        self
    }

    /// Total number of shards (k + m)
    #[inline]
    pub fn total_shards(&self) -> usize {
        self.data_shards + self.parity_shards
    }

    /// Storage overhead as a ratio (total / data)
    #[inline]
    pub fn overhead_ratio(&self) -> f64 {
        self.total_shards() as f64 / self.data_shards as f64
    }

    /// Storage efficiency as a percentage
    #[inline]
    pub fn efficiency(&self) -> f64 {
        self.data_shards as f64 / self.total_shards() as f64 * 100.0
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.data_shards == 0 {
            return Err(Error::InvalidConfiguration(
                "data_shards must be >= 1".into(),
            ));
        }

        if self.parity_shards == 0 {
            return Err(Error::InvalidConfiguration(
                "parity_shards must be >= 1".into(),
            ));
        }

        if self.total_shards() > FIELD_SIZE {
            return Err(Error::InvalidConfiguration(format!(
                "total shards (k + m) must be <= {} for GF(2^8), got {}",
                FIELD_SIZE,
                self.total_shards()
            )));
        }

        if self.shard_capacity == 0 {
            return Err(Error::InvalidConfiguration(
                "shard_capacity must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::Config(format!("Failed to parse RAID config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&contents)
    }
}

impl Default for RaidConfig {
    fn default() -> Self {
        Self::new(4, 2)
    }
}

// =============================================================================
// Tests
// =============================================================================
