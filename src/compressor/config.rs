//! Compressor configuration.

use serde::{Deserialize, Serialize};

use crate::compressor::error::{CompressorError, Result};

/// Capacity of newly allocated clusters unless configured otherwise.
pub const DEFAULT_CLUSTER_CAPACITY: u64 = 512;

/// Largest cluster capacity a compressor accepts.
pub const MAX_CLUSTER_CAPACITY: u64 = 1 << 20;

/// Tunables of an `IdCompressor`.
///
/// Every peer of a document must use the same values, so they have to be agreed
/// through the sequencer before they are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompressorConfig {
    /// Number of final ids reserved for each newly allocated cluster.
    pub cluster_capacity: u64,
}

impl Default for CompressorConfig {
    fn default() -> Self {
        CompressorConfig {
            cluster_capacity: DEFAULT_CLUSTER_CAPACITY,
        }
    }
}

impl CompressorConfig {
    pub fn with_cluster_capacity(cluster_capacity: u64) -> Self {
        CompressorConfig { cluster_capacity }
    }

    pub fn validate(&self) -> Result<()> {
        validate_cluster_capacity(self.cluster_capacity)
    }
}

pub(crate) fn validate_cluster_capacity(capacity: u64) -> Result<()> {
    if capacity == 0 || capacity > MAX_CLUSTER_CAPACITY {
        return Err(CompressorError::InvalidClusterCapacity {
            capacity,
            max: MAX_CLUSTER_CAPACITY,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = CompressorConfig::default();
        assert_eq!(config.cluster_capacity, DEFAULT_CLUSTER_CAPACITY);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_capacity_bounds() {
        assert!(CompressorConfig::with_cluster_capacity(0).validate().is_err());
        assert!(CompressorConfig::with_cluster_capacity(1).validate().is_ok());
        assert!(
            CompressorConfig::with_cluster_capacity(MAX_CLUSTER_CAPACITY)
                .validate()
                .is_ok()
        );
        assert_eq!(
            CompressorConfig::with_cluster_capacity(MAX_CLUSTER_CAPACITY + 1).validate(),
            Err(CompressorError::InvalidClusterCapacity {
                capacity: MAX_CLUSTER_CAPACITY + 1,
                max: MAX_CLUSTER_CAPACITY,
            })
        );
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: CompressorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, CompressorConfig::default());
        let config: CompressorConfig = serde_json::from_str(r#"{"clusterCapacity":8}"#).unwrap();
        assert_eq!(config.cluster_capacity, 8);
    }
}
