use crate::retriever::DEFAULT_BATCH_SIZE;
use crate::sampler::DEFAULT_SEED;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// When the engine builds a session with the query forced into the corpus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RebuildPolicy {
    /// Serve everything from the startup session
    Static,
    /// Rebuild only when the startup session has no matching title
    #[default]
    OnMiss,
    /// Rebuild for every request
    PerRequest,
}

/// Configuration for the recommendation engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub sample_size: usize,
    pub max_features: usize,
    pub batch_size: usize,
    pub seed: u64,
    /// Max entries in the title list served to clients
    pub title_limit: usize,
    pub rebuild_policy: RebuildPolicy,
    /// Max query-forced sessions kept around
    pub rebuild_cache_size: usize,
    pub default_top_n: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_size: 10_000,
            max_features: 3000,
            batch_size: DEFAULT_BATCH_SIZE,
            seed: DEFAULT_SEED,
            title_limit: 30_000,
            rebuild_policy: RebuildPolicy::OnMiss,
            rebuild_cache_size: 32,
            default_top_n: 5,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be positive".to_string()));
        }
        if self.max_features == 0 {
            return Err(Error::InvalidConfig("max_features must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.batch_size, 1000);
        assert_eq!(config.rebuild_policy, RebuildPolicy::OnMiss);
    }

    #[test]
    fn test_rejects_zero_sizes() {
        let config = EngineConfig { batch_size: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let config = EngineConfig { max_features: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_policy_serde_names() {
        let p: RebuildPolicy = serde_json::from_str("\"per-request\"").unwrap();
        assert_eq!(p, RebuildPolicy::PerRequest);
    }
}
