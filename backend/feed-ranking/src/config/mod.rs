pub mod ranking;

pub use ranking::{
    DiversityConstraints, GuaranteedSlots, PostScoringConfig, RankingConfig, ThreadScoringConfig,
};

use crate::error::Result;
use crate::models::FeedSource;
use crate::services::algorithms::AlgorithmName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

const ENV_PREFIX: &str = "FEED_RANKING_";

/// Process-level engine configuration, read once at startup.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_experiment_name")]
    pub experiment_name: String,
    /// Used when no experiment arm can be resolved.
    #[serde(default)]
    pub default_algorithm: AlgorithmName,
    /// Upper bound on candidates per request; the rest is dropped.
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
    /// Fixes the sampling arm's random source (replays, debugging).
    #[serde(default)]
    pub sampling_seed: Option<u64>,
}

fn default_experiment_name() -> String {
    "feed-ranking-algorithm".to_string()
}

fn default_max_candidates() -> usize {
    2000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            experiment_name: default_experiment_name(),
            default_algorithm: AlgorithmName::default(),
            max_candidates: default_max_candidates(),
            sampling_seed: None,
        }
    }
}

impl EngineConfig {
    /// Load from `FEED_RANKING_*` environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let config = envy::prefixed(ENV_PREFIX).from_env::<EngineConfig>()?;
        Ok(config)
    }
}

/// Per-request settings supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RankingSettings {
    /// Bucket weights for the sampling algorithm.
    pub source_weights: BTreeMap<FeedSource, f64>,
    /// Overrides for the scoring algorithm.
    pub unified_scoring: UnifiedScoringSettings,
}

impl Default for RankingSettings {
    fn default() -> Self {
        Self {
            source_weights: default_source_weights(),
            unified_scoring: UnifiedScoringSettings::default(),
        }
    }
}

pub fn default_source_weights() -> BTreeMap<FeedSource, f64> {
    BTreeMap::from([
        (FeedSource::Subscriptions, 20.0),
        (FeedSource::PostThreads, 20.0),
        (FeedSource::CommentThreads, 40.0),
        (FeedSource::Spotlights, 1.0),
        (FeedSource::Bookmarks, 1.0),
    ])
}

/// Partial JSON documents shaped like [`RankingConfig`] and
/// [`DiversityConstraints`]; absent fields keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UnifiedScoringSettings {
    pub ranking: serde_json::Value,
    pub diversity: serde_json::Value,
}

impl UnifiedScoringSettings {
    pub fn ranking_config(&self) -> RankingConfig {
        apply_overrides(&self.ranking, "ranking")
    }

    pub fn diversity_constraints(&self) -> DiversityConstraints {
        apply_overrides(&self.diversity, "diversity")
    }
}

/// Malformed overrides fall back to the defaults rather than failing a feed.
fn apply_overrides<T>(overrides: &serde_json::Value, section: &str) -> T
where
    T: Default + serde::de::DeserializeOwned,
{
    if overrides.is_null() {
        return T::default();
    }

    match serde_json::from_value(overrides.clone()) {
        Ok(config) => config,
        Err(e) => {
            warn!(section = section, error = %e, "Ignoring malformed scoring overrides");
            T::default()
        }
    }
}
