/// Algorithm Registry
///
/// Chooses the ranking strategy for a request: an explicit known name wins,
/// otherwise the caller's identity is bucketed into the feed experiment.
pub mod sampling;
pub mod scoring;

pub use sampling::SamplingAlgorithm;
pub use scoring::ScoringAlgorithm;

use crate::config::RankingSettings;
use crate::models::{RankableItem, RankedId};
use crate::services::experiments::{assign_bucket, Experiment, FeedIdentity};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlgorithmName {
    #[default]
    Scoring,
    Sampling,
}

impl AlgorithmName {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlgorithmName::Scoring => "scoring",
            AlgorithmName::Sampling => "sampling",
        }
    }
}

impl fmt::Display for AlgorithmName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlgorithmName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scoring" => Ok(AlgorithmName::Scoring),
            "sampling" => Ok(AlgorithmName::Sampling),
            other => Err(format!("unknown ranking algorithm: {}", other)),
        }
    }
}

/// A ranking strategy.
pub trait RankingAlgorithm: Send + Sync {
    fn name(&self) -> AlgorithmName;

    /// Ordered ids (with metadata when the strategy is auditable), at most
    /// `total_items` long.
    fn rank_items(
        &self,
        items: &[RankableItem],
        total_items: usize,
        settings: &RankingSettings,
    ) -> Vec<RankedId>;
}

/// Resolve which algorithm should serve a request.
///
/// `requested` may be a known name, `"auto"`, or absent. Unknown names fall
/// back to `default` rather than failing the feed.
pub fn resolve_algorithm(
    requested: Option<&str>,
    identity: &FeedIdentity,
    experiment: &Experiment,
    default: AlgorithmName,
) -> AlgorithmName {
    match requested.map(str::trim).filter(|r| !r.is_empty()) {
        Some(r) if r.eq_ignore_ascii_case("auto") => {}
        Some(r) => {
            return match r.parse::<AlgorithmName>() {
                Ok(name) => name,
                Err(e) => {
                    warn!(requested = r, error = %e, fallback = %default, "Falling back to default algorithm");
                    default
                }
            };
        }
        None => {}
    }

    match identity.key() {
        Some(key) => {
            let variant = assign_bucket(key, experiment);
            debug!(
                experiment = %experiment.name,
                variant = %variant.name,
                algorithm = %variant.algorithm,
                "Resolved experiment arm"
            );
            variant.algorithm
        }
        None => default,
    }
}

/// Build a fresh, request-scoped algorithm instance.
pub fn build_algorithm(name: AlgorithmName, sampling_seed: Option<u64>) -> Box<dyn RankingAlgorithm> {
    match name {
        AlgorithmName::Scoring => Box::new(ScoringAlgorithm::new()),
        AlgorithmName::Sampling => Box::new(SamplingAlgorithm::new(sampling_seed)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn experiment() -> Experiment {
        Experiment::default_feed_experiment("feed-ranking-algorithm")
    }

    #[test]
    fn test_parse_algorithm_name() {
        assert_eq!("scoring".parse::<AlgorithmName>(), Ok(AlgorithmName::Scoring));
        assert_eq!(" Sampling ".parse::<AlgorithmName>(), Ok(AlgorithmName::Sampling));
        assert!("ucb".parse::<AlgorithmName>().is_err());
    }

    #[test]
    fn test_explicit_name_wins() {
        let identity = FeedIdentity::user("u1");
        for _ in 0..3 {
            assert_eq!(
                resolve_algorithm(Some("sampling"), &identity, &experiment(), AlgorithmName::Scoring),
                AlgorithmName::Sampling
            );
        }
    }

    #[test]
    fn test_unknown_name_falls_back_to_default() {
        let identity = FeedIdentity::user("u1");
        assert_eq!(
            resolve_algorithm(Some("mystery"), &identity, &experiment(), AlgorithmName::Scoring),
            AlgorithmName::Scoring
        );
    }

    #[test]
    fn test_auto_uses_experiment_bucket() {
        let exp = experiment();
        let identity = FeedIdentity::client("anon-42");
        let expected = assign_bucket("anon-42", &exp).algorithm;

        assert_eq!(
            resolve_algorithm(Some("auto"), &identity, &exp, AlgorithmName::Scoring),
            expected
        );
        assert_eq!(
            resolve_algorithm(None, &identity, &exp, AlgorithmName::Scoring),
            expected
        );
    }

    #[test]
    fn test_no_identity_uses_default() {
        assert_eq!(
            resolve_algorithm(None, &FeedIdentity::default(), &experiment(), AlgorithmName::Sampling),
            AlgorithmName::Sampling
        );
    }

    #[test]
    fn test_build_algorithm() {
        assert_eq!(build_algorithm(AlgorithmName::Scoring, None).name(), AlgorithmName::Scoring);
        assert_eq!(build_algorithm(AlgorithmName::Sampling, Some(7)).name(), AlgorithmName::Sampling);
    }
}
