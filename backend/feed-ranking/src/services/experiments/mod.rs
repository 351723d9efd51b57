// ============================================
// Feed Algorithm Experiments
// ============================================
//
// Deterministic bucketing of a caller into an experiment arm.
// Assignment is recomputed from a stable hash on every call; nothing is
// cached, so the same identity lands in the same arm for as long as the
// experiment definition is unchanged.

use crate::error::{RankingError, Result};
use crate::services::algorithms::AlgorithmName;
use crate::utils::sha256;
use serde::{Deserialize, Serialize};

/// Experiment definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    pub name: String,
    pub variants: Vec<ExperimentVariant>,
}

/// Experiment arm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentVariant {
    pub name: String,
    pub allocation: u8, // Percentage (0-100)
    pub algorithm: AlgorithmName,
}

impl Experiment {
    /// Build an experiment, rejecting allocations that don't add up to 100.
    pub fn new(name: impl Into<String>, variants: Vec<ExperimentVariant>) -> Result<Self> {
        let name = name.into();

        if variants.is_empty() {
            return Err(RankingError::InvalidExperiment(format!(
                "Experiment {} has no variants",
                name
            )));
        }

        let total: u32 = variants.iter().map(|v| v.allocation as u32).sum();
        if total != 100 {
            return Err(RankingError::InvalidExperiment(format!(
                "Experiment {} allocations sum to {}, expected 100",
                name, total
            )));
        }

        Ok(Self { name, variants })
    }

    /// Scoring vs sampling, split evenly.
    pub fn default_feed_experiment(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variants: vec![
                ExperimentVariant {
                    name: "control".to_string(),
                    allocation: 50,
                    algorithm: AlgorithmName::Scoring,
                },
                ExperimentVariant {
                    name: "sampling".to_string(),
                    allocation: 50,
                    algorithm: AlgorithmName::Sampling,
                },
            ],
        }
    }
}

/// Who is asking for the feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedIdentity {
    pub user_id: Option<String>,
    /// Anonymous client id, used only when there is no user.
    pub client_id: Option<String>,
}

impl FeedIdentity {
    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            client_id: None,
        }
    }

    pub fn client(client_id: impl Into<String>) -> Self {
        Self {
            user_id: None,
            client_id: Some(client_id.into()),
        }
    }

    /// Bucketing key: the user id if authenticated, else the client id.
    pub fn key(&self) -> Option<&str> {
        self.user_id
            .as_deref()
            .or(self.client_id.as_deref())
            .filter(|k| !k.is_empty())
    }
}

/// Bucket in `0..100` for an identity within an experiment.
pub fn bucket_for(identity_key: &str, experiment_name: &str) -> u8 {
    let digest = sha256(format!("{}:{}", experiment_name, identity_key).as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(prefix) % 100) as u8
}

/// Consistent hashing into cumulative allocations.
pub fn assign_bucket<'a>(identity_key: &str, experiment: &'a Experiment) -> &'a ExperimentVariant {
    let bucket = bucket_for(identity_key, &experiment.name);

    let mut cumulative = 0u32;
    for variant in &experiment.variants {
        cumulative += variant.allocation as u32;
        if (bucket as u32) < cumulative {
            return variant;
        }
    }

    // Only reachable when allocations fall short of 100
    &experiment.variants[experiment.variants.len() - 1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(name: &str, allocation: u8, algorithm: AlgorithmName) -> ExperimentVariant {
        ExperimentVariant {
            name: name.to_string(),
            allocation,
            algorithm,
        }
    }

    #[test]
    fn test_bucket_assignment_deterministic() {
        let experiment = Experiment::default_feed_experiment("test_experiment");

        let first = assign_bucket("user-123", &experiment);
        for _ in 0..10 {
            assert_eq!(assign_bucket("user-123", &experiment), first);
        }
    }

    #[test]
    fn test_bucket_depends_on_experiment_name() {
        // Different experiments should not reuse the same split for everyone
        let differing = (0..200)
            .filter(|i| {
                let key = format!("user-{}", i);
                bucket_for(&key, "exp-a") != bucket_for(&key, "exp-b")
            })
            .count();
        assert!(differing > 100);
    }

    #[test]
    fn test_allocation_distribution() {
        let experiment = Experiment::new(
            "test_experiment",
            vec![
                variant("control", 50, AlgorithmName::Scoring),
                variant("variant_a", 30, AlgorithmName::Sampling),
                variant("variant_b", 20, AlgorithmName::Scoring),
            ],
        )
        .unwrap();

        let mut counts = [0usize; 3];
        for i in 0..10_000 {
            let assigned = assign_bucket(&format!("client-{}", i), &experiment);
            let idx = experiment
                .variants
                .iter()
                .position(|v| v == assigned)
                .unwrap();
            counts[idx] += 1;
        }

        assert!((4500..5500).contains(&counts[0]), "{:?}", counts);
        assert!((2500..3500).contains(&counts[1]), "{:?}", counts);
        assert!((1500..2500).contains(&counts[2]), "{:?}", counts);
    }

    #[test]
    fn test_invalid_allocation() {
        let result = Experiment::new(
            "broken",
            vec![
                variant("control", 60, AlgorithmName::Scoring),
                variant("variant_a", 60, AlgorithmName::Sampling),
            ],
        );
        assert!(matches!(result, Err(RankingError::InvalidExperiment(_))));

        let empty = Experiment::new("empty", Vec::new());
        assert!(matches!(empty, Err(RankingError::InvalidExperiment(_))));
    }

    #[test]
    fn test_identity_key_prefers_user() {
        let both = FeedIdentity {
            user_id: Some("u1".to_string()),
            client_id: Some("c1".to_string()),
        };
        assert_eq!(both.key(), Some("u1"));
        assert_eq!(FeedIdentity::client("c1").key(), Some("c1"));
        assert_eq!(FeedIdentity::default().key(), None);
        assert_eq!(FeedIdentity::user("").key(), None);
    }

    #[test]
    fn test_full_allocation_to_one_arm() {
        let experiment = Experiment::new(
            "all-sampling",
            vec![
                variant("control", 0, AlgorithmName::Scoring),
                variant("sampling", 100, AlgorithmName::Sampling),
            ],
        )
        .unwrap();

        for i in 0..100 {
            let assigned = assign_bucket(&format!("u{}", i), &experiment);
            assert_eq!(assigned.algorithm, AlgorithmName::Sampling);
        }
    }
}
