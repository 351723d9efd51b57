//! Scoring and diversity tunables.
//!
//! Every record derives `Default` plus `#[serde(default)]`, so a partial JSON
//! document deserializes into the defaults with only the given fields
//! replaced, nested records included.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RankingConfig {
    /// Added to every item before multipliers.
    pub starting_value: f64,
    /// Global cap applied after every other term.
    pub max_score: f64,
    pub posts: PostScoringConfig,
    pub threads: ThreadScoringConfig,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            starting_value: 1.0,
            max_score: 50.0,
            posts: PostScoringConfig::default(),
            threads: ThreadScoringConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostScoringConfig {
    pub type_multiplier: f64,
    pub subscribed_bonus: f64,
    // Hyperbolic decay: scale^exponent / (age + bias)^exponent
    pub time_decay_bias: f64,
    pub time_decay_scale: f64,
    pub time_decay_exponent: f64,
    // Ageless sources: karma^exponent / divisor
    pub karma_superlinear_exponent: f64,
    pub karma_divisor: f64,
    pub karma_max_bonus: f64,
}

impl Default for PostScoringConfig {
    fn default() -> Self {
        Self {
            type_multiplier: 1.0,
            subscribed_bonus: 2.0,
            time_decay_bias: 2.0,
            time_decay_scale: 24.0,
            time_decay_exponent: 1.1,
            karma_superlinear_exponent: 1.2,
            karma_divisor: 40.0,
            karma_max_bonus: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThreadScoringConfig {
    pub type_multiplier: f64,
    pub subscribed_comment_bonus: f64,
    pub engagement_participation_bonus: f64,
    pub engagement_voting_bonus: f64,
    pub engagement_viewing_bonus: f64,
    pub replies_to_you_bonus: f64,
    pub your_post_bonus: f64,
    pub quicktake_bonus: f64,
    pub read_post_context_bonus: f64,
    pub time_decay_bias: f64,
    pub time_decay_scale: f64,
    pub time_decay_exponent: f64,
    pub karma_max_bonus: f64,
    /// Fractional cut per recent serving, in `[0, 1)`.
    pub repetition_penalty_strength: f64,
    /// Serving age at which a serving's penalty is halved.
    pub repetition_decay_hours: f64,
}

impl Default for ThreadScoringConfig {
    fn default() -> Self {
        Self {
            type_multiplier: 1.0,
            subscribed_comment_bonus: 3.0,
            engagement_participation_bonus: 8.0,
            engagement_voting_bonus: 5.0,
            engagement_viewing_bonus: 2.0,
            replies_to_you_bonus: 10.0,
            your_post_bonus: 6.0,
            quicktake_bonus: 4.0,
            read_post_context_bonus: 3.0,
            time_decay_bias: 2.0,
            time_decay_scale: 12.0,
            time_decay_exponent: 1.1,
            karma_max_bonus: 20.0,
            repetition_penalty_strength: 0.8,
            repetition_decay_hours: 24.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GuaranteedSlots {
    pub window_size: usize,
    pub bookmarks: usize,
    pub spotlights: usize,
}

impl Default for GuaranteedSlots {
    fn default() -> Self {
        Self {
            window_size: 20,
            bookmarks: 1,
            spotlights: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiversityConstraints {
    pub max_consecutive_same_type: usize,
    pub guaranteed_slots_per_window: GuaranteedSlots,
    pub subscription_diversity_window: usize,
    pub source_diversity_window: usize,
}

impl Default for DiversityConstraints {
    fn default() -> Self {
        Self {
            max_consecutive_same_type: 3,
            guaranteed_slots_per_window: GuaranteedSlots::default(),
            subscription_diversity_window: 4,
            source_diversity_window: 3,
        }
    }
}
