pub mod algorithms;
pub mod conversion;
pub mod diversity;
pub mod experiments;
pub mod feed_ranker;
pub mod mapping;
pub mod ranking;

pub use algorithms::{AlgorithmName, RankingAlgorithm, SamplingAlgorithm, ScoringAlgorithm};
pub use diversity::{DiversityLayer, SelectionConstraint};
pub use experiments::{Experiment, ExperimentVariant, FeedIdentity};
pub use feed_ranker::{FeedRanker, FeedRankingRequest, FeedRankingResponse};
