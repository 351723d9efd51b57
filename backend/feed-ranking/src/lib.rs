pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use config::{EngineConfig, RankingSettings};
pub use error::{RankingError, Result};
pub use models::{FeedCandidate, RankedFeedEntry, RankedId, RankedItemMetadata};
pub use services::{
    AlgorithmName, DiversityLayer, FeedIdentity, FeedRanker, FeedRankingRequest,
    FeedRankingResponse, RankingAlgorithm,
};
