use thiserror::Error;

/// Errors surfaced by the feed ranking engine.
///
/// Only boundary violations are reported here. Degenerate numbers, unsatisfiable
/// diversity constraints, unknown algorithm names and stale ranked ids are all
/// handled in place and never reach the caller.
#[derive(Debug, Error)]
pub enum RankingError {
    #[error("Invalid candidate: {0}")]
    InvalidCandidate(String),

    #[error("Invalid experiment: {0}")]
    InvalidExperiment(String),

    #[error("Configuration error: {0}")]
    Config(#[from] envy::Error),
}

pub type Result<T> = std::result::Result<T, RankingError>;
