/// Ranking Module
///
/// Signal-based scoring for feed candidates.
///
/// # Workflow
/// 1. Score posts (subscription, karma with time decay) and comment threads
///    (subscriptions, engagement continuation, karma, quicktakes, repetition penalty)
/// 2. Cap every score at `max_score`
/// 3. Sort descending and drop non-positive scores
/// 4. Hand off to the diversity layer for constrained selection
pub mod scorer;

pub use scorer::{repetition_penalty, score_items, score_post, score_thread, ScoredItem};

use std::cmp::Ordering;

/// Sort descending by score, keeping input order among ties, and drop
/// anything that cannot be shown (`score <= 0`).
pub fn sort_and_filter(mut scored: Vec<ScoredItem>) -> Vec<ScoredItem> {
    scored.retain(|s| s.score > 0.0);
    // Stable sort: ties resolve to input order, which keeps ranking deterministic
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MinimalItem, PostScoreBreakdown, RankableItem, ScoreBreakdown};

    fn scored(id: &str, score: f64) -> ScoredItem {
        ScoredItem {
            id: id.to_string(),
            score,
            item: RankableItem::Spotlight(MinimalItem {
                id: id.to_string(),
                sources: Default::default(),
            }),
            breakdown: ScoreBreakdown::Post(PostScoreBreakdown::baseline()),
        }
    }

    #[test]
    fn test_sort_and_filter() {
        let sorted = sort_and_filter(vec![
            scored("a", 1.0),
            scored("b", 0.0),
            scored("c", 5.0),
            scored("d", -2.0),
            scored("e", 1.0),
        ]);

        let ids: Vec<&str> = sorted.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "e"]);
    }
}
