use super::{AlgorithmName, RankingAlgorithm};
use crate::config::RankingSettings;
use crate::models::{RankableItem, RankedId, RankedItemMetadata};
use crate::services::diversity::DiversityLayer;
use crate::services::ranking::{score_items, sort_and_filter};
use tracing::debug;

/// Score, sort, then select under diversity constraints. Every emitted id
/// carries its full breakdown.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScoringAlgorithm;

impl ScoringAlgorithm {
    pub fn new() -> Self {
        Self
    }
}

impl RankingAlgorithm for ScoringAlgorithm {
    fn name(&self) -> AlgorithmName {
        AlgorithmName::Scoring
    }

    fn rank_items(
        &self,
        items: &[RankableItem],
        total_items: usize,
        settings: &RankingSettings,
    ) -> Vec<RankedId> {
        let config = settings.unified_scoring.ranking_config();
        let layer = DiversityLayer::new(settings.unified_scoring.diversity_constraints());

        let scored = sort_and_filter(score_items(items, &config));
        let selection = layer.select(&scored, total_items);

        debug!(
            input_count = items.len(),
            eligible_count = scored.len(),
            selected_count = selection.len(),
            "Scoring algorithm ranked items"
        );

        selection
            .into_iter()
            .map(|selected| {
                let chosen = &scored[selected.index];
                RankedId {
                    id: selected.id,
                    metadata: Some(RankedItemMetadata {
                        ranked_item_type: chosen.item.kind(),
                        score_breakdown: chosen.breakdown.clone(),
                        selection_constraints: selected.applied_constraints,
                        position: selected.position,
                    }),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FeedSource, ItemKind, MinimalItem, PostItem};
    use serde_json::json;
    use std::collections::BTreeSet;

    fn post(id: &str, karma: i64, age_hours: f64) -> RankableItem {
        RankableItem::Post(PostItem {
            id: id.to_string(),
            post_id: id.to_string(),
            sources: BTreeSet::from([FeedSource::HackerNews]),
            age_hours: Some(age_hours),
            is_read: false,
            is_from_subscribed_author: false,
            karma,
        })
    }

    #[test]
    fn test_rank_items_attaches_metadata() {
        let items = vec![
            post("low", 1, 100.0),
            post("high", 200, 1.0),
            RankableItem::Spotlight(MinimalItem {
                id: "spot".to_string(),
                sources: BTreeSet::from([FeedSource::Spotlights]),
            }),
        ];

        let ranked = ScoringAlgorithm::new().rank_items(&items, 10, &RankingSettings::default());

        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].id, "high");
        for (i, r) in ranked.iter().enumerate() {
            let meta = r.metadata.as_ref().unwrap();
            assert_eq!(meta.position, i);
            assert!(meta.score_breakdown.total() <= 50.0);
        }
        let spot = ranked.iter().find(|r| r.id == "spot").unwrap();
        assert_eq!(
            spot.metadata.as_ref().unwrap().ranked_item_type,
            ItemKind::Spotlight
        );
    }

    #[test]
    fn test_overrides_drop_zero_scores() {
        // startingValue of 0 leaves a karma-0 post with score 0
        let mut settings = RankingSettings::default();
        settings.unified_scoring.ranking = json!({ "startingValue": 0.0 });

        let ranked = ScoringAlgorithm::new().rank_items(&[post("zero", 0, 5.0), post("some", 50, 5.0)], 10, &settings);

        let ids: Vec<&str> = ranked.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["some"]);
    }

    #[test]
    fn test_rank_items_respects_total() {
        let items: Vec<RankableItem> = (0..10).map(|i| post(&format!("p{}", i), i, 2.0)).collect();
        let ranked = ScoringAlgorithm::new().rank_items(&items, 4, &RankingSettings::default());
        assert_eq!(ranked.len(), 4);
    }
}
