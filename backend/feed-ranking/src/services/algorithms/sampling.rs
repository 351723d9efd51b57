use super::{AlgorithmName, RankingAlgorithm};
use crate::config::RankingSettings;
use crate::models::{FeedSource, ItemKind, RankableItem, RankedId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, HashSet, VecDeque};
use tracing::debug;

/// Source-weighted random draw, no per-item scores.
///
/// Comparison arm for the scoring algorithm. Output carries no metadata.
#[derive(Debug, Default, Clone, Copy)]
pub struct SamplingAlgorithm {
    seed: Option<u64>,
}

/// Per-call bucket of one source channel.
struct SourceBucket<'a> {
    source: FeedSource,
    weight: f64,
    queue: VecDeque<&'a str>,
}

/// Channel an item of this kind is drawn from when none of its own sources
/// carries a weight.
fn fallback_source(kind: ItemKind) -> FeedSource {
    match kind {
        ItemKind::Post => FeedSource::PostThreads,
        ItemKind::CommentThread => FeedSource::CommentThreads,
        ItemKind::Spotlight => FeedSource::Spotlights,
        ItemKind::Bookmark => FeedSource::Bookmarks,
        ItemKind::SubscriptionSuggestion => FeedSource::SubscriptionSuggestions,
    }
}

fn is_weighted(weights: &BTreeMap<FeedSource, f64>, source: FeedSource) -> bool {
    weights
        .get(&source)
        .map(|w| w.is_finite() && *w > 0.0)
        .unwrap_or(false)
}

/// Buckets an item can be drawn from: its weighted sources, else its kind's channel.
fn bucket_sources(item: &RankableItem, weights: &BTreeMap<FeedSource, f64>) -> Vec<FeedSource> {
    let own: Vec<FeedSource> = item
        .sources()
        .iter()
        .copied()
        .filter(|&s| is_weighted(weights, s))
        .collect();

    if own.is_empty() {
        vec![fallback_source(item.kind())]
    } else {
        own
    }
}

impl SamplingAlgorithm {
    pub fn new(seed: Option<u64>) -> Self {
        Self { seed }
    }

    /// Same as [`RankingAlgorithm::rank_items`] but with a caller-supplied RNG.
    pub fn rank_items_with_rng<R: Rng>(
        &self,
        items: &[RankableItem],
        total_items: usize,
        settings: &RankingSettings,
        rng: &mut R,
    ) -> Vec<RankedId> {
        let weights = &settings.source_weights;
        let memberships: Vec<Vec<FeedSource>> =
            items.iter().map(|item| bucket_sources(item, weights)).collect();

        // BTreeMap iteration keeps buckets in FeedSource order
        let mut buckets: Vec<SourceBucket<'_>> = weights
            .iter()
            .filter(|(source, _)| is_weighted(weights, **source))
            .map(|(&source, &weight)| SourceBucket {
                source,
                weight,
                queue: items
                    .iter()
                    .zip(&memberships)
                    .filter(|(_, sources)| sources.contains(&source))
                    .map(|(item, _)| item.id())
                    .collect(),
            })
            .filter(|b| !b.queue.is_empty())
            .collect();

        let mut total_weight: f64 = buckets.iter().map(|b| b.weight).sum();
        let mut emitted: HashSet<&str> = HashSet::new();
        let mut ranked = Vec::with_capacity(total_items.min(items.len()));

        while ranked.len() < total_items && total_weight > 0.0 && !buckets.is_empty() {
            let pick = rng.gen::<f64>() * total_weight;

            let mut cumulative = 0.0;
            // Rounding can leave `pick` just past the last boundary
            let mut chosen = buckets.len() - 1;
            for (i, bucket) in buckets.iter().enumerate() {
                cumulative += bucket.weight;
                if pick < cumulative {
                    chosen = i;
                    break;
                }
            }

            let bucket = &mut buckets[chosen];
            while let Some(id) = bucket.queue.pop_front() {
                if emitted.insert(id) {
                    ranked.push(RankedId {
                        id: id.to_string(),
                        metadata: None,
                    });
                    break;
                }
            }

            if bucket.queue.is_empty() {
                total_weight -= bucket.weight;
                debug!(source = %bucket.source, "Sampling bucket exhausted");
                buckets.remove(chosen);
            }
        }

        debug!(
            input_count = items.len(),
            selected_count = ranked.len(),
            seeded = self.seed.is_some(),
            "Sampling algorithm ranked items"
        );

        ranked
    }
}

impl RankingAlgorithm for SamplingAlgorithm {
    fn name(&self) -> AlgorithmName {
        AlgorithmName::Sampling
    }

    fn rank_items(
        &self,
        items: &[RankableItem],
        total_items: usize,
        settings: &RankingSettings,
    ) -> Vec<RankedId> {
        // Fresh generator per call; never shared across requests
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.rank_items_with_rng(items, total_items, settings, &mut rng)
    }
}
