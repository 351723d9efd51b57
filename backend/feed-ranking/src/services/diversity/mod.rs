use crate::config::DiversityConstraints;
use crate::models::{normalize_sources_key, FeedSource, ItemKind, RankableItem};
use crate::services::ranking::ScoredItem;
use std::fmt;
use tracing::debug;

/// Rule that can steer a single feed position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionConstraint {
    ForcedSpotlight,
    ForcedBookmark,
    TypeDiversity,
    SubscriptionDiversity,
    SourceDiversity,
}

impl SelectionConstraint {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionConstraint::ForcedSpotlight => "forced-spotlight",
            SelectionConstraint::ForcedBookmark => "forced-bookmark",
            SelectionConstraint::TypeDiversity => "type-diversity",
            SelectionConstraint::SubscriptionDiversity => "subscription-diversity",
            SelectionConstraint::SourceDiversity => "source-diversity",
        }
    }

    /// Label used when nothing satisfied the rule and the best remaining item was taken.
    pub fn no_match_label(&self) -> String {
        format!("no-match-for-{}", self.as_str())
    }
}

impl fmt::Display for SelectionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Constraint in force for the current position, with what it excludes.
#[derive(Debug, Clone, PartialEq)]
enum ActiveConstraint<'a> {
    ForcedSpotlight,
    ForcedBookmark,
    TypeDiversity { banned: ItemKind },
    SubscriptionDiversity,
    SourceDiversity { banned_key: &'a str },
}

impl ActiveConstraint<'_> {
    fn label(&self) -> SelectionConstraint {
        match self {
            ActiveConstraint::ForcedSpotlight => SelectionConstraint::ForcedSpotlight,
            ActiveConstraint::ForcedBookmark => SelectionConstraint::ForcedBookmark,
            ActiveConstraint::TypeDiversity { .. } => SelectionConstraint::TypeDiversity,
            ActiveConstraint::SubscriptionDiversity => SelectionConstraint::SubscriptionDiversity,
            ActiveConstraint::SourceDiversity { .. } => SelectionConstraint::SourceDiversity,
        }
    }

    fn admits(&self, item: &RankableItem, source_key: &str) -> bool {
        match self {
            ActiveConstraint::ForcedSpotlight => item.has_source(FeedSource::Spotlights),
            ActiveConstraint::ForcedBookmark => item.has_source(FeedSource::Bookmarks),
            ActiveConstraint::TypeDiversity { banned } => item.kind() != *banned,
            ActiveConstraint::SubscriptionDiversity => !item.is_from_subscribed_author(),
            ActiveConstraint::SourceDiversity { banned_key } => source_key != *banned_key,
        }
    }
}

/// One selected feed position.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub id: String,
    /// Index into the scored input.
    pub index: usize,
    pub applied_constraints: Vec<String>,
    pub position: usize,
}

/// Diversity Layer - 多樣性約束貪心選擇
///
/// Walks the feed position by position. Each slot takes the best-scoring
/// remaining item unless a rule is in force:
/// 1. forced spotlight / bookmark near the end of each guaranteed-slot window
/// 2. no more than `max_consecutive_same_type` items of one kind in a row
/// 3. no more than `subscription_diversity_window` subscribed items in a row
/// 4. no more than `source_diversity_window` items with the same source set in a row
///
/// When no remaining item satisfies the rule, the best remaining item is taken
/// and labelled `no-match-for-<rule>`. No randomness, no backtracking.
pub struct DiversityLayer {
    constraints: DiversityConstraints,
}

impl Default for DiversityLayer {
    fn default() -> Self {
        Self::new(DiversityConstraints::default())
    }
}

impl DiversityLayer {
    pub fn new(constraints: DiversityConstraints) -> Self {
        Self { constraints }
    }

    pub fn constraints(&self) -> &DiversityConstraints {
        &self.constraints
    }

    /// Select up to `total_items` from a score-descending list.
    pub fn select(&self, scored: &[ScoredItem], total_items: usize) -> Vec<Selection> {
        let source_keys: Vec<String> = scored
            .iter()
            .map(|s| normalize_sources_key(s.item.sources()))
            .collect();

        let mut taken = vec![false; scored.len()];
        let mut selected: Vec<Selection> = Vec::with_capacity(total_items.min(scored.len()));

        while selected.len() < total_items {
            let position = selected.len();
            let constraint = self.active_constraint(position, &selected, scored, &taken, &source_keys);

            let best_remaining = taken.iter().position(|t| !t);
            let Some(best_remaining) = best_remaining else {
                break;
            };

            let (index, applied_constraints) = match &constraint {
                Some(c) => {
                    let matched = (0..scored.len())
                        .find(|&i| !taken[i] && c.admits(&scored[i].item, &source_keys[i]));
                    match matched {
                        Some(i) => (i, vec![c.label().as_str().to_string()]),
                        None => (best_remaining, vec![c.label().no_match_label()]),
                    }
                }
                None => (best_remaining, Vec::new()),
            };

            taken[index] = true;
            selected.push(Selection {
                id: scored[index].id.clone(),
                index,
                applied_constraints,
                position,
            });
        }

        debug!(
            candidate_count = scored.len(),
            selected_count = selected.len(),
            constrained_count = selected
                .iter()
                .filter(|s| !s.applied_constraints.is_empty())
                .count(),
            "Diversity selection complete"
        );

        selected
    }

    /// Rules are checked in priority order; the first one in force wins.
    fn active_constraint<'a>(
        &self,
        position: usize,
        selected: &[Selection],
        scored: &[ScoredItem],
        taken: &[bool],
        source_keys: &'a [String],
    ) -> Option<ActiveConstraint<'a>> {
        if let Some(forced) = self.forced_slot(position, selected, scored, taken) {
            return Some(forced);
        }

        let recent = |n: usize| (n > 0 && selected.len() >= n).then(|| &selected[selected.len() - n..]);

        if let Some(window) = recent(self.constraints.max_consecutive_same_type) {
            let first = scored[window[0].index].item.kind();
            if window.iter().all(|s| scored[s.index].item.kind() == first) {
                return Some(ActiveConstraint::TypeDiversity { banned: first });
            }
        }

        if let Some(window) = recent(self.constraints.subscription_diversity_window) {
            if window
                .iter()
                .all(|s| scored[s.index].item.is_from_subscribed_author())
            {
                return Some(ActiveConstraint::SubscriptionDiversity);
            }
        }

        if let Some(window) = recent(self.constraints.source_diversity_window) {
            let first: &'a str = &source_keys[window[0].index];
            if !first.is_empty() && window.iter().all(|s| source_keys[s.index] == first) {
                return Some(ActiveConstraint::SourceDiversity { banned_key: first });
            }
        }

        None
    }

    /// Spotlight at `window_size - 3`, bookmark at `window_size - 1`, each only
    /// while the window is short of its quota and a qualifying item remains.
    fn forced_slot(
        &self,
        position: usize,
        selected: &[Selection],
        scored: &[ScoredItem],
        taken: &[bool],
    ) -> Option<ActiveConstraint<'static>> {
        let slots = &self.constraints.guaranteed_slots_per_window;
        if slots.window_size == 0 {
            return None;
        }

        let window_start = position / slots.window_size * slots.window_size;
        let position_in_window = position - window_start;
        let in_window = &selected[window_start..position];

        let count_in_window = |source: FeedSource| {
            in_window
                .iter()
                .filter(|s| scored[s.index].item.has_source(source))
                .count()
        };
        let any_remaining = |source: FeedSource| {
            scored
                .iter()
                .zip(taken)
                .any(|(s, &t)| !t && s.item.has_source(source))
        };

        if slots.window_size.checked_sub(3) == Some(position_in_window)
            && count_in_window(FeedSource::Spotlights) < slots.spotlights
            && any_remaining(FeedSource::Spotlights)
        {
            return Some(ActiveConstraint::ForcedSpotlight);
        }

        if position_in_window == slots.window_size - 1
            && count_in_window(FeedSource::Bookmarks) < slots.bookmarks
            && any_remaining(FeedSource::Bookmarks)
        {
            return Some(ActiveConstraint::ForcedBookmark);
        }

        None
    }
}
