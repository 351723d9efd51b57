use crate::models::{FeedCandidate, RankedFeedEntry, RankedId};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Reattach ranked ids to their domain objects, in ranked order.
///
/// Each original is emitted at most once. Ids with no matching original are
/// dropped with a warning.
pub fn map_ranked_results(ranked: Vec<RankedId>, originals: Vec<FeedCandidate>) -> Vec<RankedFeedEntry> {
    let mut by_id: HashMap<String, FeedCandidate> = HashMap::with_capacity(originals.len());
    for candidate in originals {
        if let Some(id) = candidate.ranking_id() {
            by_id.entry(id).or_insert(candidate);
        }
    }

    let ranked_count = ranked.len();
    let entries: Vec<RankedFeedEntry> = ranked
        .into_iter()
        .filter_map(|r| match by_id.remove(&r.id) {
            Some(candidate) => Some(RankedFeedEntry {
                candidate,
                metadata: r.metadata,
            }),
            None => {
                warn!(id = %r.id, "Ranked id has no matching candidate, skipping");
                None
            }
        })
        .collect();

    debug!(
        ranked_count = ranked_count,
        mapped_count = entries.len(),
        "Mapped ranked results"
    );

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FeedBookmark, FeedSpotlight};

    fn spotlight(id: &str) -> FeedCandidate {
        FeedCandidate::Spotlight(FeedSpotlight {
            spotlight_id: Some(id.to_string()),
            document_id: None,
        })
    }

    fn ranked(id: &str) -> RankedId {
        RankedId {
            id: id.to_string(),
            metadata: None,
        }
    }

    #[test]
    fn test_map_preserves_ranked_order() {
        let originals = vec![
            spotlight("a"),
            spotlight("b"),
            FeedCandidate::Bookmark(FeedBookmark {
                bookmark_id: Some("c".to_string()),
                document_id: Some("post-1".to_string()),
            }),
        ];

        let entries = map_ranked_results(vec![ranked("c"), ranked("a")], originals);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].candidate.ranking_id().as_deref(), Some("c"));
        assert_eq!(entries[1].candidate.ranking_id().as_deref(), Some("a"));
    }

    #[test]
    fn test_map_drops_stale_and_duplicate_ids() {
        let entries = map_ranked_results(
            vec![ranked("a"), ranked("gone"), ranked("a"), ranked("b")],
            vec![spotlight("a"), spotlight("b")],
        );

        let ids: Vec<Option<String>> = entries.iter().map(|e| e.candidate.ranking_id()).collect();
        assert_eq!(ids, vec![Some("a".to_string()), Some("b".to_string())]);
    }
}
