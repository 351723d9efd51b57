pub mod candidates;

pub use candidates::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Retrieval pathway that surfaced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeedSource {
    Subscriptions,        // 關注作者
    Recombee,             // 推薦引擎
    HackerNews,           // 熱度 + 時間衰減
    PostThreads,
    CommentThreads,
    RecentComments,
    Quicktakes,
    Spotlights,
    Bookmarks,
    SubscriptionSuggestions,
}

/// How a post's karma turns into a bonus for a given source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KarmaScoring {
    /// Hyperbolic time decay on post age.
    Decayed,
    /// Superlinear, non-decaying; the source already accounts for recency.
    Ageless,
}

impl FeedSource {
    pub const ALL: [FeedSource; 10] = [
        FeedSource::Subscriptions,
        FeedSource::Recombee,
        FeedSource::HackerNews,
        FeedSource::PostThreads,
        FeedSource::CommentThreads,
        FeedSource::RecentComments,
        FeedSource::Quicktakes,
        FeedSource::Spotlights,
        FeedSource::Bookmarks,
        FeedSource::SubscriptionSuggestions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedSource::Subscriptions => "subscriptions",
            FeedSource::Recombee => "recombee",
            FeedSource::HackerNews => "hacker-news",
            FeedSource::PostThreads => "post-threads",
            FeedSource::CommentThreads => "comment-threads",
            FeedSource::RecentComments => "recent-comments",
            FeedSource::Quicktakes => "quicktakes",
            FeedSource::Spotlights => "spotlights",
            FeedSource::Bookmarks => "bookmarks",
            FeedSource::SubscriptionSuggestions => "subscription-suggestions",
        }
    }

    pub fn karma_scoring(&self) -> KarmaScoring {
        match self {
            FeedSource::Subscriptions | FeedSource::Recombee => KarmaScoring::Ageless,
            _ => KarmaScoring::Decayed,
        }
    }
}

impl fmt::Display for FeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order-independent key for a source set, e.g. `hacker-news,subscriptions`.
///
/// Empty for an empty set.
pub fn normalize_sources_key(sources: &BTreeSet<FeedSource>) -> String {
    let mut tags: Vec<&str> = sources.iter().map(FeedSource::as_str).collect();
    tags.sort_unstable();
    tags.join(",")
}

/// Item kind as seen by the type-diversity rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemKind {
    Post,
    CommentThread,
    Spotlight,
    Bookmark,
    SubscriptionSuggestion,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Post => "post",
            ItemKind::CommentThread => "commentThread",
            ItemKind::Spotlight => "spotlight",
            ItemKind::Bookmark => "bookmark",
            ItemKind::SubscriptionSuggestion => "subscriptionSuggestion",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostItem {
    pub id: String,
    pub post_id: String,
    pub sources: BTreeSet<FeedSource>,
    /// `None` means ageless.
    pub age_hours: Option<f64>,
    pub is_read: bool,
    pub is_from_subscribed_author: bool,
    pub karma: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentItem {
    pub comment_id: String,
    pub age_hours: f64,
    pub is_read: bool,
    pub is_from_subscribed_author: bool,
    pub karma: i64,
    pub primary_source: Option<FeedSource>,
    pub descendent_count: Option<u32>,
    pub direct_descendent_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadStats {
    pub comment_count: usize,
    pub unviewed_count: usize,
    pub last_activity_age_hours: f64,
    pub has_shortform: bool,
    pub max_comment_karma: Option<i64>,
}

/// Viewer's history with a thread, computed upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThreadEngagementStats {
    pub participation_count: u32,
    pub voting_activity_score: f64,
    pub view_score: f64,
    pub is_on_read_post: bool,
    /// Hours since each previous serving of this thread to the viewer.
    pub serving_hours_ago: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadItem {
    pub id: String,
    pub thread_id: String,
    pub sources: BTreeSet<FeedSource>,
    /// Age of the most recent constituent comment.
    pub age_hours: f64,
    pub is_read: bool,
    pub is_from_subscribed_author: bool,
    pub comments: Vec<CommentItem>,
    pub stats: ThreadStats,
    pub engagement: Option<ThreadEngagementStats>,
}

/// Spotlights, bookmarks and subscription suggestions: ordered, never scored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MinimalItem {
    pub id: String,
    pub sources: BTreeSet<FeedSource>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "itemType", rename_all = "camelCase")]
pub enum RankableItem {
    Post(PostItem),
    CommentThread(ThreadItem),
    Spotlight(MinimalItem),
    Bookmark(MinimalItem),
    SubscriptionSuggestion(MinimalItem),
}

impl RankableItem {
    pub fn id(&self) -> &str {
        match self {
            RankableItem::Post(p) => &p.id,
            RankableItem::CommentThread(t) => &t.id,
            RankableItem::Spotlight(m)
            | RankableItem::Bookmark(m)
            | RankableItem::SubscriptionSuggestion(m) => &m.id,
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            RankableItem::Post(_) => ItemKind::Post,
            RankableItem::CommentThread(_) => ItemKind::CommentThread,
            RankableItem::Spotlight(_) => ItemKind::Spotlight,
            RankableItem::Bookmark(_) => ItemKind::Bookmark,
            RankableItem::SubscriptionSuggestion(_) => ItemKind::SubscriptionSuggestion,
        }
    }

    pub fn sources(&self) -> &BTreeSet<FeedSource> {
        match self {
            RankableItem::Post(p) => &p.sources,
            RankableItem::CommentThread(t) => &t.sources,
            RankableItem::Spotlight(m)
            | RankableItem::Bookmark(m)
            | RankableItem::SubscriptionSuggestion(m) => &m.sources,
        }
    }

    pub fn has_source(&self, source: FeedSource) -> bool {
        self.sources().contains(&source)
    }

    /// Only posts and threads carry an author signal.
    pub fn is_from_subscribed_author(&self) -> bool {
        match self {
            RankableItem::Post(p) => p.is_from_subscribed_author,
            RankableItem::CommentThread(t) => t.is_from_subscribed_author,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostScoreTerms {
    pub subscribed_bonus: f64,
    pub karma_bonus: f64,
    pub topic_affinity_bonus: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostScoreBreakdown {
    pub total: f64,
    pub terms: PostScoreTerms,
    pub type_multiplier: f64,
}

impl PostScoreBreakdown {
    /// Breakdown given to unscored items (spotlights, bookmarks, suggestions).
    pub fn baseline() -> Self {
        Self {
            total: 1.0,
            terms: PostScoreTerms::default(),
            type_multiplier: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadScoreTerms {
    pub unread_subscribed_comment_bonus: f64,
    pub engagement_continuation_bonus: f64,
    pub replies_to_you_bonus: f64,
    pub your_post_activity_bonus: f64,
    pub overall_karma_bonus: f64,
    pub topic_affinity_bonus: f64,
    pub quicktake_bonus: f64,
    pub read_post_context_bonus: f64,
}

impl ThreadScoreTerms {
    pub fn sum(&self) -> f64 {
        self.unread_subscribed_comment_bonus
            + self.engagement_continuation_bonus
            + self.replies_to_you_bonus
            + self.your_post_activity_bonus
            + self.overall_karma_bonus
            + self.topic_affinity_bonus
            + self.quicktake_bonus
            + self.read_post_context_bonus
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadScoreBreakdown {
    pub total: f64,
    pub terms: ThreadScoreTerms,
    pub repetition_penalty_multiplier: f64,
    pub type_multiplier: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScoreBreakdown {
    Post(PostScoreBreakdown),
    Thread(ThreadScoreBreakdown),
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        match self {
            ScoreBreakdown::Post(b) => b.total,
            ScoreBreakdown::Thread(b) => b.total,
        }
    }

    pub(crate) fn set_total(&mut self, total: f64) {
        match self {
            ScoreBreakdown::Post(b) => b.total = total,
            ScoreBreakdown::Thread(b) => b.total = total,
        }
    }
}

/// Ranking rationale attached to every item the scoring algorithm selects.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedItemMetadata {
    pub ranked_item_type: ItemKind,
    pub score_breakdown: ScoreBreakdown,
    pub selection_constraints: Vec<String>,
    pub position: usize,
}

/// Algorithm output: an id plus optional rationale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedId {
    pub id: String,
    pub metadata: Option<RankedItemMetadata>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_sources_key_is_order_independent() {
        let a: BTreeSet<_> = [FeedSource::Subscriptions, FeedSource::HackerNews].into();
        let b: BTreeSet<_> = [FeedSource::HackerNews, FeedSource::Subscriptions].into();
        assert_eq!(normalize_sources_key(&a), normalize_sources_key(&b));
        assert_eq!(normalize_sources_key(&a), "hacker-news,subscriptions");
        assert_eq!(normalize_sources_key(&BTreeSet::new()), "");
    }

    #[test]
    fn test_karma_scoring_classification() {
        assert_eq!(FeedSource::Recombee.karma_scoring(), KarmaScoring::Ageless);
        assert_eq!(FeedSource::Subscriptions.karma_scoring(), KarmaScoring::Ageless);
        assert_eq!(FeedSource::HackerNews.karma_scoring(), KarmaScoring::Decayed);
        assert_eq!(FeedSource::Bookmarks.karma_scoring(), KarmaScoring::Decayed);
    }

    #[test]
    fn test_feed_source_serde_matches_as_str() {
        for source in FeedSource::ALL {
            let json = serde_json::to_string(&source).unwrap();
            assert_eq!(json, format!("\"{}\"", source.as_str()));
        }
    }

    #[test]
    fn test_only_posts_and_threads_report_subscription() {
        let spotlight = RankableItem::Spotlight(MinimalItem {
            id: "s1".to_string(),
            sources: [FeedSource::Spotlights].into(),
        });
        assert!(!spotlight.is_from_subscribed_author());
        assert_eq!(spotlight.kind(), ItemKind::Spotlight);
        assert!(spotlight.has_source(FeedSource::Spotlights));
    }
}
