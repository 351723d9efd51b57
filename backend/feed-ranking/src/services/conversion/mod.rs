//! Domain object → rankable item conversion.
//!
//! Pure functions of the input object and a reference `now`. Derived fields
//! (ages, read flags, subscription flags, thread sources and stats) are
//! computed here so scoring never looks at raw timestamps.

use crate::error::{RankingError, Result};
use crate::models::{
    CommentItem, FeedBookmark, FeedCandidate, FeedCommentThread, FeedPost, FeedSource, FeedSpotlight,
    FeedSubscriptionSuggestion, MinimalItem, PostItem, RankableItem, ThreadEngagementStats,
    ThreadItem, ThreadStats,
};
use crate::utils::{hours_since, sha256_hex};
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, warn};

/// Stable, order-independent thread id: SHA-256 over the sorted comment ids.
pub fn thread_hash<S: AsRef<str>>(comment_ids: &[S]) -> String {
    let mut sorted: Vec<&str> = comment_ids.iter().map(AsRef::as_ref).collect();
    sorted.sort_unstable();
    sha256_hex(sorted.join(",").as_bytes())
}

pub fn to_post_item(post: &FeedPost, now: DateTime<Utc>) -> Result<PostItem> {
    let post_id = post
        .post_id
        .clone()
        .ok_or_else(|| RankingError::InvalidCandidate("post is missing post_id".to_string()))?;

    let sources: BTreeSet<FeedSource> = post.meta.sources.iter().copied().collect();
    let is_from_subscribed_author = sources.contains(&FeedSource::Subscriptions);

    Ok(PostItem {
        id: post_id.clone(),
        post_id,
        age_hours: post.posted_at.map(|t| hours_since(t, now)),
        is_read: post.meta.last_viewed.is_some() || post.meta.last_interacted.is_some(),
        is_from_subscribed_author,
        karma: post.base_score.unwrap_or(0),
        sources,
    })
}

pub fn to_thread_item(
    thread: &FeedCommentThread,
    engagement: Option<&ThreadEngagementStats>,
    now: DateTime<Utc>,
) -> Result<ThreadItem> {
    if thread.comments.is_empty() {
        return Err(RankingError::InvalidCandidate(
            "comment thread has no comments".to_string(),
        ));
    }

    let comments = thread
        .comments
        .iter()
        .enumerate()
        .map(|(idx, c)| {
            let comment_id = c.comment_id.clone().ok_or_else(|| {
                RankingError::InvalidCandidate(format!(
                    "comment at index {} of thread is missing comment_id",
                    idx
                ))
            })?;

            Ok(CommentItem {
                comment_id,
                age_hours: c.meta.posted_at.map(|t| hours_since(t, now)).unwrap_or(0.0),
                is_read: c.meta.last_viewed.is_some() || c.meta.last_interacted.is_some(),
                is_from_subscribed_author: c.meta.from_subscribed_user,
                karma: c.base_score.unwrap_or(0),
                primary_source: c.meta.sources.first().copied(),
                descendent_count: c.meta.descendent_count,
                direct_descendent_count: c.meta.direct_descendent_count,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let comment_ids: Vec<&str> = comments.iter().map(|c| c.comment_id.as_str()).collect();
    let thread_id = thread_hash(&comment_ids);

    let sources: BTreeSet<FeedSource> = thread
        .primary_source
        .into_iter()
        .chain(comments.iter().filter_map(|c| c.primary_source))
        .collect();

    let age_hours = thread
        .comments
        .iter()
        .filter_map(|c| c.meta.posted_at)
        .max()
        .map(|t| hours_since(t, now))
        .unwrap_or(0.0);

    let stats = ThreadStats {
        comment_count: comments.len(),
        unviewed_count: comments.iter().filter(|c| !c.is_read).count(),
        last_activity_age_hours: age_hours,
        has_shortform: sources.contains(&FeedSource::Quicktakes),
        max_comment_karma: comments.iter().map(|c| c.karma).max(),
    };

    Ok(ThreadItem {
        id: thread_id.clone(),
        thread_id,
        age_hours,
        is_read: comments.iter().all(|c| c.is_read),
        is_from_subscribed_author: comments.iter().any(|c| c.is_from_subscribed_author),
        engagement: engagement.cloned(),
        sources,
        stats,
        comments,
    })
}

fn to_minimal_item(id: Option<&String>, source: FeedSource, what: &str) -> Result<MinimalItem> {
    let id = id
        .cloned()
        .ok_or_else(|| RankingError::InvalidCandidate(format!("{} is missing its id", what)))?;

    Ok(MinimalItem {
        id,
        sources: BTreeSet::from([source]),
    })
}

pub fn to_spotlight_item(spotlight: &FeedSpotlight) -> Result<MinimalItem> {
    to_minimal_item(spotlight.spotlight_id.as_ref(), FeedSource::Spotlights, "spotlight")
}

pub fn to_bookmark_item(bookmark: &FeedBookmark) -> Result<MinimalItem> {
    to_minimal_item(bookmark.bookmark_id.as_ref(), FeedSource::Bookmarks, "bookmark")
}

pub fn to_subscription_suggestion_item(
    suggestion: &FeedSubscriptionSuggestion,
) -> Result<MinimalItem> {
    to_minimal_item(
        suggestion.suggestion_id.as_ref(),
        FeedSource::SubscriptionSuggestions,
        "subscription suggestion",
    )
}

/// Engagement stats are keyed by thread id or by top-level comment id.
fn lookup_engagement<'a>(
    thread: &FeedCommentThread,
    thread_id: &str,
    engagement: &'a HashMap<String, ThreadEngagementStats>,
) -> Option<&'a ThreadEngagementStats> {
    engagement.get(thread_id).or_else(|| {
        thread
            .top_level_comment_id()
            .and_then(|id| engagement.get(id))
    })
}

/// Convert one domain object.
pub fn to_rankable(
    candidate: &FeedCandidate,
    engagement: &HashMap<String, ThreadEngagementStats>,
    now: DateTime<Utc>,
) -> Result<RankableItem> {
    let item = match candidate {
        FeedCandidate::Post(post) => RankableItem::Post(to_post_item(post, now)?),
        FeedCandidate::CommentThread(thread) => {
            let mut item = to_thread_item(thread, None, now)?;
            item.engagement = lookup_engagement(thread, &item.id, engagement).cloned();
            RankableItem::CommentThread(item)
        }
        FeedCandidate::Spotlight(s) => RankableItem::Spotlight(to_spotlight_item(s)?),
        FeedCandidate::Bookmark(b) => RankableItem::Bookmark(to_bookmark_item(b)?),
        FeedCandidate::SubscriptionSuggestion(s) => {
            RankableItem::SubscriptionSuggestion(to_subscription_suggestion_item(s)?)
        }
    };
    Ok(item)
}

/// Convert a whole request, rejecting on the first invalid candidate.
///
/// Ids must be unique within a call; later duplicates are dropped.
pub fn convert_candidates(
    candidates: &[FeedCandidate],
    engagement: &HashMap<String, ThreadEngagementStats>,
    now: DateTime<Utc>,
) -> Result<Vec<RankableItem>> {
    let mut seen: HashSet<String> = HashSet::with_capacity(candidates.len());
    let mut items = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let item = to_rankable(candidate, engagement, now)?;
        if !seen.insert(item.id().to_string()) {
            warn!(id = item.id(), "Dropping duplicate candidate id");
            continue;
        }
        items.push(item);
    }

    debug!(
        input_count = candidates.len(),
        converted_count = items.len(),
        "Converted candidates"
    );

    Ok(items)
}

impl FeedCandidate {
    /// Id this object ranks under, if it has one.
    pub fn ranking_id(&self) -> Option<String> {
        match self {
            FeedCandidate::Post(p) => p.post_id.clone(),
            FeedCandidate::CommentThread(t) => {
                if t.comments.is_empty() {
                    return None;
                }
                let ids: Option<Vec<&str>> =
                    t.comments.iter().map(|c| c.comment_id.as_deref()).collect();
                ids.map(|ids| thread_hash(&ids))
            }
            FeedCandidate::Spotlight(s) => s.spotlight_id.clone(),
            FeedCandidate::Bookmark(b) => b.bookmark_id.clone(),
            FeedCandidate::SubscriptionSuggestion(s) => s.suggestion_id.clone(),
        }
    }
}
