//! Pre-hydrated domain objects handed to the engine by candidate sourcing.
//!
//! Identifiers are optional on the wire; a missing one is a sourcing bug and is
//! rejected during conversion.

use super::FeedSource;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostMetaInfo {
    pub sources: Vec<FeedSource>,
    pub last_viewed: Option<DateTime<Utc>>,
    pub last_interacted: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedPost {
    pub post_id: Option<String>,
    pub title: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub base_score: Option<i64>,
    pub meta: PostMetaInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedCommentMetaInfo {
    pub sources: Vec<FeedSource>,
    pub posted_at: Option<DateTime<Utc>>,
    pub last_viewed: Option<DateTime<Utc>>,
    pub last_interacted: Option<DateTime<Utc>>,
    pub from_subscribed_user: bool,
    pub descendent_count: Option<u32>,
    pub direct_descendent_count: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedComment {
    pub comment_id: Option<String>,
    pub post_id: Option<String>,
    pub base_score: Option<i64>,
    pub meta: FeedCommentMetaInfo,
}

/// A linear thread of comments, top-level comment first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedCommentThread {
    pub comments: Vec<FeedComment>,
    pub primary_source: Option<FeedSource>,
}

impl FeedCommentThread {
    pub fn top_level_comment_id(&self) -> Option<&str> {
        self.comments.first().and_then(|c| c.comment_id.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedSpotlight {
    pub spotlight_id: Option<String>,
    pub document_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedBookmark {
    pub bookmark_id: Option<String>,
    pub document_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedSubscriptionSuggestion {
    pub suggestion_id: Option<String>,
    pub suggested_user_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FeedCandidate {
    Post(FeedPost),
    CommentThread(FeedCommentThread),
    Spotlight(FeedSpotlight),
    Bookmark(FeedBookmark),
    SubscriptionSuggestion(FeedSubscriptionSuggestion),
}

/// A domain object in its final feed position, with rationale when the
/// scoring algorithm produced the ordering.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedFeedEntry {
    pub candidate: FeedCandidate,
    pub metadata: Option<super::RankedItemMetadata>,
}
