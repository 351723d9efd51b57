/// Candidate Scoring Module
///
/// Signal-driven scores for posts and comment threads, each with an itemized
/// breakdown. Scoring never fails: optional signals default to zero and
/// degenerate terms are dropped.
use crate::config::RankingConfig;
use crate::models::{
    KarmaScoring, PostItem, PostScoreBreakdown, PostScoreTerms, RankableItem, ScoreBreakdown,
    ThreadItem, ThreadScoreBreakdown, ThreadScoreTerms,
};
use crate::utils::{capped, finite_or_zero, hyperbolic_decay};
use tracing::debug;

/// Upper bound on repetition penalty strength, keeps the multiplier above 0.
const MAX_PENALTY_STRENGTH: f64 = 0.95;

/// Scored candidate, score already capped at `max_score`
#[derive(Debug, Clone)]
pub struct ScoredItem {
    pub id: String,
    pub score: f64,
    pub item: RankableItem,
    pub breakdown: ScoreBreakdown,
}

pub fn score_post(post: &PostItem, config: &RankingConfig) -> (f64, PostScoreBreakdown) {
    let cfg = &config.posts;

    let subscribed_bonus = if post.is_from_subscribed_author {
        cfg.subscribed_bonus
    } else {
        0.0
    };

    // TODO: derive from the viewer's tag reading history once it is available upstream
    let topic_affinity_bonus = 0.0;

    let ageless = post.age_hours.is_none()
        || post
            .sources
            .iter()
            .any(|s| s.karma_scoring() == KarmaScoring::Ageless);

    let karma = post.karma as f64;
    let karma_bonus = match post.age_hours {
        Some(age) if !ageless => hyperbolic_decay(
            age,
            cfg.time_decay_bias,
            cfg.time_decay_scale,
            cfg.time_decay_exponent,
        )
        .map(|factor| capped(karma * factor, cfg.karma_max_bonus))
        .unwrap_or(0.0),
        // Negative karma has no real fractional power (NaN, scored 0); overflow saturates.
        _ => capped(
            karma.powf(cfg.karma_superlinear_exponent) / cfg.karma_divisor,
            cfg.karma_max_bonus,
        ),
    };

    let additive = config.starting_value + subscribed_bonus + karma_bonus + topic_affinity_bonus;
    let total = additive * cfg.type_multiplier;

    (
        total,
        PostScoreBreakdown {
            total,
            terms: PostScoreTerms {
                subscribed_bonus,
                karma_bonus,
                topic_affinity_bonus,
            },
            type_multiplier: cfg.type_multiplier,
        },
    )
}

/// Multiplier in `(0, 1]`; exactly 1 when the thread was never served.
pub fn repetition_penalty(serving_hours_ago: &[f64], config: &RankingConfig) -> f64 {
    let strength = finite_or_zero(config.threads.repetition_penalty_strength)
        .clamp(0.0, MAX_PENALTY_STRENGTH);

    serving_hours_ago
        .iter()
        .fold(1.0, |multiplier, &hours_ago| {
            let decay_factor =
                1.0 / (1.0 + hours_ago.max(0.0) / config.threads.repetition_decay_hours);
            if !decay_factor.is_finite() {
                return multiplier;
            }
            multiplier * (1.0 - strength * decay_factor.clamp(0.0, 1.0))
        })
        // Long serving histories underflow; a served thread still keeps its order
        .max(f64::MIN_POSITIVE)
}

pub fn score_thread(thread: &ThreadItem, config: &RankingConfig) -> (f64, ThreadScoreBreakdown) {
    let cfg = &config.threads;
    let engagement = thread.engagement.as_ref();

    let unread_subscribed = thread
        .comments
        .iter()
        .filter(|c| !c.is_read && c.is_from_subscribed_author)
        .count();
    let unread_subscribed_comment_bonus = unread_subscribed as f64 * cfg.subscribed_comment_bonus;

    // Highest tier wins
    let engagement_continuation_bonus = match engagement {
        Some(e) if e.participation_count > 0 => cfg.engagement_participation_bonus,
        Some(e) if e.voting_activity_score > 0.0 => cfg.engagement_voting_bonus,
        Some(e) if e.view_score > 0.0 => cfg.engagement_viewing_bonus,
        _ => 0.0,
    };

    // TODO: wire up once threads carry "has replies to viewer" and "on viewer's post" flags
    let has_replies_to_you = false;
    let is_your_post = false;
    let replies_to_you_bonus = if has_replies_to_you {
        cfg.replies_to_you_bonus
    } else {
        0.0
    };
    let your_post_activity_bonus = if is_your_post { cfg.your_post_bonus } else { 0.0 };

    let overall_karma_bonus = thread
        .comments
        .iter()
        .filter(|c| !c.is_read)
        .filter_map(|c| {
            hyperbolic_decay(
                c.age_hours,
                cfg.time_decay_bias,
                cfg.time_decay_scale,
                cfg.time_decay_exponent,
            )
            .map(|factor| finite_or_zero(c.karma as f64 * factor))
        })
        .sum::<f64>();
    let overall_karma_bonus = capped(overall_karma_bonus, cfg.karma_max_bonus);

    let top_level_unread = thread.comments.first().map(|c| !c.is_read).unwrap_or(false);
    let quicktake_bonus = if thread.stats.has_shortform && top_level_unread {
        cfg.quicktake_bonus
    } else {
        0.0
    };

    let read_post_context_bonus = if engagement.map(|e| e.is_on_read_post).unwrap_or(false) {
        cfg.read_post_context_bonus
    } else {
        0.0
    };

    let terms = ThreadScoreTerms {
        unread_subscribed_comment_bonus,
        engagement_continuation_bonus,
        replies_to_you_bonus,
        your_post_activity_bonus,
        overall_karma_bonus,
        topic_affinity_bonus: 0.0,
        quicktake_bonus,
        read_post_context_bonus,
    };

    let repetition_penalty_multiplier = engagement
        .map(|e| repetition_penalty(&e.serving_hours_ago, config))
        .unwrap_or(1.0);

    let total =
        (config.starting_value + terms.sum()) * repetition_penalty_multiplier * cfg.type_multiplier;

    (
        total,
        ThreadScoreBreakdown {
            total,
            terms,
            repetition_penalty_multiplier,
            type_multiplier: cfg.type_multiplier,
        },
    )
}

/// Score every item without ordering or selecting.
///
/// Applies the global `max_score` cap and writes the capped value back into
/// the breakdown total. Spotlights, bookmarks and subscription suggestions get
/// a flat baseline of 1.
pub fn score_items(items: &[RankableItem], config: &RankingConfig) -> Vec<ScoredItem> {
    let scored: Vec<ScoredItem> = items
        .iter()
        .map(|item| {
            let (score, mut breakdown) = match item {
                RankableItem::Post(post) => {
                    let (score, b) = score_post(post, config);
                    (score, ScoreBreakdown::Post(b))
                }
                RankableItem::CommentThread(thread) => {
                    let (score, b) = score_thread(thread, config);
                    (score, ScoreBreakdown::Thread(b))
                }
                RankableItem::Spotlight(_)
                | RankableItem::Bookmark(_)
                | RankableItem::SubscriptionSuggestion(_) => {
                    (1.0, ScoreBreakdown::Post(PostScoreBreakdown::baseline()))
                }
            };

            let capped_score = capped(score, config.max_score);
            breakdown.set_total(capped_score);

            ScoredItem {
                id: item.id().to_string(),
                score: capped_score,
                item: item.clone(),
                breakdown,
            }
        })
        .collect();

    debug!(
        item_count = scored.len(),
        top_score = ?scored.iter().map(|s| s.score).reduce(f64::max),
        "Scored feed items"
    );

    scored
}
