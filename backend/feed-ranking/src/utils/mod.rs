// Utility functions for feed-ranking

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Hyperbolic time decay: `scale^exponent / (age + bias)^exponent`.
///
/// Returns `None` when the denominator is zero, negative or non-finite so the
/// caller can drop the term instead of carrying NaN/Infinity forward.
pub fn hyperbolic_decay(age_hours: f64, bias: f64, scale: f64, exponent: f64) -> Option<f64> {
    let denominator = (age_hours + bias).powf(exponent);
    if !denominator.is_finite() || denominator <= 0.0 {
        return None;
    }

    let factor = scale.powf(exponent) / denominator;
    factor.is_finite().then_some(factor)
}

/// Whole hours elapsed between `then` and `now`, never negative.
pub fn hours_since(then: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - then).num_hours().max(0) as f64
}

/// Lowercase hex SHA-256 digest.
pub fn sha256_hex(input: &[u8]) -> String {
    hex::encode(sha256(input))
}

/// Compute SHA256 hash of input bytes
pub fn sha256(input: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(input);
    hasher.finalize().into()
}

/// Replace a non-finite value with zero.
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Apply an upper bound to a computed term.
///
/// `+inf` saturates at `cap`; NaN and `-inf` become 0.
pub fn capped(value: f64, cap: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    finite_or_zero(value.min(cap))
}
