//! Content scoring engine.
//!
//! Converts heterogeneous engagement metrics into a single comparable
//! relevance score:
//!
//! ```text
//! score = (base * type_multiplier) + freshness + engagement
//! ```
//!
//! The engine is a pure function of its inputs. It never fails and never
//! performs I/O; `now` is passed in so callers (and tests) control the
//! freshness reference point.

use chrono::{DateTime, Utc};

use crate::models::ContentMetrics;

/// Multiplier applied to the base score for video content.
const VIDEO_MULTIPLIER: f64 = 1.5;
const TEXT_MULTIPLIER: f64 = 1.0;

/// Compute the final score for a piece of content.
///
/// Missing text metrics are treated as 0 inside the formula; the canonical
/// record still carries `None` so the data layer can tell "no data" from
/// "zero". Valid (non-negative) inputs always yield a finite, non-negative
/// result — negative metrics are rejected by the normalizer, not here.
pub fn score(metrics: &ContentMetrics, published_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let base = base_score(metrics);
    let multiplier = match metrics {
        ContentMetrics::Video { .. } => VIDEO_MULTIPLIER,
        ContentMetrics::Text { .. } => TEXT_MULTIPLIER,
    };
    (base * multiplier) + freshness_score(published_at, now) + engagement_score(metrics)
}

fn base_score(metrics: &ContentMetrics) -> f64 {
    match *metrics {
        ContentMetrics::Video { views, likes } => views as f64 / 1000.0 + likes as f64 / 100.0,
        ContentMetrics::Text {
            reading_time,
            reactions,
        } => reading_time.unwrap_or(0) as f64 + reactions.unwrap_or(0) as f64 / 50.0,
    }
}

/// Step-function bonus for recent publication.
///
/// Uses the absolute day difference, so items published in the future
/// (clock skew, scheduled content) receive the same bonus as recent past
/// items. Part of the scoring contract.
fn freshness_score(published_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let days = (now - published_at).num_days().abs();
    if days <= 7 {
        5.0
    } else if days <= 30 {
        3.0
    } else if days <= 90 {
        1.0
    } else {
        0.0
    }
}

/// Ratio-based bonus rewarding interaction density. Guards every division.
fn engagement_score(metrics: &ContentMetrics) -> f64 {
    match *metrics {
        ContentMetrics::Video { views, likes } => {
            if views > 0 {
                (likes as f64 / views as f64) * 10.0
            } else {
                0.0
            }
        }
        ContentMetrics::Text {
            reading_time,
            reactions,
        } => {
            let rt = reading_time.unwrap_or(0);
            if rt > 0 {
                (reactions.unwrap_or(0) as f64 / rt as f64) * 5.0
            } else {
                0.0
            }
        }
    }
}
