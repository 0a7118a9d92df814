//! Content normalizer.
//!
//! Converts a raw provider item (an arbitrary JSON object) into the
//! canonical [`ContentItem`]. Pure transform: the only side channel is a
//! warning on stderr when a publish date fails to parse, which never
//! surfaces to the caller — one bad date must not abort an ingestion batch.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use crate::models::{ContentItem, ContentMetrics, ContentType};

/// Why a raw item was rejected. These are item-scoped validation failures:
/// the sync loop logs them, counts the item as skipped, and moves on.
#[derive(Debug)]
pub enum NormalizeError {
    /// No usable `url` — nothing to key the upsert on.
    MissingKey,
    /// Title or body empty after sanitization.
    EmptyField(&'static str),
    /// Metrics must be non-negative; the scoring engine does not re-check.
    NegativeMetric(&'static str),
}

impl std::fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NormalizeError::MissingKey => write!(f, "item has no url"),
            NormalizeError::EmptyField(field) => {
                write!(f, "{} is empty after sanitization", field)
            }
            NormalizeError::NegativeMetric(field) => write!(f, "negative value for {}", field),
        }
    }
}

impl std::error::Error for NormalizeError {}

/// Normalize one raw provider item into a canonical [`ContentItem`].
///
/// `fetched_at` is the ingestion timestamp, used when the source provides
/// no publish date (or an unparseable one).
pub fn normalize(
    raw: &Value,
    provider: &str,
    fetched_at: DateTime<Utc>,
) -> Result<ContentItem, NormalizeError> {
    let external_key = sanitize_string(raw.get("url"));
    if external_key.is_empty() {
        return Err(NormalizeError::MissingKey);
    }

    let title = sanitize_string(raw.get("title"));
    if title.is_empty() {
        return Err(NormalizeError::EmptyField("title"));
    }

    let body = sanitize_string(raw.get("content"));
    if body.is_empty() {
        return Err(NormalizeError::EmptyField("content"));
    }

    let content_type = normalize_type(raw.get("type"));

    let mut category = sanitize_string(raw.get("category"));
    if category.is_empty() {
        category = "General".to_string();
    }

    let tags = normalize_tags(raw.get("tags"));

    let metrics = match content_type {
        ContentType::Video => {
            let views = require_counter(raw, "views")?;
            let likes = require_counter(raw, "likes")?;
            ContentMetrics::Video { views, likes }
        }
        ContentType::Text => {
            let reading_time = optional_metric(raw, "reading_time")?;
            let reactions = optional_metric(raw, "reactions")?;
            ContentMetrics::Text {
                reading_time,
                reactions,
            }
        }
    };

    let published_at = normalize_date(raw.get("published_at"), fetched_at);

    Ok(ContentItem {
        external_key,
        title,
        body,
        category,
        tags,
        metrics,
        published_at,
        provider: provider.to_string(),
    })
}

/// Strip HTML tags and trim whitespace. Non-string values (and missing
/// fields) normalize to the empty string.
fn sanitize_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => strip_tags(s).trim().to_string(),
        _ => String::new(),
    }
}

/// Remove `<...>` tag spans. Unterminated tags swallow the rest of the
/// string, matching the usual strip-tags behavior.
fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for ch in input.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn normalize_type(value: Option<&Value>) -> ContentType {
    match value.and_then(Value::as_str) {
        Some(s) => ContentType::from_str_lossy(s),
        None => ContentType::Text,
    }
}

/// Filter a raw tags value down to non-empty strings, deduplicated,
/// provider order preserved. Anything that is not an array yields no tags.
fn normalize_tags(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };

    let mut tags: Vec<String> = Vec::new();
    for item in items {
        if let Value::String(s) = item {
            let tag = strip_tags(s).trim().to_string();
            if !tag.is_empty() && !tags.contains(&tag) {
                tags.push(tag);
            }
        }
    }
    tags
}

/// Read an integer field that may be a JSON number, a numeric string, null,
/// or absent. Missing and empty-string values are `None`, never 0.
fn read_integer(raw: &Value, key: &str) -> Option<i64> {
    match raw.get(key) {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                s.parse::<i64>().ok()
            }
        }
        _ => None,
    }
}

/// Required counter for video metrics: missing defaults to 0, negatives are
/// rejected.
fn require_counter(raw: &Value, key: &'static str) -> Result<i64, NormalizeError> {
    let n = read_integer(raw, key).unwrap_or(0);
    if n < 0 {
        return Err(NormalizeError::NegativeMetric(key));
    }
    Ok(n)
}

/// Optional text metric: missing stays `None`, negatives are rejected.
fn optional_metric(raw: &Value, key: &'static str) -> Result<Option<i64>, NormalizeError> {
    match read_integer(raw, key) {
        Some(n) if n < 0 => Err(NormalizeError::NegativeMetric(key)),
        other => Ok(other),
    }
}

/// Parse a publish date, falling back to the ingestion timestamp on any
/// failure. Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`, and bare `YYYY-MM-DD`.
fn normalize_date(value: Option<&Value>, fetched_at: DateTime<Utc>) -> DateTime<Utc> {
    let Some(raw) = value.and_then(Value::as_str) else {
        return fetched_at;
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return fetched_at;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    if let Ok(nd) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(ndt) = nd.and_hms_opt(0, 0, 0) {
            return ndt.and_utc();
        }
    }

    eprintln!(
        "Warning: invalid published_at '{}', using ingestion time",
        raw
    );
    fetched_at
}
