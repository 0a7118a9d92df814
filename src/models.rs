//! Core data models used throughout the content catalog.
//!
//! These types represent the canonical content items produced by the
//! normalization pipeline and the documents persisted in SQLite.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Content classification. Anything a provider sends that is not exactly
/// `"video"` (after trimming and lowercasing) normalizes to [`ContentType::Text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Video,
    Text,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Video => "video",
            ContentType::Text => "text",
        }
    }

    /// Parse a stored type string. Unknown values fall back to text, the
    /// same rule the normalizer applies to raw provider input.
    pub fn from_str_lossy(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "video" => ContentType::Video,
            _ => ContentType::Text,
        }
    }
}

/// Type-dependent engagement metrics.
///
/// Video counters are required and default to 0; text metrics stay `None`
/// when the provider sent nothing, so "no data" is distinguishable from
/// "zero" at the data layer. Metrics that do not apply to the content type
/// are structurally absent.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentMetrics {
    Video {
        views: i64,
        likes: i64,
    },
    Text {
        reading_time: Option<i64>,
        reactions: Option<i64>,
    },
}

impl ContentMetrics {
    pub fn content_type(&self) -> ContentType {
        match self {
            ContentMetrics::Video { .. } => ContentType::Video,
            ContentMetrics::Text { .. } => ContentType::Text,
        }
    }
}

/// Canonical, provider-agnostic content record produced by normalization,
/// prior to persistence.
#[derive(Debug, Clone)]
pub struct ContentItem {
    /// Natural key for upsert: the source URL.
    pub external_key: String,
    pub title: String,
    pub body: String,
    pub category: String,
    /// Deduplicated, non-empty tags in provider order.
    pub tags: Vec<String>,
    pub metrics: ContentMetrics,
    pub published_at: DateTime<Utc>,
    /// Identity of the provider that produced the item, for stats and logs.
    pub provider: String,
}

impl ContentItem {
    pub fn content_type(&self) -> ContentType {
        self.metrics.content_type()
    }
}

/// Persisted catalog entity. Counters mutate over its lifetime through the
/// view/like interactions; everything else is overwritten on each sync.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub url: String,
    pub category: String,
    pub tags: Vec<String>,
    pub content_type: ContentType,
    pub views: i64,
    pub likes: i64,
    pub reading_time: Option<i64>,
    pub reactions: Option<i64>,
    pub score: f64,
    pub published_at: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Document {
    /// Reassemble the metrics view of this document for rescoring.
    pub fn metrics(&self) -> ContentMetrics {
        match self.content_type {
            ContentType::Video => ContentMetrics::Video {
                views: self.views,
                likes: self.likes,
            },
            ContentType::Text => ContentMetrics::Text {
                reading_time: self.reading_time,
                reactions: self.reactions,
            },
        }
    }
}

/// Outcome of one provider within a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderStatus {
    Success,
    Unavailable,
    Error,
}

impl ProviderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderStatus::Success => "success",
            ProviderStatus::Unavailable => "unavailable",
            ProviderStatus::Error => "error",
        }
    }
}

/// Per-provider sync statistics.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderReport {
    pub provider: String,
    pub format: String,
    pub status: ProviderStatus,
    pub fetched: usize,
    pub error: Option<String>,
}

/// A single item that failed normalization during sync.
#[derive(Debug, Clone, Serialize)]
pub struct ItemError {
    pub item: String,
    pub error: String,
}

/// Structured summary returned by a sync run, even on partial failure.
/// Only a storage failure aborts a sync before this is produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub created: u64,
    pub updated: u64,
    pub skipped: u64,
    pub errors: Vec<ItemError>,
    pub providers: Vec<ProviderReport>,
}
