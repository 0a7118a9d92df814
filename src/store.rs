//! Document store access.
//!
//! All reads and writes against the `documents` table live here: lookup by
//! natural key for the sync upsert, retrieval by id, and the view/like
//! interaction updates. Interactions run read-modify-score-write inside a
//! single transaction so concurrent interactions on the same document
//! cannot lose updates.

use anyhow::{bail, Result};
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

use crate::models::{ContentItem, ContentMetrics, ContentType, Document};
use crate::scoring;

pub(crate) fn row_to_document(row: &SqliteRow) -> Document {
    let tags_json: String = row.get("tags");
    let tags: Vec<String> = serde_json::from_str(&tags_json).unwrap_or_default();
    let content_type: String = row.get("content_type");

    Document {
        id: row.get("id"),
        title: row.get("title"),
        body: row.get("body"),
        url: row.get("url"),
        category: row.get("category"),
        tags,
        content_type: ContentType::from_str_lossy(&content_type),
        views: row.get("views"),
        likes: row.get("likes"),
        reading_time: row.get("reading_time"),
        reactions: row.get("reactions"),
        score: row.get("score"),
        published_at: row.get("published_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const DOCUMENT_COLUMNS: &str = "id, title, body, url, category, tags, content_type, views, likes, \
     reading_time, reactions, score, published_at, created_at, updated_at";

pub async fn get_document(pool: &SqlitePool, id: i64) -> Result<Option<Document>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM documents WHERE id = ?",
        DOCUMENT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| row_to_document(&r)))
}

pub async fn find_by_url(pool: &SqlitePool, url: &str) -> Result<Option<Document>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM documents WHERE url = ?",
        DOCUMENT_COLUMNS
    ))
    .bind(url)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| row_to_document(&r)))
}

/// Lookup by natural key inside a sync transaction, so items earlier in the
/// same batch are visible to later ones.
pub(crate) async fn find_id_by_url(conn: &mut SqliteConnection, url: &str) -> Result<Option<i64>> {
    let id: Option<i64> = sqlx::query_scalar("SELECT id FROM documents WHERE url = ?")
        .bind(url)
        .fetch_optional(conn)
        .await?;
    Ok(id)
}

fn metric_columns(metrics: &ContentMetrics) -> (i64, i64, Option<i64>, Option<i64>) {
    match *metrics {
        ContentMetrics::Video { views, likes } => (views, likes, None, None),
        ContentMetrics::Text {
            reading_time,
            reactions,
        } => (0, 0, reading_time, reactions),
    }
}

/// Create path of the sync upsert.
pub(crate) async fn insert_item(
    conn: &mut SqliteConnection,
    item: &ContentItem,
    score: f64,
    now_ts: i64,
) -> Result<()> {
    let (views, likes, reading_time, reactions) = metric_columns(&item.metrics);
    let tags_json = serde_json::to_string(&item.tags)?;

    sqlx::query(
        r#"
        INSERT INTO documents
            (title, body, url, category, tags, content_type, views, likes,
             reading_time, reactions, score, published_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&item.title)
    .bind(&item.body)
    .bind(&item.external_key)
    .bind(&item.category)
    .bind(&tags_json)
    .bind(item.content_type().as_str())
    .bind(views)
    .bind(likes)
    .bind(reading_time)
    .bind(reactions)
    .bind(score)
    .bind(item.published_at.timestamp())
    .bind(now_ts)
    .bind(now_ts)
    .execute(conn)
    .await?;

    Ok(())
}

/// Update path of the sync upsert: overwrite every normalized and scored
/// field, refresh `updated_at`, leave `created_at` alone.
pub(crate) async fn update_item(
    conn: &mut SqliteConnection,
    id: i64,
    item: &ContentItem,
    score: f64,
    now_ts: i64,
) -> Result<()> {
    let (views, likes, reading_time, reactions) = metric_columns(&item.metrics);
    let tags_json = serde_json::to_string(&item.tags)?;

    sqlx::query(
        r#"
        UPDATE documents SET
            title = ?, body = ?, category = ?, tags = ?, content_type = ?,
            views = ?, likes = ?, reading_time = ?, reactions = ?,
            score = ?, published_at = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&item.title)
    .bind(&item.body)
    .bind(&item.category)
    .bind(&tags_json)
    .bind(item.content_type().as_str())
    .bind(views)
    .bind(likes)
    .bind(reading_time)
    .bind(reactions)
    .bind(score)
    .bind(item.published_at.timestamp())
    .bind(now_ts)
    .bind(id)
    .execute(conn)
    .await?;

    Ok(())
}

/// Record one view: increment the view counter, recompute the score, and
/// persist both atomically.
pub async fn record_view(pool: &SqlitePool, id: i64) -> Result<Document> {
    apply_interaction(pool, id, |doc| {
        doc.views += 1;
    })
    .await
}

/// Record one like: `likes` for video documents, `reactions` for text
/// documents — each type's counter feeds its own engagement formula.
pub async fn record_like(pool: &SqlitePool, id: i64) -> Result<Document> {
    apply_interaction(pool, id, |doc| match doc.content_type {
        ContentType::Video => doc.likes += 1,
        ContentType::Text => doc.reactions = Some(doc.reactions.unwrap_or(0) + 1),
    })
    .await
}

/// Shared read-modify-score-write sequence for interactions. The whole
/// sequence runs in one immediate transaction: the write lock is taken up
/// front, so concurrent interactions on the same document queue on the busy
/// timeout instead of failing a snapshot upgrade at commit time.
async fn apply_interaction(
    pool: &SqlitePool,
    id: i64,
    mutate: impl FnOnce(&mut Document),
) -> Result<Document> {
    let mut conn = pool.acquire().await?;

    sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

    match interact(&mut *conn, id, mutate).await {
        Ok(doc) => {
            sqlx::query("COMMIT").execute(&mut *conn).await?;
            Ok(doc)
        }
        Err(e) => {
            let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
            Err(e)
        }
    }
}

async fn interact(
    conn: &mut SqliteConnection,
    id: i64,
    mutate: impl FnOnce(&mut Document),
) -> Result<Document> {
    let now = Utc::now();

    let row = sqlx::query(&format!(
        "SELECT {} FROM documents WHERE id = ?",
        DOCUMENT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    let mut doc = match row {
        Some(row) => row_to_document(&row),
        None => bail!("document not found: {}", id),
    };

    mutate(&mut doc);

    let published_at = chrono::DateTime::from_timestamp(doc.published_at, 0).unwrap_or(now);
    doc.score = scoring::score(&doc.metrics(), published_at, now);
    doc.updated_at = now.timestamp();

    sqlx::query(
        "UPDATE documents SET views = ?, likes = ?, reactions = ?, score = ?, updated_at = ? WHERE id = ?",
    )
    .bind(doc.views)
    .bind(doc.likes)
    .bind(doc.reactions)
    .bind(doc.score)
    .bind(doc.updated_at)
    .bind(doc.id)
    .execute(&mut *conn)
    .await?;

    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate;
    use chrono::Utc;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        migrate::create_schema(&pool).await.unwrap();
        pool
    }

    fn video_item(url: &str) -> ContentItem {
        ContentItem {
            external_key: url.to_string(),
            title: "Video".to_string(),
            body: "Body".to_string(),
            category: "General".to_string(),
            tags: vec!["a".to_string()],
            metrics: ContentMetrics::Video {
                views: 1000,
                likes: 10,
            },
            published_at: Utc::now(),
            provider: "json:test".to_string(),
        }
    }

    fn text_item(url: &str) -> ContentItem {
        ContentItem {
            external_key: url.to_string(),
            title: "Text".to_string(),
            body: "Body".to_string(),
            category: "General".to_string(),
            tags: vec![],
            metrics: ContentMetrics::Text {
                reading_time: Some(10),
                reactions: None,
            },
            published_at: Utc::now(),
            provider: "xml:test".to_string(),
        }
    }

    async fn insert(pool: &SqlitePool, item: &ContentItem) -> Document {
        let now = Utc::now();
        let score = scoring::score(&item.metrics, item.published_at, now);
        let mut conn = pool.acquire().await.unwrap();
        insert_item(&mut *conn, item, score, now.timestamp())
            .await
            .unwrap();
        drop(conn);
        find_by_url(pool, &item.external_key).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_find_by_url() {
        let pool = test_pool().await;
        let doc = insert(&pool, &video_item("https://example.com/v1")).await;
        assert_eq!(doc.content_type, ContentType::Video);
        assert_eq!(doc.views, 1000);
        assert_eq!(doc.reading_time, None);
        assert!(doc.score > 0.0);
    }

    #[tokio::test]
    async fn test_record_view_increments_views() {
        let pool = test_pool().await;
        let doc = insert(&pool, &video_item("https://example.com/v1")).await;
        let updated = record_view(&pool, doc.id).await.unwrap();
        assert_eq!(updated.views, doc.views + 1);
    }

    #[tokio::test]
    async fn test_record_like_on_video_increases_score() {
        let pool = test_pool().await;
        let doc = insert(&pool, &video_item("https://example.com/v1")).await;
        let updated = record_like(&pool, doc.id).await.unwrap();
        assert_eq!(updated.likes, doc.likes + 1);
        // views > 0, so engagement is strictly monotonic in likes
        assert!(updated.score > doc.score);
    }

    #[tokio::test]
    async fn test_record_like_on_text_bumps_reactions() {
        let pool = test_pool().await;
        let doc = insert(&pool, &text_item("https://example.com/t1")).await;
        assert_eq!(doc.reactions, None);
        let updated = record_like(&pool, doc.id).await.unwrap();
        assert_eq!(updated.reactions, Some(1));
        assert!(updated.score > doc.score);
    }

    #[tokio::test]
    async fn test_concurrent_likes_both_land() {
        // File-backed pool so the two interactions run on separate
        // connections, each taking the write lock in turn
        let tmp = tempfile::TempDir::new().unwrap();
        let config = crate::config::Config {
            db: crate::config::DbConfig {
                path: tmp.path().join("catalog.sqlite"),
            },
            sync: Default::default(),
            providers: Default::default(),
        };
        let pool = crate::db::connect(&config).await.unwrap();
        migrate::create_schema(&pool).await.unwrap();

        let doc = insert(&pool, &video_item("https://example.com/v1")).await;

        let (a, b) = tokio::join!(record_like(&pool, doc.id), record_like(&pool, doc.id));
        a.unwrap();
        b.unwrap();

        let after = get_document(&pool, doc.id).await.unwrap().unwrap();
        assert_eq!(after.likes, doc.likes + 2);
        pool.close().await;
    }

    #[tokio::test]
    async fn test_interaction_on_missing_document_fails() {
        let pool = test_pool().await;
        assert!(record_view(&pool, 999).await.is_err());
    }
}
