//! Catalog search and listing queries.
//!
//! Search is deliberately naive: `LIKE` matching on title and body plus
//! structured filters, ordered by the computed score (or an explicitly
//! whitelisted column). Every non-empty query is logged to the
//! `search_queries` analytics table; a logging failure never fails the
//! search itself.

use anyhow::{bail, Result};
use chrono::{NaiveDate, NaiveTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::config::Config;
use crate::db;
use crate::models::Document;
use crate::store::row_to_document;

/// Structured search filters. All optional; they compose with AND.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub content_type: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    /// Inclusive publish-date lower bound, `YYYY-MM-DD`.
    pub date_from: Option<String>,
    /// Inclusive publish-date upper bound, `YYYY-MM-DD`.
    pub date_to: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

/// One page of search results plus paging metadata.
#[derive(Debug)]
pub struct SearchPage {
    pub documents: Vec<Document>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub pages: i64,
    pub execution_time_ms: i64,
}

enum Bind {
    Text(String),
    Int(i64),
}

/// Translate filters into WHERE fragments and their bind values, in order.
fn build_conditions(query: &str, filters: &SearchFilters) -> Result<(Vec<String>, Vec<Bind>)> {
    let mut conditions: Vec<String> = Vec::new();
    let mut binds: Vec<Bind> = Vec::new();

    if !query.is_empty() {
        conditions.push("(title LIKE ? OR body LIKE ?)".to_string());
        let pattern = format!("%{}%", query);
        binds.push(Bind::Text(pattern.clone()));
        binds.push(Bind::Text(pattern));
    }

    if let Some(ref ct) = filters.content_type {
        let ct = ct.trim().to_lowercase();
        match ct.as_str() {
            "video" | "text" => {
                conditions.push("content_type = ?".to_string());
                binds.push(Bind::Text(ct));
            }
            other => bail!("Unknown content type filter: {}. Use video or text.", other),
        }
    }

    if let Some(ref category) = filters.category {
        if !category.is_empty() {
            conditions.push("category = ?".to_string());
            binds.push(Bind::Text(category.clone()));
        }
    }

    for tag in &filters.tags {
        if tag.is_empty() {
            continue;
        }
        conditions.push(
            "EXISTS (SELECT 1 FROM json_each(documents.tags) WHERE json_each.value = ?)"
                .to_string(),
        );
        binds.push(Bind::Text(tag.clone()));
    }

    if let Some(ref from) = filters.date_from {
        let date = NaiveDate::parse_from_str(from, "%Y-%m-%d")?;
        let ts = date.and_time(NaiveTime::MIN).and_utc().timestamp();
        conditions.push("published_at >= ?".to_string());
        binds.push(Bind::Int(ts));
    }

    if let Some(ref to) = filters.date_to {
        let date = NaiveDate::parse_from_str(to, "%Y-%m-%d")?;
        // Inclusive upper bound covers the whole day
        let ts = date.and_time(NaiveTime::MIN).and_utc().timestamp() + 86_399;
        conditions.push("published_at <= ?".to_string());
        binds.push(Bind::Int(ts));
    }

    Ok((conditions, binds))
}

/// Map the user-facing sort key onto a whitelisted column. Anything else
/// falls back to the score ordering.
fn sort_column(sort: Option<&str>) -> &'static str {
    match sort.unwrap_or("score") {
        "created" => "created_at",
        "title" => "title",
        "type" => "content_type",
        _ => "score",
    }
}

/// Search documents with LIKE matching, filters, sorting, and pagination.
///
/// `page` is clamped to 1.., `limit` to 1..=100.
pub async fn search_documents(
    pool: &SqlitePool,
    query: &str,
    filters: &SearchFilters,
    page: i64,
    limit: i64,
) -> Result<SearchPage> {
    let started = std::time::Instant::now();

    let query = query.trim();
    let page = page.max(1);
    let limit = limit.clamp(1, 100);
    let offset = (page - 1) * limit;

    let (conditions, binds) = build_conditions(query, filters)?;
    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let order = match filters.order.as_deref() {
        Some("asc") => "ASC",
        _ => "DESC",
    };
    let sort = sort_column(filters.sort.as_deref());

    let sql = format!(
        "SELECT * FROM documents{} ORDER BY {} {} LIMIT {} OFFSET {}",
        where_clause, sort, order, limit, offset
    );
    let mut q = sqlx::query(&sql);
    for bind in &binds {
        q = match bind {
            Bind::Text(s) => q.bind(s.as_str()),
            Bind::Int(i) => q.bind(*i),
        };
    }
    let rows = q.fetch_all(pool).await?;
    let documents: Vec<Document> = rows.iter().map(row_to_document).collect();

    let count_sql = format!("SELECT COUNT(*) AS n FROM documents{}", where_clause);
    let mut count_q = sqlx::query(&count_sql);
    for bind in &binds {
        count_q = match bind {
            Bind::Text(s) => count_q.bind(s.as_str()),
            Bind::Int(i) => count_q.bind(*i),
        };
    }
    let total: i64 = count_q.fetch_one(pool).await?.get("n");

    let execution_time_ms = started.elapsed().as_millis() as i64;

    log_search_query(pool, query, filters, documents.len() as i64, execution_time_ms).await;

    Ok(SearchPage {
        documents,
        total,
        page,
        limit,
        pages: (total + limit - 1) / limit,
        execution_time_ms,
    })
}

/// Record the query for analytics. Best effort only.
async fn log_search_query(
    pool: &SqlitePool,
    query: &str,
    filters: &SearchFilters,
    results_count: i64,
    execution_time_ms: i64,
) {
    if query.is_empty() {
        return;
    }

    let filters_json = serde_json::json!({
        "type": filters.content_type,
        "category": filters.category,
        "tags": filters.tags,
        "date_from": filters.date_from,
        "date_to": filters.date_to,
    })
    .to_string();

    let result = sqlx::query(
        "INSERT INTO search_queries (query_text, filters, results_count, execution_time_ms, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(query)
    .bind(&filters_json)
    .bind(results_count)
    .bind(execution_time_ms)
    .bind(Utc::now().timestamp())
    .execute(pool)
    .await;

    if let Err(e) = result {
        eprintln!("Warning: failed to log search query: {}", e);
    }
}

/// Title suggestions for a partial query. Prefixes shorter than two
/// characters yield nothing.
pub async fn suggestions(pool: &SqlitePool, prefix: &str, limit: i64) -> Result<Vec<String>> {
    let prefix = prefix.trim();
    if prefix.chars().count() < 2 {
        return Ok(Vec::new());
    }
    let limit = limit.clamp(1, 20);

    let rows = sqlx::query("SELECT DISTINCT title FROM documents WHERE title LIKE ? LIMIT ?")
        .bind(format!("%{}%", prefix))
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows.iter().map(|r| r.get("title")).collect())
}

/// Categories with document counts, most populous first.
pub async fn categories(pool: &SqlitePool) -> Result<Vec<(String, i64)>> {
    let rows = sqlx::query(
        "SELECT category, COUNT(*) AS doc_count FROM documents GROUP BY category ORDER BY doc_count DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|r| (r.get("category"), r.get("doc_count")))
        .collect())
}

/// Distinct tags across the whole catalog, alphabetical.
pub async fn all_tags(pool: &SqlitePool) -> Result<Vec<String>> {
    let rows = sqlx::query(
        "SELECT DISTINCT json_each.value AS tag FROM documents, json_each(documents.tags) ORDER BY tag",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(|r| r.get("tag")).collect())
}

/// CLI entry point for `ccat search`.
pub async fn run_search(
    config: &Config,
    query: &str,
    filters: &SearchFilters,
    page: i64,
    limit: i64,
) -> Result<()> {
    let pool = db::connect(config).await?;
    let result = search_documents(&pool, query, filters, page, limit).await?;

    if result.documents.is_empty() {
        println!("No results.");
        pool.close().await;
        return Ok(());
    }

    println!(
        "Results: {} total, page {}/{} ({} ms)",
        result.total, result.page, result.pages, result.execution_time_ms
    );
    for doc in &result.documents {
        println!(
            "  [{}] {:>8.2}  {:<5}  {:<16}  {}",
            doc.id,
            doc.score,
            doc.content_type.as_str(),
            doc.category,
            doc.title
        );
        println!("       {}", doc.url);
    }

    pool.close().await;
    Ok(())
}

pub async fn run_suggest(config: &Config, prefix: &str, limit: i64) -> Result<()> {
    let pool = db::connect(config).await?;
    let titles = suggestions(&pool, prefix, limit).await?;

    if titles.is_empty() {
        println!("No suggestions.");
    } else {
        for title in &titles {
            println!("{}", title);
        }
    }

    pool.close().await;
    Ok(())
}

pub async fn run_categories(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let cats = categories(&pool).await?;

    println!("{:<24} {}", "CATEGORY", "DOCUMENTS");
    for (category, count) in &cats {
        println!("{:<24} {}", category, count);
    }

    pool.close().await;
    Ok(())
}

pub async fn run_tags(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let tags = all_tags(&pool).await?;

    for tag in &tags {
        println!("{}", tag);
    }

    pool.close().await;
    Ok(())
}
