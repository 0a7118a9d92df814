//! Catalog statistics and health overview.
//!
//! Provides a quick summary of what's in the catalog: document counts by
//! type, top categories, score distribution, and search analytics. Used by
//! `ccat stats` to give confidence that syncs and scoring are working as
//! expected.

use anyhow::Result;
use sqlx::Row;

use crate::config::Config;
use crate::db;

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    let total_docs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
        .fetch_one(&pool)
        .await?;

    let video_docs: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE content_type = 'video'")
            .fetch_one(&pool)
            .await?;

    let text_docs: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE content_type = 'text'")
            .fetch_one(&pool)
            .await?;

    let (avg_score, max_score): (f64, f64) = if total_docs > 0 {
        let row = sqlx::query("SELECT AVG(score) AS avg_score, MAX(score) AS max_score FROM documents")
            .fetch_one(&pool)
            .await?;
        (row.get("avg_score"), row.get("max_score"))
    } else {
        (0.0, 0.0)
    };

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Content Catalog — Stats");
    println!("=======================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Documents:   {}", total_docs);
    println!("  Video:       {}", video_docs);
    println!("  Text:        {}", text_docs);
    println!("  Avg score:   {:.2}", avg_score);
    println!("  Max score:   {:.2}", max_score);

    // Top categories by document count
    let category_rows = sqlx::query(
        r#"
        SELECT category, COUNT(*) AS doc_count, AVG(score) AS avg_score
        FROM documents
        GROUP BY category
        ORDER BY doc_count DESC
        LIMIT 10
        "#,
    )
    .fetch_all(&pool)
    .await?;

    if !category_rows.is_empty() {
        println!();
        println!("  By category:");
        println!("  {:<24} {:>6} {:>10}", "CATEGORY", "DOCS", "AVG SCORE");
        println!("  {}", "-".repeat(44));
        for row in &category_rows {
            let category: String = row.get("category");
            let doc_count: i64 = row.get("doc_count");
            let cat_avg: f64 = row.get("avg_score");
            println!("  {:<24} {:>6} {:>10.2}", category, doc_count, cat_avg);
        }
    }

    // Search analytics
    let total_queries: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM search_queries")
        .fetch_one(&pool)
        .await?;

    println!();
    println!("  Searches:    {}", total_queries);

    if total_queries > 0 {
        let query_rows = sqlx::query(
            r#"
            SELECT query_text, COUNT(*) AS times, AVG(results_count) AS avg_results
            FROM search_queries
            GROUP BY query_text
            ORDER BY times DESC
            LIMIT 5
            "#,
        )
        .fetch_all(&pool)
        .await?;

        println!();
        println!("  Top queries:");
        println!("  {:<24} {:>6} {:>12}", "QUERY", "TIMES", "AVG RESULTS");
        println!("  {}", "-".repeat(46));
        for row in &query_rows {
            let query_text: String = row.get("query_text");
            let times: i64 = row.get("times");
            let avg_results: f64 = row.get("avg_results");
            println!("  {:<24} {:>6} {:>12.1}", query_text, times, avg_results);
        }
    }

    println!();

    pool.close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }
}
