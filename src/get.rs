//! Document retrieval and interaction commands.
//!
//! `ccat get` prints a full document; `ccat view` and `ccat like` record an
//! interaction and print the refreshed counters and score.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::db;
use crate::models::Document;
use crate::store;

/// CLI entry point for `ccat get`.
pub async fn run_get(config: &Config, id: i64) -> Result<()> {
    let pool = db::connect(config).await?;
    let doc = store::get_document(&pool, id).await?;
    pool.close().await;

    let doc = match doc {
        Some(doc) => doc,
        None => bail!("document not found: {}", id),
    };

    print_document(&doc);
    Ok(())
}

/// CLI entry point for `ccat view`.
pub async fn run_view(config: &Config, id: i64) -> Result<()> {
    let pool = db::connect(config).await?;
    let doc = store::record_view(&pool, id).await?;
    pool.close().await;

    println!("Viewed document {} ({} views)", doc.id, doc.views);
    println!("score: {:.2}", doc.score);
    Ok(())
}

/// CLI entry point for `ccat like`.
pub async fn run_like(config: &Config, id: i64) -> Result<()> {
    let pool = db::connect(config).await?;
    let doc = store::record_like(&pool, id).await?;
    pool.close().await;

    match doc.content_type {
        crate::models::ContentType::Video => {
            println!("Liked document {} ({} likes)", doc.id, doc.likes)
        }
        crate::models::ContentType::Text => println!(
            "Liked document {} ({} reactions)",
            doc.id,
            doc.reactions.unwrap_or(0)
        ),
    }
    println!("score: {:.2}", doc.score);
    Ok(())
}

fn print_document(doc: &Document) {
    println!("--- Document ---");
    println!("id:           {}", doc.id);
    println!("title:        {}", doc.title);
    println!("url:          {}", doc.url);
    println!("type:         {}", doc.content_type.as_str());
    println!("category:     {}", doc.category);
    println!("tags:         {}", doc.tags.join(", "));
    match doc.content_type {
        crate::models::ContentType::Video => {
            println!("views:        {}", doc.views);
            println!("likes:        {}", doc.likes);
        }
        crate::models::ContentType::Text => {
            println!(
                "reading_time: {}",
                doc.reading_time
                    .map(|m| format!("{} min", m))
                    .unwrap_or_else(|| "unknown".to_string())
            );
            println!("reactions:    {}", doc.reactions.unwrap_or(0));
        }
    }
    println!("score:        {:.2}", doc.score);
    println!("published_at: {}", format_ts_iso(doc.published_at));
    println!("created_at:   {}", format_ts_iso(doc.created_at));
    println!("updated_at:   {}", format_ts_iso(doc.updated_at));
    println!();

    println!("--- Body ---");
    println!("{}", doc.body);
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ts.to_string())
}
