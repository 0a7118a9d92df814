//! Ingestion pipeline orchestration.
//!
//! Coordinates the full sync flow: provider fetch → normalization →
//! scoring → upsert by natural key. Providers are processed in
//! registration order; a failing or unavailable provider is recorded in
//! the report and never blocks the remaining providers, and a failing
//! item never aborts its batch. Only a storage failure is fatal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;
use crate::models::{ItemError, ProviderReport, ProviderStatus, SyncReport};
use crate::normalize;
use crate::provider::{self, FetchFilters, Provider};
use crate::scoring;
use crate::store;

/// Cooperative cancellation flag, checked before each provider. A provider
/// that has started fetching finishes its whole batch — items are never
/// half-processed.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Run one sync sweep over the given providers.
///
/// Returns a structured summary even on partial failure; an `Err` means
/// the document store itself failed and the sync state is unknown — safe
/// to re-run, since the upsert is keyed on url.
pub async fn sync_providers(
    pool: &SqlitePool,
    providers: &[Box<dyn Provider>],
    filters: &FetchFilters,
    cancel: &CancelFlag,
) -> Result<SyncReport> {
    let mut report = SyncReport::default();

    for provider in providers {
        if cancel.is_cancelled() {
            eprintln!("Warning: sync cancelled, skipping remaining providers");
            break;
        }

        if !provider.is_available().await {
            eprintln!("Warning: provider {} is not available", provider.name());
            report.providers.push(ProviderReport {
                provider: provider.name().to_string(),
                format: provider.format().to_string(),
                status: ProviderStatus::Unavailable,
                fetched: 0,
                error: Some("provider not available".to_string()),
            });
            continue;
        }

        let raw_items = match provider.fetch(filters).await {
            Ok(items) => items,
            Err(e) => {
                eprintln!("Warning: fetch from {} failed: {}", provider.name(), e);
                report.providers.push(ProviderReport {
                    provider: provider.name().to_string(),
                    format: provider.format().to_string(),
                    status: ProviderStatus::Error,
                    fetched: 0,
                    error: Some(e.to_string()),
                });
                continue;
            }
        };

        let fetched = raw_items.len();
        let now = Utc::now();
        let now_ts = now.timestamp();

        // One transaction per provider; a commit failure is fatal for the run.
        let mut tx = pool.begin().await?;

        for raw in &raw_items {
            let item = match normalize::normalize(raw, provider.name(), now) {
                Ok(item) => item,
                Err(e) => {
                    let label = raw
                        .get("title")
                        .and_then(|t| t.as_str())
                        .unwrap_or("unknown")
                        .to_string();
                    eprintln!("Warning: skipping item '{}': {}", label, e);
                    report.skipped += 1;
                    report.errors.push(ItemError {
                        item: label,
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            let score = scoring::score(&item.metrics, item.published_at, now);

            match store::find_id_by_url(&mut *tx, &item.external_key).await? {
                Some(id) => {
                    store::update_item(&mut *tx, id, &item, score, now_ts).await?;
                    report.updated += 1;
                }
                None => {
                    store::insert_item(&mut *tx, &item, score, now_ts).await?;
                    report.created += 1;
                }
            }
        }

        tx.commit().await?;

        report.providers.push(ProviderReport {
            provider: provider.name().to_string(),
            format: provider.format().to_string(),
            status: ProviderStatus::Success,
            fetched,
            error: None,
        });
    }

    Ok(report)
}

/// CLI entry point: build providers from config, run the sweep, print the
/// summary.
pub async fn run_sync(config: &Config, query: Option<String>, limit: Option<u32>) -> Result<()> {
    let pool = db::connect(config).await?;
    let providers = provider::providers_from_config(config)?;

    if providers.is_empty() {
        println!("No providers configured.");
        pool.close().await;
        return Ok(());
    }

    let filters = FetchFilters { query, limit };
    let cancel = CancelFlag::new();
    let report = sync_providers(&pool, &providers, &filters, &cancel).await?;

    println!("sync");
    for p in &report.providers {
        let detail = match &p.error {
            Some(e) => format!(" ({})", e),
            None => String::new(),
        };
        println!(
            "  {:<20} {:<12} {} fetched{}",
            p.provider,
            p.status.as_str(),
            p.fetched,
            detail
        );
    }
    println!("  created: {}", report.created);
    println!("  updated: {}", report.updated);
    println!("  skipped: {}", report.skipped);
    if !report.errors.is_empty() {
        println!("  errors:");
        for e in &report.errors {
            println!("    {}: {}", e.item, e.error);
        }
    }
    println!("ok");

    pool.close().await;
    Ok(())
}
