//! Provider status listing.
//!
//! `ccat providers` shows every configured provider with its format, a live
//! availability probe, and the configured rate limit.

use anyhow::Result;

use crate::config::Config;
use crate::provider;

pub async fn run_providers(config: &Config) -> Result<()> {
    let providers = provider::providers_from_config(config)?;

    if providers.is_empty() {
        println!("No providers configured.");
        return Ok(());
    }

    println!(
        "{:<20} {:<8} {:<12} {}",
        "PROVIDER", "FORMAT", "AVAILABLE", "RATE LIMIT"
    );
    for p in &providers {
        let available = if p.is_available().await { "yes" } else { "no" };
        let rate = p.rate_limit();
        println!(
            "{:<20} {:<8} {:<12} {}/{}",
            p.name(),
            p.format(),
            available,
            rate.remaining,
            rate.limit
        );
    }

    Ok(())
}
