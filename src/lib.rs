//! # Content Catalog
//!
//! A provider-driven content aggregation and search service.
//!
//! Content Catalog pulls items from heterogeneous upstream feeds (JSON and
//! XML), normalizes them into a single document shape, scores each document
//! by type, freshness, and engagement, and stores everything in SQLite for
//! search, filtering, and listing via a CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────────┐   ┌──────────┐
//! │ Providers   │──▶│  Pipeline        │──▶│  SQLite   │
//! │ JSON / XML  │   │ Normalize+Score │   │ documents │
//! └─────────────┘   └──────────────────┘   └────┬─────┘
//!                                               │
//!                                               ▼
//!                                         ┌──────────┐
//!                                         │   CLI    │
//!                                         │  (ccat)  │
//!                                         └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! ccat init                       # create database
//! ccat providers                  # check configured feeds
//! ccat sync                       # pull, normalize, score, upsert
//! ccat search "rust" --tag beginner
//! ccat stats                      # catalog overview
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`provider`] | Provider trait and construction |
//! | [`provider_json`] | JSON feed provider |
//! | [`provider_xml`] | XML feed provider |
//! | [`normalize`] | Raw item validation and sanitization |
//! | [`scoring`] | Document relevance scoring |
//! | [`sync`] | Ingestion pipeline orchestration |
//! | [`store`] | Document reads, writes, and interactions |
//! | [`search`] | Search, suggestions, categories, tags |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod config;
pub mod db;
pub mod get;
pub mod migrate;
pub mod models;
pub mod normalize;
pub mod provider;
pub mod provider_json;
pub mod provider_xml;
pub mod providers;
pub mod scoring;
pub mod search;
pub mod stats;
pub mod store;
pub mod sync;
