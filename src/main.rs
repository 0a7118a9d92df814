//! # Content Catalog CLI (`ccat`)
//!
//! The `ccat` binary is the primary interface for Content Catalog. It
//! provides commands for database initialization, provider sync, search,
//! document retrieval, interactions, and catalog statistics.
//!
//! ## Usage
//!
//! ```bash
//! ccat --config ./config/ccat.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ccat init` | Create the SQLite database and run schema migrations |
//! | `ccat providers` | List configured providers and their availability |
//! | `ccat sync` | Pull from all providers, normalize, score, and upsert |
//! | `ccat search "<query>"` | Search the catalog with filters and sorting |
//! | `ccat suggest "<prefix>"` | Title suggestions for a partial query |
//! | `ccat categories` | List categories with document counts |
//! | `ccat tags` | List all tags in the catalog |
//! | `ccat get <id>` | Print a full document by id |
//! | `ccat view <id>` | Record a view and rescore the document |
//! | `ccat like <id>` | Record a like and rescore the document |
//! | `ccat stats` | Catalog and search-analytics overview |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the database
//! ccat init --config ./config/ccat.toml
//!
//! # Pull everything from the configured feeds
//! ccat sync --config ./config/ccat.toml
//!
//! # Narrow the pull upstream
//! ccat sync --query rust --limit 50
//!
//! # Filtered search, newest first
//! ccat search "rust" --type video --from 2024-01-01 --sort created
//!
//! # Record interactions
//! ccat view 12
//! ccat like 12
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use content_catalog::{config, get, migrate, providers, search, stats, sync};

/// Content Catalog CLI — a provider-driven content aggregation and search
/// service.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/ccat.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "ccat",
    about = "Content Catalog — a provider-driven content aggregation and search service",
    version,
    long_about = "Content Catalog pulls items from heterogeneous upstream feeds (JSON and XML), \
    normalizes them into a single document shape, scores each document by type, freshness, and \
    engagement, and stores everything in SQLite for search, filtering, and listing."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/ccat.toml`. All provider, database, and sync
    /// settings are read from this file.
    #[arg(long, global = true, default_value = "./config/ccat.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and all required tables
    /// (documents, search_queries). This command is idempotent — running it
    /// multiple times is safe.
    Init,

    /// List configured providers and their status.
    ///
    /// Shows every provider with its feed format, a live availability
    /// probe, and the configured rate limit. Useful for verifying
    /// configuration before running a sync.
    Providers,

    /// Pull from all providers, normalize, score, and upsert.
    ///
    /// Providers run in configuration order. An unavailable or failing
    /// provider is reported and skipped; an invalid item is skipped and
    /// recorded. Documents are upserted by url, so re-running a sync never
    /// creates duplicates.
    Sync {
        /// Pass a query string upstream to providers that support filtering.
        #[arg(long)]
        query: Option<String>,

        /// Ask providers for at most this many items each.
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Search the catalog.
    ///
    /// Matches the query against document titles and bodies, applies the
    /// given filters, and returns a ranked page of results. An empty query
    /// lists the whole catalog.
    Search {
        /// The search query string. Empty means "list everything".
        #[arg(default_value = "")]
        query: String,

        /// Filter by content type: `video` or `text`.
        #[arg(long = "type")]
        content_type: Option<String>,

        /// Filter by exact category name.
        #[arg(long)]
        category: Option<String>,

        /// Filter by tag. Repeatable; documents must carry every given tag.
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Only documents published on or after this date (YYYY-MM-DD).
        #[arg(long)]
        from: Option<String>,

        /// Only documents published on or before this date (YYYY-MM-DD).
        #[arg(long)]
        to: Option<String>,

        /// Sort key: `score` (default), `created`, `title`, or `type`.
        #[arg(long)]
        sort: Option<String>,

        /// Sort direction: `asc` or `desc` (default).
        #[arg(long)]
        order: Option<String>,

        /// Result page, starting at 1.
        #[arg(long, default_value_t = 1)]
        page: i64,

        /// Results per page (max 100).
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },

    /// Title suggestions for a partial query.
    ///
    /// Prints matching document titles, one per line. Prefixes shorter than
    /// two characters yield nothing.
    Suggest {
        /// The partial query, at least two characters.
        prefix: String,

        /// Maximum number of suggestions (max 20).
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },

    /// List categories with document counts, most populous first.
    Categories,

    /// List all tags in the catalog, one per line.
    Tags,

    /// Print a full document by id.
    Get {
        /// Document id.
        id: i64,
    },

    /// Record a view.
    ///
    /// Increments the document's view counter and recomputes its score.
    View {
        /// Document id.
        id: i64,
    },

    /// Record a like.
    ///
    /// Bumps the like counter for video documents and the reaction counter
    /// for text documents, then recomputes the score.
    Like {
        /// Document id.
        id: i64,
    },

    /// Catalog and search-analytics overview.
    ///
    /// Shows document counts by type, top categories, score distribution,
    /// and the most frequent search queries.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Providers => {
            providers::run_providers(&cfg).await?;
        }
        Commands::Sync { query, limit } => {
            sync::run_sync(&cfg, query, limit).await?;
        }
        Commands::Search {
            query,
            content_type,
            category,
            tags,
            from,
            to,
            sort,
            order,
            page,
            limit,
        } => {
            let filters = search::SearchFilters {
                content_type,
                category,
                tags,
                date_from: from,
                date_to: to,
                sort,
                order,
            };
            search::run_search(&cfg, &query, &filters, page, limit).await?;
        }
        Commands::Suggest { prefix, limit } => {
            search::run_suggest(&cfg, &prefix, limit).await?;
        }
        Commands::Categories => {
            search::run_categories(&cfg).await?;
        }
        Commands::Tags => {
            search::run_tags(&cfg).await?;
        }
        Commands::Get { id } => {
            get::run_get(&cfg, id).await?;
        }
        Commands::View { id } => {
            get::run_view(&cfg, id).await?;
        }
        Commands::Like { id } => {
            get::run_like(&cfg, id).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
