use anyhow::Result;
use clap::{Parser, Subcommand};
use filmsearch_core::catalog::DEFAULT_TIMEOUT;
use filmsearch_core::{
    fallback_year_bounds, normalize_year_range, CatalogStore, LogStore, MemoryLogStore, Paginator, QueryLogger,
    SearchFilter, SledLogStore, SqliteCatalog, StatsService,
};
use loader::format::{films_table, latest_list, popular_list, reference_list};
use loader::import::import;
use loader::record::record_search;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "loader")]
#[command(about = "Load the film catalog and query it from the console", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import films from JSON/JSONL files or a directory of them
    Import {
        /// Input path (file or directory)
        #[arg(long)]
        input: PathBuf,
        /// SQLite catalog database
        #[arg(long, default_value = "./catalog.db")]
        db: PathBuf,
    },
    /// Search the catalog and print one page; the first page is logged
    Search {
        #[arg(long, default_value = "./catalog.db")]
        db: PathBuf,
        /// Query log directory
        #[arg(long, default_value = "./search_log")]
        log: PathBuf,
        /// Substring of title or description
        #[arg(long, conflicts_with_all = ["genre", "from", "to"])]
        keyword: Option<String>,
        /// Exact genre name; omit for every genre
        #[arg(long)]
        genre: Option<String>,
        /// Lower release-year bound (defaults to the oldest film)
        #[arg(long)]
        from: Option<i32>,
        /// Upper release-year bound (defaults to the newest film)
        #[arg(long)]
        to: Option<i32>,
        /// 1-based page number
        #[arg(long, default_value_t = 1)]
        page: u64,
        #[arg(long, default_value_t = 10)]
        page_size: u64,
    },
    /// List the genres and the release-year span available for a genre search
    Genres {
        #[arg(long, default_value = "./catalog.db")]
        db: PathBuf,
    },
    /// Print the most popular and the latest distinct searches
    Stats {
        #[arg(long, default_value = "./search_log")]
        log: PathBuf,
        #[arg(long, default_value_t = 5)]
        popular: usize,
        #[arg(long, default_value_t = 10)]
        latest: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Import { input, db } => {
            let catalog = SqliteCatalog::open(&db, DEFAULT_TIMEOUT).await?;
            let summary = import(&catalog, &input).await?;
            tracing::info!(files = summary.files, films = summary.films, db = %db.display(), "import complete");
            println!("Imported {} films from {} files.", summary.films, summary.files);
        }
        Commands::Search { db, log, keyword, genre, from, to, page, page_size } => {
            anyhow::ensure!(page_size > 0, "page size must be positive");
            let catalog = Arc::new(SqliteCatalog::open(&db, DEFAULT_TIMEOUT).await?);
            let filter = match keyword {
                Some(k) => SearchFilter::keyword(&k)?,
                None => {
                    let bounds = catalog.year_range().await?.unwrap_or_else(fallback_year_bounds);
                    let (yf, yt) = normalize_year_range(from, to, bounds);
                    SearchFilter::genre_year(genre.as_deref(), yf, yt)?
                }
            };
            let paginator = Paginator::new(catalog);
            let result = paginator.search_page(&filter, page, page_size).await?;
            println!("Total results: {}", result.total_count);
            println!("{}", films_table(&result));
            if result.has_next {
                println!("More results: --page {}", page.max(1) + 1);
            }

            match SledLogStore::open(&log) {
                Ok(store) => {
                    let logger = QueryLogger::new(Arc::new(store));
                    for warning in record_search(&logger, &filter, &result) {
                        eprintln!("warning: {warning}");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "query log unavailable, search not recorded"),
            }
        }
        Commands::Genres { db } => {
            let catalog = SqliteCatalog::open(&db, DEFAULT_TIMEOUT).await?;
            let genres = catalog.genres().await?;
            let years = catalog.year_range().await?;
            println!("{}", reference_list(&genres, years));
        }
        Commands::Stats { log, popular, latest } => {
            let store: Arc<dyn LogStore> = match SledLogStore::open(&log) {
                Ok(store) => Arc::new(store),
                Err(e) => {
                    eprintln!("warning: query log unavailable: {e}");
                    Arc::new(MemoryLogStore::new())
                }
            };
            let stats = StatsService::new(store);
            let top = stats.top_popular(popular);
            let recent = stats.latest_unique(latest);
            for note in top.diagnostic.iter().chain(recent.diagnostic.iter()) {
                eprintln!("warning: {note}");
            }
            println!("Popular searches:\n{}\n", popular_list(&top.items));
            println!("Latest searches:\n{}", latest_list(&recent.items));
        }
    }
    Ok(())
}
