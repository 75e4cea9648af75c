use anyhow::Result;
use clap::Parser;
use filmsearch_core::{LogStore, MemoryLogStore, SledLogStore, SqliteCatalog};
use server::{build_app, AppConfig, AppState};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// SQLite catalog database
    #[arg(long, env = "CATALOG_DB", default_value = "./catalog.db")]
    catalog: PathBuf,
    /// Query log directory (sled)
    #[arg(long, env = "SEARCH_LOG", default_value = "./search_log")]
    log: PathBuf,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, env = "PORT", default_value_t = 5050)]
    port: u16,
    /// Results per page
    #[arg(long, env = "PAGE_SIZE", default_value_t = 20)]
    page_size: u64,
    /// Entries in the popular-queries list
    #[arg(long, default_value_t = 5)]
    popular: usize,
    /// Entries in the latest-queries list
    #[arg(long, default_value_t = 5)]
    latest: usize,
    /// Catalog query timeout in seconds
    #[arg(long, default_value_t = 5)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    anyhow::ensure!(args.page_size > 0, "page size must be positive");

    let catalog = SqliteCatalog::open(&args.catalog, Duration::from_secs(args.timeout_secs)).await?;
    catalog.migrate().await?;

    // Searches keep working without a persistent log; they just are not remembered.
    let log: Arc<dyn LogStore> = match SledLogStore::open(&args.log) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::warn!(error = %e, path = %args.log.display(), "query log unavailable, logging in memory only");
            Arc::new(MemoryLogStore::new())
        }
    };

    let config = AppConfig { page_size: args.page_size, popular_limit: args.popular, latest_limit: args.latest };
    let app = build_app(AppState::new(Arc::new(catalog), log, config));

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
