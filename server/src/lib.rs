use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use filmsearch_core::{
    fallback_year_bounds, normalize_year_range, CatalogItem, CatalogStore, LatestSummary, LogStore, Page, Paginator,
    PopularSummary, QueryLogger, QuerySignature, SearchError, SearchFilter, StatsService,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub page_size: u64,
    pub popular_limit: usize,
    pub latest_limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self { Self { page_size: 20, popular_limit: 5, latest_limit: 5 } }
}

#[derive(Clone)]
pub struct AppState {
    pub paginator: Paginator<dyn CatalogStore>,
    pub logger: QueryLogger<dyn LogStore>,
    pub stats: StatsService<dyn LogStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(catalog: Arc<dyn CatalogStore>, log: Arc<dyn LogStore>, config: AppConfig) -> Self {
        Self {
            paginator: Paginator::new(catalog),
            logger: QueryLogger::new(log.clone()),
            stats: StatsService::new(log),
            config: Arc::new(config),
        }
    }
}

#[derive(Deserialize)]
pub struct KeywordParams {
    pub q: Option<String>,
    pub page: Option<String>,
}

#[derive(Deserialize)]
pub struct GenreParams {
    pub genre: Option<String>,
    pub y_from: Option<String>,
    pub y_to: Option<String>,
    pub page: Option<String>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: QuerySignature,
    pub results: Vec<CatalogItem>,
    pub total_count: u64,
    pub has_next: bool,
    pub page: u64,
    pub page_size: u64,
    pub logged: bool,
    pub log_warning: Option<String>,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub popular: Vec<PopularSummary>,
    pub latest: Vec<LatestSummary>,
    pub diagnostics: Vec<String>,
}

#[derive(Serialize)]
pub struct ReferenceResponse {
    pub genres: Vec<String>,
    pub min_year: i32,
    pub max_year: i32,
}

/// An error rendered as `{"error": ...}` with a status code.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into() }
    }
}

impl From<SearchError> for ApiError {
    fn from(e: SearchError) -> Self {
        let status = match e {
            SearchError::InvalidFilter(_) => StatusCode::BAD_REQUEST,
            SearchError::StoreUnavailable(_) | SearchError::Corrupt(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        Self { status, message: e.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "error": self.message }))).into_response()
    }
}

pub fn build_app(state: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search/keyword", get(search_keyword))
        .route("/search/genre", get(search_genre))
        .route("/stats", get(stats_handler))
        .route("/genres", get(reference_handler))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Page numbers are 1-based; anything unparsable or below 1 means the first page.
fn parse_page(raw: Option<&str>) -> u64 {
    raw.and_then(|s| s.trim().parse::<u64>().ok()).unwrap_or(1).max(1)
}

fn parse_year(raw: Option<&str>, label: &str) -> Result<Option<i32>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s
            .parse::<i32>()
            .map(Some)
            .map_err(|_| ApiError::bad_request(format!("year '{label}' must be a number"))),
    }
}

async fn run_search(state: &AppState, filter: SearchFilter, page_no: u64) -> Result<SearchResponse, ApiError> {
    let page_size = state.config.page_size;
    let page: Page = state.paginator.search_page(&filter, page_no, page_size).await.map_err(|e| {
        tracing::error!(error = %e, "search failed");
        ApiError::from(e)
    })?;
    let outcome = state.logger.record_search(&filter, &page);
    Ok(SearchResponse {
        query: filter.signature(),
        total_count: page.total_count,
        has_next: page.has_next,
        results: page.items,
        page: page_no,
        page_size,
        logged: outcome.is_recorded(),
        log_warning: outcome.failure().map(|f| f.to_string()),
    })
}

pub async fn search_keyword(
    State(state): State<AppState>,
    Query(params): Query<KeywordParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let filter = SearchFilter::keyword(params.q.as_deref().unwrap_or(""))
        .map_err(|_| ApiError::bad_request("enter a keyword to search for"))?;
    let page_no = parse_page(params.page.as_deref());
    Ok(Json(run_search(&state, filter, page_no).await?))
}

pub async fn search_genre(
    State(state): State<AppState>,
    Query(params): Query<GenreParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let catalog = state.paginator.catalog();
    let genres = catalog.genres().await?;
    let bounds = catalog.year_range().await?.unwrap_or_else(fallback_year_bounds);

    let genre = params.genre.as_deref().map(str::trim).filter(|g| !g.is_empty());
    if let Some(g) = genre {
        if !genres.is_empty() && !genres.iter().any(|known| known == g) {
            return Err(ApiError::bad_request(format!("unknown genre {g:?}")));
        }
    }

    let from = parse_year(params.y_from.as_deref(), "from")?;
    let to = parse_year(params.y_to.as_deref(), "to")?;
    let (year_from, year_to) = normalize_year_range(from, to, bounds);
    let filter = SearchFilter::genre_year(genre, year_from, year_to)?;
    let page_no = parse_page(params.page.as_deref());
    Ok(Json(run_search(&state, filter, page_no).await?))
}

pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let popular = state.stats.top_popular(state.config.popular_limit);
    let latest = state.stats.latest_unique(state.config.latest_limit);
    let diagnostics = popular.diagnostic.iter().chain(latest.diagnostic.iter()).cloned().collect();
    Json(StatsResponse { popular: popular.items, latest: latest.items, diagnostics })
}

pub async fn reference_handler(State(state): State<AppState>) -> Json<ReferenceResponse> {
    let catalog = state.paginator.catalog();
    let genres = catalog.genres().await;
    let years = catalog.year_range().await;
    match (genres, years) {
        (Ok(genres), Ok(years)) => {
            let (min_year, max_year) = years.unwrap_or_else(fallback_year_bounds);
            Json(ReferenceResponse { genres, min_year, max_year })
        }
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "reference data unavailable, using defaults");
            let (min_year, max_year) = fallback_year_bounds();
            Json(ReferenceResponse { genres: vec![], min_year, max_year })
        }
    }
}
