//! Relational film catalog on SQLite.
//!
//! Schema (Sakila-shaped):
//! - `film`: one row per title with release year, rating and description
//! - `category`: genre names
//! - `film_category`: many-to-many link
//!
//! Every query runs under a bounded timeout; running out of time, failing to
//! acquire a connection or any driver error is reported as
//! [`SearchError::StoreUnavailable`].

use crate::error::{Result, SearchError};
use crate::filter::Predicate;
use crate::model::CatalogItem;
use async_trait::async_trait;
use serde::Deserialize;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::future::Future;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Read access to the catalog, as needed by the paginator and the presentation layer.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Rows matching `predicate`, ordered by title, plus the count of all matching rows.
    async fn query(&self, predicate: &Predicate, limit: u64, offset: u64) -> Result<(Vec<CatalogItem>, u64)>;

    /// All genre names, sorted.
    async fn genres(&self) -> Result<Vec<String>>;

    /// Smallest and largest release year, `None` when the catalog is empty.
    async fn year_range(&self) -> Result<Option<(i32, i32)>>;
}

/// Film record accepted by [`insert_film`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewFilm {
    pub title: String,
    pub release_year: i32,
    #[serde(default = "default_rating")]
    pub rating: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
}
fn default_rating() -> String { "G".to_string() }

pub struct SqliteCatalog {
    pool: SqlitePool,
    timeout: Duration,
}

impl SqliteCatalog {
    /// Open (creating if missing) the catalog database at `path`.
    pub async fn open<P: AsRef<Path>>(path: P, timeout: Duration) -> Result<Self> {
        let url = format!("sqlite:{}?mode=rwc", path.as_ref().to_string_lossy());
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .acquire_timeout(timeout)
            .connect(&url)
            .await?;
        tracing::info!(path = %path.as_ref().display(), "catalog database opened");
        Ok(Self { pool, timeout })
    }

    /// A private, migrated in-memory catalog. The single connection is pinned
    /// so the database lives as long as the pool.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        run_migrations(&pool).await?;
        Ok(Self { pool, timeout: DEFAULT_TIMEOUT })
    }

    pub fn from_pool(pool: SqlitePool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    pub fn pool(&self) -> &SqlitePool { &self.pool }

    pub async fn migrate(&self) -> Result<()> { run_migrations(&self.pool).await }

    pub async fn insert(&self, film: &NewFilm) -> Result<i64> { insert_film(&self.pool, film).await }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(res) => res.map_err(SearchError::from),
            Err(_) => Err(SearchError::StoreUnavailable(format!("catalog query timed out after {:?}", self.timeout))),
        }
    }
}

/// `%` and `_` in user text are literal characters, not wildcards.
fn like_pattern(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('%');
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') { out.push('\\'); }
        out.push(ch);
    }
    out.push('%');
    out
}

fn push_from_where(qb: &mut QueryBuilder<'_, Sqlite>, predicate: &Predicate) {
    qb.push(" FROM film f");
    if predicate.genre.is_some() {
        qb.push(" JOIN film_category fc ON fc.film_id = f.film_id JOIN category c ON c.category_id = fc.category_id");
    }
    qb.push(" WHERE 1 = 1");
    if let Some(keyword) = &predicate.keyword {
        let like = like_pattern(keyword);
        qb.push(" AND (f.title LIKE ")
            .push_bind(like.clone())
            .push(" ESCAPE '\\' OR f.description LIKE ")
            .push_bind(like)
            .push(" ESCAPE '\\')");
    }
    if let Some(genre) = &predicate.genre {
        qb.push(" AND c.name = ").push_bind(genre.clone());
    }
    if let Some((from, to)) = predicate.years {
        qb.push(" AND f.release_year BETWEEN ").push_bind(from).push(" AND ").push_bind(to);
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalog {
    async fn query(&self, predicate: &Predicate, limit: u64, offset: u64) -> Result<(Vec<CatalogItem>, u64)> {
        predicate.validate()?;
        let limit_arg = i64::try_from(limit).unwrap_or(i64::MAX);
        let offset_arg = i64::try_from(offset)
            .map_err(|_| SearchError::InvalidFilter(format!("offset {offset} is out of range")))?;

        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*)");
        push_from_where(&mut count_qb, predicate);
        let total: i64 = self.bounded(count_qb.build_query_scalar::<i64>().fetch_one(&self.pool)).await?;

        let genre_col = if predicate.genre.is_some() { "c.name" } else { "NULL" };
        let mut rows_qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT f.title, f.release_year, f.rating, f.description, {genre_col} AS genre"
        ));
        push_from_where(&mut rows_qb, predicate);
        rows_qb
            .push(" ORDER BY f.title ASC, f.film_id ASC LIMIT ")
            .push_bind(limit_arg)
            .push(" OFFSET ")
            .push_bind(offset_arg);
        let rows = self.bounded(rows_qb.build().fetch_all(&self.pool)).await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(CatalogItem {
                title: row.try_get("title")?,
                release_year: row.try_get("release_year")?,
                rating: row.try_get("rating")?,
                description: row.try_get("description")?,
                genre: row.try_get("genre")?,
            });
        }
        tracing::debug!(?predicate, limit, offset, total, returned = items.len(), "catalog query");
        Ok((items, total.max(0) as u64))
    }

    async fn genres(&self) -> Result<Vec<String>> {
        self.bounded(sqlx::query_scalar("SELECT name FROM category ORDER BY name").fetch_all(&self.pool))
            .await
    }

    async fn year_range(&self) -> Result<Option<(i32, i32)>> {
        let row = self
            .bounded(sqlx::query("SELECT MIN(release_year) AS min_year, MAX(release_year) AS max_year FROM film").fetch_one(&self.pool))
            .await?;
        let min: Option<i32> = row.try_get("min_year")?;
        let max: Option<i32> = row.try_get("max_year")?;
        Ok(min.zip(max))
    }
}

/// Create the catalog tables if they do not exist.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS film (
            film_id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT,
            release_year INTEGER NOT NULL,
            rating TEXT NOT NULL DEFAULT 'G'
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS category (
            category_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS film_category (
            film_id INTEGER NOT NULL,
            category_id INTEGER NOT NULL,
            PRIMARY KEY (film_id, category_id),
            FOREIGN KEY (film_id) REFERENCES film(film_id) ON DELETE CASCADE,
            FOREIGN KEY (category_id) REFERENCES category(category_id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_film_title ON film(title)").execute(pool).await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_film_year ON film(release_year)").execute(pool).await?;
    Ok(())
}

/// Insert one film and link it to its genres, creating missing categories.
pub async fn insert_film(pool: &SqlitePool, film: &NewFilm) -> Result<i64> {
    let mut tx = pool.begin().await?;
    let film_id = sqlx::query("INSERT INTO film (title, description, release_year, rating) VALUES (?, ?, ?, ?)")
        .bind(&film.title)
        .bind(&film.description)
        .bind(film.release_year)
        .bind(&film.rating)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

    for genre in film.genres.iter().map(|g| g.trim()).filter(|g| !g.is_empty()) {
        sqlx::query("INSERT OR IGNORE INTO category (name) VALUES (?)")
            .bind(genre)
            .execute(&mut *tx)
            .await?;
        let category_id: i64 = sqlx::query_scalar("SELECT category_id FROM category WHERE name = ?")
            .bind(genre)
            .fetch_one(&mut *tx)
            .await?;
        sqlx::query("INSERT OR IGNORE INTO film_category (film_id, category_id) VALUES (?, ?)")
            .bind(film_id)
            .bind(category_id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    Ok(film_id)
}
