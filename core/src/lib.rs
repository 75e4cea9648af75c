//! Film catalog search with a query log.
//!
//! - [`paginator`] runs filtered, title-ordered searches over the [`catalog`]
//!   and reports exact totals and whether another page follows.
//! - [`logger`] appends one event per first page to a [`logstore`].
//! - [`stats`] recomputes popular and recent distinct searches from the log.

pub mod catalog;
pub mod error;
pub mod filter;
pub mod logger;
pub mod logstore;
pub mod model;
pub mod normalize;
pub mod paginator;
pub mod stats;

pub use catalog::{CatalogStore, NewFilm, SqliteCatalog};
pub use error::{LogFailure, SearchError};
pub use filter::{fallback_year_bounds, normalize_year_range, Predicate, SearchFilter};
pub use logger::{LogOutcome, QueryLogger};
pub use logstore::{LogStore, MemoryLogStore, SledLogStore};
pub use model::{
    CatalogItem, LatestSummary, LogEvent, Page, ParamValue, PopularSummary, QuerySignature, SearchType, Timestamp,
};
pub use paginator::Paginator;
pub use stats::{StatsReport, StatsService};
