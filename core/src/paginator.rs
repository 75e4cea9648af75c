use crate::catalog::CatalogStore;
use crate::error::{Result, SearchError};
use crate::filter::SearchFilter;
use crate::model::Page;
use std::sync::Arc;

/// Runs filtered, title-ordered searches against the catalog and builds [`Page`]s.
pub struct Paginator<C: CatalogStore + ?Sized> {
    catalog: Arc<C>,
}

impl<C: CatalogStore + ?Sized> Clone for Paginator<C> {
    fn clone(&self) -> Self { Self { catalog: self.catalog.clone() } }
}

impl<C: CatalogStore + ?Sized> Paginator<C> {
    pub fn new(catalog: Arc<C>) -> Self { Self { catalog } }

    pub fn catalog(&self) -> &Arc<C> { &self.catalog }

    /// `total_count` is the store's count of every matching row, not an
    /// estimate from the window.
    pub async fn search(&self, filter: &SearchFilter, limit: u64, offset: u64) -> Result<Page> {
        if limit == 0 {
            return Err(SearchError::InvalidFilter("page size must be positive".into()));
        }
        if offset > i64::MAX as u64 {
            return Err(SearchError::InvalidFilter(format!("offset {offset} is out of range")));
        }
        let predicate = filter.predicate();
        predicate.validate()?;
        let (mut items, total) = self.catalog.query(&predicate, limit, offset).await?;
        // A store that over-delivers must not break the window invariant.
        items.truncate(limit as usize);
        Ok(Page::new(items, total, offset, limit))
    }

    /// 1-based page number helper used by the presentation layers.
    pub async fn search_page(&self, filter: &SearchFilter, page: u64, page_size: u64) -> Result<Page> {
        let offset = (page.max(1) - 1)
            .checked_mul(page_size)
            .ok_or_else(|| SearchError::InvalidFilter(format!("page {page} is out of range")))?;
        self.search(filter, page_size, offset).await
    }
}
