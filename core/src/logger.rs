use crate::error::LogFailure;
use crate::filter::SearchFilter;
use crate::logstore::LogStore;
use crate::model::{LogEvent, Page, QuerySignature, Timestamp};
use std::sync::Arc;

/// What happened to the log write that accompanies a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOutcome {
    Recorded(LogEvent),
    /// Not the first page of the search; nothing was written.
    Skipped,
    Failed(LogFailure),
}

impl LogOutcome {
    pub fn is_recorded(&self) -> bool { matches!(self, LogOutcome::Recorded(_)) }

    pub fn failure(&self) -> Option<&LogFailure> {
        match self {
            LogOutcome::Failed(f) => Some(f),
            _ => None,
        }
    }
}

/// Stateless writer of search events. Trusts the caller's first-page signal.
pub struct QueryLogger<S: LogStore + ?Sized> {
    store: Arc<S>,
}

impl<S: LogStore + ?Sized> Clone for QueryLogger<S> {
    fn clone(&self) -> Self { Self { store: self.store.clone() } }
}

impl<S: LogStore + ?Sized> QueryLogger<S> {
    pub fn new(store: Arc<S>) -> Self { Self { store } }

    pub fn store(&self) -> &Arc<S> { &self.store }

    /// Append one event stamped with the current second.
    pub fn record(&self, signature: QuerySignature, results_count: u64) -> Result<LogEvent, LogFailure> {
        let event = LogEvent { timestamp: Timestamp::now(), signature, results_count };
        self.store.append(&event)?;
        tracing::debug!(signature = %event.signature, results_count, "search logged");
        Ok(event)
    }

    /// Log a finished search if `page` is its first page. Failures are
    /// reported as a warning and returned, never raised.
    pub fn record_search(&self, filter: &SearchFilter, page: &Page) -> LogOutcome {
        if !page.is_first() {
            return LogOutcome::Skipped;
        }
        match self.record(filter.signature(), page.total_count) {
            Ok(event) => LogOutcome::Recorded(event),
            Err(failure) => {
                tracing::warn!(error = %failure, "search succeeded but could not be logged");
                LogOutcome::Failed(failure)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, SearchError};
    use crate::logstore::{EventScan, MemoryLogStore};

    struct Unreachable;

    impl LogStore for Unreachable {
        fn append(&self, _event: &LogEvent) -> Result<()> {
            Err(SearchError::StoreUnavailable("log server selection timed out".into()))
        }
        fn scan(&self) -> Result<EventScan<'_>> {
            Err(SearchError::StoreUnavailable("log server selection timed out".into()))
        }
        fn len(&self) -> Result<usize> { Ok(0) }
    }

    fn first_page(total: u64) -> Page { Page::new(vec![], total, 0, 10) }

    #[test]
    fn records_first_page_with_total_count() {
        let store = Arc::new(MemoryLogStore::new());
        let logger = QueryLogger::new(store.clone());
        let filter = SearchFilter::keyword("cat").unwrap();
        let outcome = logger.record_search(&filter, &first_page(42));
        match outcome {
            LogOutcome::Recorded(ev) => {
                assert_eq!(ev.results_count, 42);
                assert_eq!(ev.signature, filter.signature());
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn later_pages_are_not_logged() {
        let store = Arc::new(MemoryLogStore::new());
        let logger = QueryLogger::new(store.clone());
        let filter = SearchFilter::keyword("cat").unwrap();
        let page = Page::new(vec![], 42, 10, 10);
        assert_eq!(logger.record_search(&filter, &page), LogOutcome::Skipped);
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn failure_is_returned_as_a_value() {
        let logger: QueryLogger<dyn LogStore> = QueryLogger::new(Arc::new(Unreachable));
        let filter = SearchFilter::keyword("cat").unwrap();
        let outcome = logger.record_search(&filter, &first_page(1));
        assert!(outcome.failure().unwrap().reason.contains("timed out"));
    }
}
