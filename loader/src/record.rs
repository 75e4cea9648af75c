use filmsearch_core::{LogOutcome, LogStore, Page, QueryLogger, SearchFilter};

/// Log the first page of a console search and flush the store.
///
/// Log problems come back as warning lines. The search has already
/// succeeded and its exit status does not depend on them.
pub fn record_search<S: LogStore + ?Sized>(logger: &QueryLogger<S>, filter: &SearchFilter, page: &Page) -> Vec<String> {
    match logger.record_search(filter, page) {
        LogOutcome::Skipped => Vec::new(),
        LogOutcome::Failed(failure) => vec![failure.to_string()],
        LogOutcome::Recorded(_) => match logger.store().flush() {
            Ok(()) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "query log flush failed, search may not be recorded");
                vec![format!("query log flush failed: {e}")]
            }
        },
    }
}
