//! Query-log analytics: most popular searches and most recent distinct searches.
//!
//! Both views are recomputed from a full scan on every call. The pipelines
//! are plain functions over an iterator of events so the ranking rules can be
//! exercised without a store:
//!
//! - `top_popular`: group by signature, count, order by count desc, then by the
//!   group's most recent timestamp desc, then by canonical key asc.
//! - `latest_unique`: keep each signature's most recent event (a timestamp tie
//!   keeps the larger `results_count`), order by that timestamp desc, then by
//!   canonical key asc.

use crate::error::SearchError;
use crate::logstore::LogStore;
use crate::model::{LatestSummary, LogEvent, PopularSummary, QuerySignature, Timestamp};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

pub fn top_popular<I>(events: I, limit: usize) -> Vec<PopularSummary>
where
    I: IntoIterator<Item = LogEvent>,
{
    if limit == 0 {
        return Vec::new();
    }
    let mut groups: HashMap<QuerySignature, (u64, Timestamp)> = HashMap::new();
    for ev in events {
        let group = groups.entry(ev.signature).or_insert((0, ev.timestamp));
        group.0 += 1;
        if ev.timestamp > group.1 {
            group.1 = ev.timestamp;
        }
    }

    let mut ranked: Vec<(String, QuerySignature, u64, Timestamp)> = groups
        .into_iter()
        .map(|(sig, (count, last))| (sig.canonical_key(), sig, count, last))
        .collect();
    ranked.sort_by(|a, b| b.2.cmp(&a.2).then(b.3.cmp(&a.3)).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked
        .into_iter()
        .map(|(_, signature, count, _)| PopularSummary { signature, count })
        .collect()
}

pub fn latest_unique<I>(events: I, limit: usize) -> Vec<LatestSummary>
where
    I: IntoIterator<Item = LogEvent>,
{
    if limit == 0 {
        return Vec::new();
    }
    let mut latest: HashMap<QuerySignature, (Timestamp, u64)> = HashMap::new();
    for ev in events {
        let candidate = (ev.timestamp, ev.results_count);
        latest
            .entry(ev.signature)
            .and_modify(|kept| {
                if candidate > *kept {
                    *kept = candidate;
                }
            })
            .or_insert(candidate);
    }

    let mut ranked: Vec<(String, LatestSummary)> = latest
        .into_iter()
        .map(|(signature, (timestamp, results_count))| {
            (signature.canonical_key(), LatestSummary { signature, timestamp, results_count })
        })
        .collect();
    ranked.sort_by(|a, b| b.1.timestamp.cmp(&a.1.timestamp).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked.into_iter().map(|(_, summary)| summary).collect()
}

/// Items plus a non-fatal note explaining why they may be incomplete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsReport<T> {
    pub items: Vec<T>,
    pub diagnostic: Option<String>,
}

impl<T> StatsReport<T> {
    fn unavailable(op: &'static str, err: SearchError) -> Self {
        tracing::warn!(op, error = %err, "query log unavailable, returning empty stats");
        Self { items: Vec::new(), diagnostic: Some(format!("query log unavailable: {err}")) }
    }
}

/// Runs the stats pipelines over a log store. Never fails: store problems
/// degrade to empty results with a diagnostic.
pub struct StatsService<S: LogStore + ?Sized> {
    store: Arc<S>,
}

impl<S: LogStore + ?Sized> Clone for StatsService<S> {
    fn clone(&self) -> Self { Self { store: self.store.clone() } }
}

impl<S: LogStore + ?Sized> StatsService<S> {
    pub fn new(store: Arc<S>) -> Self { Self { store } }

    pub fn top_popular(&self, limit: usize) -> StatsReport<PopularSummary> {
        self.run("top_popular", |events| top_popular(events, limit))
    }

    pub fn latest_unique(&self, limit: usize) -> StatsReport<LatestSummary> {
        self.run("latest_unique", |events| latest_unique(events, limit))
    }

    fn run<T>(
        &self,
        op: &'static str,
        pipeline: impl FnOnce(&mut dyn Iterator<Item = LogEvent>) -> Vec<T>,
    ) -> StatsReport<T> {
        let scan = match self.store.scan() {
            Ok(scan) => scan,
            Err(err) => return StatsReport::unavailable(op, err),
        };

        let mut corrupt = 0usize;
        let mut failure: Option<SearchError> = None;
        let items = {
            let mut events = scan
                .map_while(|item| match item {
                    Ok(ev) => Some(Some(ev)),
                    Err(SearchError::Corrupt(msg)) => {
                        tracing::warn!(op, %msg, "skipping unreadable log record");
                        corrupt += 1;
                        Some(None)
                    }
                    Err(err) => {
                        failure = Some(err);
                        None
                    }
                })
                .flatten();
            pipeline(&mut events)
        };

        if let Some(err) = failure {
            return StatsReport::unavailable(op, err);
        }
        let diagnostic = (corrupt > 0).then(|| format!("skipped {corrupt} unreadable log records"));
        StatsReport { items, diagnostic }
    }
}
