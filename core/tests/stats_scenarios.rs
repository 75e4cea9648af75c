use filmsearch_core::logstore::EventScan;
use filmsearch_core::{
    LogEvent, LogStore, MemoryLogStore, ParamValue, QuerySignature, SearchError, SearchType, SledLogStore,
    StatsService, Timestamp,
};
use std::sync::Arc;
use tempfile::tempdir;

fn keyword(text: &str) -> QuerySignature {
    QuerySignature::new(SearchType::Keyword).with("keyword", ParamValue::Text(text.into()))
}

fn action() -> QuerySignature {
    QuerySignature::new(SearchType::GenreYear)
        .with("genre", ParamValue::Text("Action".into()))
        .with("year_from", ParamValue::Int(2000))
        .with("year_to", ParamValue::Int(2010))
}

fn at(signature: QuerySignature, secs: i64) -> LogEvent {
    LogEvent { timestamp: Timestamp::from_unix_seconds(secs).unwrap(), signature, results_count: 1 }
}

fn scenario() -> Vec<LogEvent> {
    vec![at(keyword("cat"), 10), at(keyword("cat"), 20), at(action(), 15)]
}

fn check_scenario<S: LogStore + ?Sized>(stats: &StatsService<S>) {
    let popular = stats.top_popular(2);
    assert_eq!(popular.diagnostic, None);
    let counts: Vec<_> = popular.items.iter().map(|p| (p.signature.clone(), p.count)).collect();
    assert_eq!(counts, vec![(keyword("cat"), 2), (action(), 1)]);

    let latest = stats.latest_unique(2);
    let stamps: Vec<_> = latest.items.iter().map(|l| (l.signature.clone(), l.timestamp.unix_seconds())).collect();
    assert_eq!(stamps, vec![(keyword("cat"), 20), (action(), 15)]);
}

#[test]
fn scenario_over_memory_log() {
    let stats = StatsService::new(Arc::new(MemoryLogStore::with_events(scenario())));
    check_scenario(&stats);
}

#[test]
fn scenario_over_sled_log() {
    let dir = tempdir().unwrap();
    let store = Arc::new(SledLogStore::open(dir.path()).unwrap());
    for ev in scenario() {
        store.append(&ev).unwrap();
    }
    check_scenario(&StatsService::new(store));
}

#[test]
fn results_do_not_depend_on_input_order() {
    let mut events = scenario();
    events.extend([at(keyword("dog"), 20), at(keyword("dog"), 5), at(keyword("emu"), 20)]);
    let forward = StatsService::new(Arc::new(MemoryLogStore::with_events(events.clone())));
    events.reverse();
    let backward = StatsService::new(Arc::new(MemoryLogStore::with_events(events)));

    assert_eq!(forward.top_popular(10), backward.top_popular(10));
    assert_eq!(forward.latest_unique(10), backward.latest_unique(10));
    assert_eq!(forward.top_popular(10), forward.top_popular(10));
}

#[test]
fn latest_never_repeats_a_signature() {
    let events: Vec<LogEvent> = (0..50).map(|i| at(keyword(&format!("q{}", i % 7)), i)).collect();
    let stats = StatsService::new(Arc::new(MemoryLogStore::with_events(events.clone())));
    let latest = stats.latest_unique(100).items;
    assert_eq!(latest.len(), 7);
    for summary in &latest {
        let max = events.iter().filter(|e| e.signature == summary.signature).map(|e| e.timestamp).max().unwrap();
        assert_eq!(summary.timestamp, max);
    }
    assert!(latest.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
}

#[test]
fn empty_log_gives_empty_views() {
    let stats = StatsService::new(Arc::new(MemoryLogStore::new()));
    assert!(stats.top_popular(5).items.is_empty());
    assert!(stats.latest_unique(5).items.is_empty());
    assert_eq!(stats.top_popular(5).diagnostic, None);
}

struct Down;

impl LogStore for Down {
    fn append(&self, _event: &LogEvent) -> Result<(), SearchError> {
        Err(SearchError::StoreUnavailable("no route to host".into()))
    }
    fn scan(&self) -> Result<EventScan<'_>, SearchError> {
        Err(SearchError::StoreUnavailable("no route to host".into()))
    }
    fn len(&self) -> Result<usize, SearchError> {
        Err(SearchError::StoreUnavailable("no route to host".into()))
    }
}

/// Yields one good event, then fails mid-scan.
struct Flaky;

impl LogStore for Flaky {
    fn append(&self, _event: &LogEvent) -> Result<(), SearchError> { Ok(()) }
    fn scan(&self) -> Result<EventScan<'_>, SearchError> {
        let items = vec![Ok(at(keyword("cat"), 1)), Err(SearchError::StoreUnavailable("connection reset".into()))];
        Ok(Box::new(items.into_iter()))
    }
    fn len(&self) -> Result<usize, SearchError> { Ok(1) }
}

#[test]
fn unreachable_log_degrades_to_empty_with_diagnostic() {
    let stats: StatsService<dyn LogStore> = StatsService::new(Arc::new(Down));
    let popular = stats.top_popular(5);
    assert!(popular.items.is_empty());
    assert!(popular.diagnostic.unwrap().contains("no route to host"));
    assert!(stats.latest_unique(5).items.is_empty());

    let flaky: StatsService<dyn LogStore> = StatsService::new(Arc::new(Flaky));
    let latest = flaky.latest_unique(5);
    assert!(latest.items.is_empty());
    assert!(latest.diagnostic.is_some());
}

#[test]
fn corrupt_records_are_skipped() {
    struct WithGarbage;
    impl LogStore for WithGarbage {
        fn append(&self, _event: &LogEvent) -> Result<(), SearchError> { Ok(()) }
        fn scan(&self) -> Result<EventScan<'_>, SearchError> {
            let items = vec![
                Ok(at(keyword("cat"), 1)),
                Err(SearchError::Corrupt("record 00: expected value".into())),
                Ok(at(keyword("cat"), 2)),
            ];
            Ok(Box::new(items.into_iter()))
        }
        fn len(&self) -> Result<usize, SearchError> { Ok(3) }
    }

    let stats: StatsService<dyn LogStore> = StatsService::new(Arc::new(WithGarbage));
    let popular = stats.top_popular(5);
    assert_eq!(popular.items.len(), 1);
    assert_eq!(popular.items[0].count, 2);
    assert_eq!(popular.diagnostic.as_deref(), Some("skipped 1 unreadable log records"));
}
