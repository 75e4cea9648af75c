use criterion::{criterion_group, criterion_main, Criterion};
use filmsearch_core::stats::{latest_unique, top_popular};
use filmsearch_core::{LogEvent, ParamValue, QuerySignature, SearchType, Timestamp};

fn synthetic_log(n: usize) -> Vec<LogEvent> {
    (0..n)
        .map(|i| LogEvent {
            timestamp: Timestamp::from_unix_seconds(1_700_000_000 + (i as i64 * 7919) % 86_400).unwrap(),
            signature: QuerySignature::new(SearchType::Keyword)
                .with("keyword", ParamValue::Text(format!("query {}", i % 500))),
            results_count: (i % 40) as u64,
        })
        .collect()
}

fn bench_stats(c: &mut Criterion) {
    let log = synthetic_log(50_000);
    c.bench_function("top_popular_50k", |b| b.iter(|| top_popular(log.iter().cloned(), 5)));
    c.bench_function("latest_unique_50k", |b| b.iter(|| latest_unique(log.iter().cloned(), 10)));
}

criterion_group!(benches, bench_stats);
criterion_main!(benches);
