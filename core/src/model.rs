use crate::error::SearchError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Duration, OffsetDateTime, PrimitiveDateTime};

/// Log documents store `YYYY-MM-DDTHH:MM:SS` in UTC, which sorts lexicographically.
const TIMESTAMP_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

/// A UTC instant with whole-second precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(OffsetDateTime);

impl Timestamp {
    /// Current UTC time, truncated to whole seconds.
    pub fn now() -> Self {
        let now = OffsetDateTime::now_utc();
        Self(now - Duration::nanoseconds(now.nanosecond() as i64))
    }

    pub fn from_unix_seconds(secs: i64) -> Result<Self, SearchError> {
        OffsetDateTime::from_unix_timestamp(secs)
            .map(Self)
            .map_err(|e| SearchError::Corrupt(format!("timestamp {secs} out of range: {e}")))
    }

    pub fn unix_seconds(&self) -> i64 { self.0.unix_timestamp() }

    pub fn parse(s: &str) -> Result<Self, SearchError> {
        let trimmed = s.trim().trim_end_matches('Z');
        PrimitiveDateTime::parse(trimmed, TIMESTAMP_FORMAT)
            .map(|dt| Self(dt.assume_utc()))
            .map_err(|e| SearchError::Corrupt(format!("bad timestamp {s:?}: {e}")))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.0.format(TIMESTAMP_FORMAT).map_err(|_| fmt::Error)?;
        f.write_str(&s)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Timestamp::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// One row of the film catalog as seen by a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub title: String,
    pub release_year: i32,
    pub rating: String,
    pub description: Option<String>,
    /// Only populated when the search was constrained by genre.
    pub genre: Option<String>,
}

/// One window of a larger result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    pub items: Vec<CatalogItem>,
    pub total_count: u64,
    pub has_next: bool,
    pub offset: u64,
    pub limit: u64,
}

impl Page {
    pub fn new(items: Vec<CatalogItem>, total_count: u64, offset: u64, limit: u64) -> Self {
        let has_next = offset.saturating_add(items.len() as u64) < total_count;
        Self { items, total_count, has_next, offset, limit }
    }

    pub fn is_first(&self) -> bool { self.offset == 0 }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    Keyword,
    GenreYear,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Keyword => "keyword",
            SearchType::GenreYear => "genre_year",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// A single search parameter value as stored in the query log.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Text(String),
    Null,
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Text(v) => f.write_str(v),
            ParamValue::Null => f.write_str("null"),
        }
    }
}

/// Identity of a search: its type plus its parameters.
///
/// `params` is key-sorted, so equality and ordering do not depend on the
/// order in which parameters were inserted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QuerySignature {
    pub search_type: SearchType,
    pub params: BTreeMap<String, ParamValue>,
}

impl QuerySignature {
    pub fn new(search_type: SearchType) -> Self {
        Self { search_type, params: BTreeMap::new() }
    }

    pub fn with(mut self, key: &str, value: ParamValue) -> Self {
        self.params.insert(key.to_string(), value);
        self
    }

    /// Compact JSON with sorted keys; stable across processes.
    pub fn canonical_key(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{}:{:?}", self.search_type, self.params))
    }
}

impl fmt::Display for QuerySignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{", self.search_type)?;
        for (i, (k, v)) in self.params.iter().enumerate() {
            if i > 0 { f.write_str(", ")?; }
            write!(f, "{k}: {v}")?;
        }
        f.write_str("}")
    }
}

/// A recorded search. Serializes to the flat log document
/// `{timestamp, search_type, params, results_count}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    pub timestamp: Timestamp,
    #[serde(flatten)]
    pub signature: QuerySignature,
    pub results_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopularSummary {
    #[serde(flatten)]
    pub signature: QuerySignature,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LatestSummary {
    #[serde(flatten)]
    pub signature: QuerySignature,
    pub timestamp: Timestamp,
    pub results_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_has_next_tracks_window_end() {
        let item = CatalogItem { title: "A".into(), release_year: 2006, rating: "G".into(), description: None, genre: None };
        let page = Page::new(vec![item.clone(); 5], 25, 20, 10);
        assert!(!page.has_next);
        let page = Page::new(vec![item.clone(); 10], 25, 10, 10);
        assert!(page.has_next);
        let page = Page::new(vec![item], 25, u64::MAX, 10);
        assert!(!page.has_next);
    }

    #[test]
    fn log_document_shape() {
        let ev = LogEvent {
            timestamp: Timestamp::parse("2024-05-01T12:00:00").unwrap(),
            signature: QuerySignature::new(SearchType::Keyword).with("keyword", ParamValue::Text("cat".into())),
            results_count: 3,
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["timestamp"], "2024-05-01T12:00:00");
        assert_eq!(json["search_type"], "keyword");
        assert_eq!(json["params"]["keyword"], "cat");
        assert_eq!(json["results_count"], 3);
        let back: LogEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, ev);
    }

    #[test]
    fn param_order_does_not_matter() {
        let a = QuerySignature::new(SearchType::GenreYear)
            .with("year_from", ParamValue::Int(2000))
            .with("genre", ParamValue::Text("Action".into()));
        let b = QuerySignature::new(SearchType::GenreYear)
            .with("genre", ParamValue::Text("Action".into()))
            .with("year_from", ParamValue::Int(2000));
        assert_eq!(a, b);
        assert_eq!(a.canonical_key(), b.canonical_key());
        assert_eq!(a.canonical_key(), r#"{"search_type":"genre_year","params":{"genre":"Action","year_from":2000}}"#);
    }

    #[test]
    fn now_has_whole_seconds() {
        let ts = Timestamp::now();
        assert_eq!(ts, Timestamp::from_unix_seconds(ts.unix_seconds()).unwrap());
    }
}
