use crate::error::SearchError;
use crate::model::{ParamValue, QuerySignature, SearchType};
use crate::normalize::{normalize_optional, normalize_text};

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchFilter {
    Keyword { text: String },
    GenreYear { genre: Option<String>, year_from: i32, year_to: i32 },
}

impl SearchFilter {
    pub fn keyword(text: &str) -> Result<Self, SearchError> {
        let text = normalize_text(text);
        if text.is_empty() {
            return Err(SearchError::InvalidFilter("keyword must not be empty".into()));
        }
        Ok(SearchFilter::Keyword { text })
    }

    /// Callers swap an inverted range before getting here.
    pub fn genre_year(genre: Option<&str>, year_from: i32, year_to: i32) -> Result<Self, SearchError> {
        if year_from > year_to {
            return Err(SearchError::InvalidFilter(format!("year range {year_from}..={year_to} is inverted")));
        }
        Ok(SearchFilter::GenreYear { genre: normalize_optional(genre), year_from, year_to })
    }

    pub fn search_type(&self) -> SearchType {
        match self {
            SearchFilter::Keyword { .. } => SearchType::Keyword,
            SearchFilter::GenreYear { .. } => SearchType::GenreYear,
        }
    }

    /// The identity under which this search is logged and grouped.
    pub fn signature(&self) -> QuerySignature {
        match self {
            SearchFilter::Keyword { text } => {
                QuerySignature::new(SearchType::Keyword).with("keyword", ParamValue::Text(text.clone()))
            }
            SearchFilter::GenreYear { genre, year_from, year_to } => {
                let sig = QuerySignature::new(SearchType::GenreYear)
                    .with("year_from", ParamValue::Int(*year_from as i64))
                    .with("year_to", ParamValue::Int(*year_to as i64));
                match genre {
                    Some(g) => sig.with("genre", ParamValue::Text(g.clone())),
                    None => sig,
                }
            }
        }
    }

    pub fn predicate(&self) -> Predicate {
        match self {
            SearchFilter::Keyword { text } => Predicate { keyword: Some(text.clone()), ..Predicate::default() },
            SearchFilter::GenreYear { genre, year_from, year_to } => Predicate {
                keyword: None,
                genre: genre.clone(),
                years: Some((*year_from, *year_to)),
            },
        }
    }
}

/// Store-facing form of a filter. Every `None` field is left unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    /// Substring of title or description.
    pub keyword: Option<String>,
    /// Exact category name.
    pub genre: Option<String>,
    /// Inclusive release-year bounds.
    pub years: Option<(i32, i32)>,
}

impl Predicate {
    pub fn validate(&self) -> Result<(), SearchError> {
        if let Some((from, to)) = self.years {
            if from > to {
                return Err(SearchError::InvalidFilter(format!("year range {from}..={to} is inverted")));
            }
        }
        Ok(())
    }
}

const FALLBACK_MIN_YEAR: i32 = 1900;

/// Year bounds to search within when the catalog has no films or cannot be read.
pub fn fallback_year_bounds() -> (i32, i32) {
    (FALLBACK_MIN_YEAR, time::OffsetDateTime::now_utc().year())
}

/// Clamp user-supplied year bounds to the catalog range and swap an inverted pair.
///
/// Missing bounds default to the catalog's own min / max.
pub fn normalize_year_range(from: Option<i32>, to: Option<i32>, bounds: (i32, i32)) -> (i32, i32) {
    let (min_year, max_year) = if bounds.0 <= bounds.1 { bounds } else { (bounds.1, bounds.0) };
    let mut from = from.unwrap_or(min_year).clamp(min_year, max_year);
    let mut to = to.unwrap_or(max_year).clamp(min_year, max_year);
    if from > to {
        std::mem::swap(&mut from, &mut to);
    }
    (from, to)
}
