use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("valid regex");
}

/// Normalize user-entered search text: NFKC, trimmed, whitespace runs collapsed.
///
/// Two keywords that normalize to the same string produce the same query
/// signature, so they are grouped together in the stats.
pub fn normalize_text(text: &str) -> String {
    let nfkc = text.nfkc().collect::<String>();
    WHITESPACE.replace_all(nfkc.trim(), " ").into_owned()
}

/// Same as [`normalize_text`] but maps an empty result to `None`.
pub fn normalize_optional(text: Option<&str>) -> Option<String> {
    text.map(normalize_text).filter(|s| !s.is_empty())
}
