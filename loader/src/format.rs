use filmsearch_core::{LatestSummary, Page, PopularSummary};

/// Render films as an aligned text table. Numbering continues across pages.
pub fn films_table(page: &Page) -> String {
    if page.items.is_empty() {
        return "No results.".to_string();
    }
    let headers = ["#", "Title", "Year", "Rating", "Genre"];
    let rows: Vec<[String; 5]> = page
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            [
                (page.offset as usize + i + 1).to_string(),
                item.title.clone(),
                item.release_year.to_string(),
                item.rating.clone(),
                item.genre.clone().unwrap_or_default(),
            ]
        })
        .collect();

    let widths: Vec<usize> = (0..headers.len())
        .map(|c| rows.iter().map(|r| r[c].chars().count()).chain([headers[c].len()]).max().unwrap_or(0))
        .collect();
    let fmt_row = |vals: Vec<&str>| -> String {
        vals.iter()
            .enumerate()
            .map(|(c, v)| format!("{v:<width$}", width = widths[c]))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![fmt_row(headers.to_vec())];
    lines.push(widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("-+-"));
    for r in &rows {
        lines.push(fmt_row(r.iter().map(String::as_str).collect()));
    }
    lines.join("\n")
}

pub fn popular_list(items: &[PopularSummary]) -> String {
    if items.is_empty() {
        return "No data.".to_string();
    }
    items
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{}. {} | count: {}", i + 1, p.signature, p.count))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn latest_list(items: &[LatestSummary]) -> String {
    if items.is_empty() {
        return "No data.".to_string();
    }
    items
        .iter()
        .enumerate()
        .map(|(i, l)| format!("{}. {} | at: {} | results: {}", i + 1, l.signature, l.timestamp, l.results_count))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Genre names and the catalog's release-year span, shown before a genre search.
pub fn reference_list(genres: &[String], years: Option<(i32, i32)>) -> String {
    let genres = if genres.is_empty() { "none".to_string() } else { genres.join(", ") };
    let years = match years {
        Some((min_year, max_year)) => format!("{min_year}-{max_year}"),
        None => "no films".to_string(),
    };
    format!("Genres: {genres}\nYears: {years}")
}
