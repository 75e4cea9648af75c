use anyhow::{Context, Result};
use filmsearch_core::{NewFilm, SqliteCatalog};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub files: usize,
    pub films: usize,
}

/// `.json` and `.jsonl` files under `input`, or `input` itself when it is a file.
pub fn collect_files(input: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    }
    files
}

/// Parse film records from a JSONL file (one object per line) or a JSON file
/// holding an array of objects or a single object.
pub fn read_films(file: &Path) -> Result<Vec<NewFilm>> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let reader = BufReader::new(f);
    if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
        let mut films = Vec::new();
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() { continue; }
            let film: NewFilm = serde_json::from_str(&line)
                .with_context(|| format!("{}:{}", file.display(), lineno + 1))?;
            films.push(film);
        }
        return Ok(films);
    }

    let json: serde_json::Value = serde_json::from_reader(reader)?;
    match json {
        serde_json::Value::Array(arr) => arr
            .into_iter()
            .map(|v| serde_json::from_value(v).map_err(anyhow::Error::from))
            .collect(),
        serde_json::Value::Object(_) => Ok(vec![serde_json::from_value(json)?]),
        _ => Ok(vec![]),
    }
}

pub async fn import(catalog: &SqliteCatalog, input: &Path) -> Result<ImportSummary> {
    catalog.migrate().await?;
    let mut summary = ImportSummary::default();
    for file in collect_files(input) {
        let films = read_films(&file)?;
        for film in &films {
            catalog.insert(film).await.with_context(|| format!("inserting {:?}", film.title))?;
        }
        tracing::info!(file = %file.display(), films = films.len(), "imported");
        summary.files += 1;
        summary.films += films.len();
    }
    Ok(summary)
}
