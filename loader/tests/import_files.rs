use filmsearch_core::{CatalogStore, Paginator, SearchFilter, SqliteCatalog};
use loader::import::{collect_files, import, read_films};
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn reads_json_array_object_and_jsonl() {
    let dir = tempdir().unwrap();
    let arr = dir.path().join("a.json");
    fs::write(&arr, r#"[{"title":"Ace Goldfinger","release_year":2006,"rating":"G","genres":["Horror"]},
                        {"title":"Adaptation Holes","release_year":2006}]"#).unwrap();
    let obj = dir.path().join("b.json");
    fs::write(&obj, r#"{"title":"Airport Pollock","release_year":2006,"description":"An epic tale"}"#).unwrap();
    let lines = dir.path().join("c.jsonl");
    fs::write(&lines, "{\"title\":\"Alamo Videotape\",\"release_year\":2006}\n\n{\"title\":\"Alley Evolution\",\"release_year\":2007}\n").unwrap();
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let films = read_films(&arr).unwrap();
    assert_eq!(films.len(), 2);
    assert_eq!(films[1].rating, "G");
    assert!(films[1].genres.is_empty());
    assert_eq!(read_films(&obj).unwrap()[0].description.as_deref(), Some("An epic tale"));
    assert_eq!(read_films(&lines).unwrap().len(), 2);

    let files = collect_files(dir.path());
    assert_eq!(files, vec![arr, obj, lines]);
}

#[test]
fn bad_jsonl_line_reports_location() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.jsonl");
    fs::write(&path, "{\"title\":\"Ok\",\"release_year\":2006}\n{\"title\":42}\n").unwrap();
    let err = read_films(&path).unwrap_err();
    assert!(format!("{err:#}").contains("bad.jsonl:2"));
}

#[tokio::test]
async fn import_then_search() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("films.jsonl");
    fs::write(
        &input,
        [
            r#"{"title":"Bucket Brotherhood","release_year":2005,"genres":["Travel"]}"#,
            r#"{"title":"Bride Intrigue","release_year":2006,"genres":["Action","Travel"]}"#,
            r#"{"title":"Chamber Italian","release_year":2007,"genres":["Music"]}"#,
        ]
        .join("\n"),
    )
    .unwrap();

    let catalog = SqliteCatalog::open(dir.path().join("catalog.db"), Duration::from_secs(5)).await.unwrap();
    let summary = import(&catalog, &input).await.unwrap();
    assert_eq!(summary.files, 1);
    assert_eq!(summary.films, 3);
    assert_eq!(catalog.genres().await.unwrap(), vec!["Action", "Music", "Travel"]);

    let paginator = Paginator::new(Arc::new(catalog));
    let travel = SearchFilter::genre_year(Some("Travel"), 2005, 2007).unwrap();
    let page = paginator.search(&travel, 10, 0).await.unwrap();
    let titles: Vec<_> = page.items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["Bucket Brotherhood", "Bride Intrigue"]);
}
