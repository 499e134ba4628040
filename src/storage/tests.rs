use super::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Credit {
    name: Option<String>,
    titles: Vec<String>,
}

impl FeedItem for Credit {
    fn csv_header() -> &'static [&'static str] {
        &["name", "titles"]
    }

    fn csv_row(&self) -> Vec<String> {
        vec![self.name.clone().unwrap_or_default(), self.titles.join(",")]
    }
}

fn temp_feed(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("filmocrawl-{}", std::process::id()))
        .join(name)
}

fn credits() -> Vec<Credit> {
    vec![
        Credit {
            name: Some("Ellen Pompeo".to_string()),
            titles: vec!["Show A".to_string(), "Show B".to_string()],
        },
        Credit {
            name: None,
            titles: vec!["Show C".to_string()],
        },
    ]
}

#[test]
fn test_format_follows_extension() {
    assert_eq!(
        FeedFormat::from_path(Path::new("movies.csv")).unwrap(),
        FeedFormat::Csv
    );
    assert_eq!(
        FeedFormat::from_path(Path::new("out/movies.JSONL")).unwrap(),
        FeedFormat::JsonLines
    );
    assert_eq!(
        FeedFormat::from_path(Path::new("movies.jl")).unwrap(),
        FeedFormat::JsonLines
    );
    assert!(matches!(
        FeedFormat::from_path(Path::new("movies.xml")),
        Err(StorageError::UnsupportedFormat(_))
    ));
    assert!(FeedFormat::from_path(Path::new("movies")).is_err());
}

#[tokio::test]
async fn test_csv_feed_writes_header_once() {
    let path = temp_feed("credits.csv");
    let storage = create_storage(StorageType::from_path(&path).unwrap()).unwrap();

    for credit in credits() {
        storage.store(&credit).await.unwrap();
    }
    storage.flush().await.unwrap();

    let written = fs::read_to_string(&path).unwrap();
    assert_eq!(
        written,
        "name,titles\nEllen Pompeo,\"Show A,Show B\"\n,Show C\n"
    );
}

#[tokio::test]
async fn test_jsonl_feed_writes_one_object_per_line() {
    let path = temp_feed("credits.jsonl");
    let storage = create_storage(StorageType::from_path(&path).unwrap()).unwrap();

    for credit in credits() {
        storage.store(&credit).await.unwrap();
    }
    storage.flush().await.unwrap();

    let written = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(
        lines[0],
        r#"{"name":"Ellen Pompeo","titles":["Show A","Show B"]}"#
    );
    assert_eq!(lines[1], r#"{"name":null,"titles":["Show C"]}"#);
}

#[tokio::test]
async fn test_memory_storage_round_trips_items() {
    let storage = create_storage(StorageType::Memory).unwrap();
    for credit in credits() {
        storage.store(&credit).await.unwrap();
    }

    let Storage::Memory(memory) = storage else {
        panic!("expected memory storage");
    };
    assert_eq!(memory.len(), 2);
    assert_eq!(memory.items::<Credit>().unwrap(), credits());
}
