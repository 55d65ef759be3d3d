// tests/corpus_loader.rs
use std::fs;

use bio_knowledge_engine::config::CorpusConfig;
use bio_knowledge_engine::ingest::{self, BulkCorpusLoader};
use bio_knowledge_engine::SourceType;

#[test]
fn loads_corpus_file_from_config_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("journals.csv");
    let mut csv = String::from("Title,Link\n");
    for i in 0..25 {
        csv.push_str(&format!("Paper {i},https://pmc.example/{i}\n"));
    }
    fs::write(&path, csv).unwrap();

    let records = ingest::load_corpus(&CorpusConfig { path });
    assert_eq!(records.len(), 25);
    assert_eq!(records[24].id, "journal-24");
    assert_eq!(records[24].document_link.as_deref(), Some("https://pmc.example/24"));
    assert!(records.iter().all(|r| r.source_type == SourceType::Journal));
}

#[test]
fn malformed_row_yields_empty_corpus() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.csv");
    // invalid UTF-8 in a title cell
    fs::write(&path, [&b"Title,Link\nok,https://x\n"[..], &[0xff, 0xfe, b'\n']].concat()).unwrap();

    assert!(BulkCorpusLoader::try_parse(fs::File::open(&path).unwrap()).is_err());
    assert!(BulkCorpusLoader::load_path(&path).is_empty());
}

#[test]
fn header_only_file_is_an_empty_corpus() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.csv");
    fs::write(&path, "Title,Link\n").unwrap();
    assert!(BulkCorpusLoader::load_path(&path).is_empty());
    assert!(BulkCorpusLoader::try_parse(fs::File::open(&path).unwrap()).unwrap().is_empty());
}
