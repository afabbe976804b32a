//! Multi-page batch runs: per-page results, failure isolation and progress events.

mod helpers;

use helpers::*;
use pagewright::{
    LayoutClass, ModelCache, NoProgress, PagePipeline, PageProgress, PagewrightError, PipelineConfig,
};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::channel;
use tempfile::TempDir;

fn pipeline() -> PagePipeline {
    init_tracing();
    let caps = capabilities(
        ScriptedLayout::returning(vec![region(0, 0, 200, 50, LayoutClass::PlainText)]),
        ScriptedOcr::constant(vec![span(0, "the cat sat", 0.95)]),
        ScriptedHandwriting::returning(&[]),
    );
    let config = PipelineConfig {
        max_workers: 1,
        ..Default::default()
    };
    PagePipeline::new(config, caps).unwrap()
}

fn pages(dir: &TempDir) -> Vec<PathBuf> {
    let first = dir.path().join("page-1.png");
    let third = dir.path().join("page-3.png");
    fs::write(&first, page_png()).unwrap();
    fs::write(&third, page_png()).unwrap();
    vec![first, dir.path().join("missing.png"), third]
}

#[test]
fn test_failed_page_does_not_stop_batch() {
    let dir = TempDir::new().unwrap();
    let paths = pages(&dir);

    let mut events = Vec::new();
    let results = pipeline().process_files(&paths, &mut |p: PageProgress| events.push(p));

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().transcript.text(), "the cat sat");
    assert!(matches!(results[1], Err(PagewrightError::Io(_))));
    assert!(results[2].is_ok());

    let indices: Vec<usize> = events.iter().map(|p| p.page_index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
    assert!(events.iter().all(|p| p.total_pages == 3));
    assert_eq!(events[2].percent_complete, 100.0);
}

#[test]
fn test_progress_over_channel() {
    let dir = TempDir::new().unwrap();
    let paths = pages(&dir);

    let (mut tx, rx) = channel::<PageProgress>();
    pipeline().process_files(&paths, &mut tx);
    drop(tx);

    let events: Vec<PageProgress> = rx.iter().collect();
    assert_eq!(events.len(), 3);
    assert!(events.windows(2).all(|w| w[0].percent_complete < w[1].percent_complete));
}

#[test]
fn test_empty_batch_emits_nothing() {
    let paths: Vec<PathBuf> = Vec::new();
    let mut calls = 0;
    let results = pipeline().process_files(&paths, &mut |_p: PageProgress| calls += 1);

    assert!(results.is_empty());
    assert_eq!(calls, 0);
    assert!(pipeline().process_files(&paths, &mut NoProgress).is_empty());
}

#[test]
fn test_cached_dictionary_is_shared_between_pipelines() {
    let dir = TempDir::new().unwrap();
    let words = dir.path().join("words.txt");
    fs::write(&words, "the\ncat\nsat\n").unwrap();

    let cache = ModelCache::new();
    let first = cache.word_dictionary(&words).unwrap();
    let second = cache.word_dictionary(&words).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let caps = capabilities(
        ScriptedLayout::returning(vec![region(0, 0, 200, 50, LayoutClass::PlainText)]),
        ScriptedOcr::constant(vec![span(0, "the cat sat", 0.95)]),
        ScriptedHandwriting::returning(&[]),
    );
    let caps = pagewright::Capabilities {
        dictionary: first,
        ..caps
    };
    let result = PagePipeline::new(PipelineConfig::default(), caps)
        .unwrap()
        .process_image(&page());
    assert_eq!(result.transcript.text(), "the cat sat");
}
