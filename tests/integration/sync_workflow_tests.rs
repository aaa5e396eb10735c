/*!
 * End-to-end runs over a fake catalog and a temporary library
 */

use anyhow::Result;
use std::fs;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::Mutex;

use subsync::catalog::WantedItem;
use subsync::database::SyncStateStore;
use subsync::errors::CatalogError;
use subsync::file_utils::FileManager;
use subsync::providers::{MockBackend, TranslationBackend};
use subsync::sync::{SyncSettings, SyncSummary};
use crate::common::{self, FakeCatalog, FakeToolkit, OrchestratorParts};

fn working_chain() -> Vec<Arc<dyn TranslationBackend>> {
    vec![Arc::new(MockBackend::working())]
}

const TITLES: [&str; 20] = [
    "Alien", "Heat", "Casablanca", "Vertigo", "Psycho", "Jaws", "Rocky", "Fargo", "Amelie", "Gravity",
    "Inception", "Memento", "Titanic", "Goodfellas", "Unforgiven", "Zodiac", "Oldboy", "Brazil", "Network",
    "Chinatown",
];

/// Twenty movies: seven already translated, seven translatable, six missing on disk
fn mixed_library(root: &Path) -> Result<Vec<WantedItem>> {
    let mut items = Vec::new();
    for (i, title) in TITLES.iter().enumerate() {
        let dir = format!("{} (2001)", title);
        match i % 3 {
            0 => {
                let video = common::create_video(root, &dir, title, Some("en"))?;
                common::create_test_subtitle(video.parent().unwrap_or(root), &format!("{}.nl.srt", title))?;
            }
            1 => {
                common::create_video(root, &dir, title, Some("en"))?;
            }
            _ => {}
        }
        items.push(WantedItem::movie(i as i64, *title).with_year(2001));
    }
    Ok(items)
}

#[tokio::test]
async fn test_processWantedItems_withThreeMovies_shouldCountEachOutcome() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    let existing = common::create_video(root, "Heat (1995)", "Heat", Some("en"))?;
    common::create_test_subtitle(root.join("Heat (1995)").as_path(), "Heat.nl.srt")?;
    let fresh = common::create_video(root, "Alien (1979)", "Alien", Some("en"))?;

    let mut parts = OrchestratorParts::new(root, working_chain());
    parts.catalog = Arc::new(FakeCatalog::with_movies(vec![
        WantedItem::movie(1, "Heat").with_year(1995),
        WantedItem::movie(2, "Alien").with_year(1979),
        WantedItem::movie(3, "Ghost In The Machine").with_year(1993),
    ]));
    let (orchestrator, store) = parts.build()?;

    let summary = orchestrator.process_wanted_items("nl").await?;

    assert_eq!(
        summary,
        SyncSummary {
            successful: 2,
            failed: 0,
            skipped: 1,
            translated: 1
        }
    );
    assert!(FileManager::translated_output_for_video(&fresh, "nl").exists());
    assert!(!FileManager::translated_output_for_video(&existing, "nl").exists());
    assert_eq!(store.statistics(1).await?.runs, 1);
    Ok(())
}

#[tokio::test]
async fn test_processItems_runTwice_shouldNotTranslateAgain() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    common::create_video(root, "Alien (1979)", "Alien", Some("en"))?;
    let backend = MockBackend::working();
    let calls = backend.call_counter();
    let (orchestrator, store) = OrchestratorParts::new(root, vec![Arc::new(backend)]).build()?;
    let items = vec![WantedItem::movie(2, "Alien").with_year(1979)];

    let first = orchestrator.process_items(items.clone(), "nl", |_, _| {}).await;
    let calls_after_first = calls.load(Ordering::SeqCst);
    let second = orchestrator.process_items(items.clone(), "nl", |_, _| {}).await;

    assert_eq!(first.translated, 1);
    assert_eq!(second.translated, 0);
    assert_eq!(second.successful, 1);
    assert_eq!(calls.load(Ordering::SeqCst), calls_after_first);
    assert!(store.exists(items[0].key(), "nl").await?);
    Ok(())
}

#[tokio::test]
async fn test_processItems_withFourWorkersOrOne_shouldAgreeOnCounters() -> Result<()> {
    let sequential_dir = common::create_temp_dir()?;
    let parallel_dir = common::create_temp_dir()?;
    let sequential_items = mixed_library(sequential_dir.path())?;
    let parallel_items = mixed_library(parallel_dir.path())?;

    let mut sequential = OrchestratorParts::new(sequential_dir.path(), working_chain());
    sequential.settings = SyncSettings::default().with_max_workers(1);
    let mut parallel = OrchestratorParts::new(parallel_dir.path(), working_chain());
    parallel.settings = SyncSettings::default().with_max_workers(4);
    let (sequential, _) = sequential.build()?;
    let (parallel, _) = parallel.build()?;

    let one = sequential.process_items(sequential_items, "nl", |_, _| {}).await;
    let four = parallel.process_items(parallel_items, "nl", |_, _| {}).await;

    assert_eq!(one, four);
    assert_eq!(one.total(), 20);
    assert_eq!(one.skipped, 6);
    assert_eq!(one.translated, 7);
    assert_eq!(one.successful, 14);
    Ok(())
}

#[tokio::test]
async fn test_processItems_shouldReportProgressForEveryItem() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let items = mixed_library(temp_dir.path())?;
    let (orchestrator, _) = OrchestratorParts::new(temp_dir.path(), working_chain()).build()?;
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    orchestrator
        .process_items(items, "nl", move |done, total| {
            sink.lock().push((done, total));
        })
        .await;

    let seen = seen.lock().clone();
    assert_eq!(seen.len(), 20);
    assert_eq!(seen.last(), Some(&(20, 20)));
    Ok(())
}

#[tokio::test]
async fn test_processItems_whenCancelledMidRun_shouldStopDispatching() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let items = mixed_library(temp_dir.path())?;
    let mut parts = OrchestratorParts::new(temp_dir.path(), working_chain());
    parts.settings = SyncSettings::default().with_max_workers(1);
    let (orchestrator, _) = parts.build()?;
    let cancel = orchestrator.cancel_handle();

    let summary = orchestrator
        .process_items(items, "nl", move |done, _| {
            if done == 3 {
                cancel.cancel();
            }
        })
        .await;

    assert!(summary.total() >= 3);
    assert!(summary.total() < 20);
    Ok(())
}

#[tokio::test]
async fn test_processWantedItems_withUnreachableCatalog_shouldFailTheRun() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut parts = OrchestratorParts::new(temp_dir.path(), working_chain());
    parts.catalog = Arc::new(FakeCatalog::unreachable());
    let (orchestrator, store) = parts.build()?;

    let err = orchestrator.process_wanted_items("nl").await.unwrap_err();

    assert!(matches!(err, CatalogError::Unavailable(_)));
    assert_eq!(store.statistics(1).await?.runs, 0);
    Ok(())
}

#[tokio::test]
async fn test_processItem_withEpisode_shouldTranslateMatchingEpisodeOnly() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let season = temp_dir.path().join("The Wire (2002)").join("Season 01");
    common::create_test_file(&season, "The.Wire.S01E01.mkv", "")?;
    common::create_test_subtitle(&season, "The.Wire.S01E01.en.srt")?;
    let episode = common::create_test_file(&season, "The.Wire.S01E02.mkv", "")?;
    common::create_test_subtitle(&season, "The.Wire.S01E02.en.srt")?;
    let (orchestrator, _) = OrchestratorParts::new(temp_dir.path(), working_chain()).build()?;
    let item = WantedItem::episode(12, "The Wire", 1, 2, "The Detail").with_year(2002);

    let summary = orchestrator.process_items(vec![item], "nl", |_, _| {}).await;

    assert_eq!(summary.translated, 1);
    assert!(FileManager::translated_output_for_video(&episode, "nl").exists());
    assert!(!season.join("The.Wire.S01E01.nl.translated.srt").exists());
    Ok(())
}

#[tokio::test]
async fn test_processItem_withOnlyEmbeddedStreams_shouldExtractTranslateAndClean() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let video = common::create_video(temp_dir.path(), "Alien (1979)", "Alien", None)?;
    let toolkit = Arc::new(FakeToolkit::with_streams(vec![
        FakeToolkit::stream(2, "hdmv_pgs_subtitle", Some("eng")),
        FakeToolkit::stream(3, "subrip", Some("eng")),
        FakeToolkit::stream(4, "subrip", Some("dut")),
    ]));
    let mut parts = OrchestratorParts::new(temp_dir.path(), working_chain());
    parts.toolkit = toolkit.clone();
    let (orchestrator, _) = parts.build()?;

    let summary = orchestrator
        .process_items(vec![WantedItem::movie(2, "Alien")], "nl", |_, _| {})
        .await;

    assert_eq!(summary.translated, 1);
    assert_eq!(toolkit.probe_count(), 1);
    let dir = video.parent().unwrap_or(temp_dir.path());
    let mut names: Vec<String> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["Alien.mkv".to_string(), "Alien.nl.translated.srt".to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_processItem_withFailingChain_shouldCountFailureAndRecordNothing() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_video(temp_dir.path(), "Alien (1979)", "Alien", Some("en"))?;
    let chain: Vec<Arc<dyn TranslationBackend>> =
        vec![Arc::new(MockBackend::failing()), Arc::new(MockBackend::wrong_count())];
    let (orchestrator, store) = OrchestratorParts::new(temp_dir.path(), chain).build()?;
    let item = WantedItem::movie(2, "Alien");

    let summary = orchestrator.process_items(vec![item.clone()], "nl", |_, _| {}).await;

    assert_eq!(summary.failed, 1);
    assert!(!store.exists(item.key(), "nl").await?);
    Ok(())
}

#[test]
fn test_processItems_withEmptyList_shouldReturnZeroCounters() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let (orchestrator, store) = OrchestratorParts::new(temp_dir.path(), working_chain()).build()?;

    let (summary, runs) = tokio_test::block_on(async {
        let summary = orchestrator.process_items(Vec::new(), "nl", |_, _| {}).await;
        let runs = store.statistics(1).await.map(|stats| stats.runs);
        (summary, runs)
    });

    assert_eq!(summary, SyncSummary::default());
    assert_eq!(runs?, 1);
    Ok(())
}
