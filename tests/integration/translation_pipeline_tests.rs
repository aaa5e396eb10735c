/*!
 * Integration tests for the translation pipeline and its fallback chain
 */

use anyhow::Result;
use std::fs;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use subsync::errors::TranslationError;
use subsync::file_utils::FileManager;
use subsync::providers::{MockBackend, TranslationBackend};
use subsync::subtitle_processor::SubtitleCollection;
use subsync::translation::TranslationPipeline;
use crate::common;

fn pipeline_of(backends: Vec<MockBackend>, timeout: Duration) -> TranslationPipeline {
    let backends: Vec<Arc<dyn TranslationBackend>> = backends
        .into_iter()
        .map(|b| Arc::new(b) as Arc<dyn TranslationBackend>)
        .collect();
    TranslationPipeline::new(backends, timeout, Duration::ZERO)
}

fn long_subtitle(entries: usize) -> String {
    (1..=entries)
        .map(|i| {
            format!(
                "{}\n00:00:{:02},000 --> 00:00:{:02},500\nLine number {}\n\n",
                i,
                i % 60,
                i % 60,
                i
            )
        })
        .collect()
}

#[tokio::test]
async fn test_translate_withWrongCountPrimary_shouldUseSecondaryForWholeFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_subtitle(temp_dir.path(), "Heat.en.srt")?;
    let primary = MockBackend::wrong_count();
    let primary_calls = primary.call_counter();
    let pipeline = pipeline_of(vec![primary, MockBackend::working()], Duration::from_secs(2));

    let outcome = pipeline.translate(&source, "en", "nl").await?;

    assert_eq!(primary_calls.load(Ordering::SeqCst), 1);
    assert_eq!(outcome.backends, vec!["mock-working".to_string()]);
    assert_eq!(outcome.output_path, temp_dir.path().join("Heat.nl.translated.srt"));

    let written = SubtitleCollection::load(&outcome.output_path)?;
    assert_eq!(written.entries.len(), 3);
    assert_eq!(written.entries[2].text, MockBackend::translated("For testing purposes.", "nl"));
    Ok(())
}

#[tokio::test]
async fn test_translate_withHangingPrimary_shouldTimeOutAndFallBack() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_subtitle(temp_dir.path(), "Heat.en.srt")?;
    let pipeline = pipeline_of(
        vec![MockBackend::slow(5_000), MockBackend::working()],
        Duration::from_millis(100),
    );

    let started = std::time::Instant::now();
    let outcome = pipeline.translate(&source, "en", "nl").await?;

    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(outcome.backend_summary(), "mock-working");
    Ok(())
}

#[tokio::test]
async fn test_translate_withIntermittentPrimary_shouldMixBackendsAndKeepOrder() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_file(temp_dir.path(), "Long.en.srt", &long_subtitle(12))?;
    let primary = MockBackend::intermittent(2).with_limits(1_000, 4);
    let fallback = MockBackend::working().with_limits(1_000, 2);
    let pipeline = pipeline_of(vec![primary, fallback], Duration::from_secs(2));

    let outcome = pipeline.translate(&source, "en", "nl").await?;

    assert_eq!(outcome.batches, 3);
    assert_eq!(outcome.backends, vec!["mock-intermittent".to_string(), "mock-working".to_string()]);
    let written = SubtitleCollection::load(&outcome.output_path)?;
    let texts: Vec<String> = written.texts();
    let expected: Vec<String> = (1..=12)
        .map(|i| MockBackend::translated(&format!("Line number {}", i), "nl"))
        .collect();
    assert_eq!(texts, expected);
    Ok(())
}

#[tokio::test]
async fn test_translate_withEveryBackendFailing_shouldLeaveDirectoryUntouched() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_subtitle(temp_dir.path(), "Heat.en.srt")?;
    let pipeline = pipeline_of(
        vec![MockBackend::failing(), MockBackend::wrong_count()],
        Duration::from_secs(2),
    );

    let err = pipeline.translate(&source, "en", "nl").await.unwrap_err();

    assert!(matches!(err, TranslationError::AllBackendsFailed { batch: 1, attempts: 2, .. }));
    let entries: Vec<_> = fs::read_dir(temp_dir.path())?.filter_map(|e| e.ok()).collect();
    assert_eq!(entries.len(), 1, "only the source file should remain");
    assert!(!FileManager::translated_output_path(&source, "nl").exists());
    Ok(())
}

#[tokio::test]
async fn test_translate_withCorruptTiming_shouldNotCallAnyBackend() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_file(
        temp_dir.path(),
        "Bad.en.srt",
        "1\n00:00:01,000 --> 00:00:02,000\nOk\n\n2\nnot a timing line\nBroken\n",
    )?;
    let backend = MockBackend::working();
    let calls = backend.call_counter();
    let pipeline = pipeline_of(vec![backend], Duration::from_secs(2));

    let err = pipeline.translate(&source, "en", "nl").await.unwrap_err();

    assert!(matches!(err, TranslationError::Subtitle(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    Ok(())
}
