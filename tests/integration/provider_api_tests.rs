/*!
 * Live backend calls
 *
 * These hit public services and are ignored by default:
 * `cargo test -- --ignored provider_api`
 */

use std::time::Duration;

use subsync::app_config::{BackendConfig, BackendKind, TranslationConfig};
use subsync::translation::TranslationPipeline;

fn pipeline_for(kind: BackendKind) -> TranslationPipeline {
    let config = TranslationConfig {
        request_timeout_secs: 30,
        batch_delay_ms: 0,
        backends: vec![BackendConfig::new(kind).enabled(true)],
    };
    TranslationPipeline::from_config(&config).expect("backend should build")
}

async fn assert_translates(kind: BackendKind) {
    let _ = env_logger::builder().is_test(true).try_init();
    let pipeline = pipeline_for(kind);
    let texts = vec!["Good morning".to_string(), "Thank you very much".to_string()];

    let translated = tokio::time::timeout(Duration::from_secs(60), pipeline.translate_entries(&texts, "en", "nl"))
        .await
        .expect("request should finish")
        .expect("translation should succeed");

    assert_eq!(translated.len(), texts.len());
    assert!(translated.iter().all(|t| !t.trim().is_empty()));
}

#[tokio::test]
#[ignore]
async fn test_libreTranslate_withPublicServer_shouldTranslateBatch() {
    assert_translates(BackendKind::LibreTranslate).await;
}

#[tokio::test]
#[ignore]
async fn test_myMemory_withPublicApi_shouldTranslateBatch() {
    assert_translates(BackendKind::MyMemory).await;
}

#[tokio::test]
#[ignore]
async fn test_ollama_withLocalServer_shouldTranslateBatch() {
    assert_translates(BackendKind::Ollama).await;
}
