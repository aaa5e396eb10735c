/*!
 * Tests for backend construction and response handling
 */

use reqwest::StatusCode;

use subsync::app_config::{BackendConfig, BackendKind, TranslationConfig};
use subsync::errors::ProviderError;
use subsync::providers::{
    BatchLimits, GoogleTranslate, LibreTranslate, MockBackend, MyMemory, Ollama, TranslationBackend, build_backends,
    status_error,
};

#[test]
fn test_buildBackends_withEnabledFlags_shouldSkipDisabledAndKeepOrder() {
    let config = TranslationConfig {
        backends: vec![
            BackendConfig::new(BackendKind::Ollama).enabled(true),
            BackendConfig::new(BackendKind::LibreTranslate).enabled(false),
            BackendConfig::new(BackendKind::MyMemory),
        ],
        ..TranslationConfig::default()
    };

    let backends = build_backends(&config).unwrap();

    let names: Vec<&str> = backends.iter().map(|b| b.name()).collect();
    assert_eq!(names, vec!["ollama", "mymemory"]);
    assert_eq!(backends[0].limits(), BatchLimits::new(1500, 30));
    assert_eq!(backends[1].limits(), BatchLimits::new(1000, 20));
}

#[test]
fn test_statusError_shouldSeparateTransientFromPermanent() {
    assert!(status_error(StatusCode::TOO_MANY_REQUESTS, "slow down").is_transient());
    assert!(!status_error(StatusCode::UNAUTHORIZED, "bad key").is_transient());
    assert!(!status_error(StatusCode::BAD_REQUEST, "unknown language").is_transient());
    assert!(matches!(
        status_error(StatusCode::BAD_GATEWAY, ""),
        ProviderError::ApiError { status_code: 502, .. }
    ));
}

#[test]
fn test_timeoutAndMisalignment_shouldBeReportedDistinctly() {
    let timeout = ProviderError::Timeout(30_000);
    let misaligned = ProviderError::MisalignedBatch { expected: 3, actual: 2 };

    assert!(timeout.is_transient());
    assert!(timeout.to_string().contains("30000"));
    assert!(misaligned.to_string().contains("2 lines for a batch of 3"));
}

#[test]
fn test_parseResponses_ofEachBackend_shouldKeepLineOrder() {
    let libre = LibreTranslate::parse_response(r#"{"translatedText": ["Hallo", "Wereld"]}"#).unwrap();
    assert_eq!(libre, vec!["Hallo", "Wereld"]);

    let google = GoogleTranslate::parse_response(
        r#"{"data": {"translations": [{"translatedText": "Hallo"}, {"translatedText": "Wereld"}]}}"#,
    )
    .unwrap();
    assert_eq!(google, vec!["Hallo", "Wereld"]);

    let memory = MyMemory::parse_response(
        r#"{"responseData": {"translatedText": "Hallo"}, "responseStatus": 200}"#,
    )
    .unwrap();
    assert_eq!(memory, "Hallo");

    let ollama = Ollama::parse_reply("<<ENTRY_0>> Hallo\n<<ENTRY_1>> Wereld\n<<END>>", 2).unwrap();
    assert_eq!(ollama, vec!["Hallo", "Wereld"]);
}

#[tokio::test]
async fn test_mockBackend_throughTraitObject_shouldCountCalls() {
    let mock = MockBackend::working().with_limits(100, 2);
    let counter = mock.call_counter();
    let backend: Box<dyn TranslationBackend> = Box::new(mock);

    let out = backend
        .translate_batch(&["Hi".to_string()], "en", "nl")
        .await
        .unwrap();

    assert_eq!(out, vec![MockBackend::translated("Hi", "nl")]);
    assert_eq!(backend.limits(), BatchLimits::new(100, 2));
    assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 1);
}
