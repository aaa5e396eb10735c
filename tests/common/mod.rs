/*!
 * Common test utilities for the subsync test suite
 */

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use tempfile::TempDir;

use subsync::app_config::PathConfig;
use subsync::catalog::{Catalog, WantedItem};
use subsync::database::SyncRepository;
use subsync::errors::CatalogError;
use subsync::media::{StreamToolkit, SubtitleLocator, SubtitleStream};
use subsync::providers::TranslationBackend;
use subsync::resolver::PathResolver;
use subsync::sync::{SyncOrchestrator, SyncSettings};
use subsync::translation::TranslationPipeline;
use std::time::Duration;

/// Three-entry English subtitle
pub const SAMPLE_SRT: &str = r#"1
00:00:01,000 --> 00:00:04,000
This is a test subtitle.

2
00:00:05,000 --> 00:00:09,000
It contains multiple entries.

3
00:00:10,000 --> 00:00:14,000
For testing purposes.
"#;

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates a sample subtitle file for testing
pub fn create_test_subtitle(dir: &Path, filename: &str) -> Result<PathBuf> {
    create_test_file(dir, filename, SAMPLE_SRT)
}

/// Creates `root/dir_name/{stem}.mkv`, plus `{stem}.{lang}.srt` when a language is given
pub fn create_video(root: &Path, dir_name: &str, stem: &str, subtitle_language: Option<&str>) -> Result<PathBuf> {
    let dir = root.join(dir_name);
    let video = create_test_file(&dir, &format!("{}.mkv", stem), "")?;
    if let Some(language) = subtitle_language {
        create_test_subtitle(&dir, &format!("{}.{}.srt", stem, language))?;
    }
    Ok(video)
}

/// Catalog serving a fixed list
#[derive(Debug, Default)]
pub struct FakeCatalog {
    pub movies: Vec<WantedItem>,
    pub episodes: Vec<WantedItem>,
    pub unreachable: bool,
}

impl FakeCatalog {
    pub fn with_movies(movies: Vec<WantedItem>) -> Self {
        Self {
            movies,
            ..Self::default()
        }
    }

    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    fn answer(&self, items: &[WantedItem]) -> Result<Vec<WantedItem>, CatalogError> {
        if self.unreachable {
            return Err(CatalogError::Unavailable("connection refused".to_string()));
        }
        Ok(items.to_vec())
    }
}

#[async_trait]
impl Catalog for FakeCatalog {
    async fn fetch_wanted_movies(&self) -> Result<Vec<WantedItem>, CatalogError> {
        self.answer(&self.movies)
    }

    async fn fetch_wanted_episodes(&self) -> Result<Vec<WantedItem>, CatalogError> {
        self.answer(&self.episodes)
    }

    async fn test_connection(&self) -> Result<(), CatalogError> {
        self.answer(&[]).map(|_| ())
    }
}

/// Stream toolkit that reports fixed streams and writes `SAMPLE_SRT` on extraction
#[derive(Debug, Default)]
pub struct FakeToolkit {
    pub streams: Vec<SubtitleStream>,
    pub probes: AtomicUsize,
}

impl FakeToolkit {
    pub fn with_streams(streams: Vec<SubtitleStream>) -> Self {
        Self {
            streams,
            probes: AtomicUsize::new(0),
        }
    }

    pub fn stream(index: usize, codec: &str, language: Option<&str>) -> SubtitleStream {
        SubtitleStream {
            index,
            codec_name: codec.to_string(),
            language: language.map(str::to_string),
            title: None,
        }
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StreamToolkit for FakeToolkit {
    async fn list_subtitle_streams(&self, _video: &Path) -> Result<Vec<SubtitleStream>> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        Ok(self.streams.clone())
    }

    async fn extract_stream(&self, _video: &Path, _stream_index: usize, output: &Path) -> Result<()> {
        fs::write(output, SAMPLE_SRT)?;
        Ok(())
    }
}

/// Path settings with `root` as the only movie and series root
pub fn library_paths(root: &Path) -> PathConfig {
    PathConfig {
        movie_roots: vec![root.to_path_buf()],
        series_roots: vec![root.to_path_buf()],
        ..PathConfig::default()
    }
}

/// Collaborators for an orchestrator under test
pub struct OrchestratorParts {
    pub catalog: Arc<dyn Catalog>,
    pub paths: PathConfig,
    pub toolkit: Arc<dyn StreamToolkit>,
    pub backends: Vec<Arc<dyn TranslationBackend>>,
    pub settings: SyncSettings,
}

impl OrchestratorParts {
    pub fn new(root: &Path, backends: Vec<Arc<dyn TranslationBackend>>) -> Self {
        Self {
            catalog: Arc::new(FakeCatalog::default()),
            paths: library_paths(root),
            toolkit: Arc::new(FakeToolkit::default()),
            backends,
            settings: SyncSettings::default(),
        }
    }

    pub fn build(self) -> Result<(SyncOrchestrator, Arc<SyncRepository>)> {
        let store = Arc::new(SyncRepository::open_in_memory()?);
        let orchestrator = SyncOrchestrator::new(
            self.catalog,
            PathResolver::new(&self.paths),
            SubtitleLocator::new(self.toolkit),
            TranslationPipeline::new(self.backends, Duration::from_secs(2), Duration::ZERO),
            store.clone(),
            self.settings,
        );
        Ok((orchestrator, store))
    }
}
