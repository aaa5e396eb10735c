/*!
 * Per-item pipeline and the bounded worker pool that drives it.
 */

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use log::{debug, error, info, warn};

use super::{CancelHandle, ItemOutcome, SyncSummary};
use crate::app_config::Config;
use crate::catalog::{Catalog, ItemKey, WantedItem};
use crate::database::{RunRecord, SyncRecord, SyncStateStore};
use crate::errors::CatalogError;
use crate::file_utils::FileManager;
use crate::language_utils::language_codes_match;
use crate::media::{self, SubtitleCandidate, SubtitleLocator};
use crate::resolver::PathResolver;
use crate::translation::{TranslationJob, TranslationPipeline};

/// Run-wide knobs taken from the configuration
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub source_priority: Vec<String>,
    pub max_workers: usize,
    pub skip_unmonitored: bool,
    pub cleanup_extracted: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            source_priority: vec!["en".to_string()],
            max_workers: 2,
            skip_unmonitored: false,
            cleanup_extracted: true,
        }
    }
}

impl SyncSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            source_priority: config.source_priority.clone(),
            max_workers: config.sync.max_workers,
            skip_unmonitored: config.sync.skip_unmonitored,
            cleanup_extracted: config.sync.cleanup_extracted,
        }
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }
}

/// Drives wanted items through resolve, locate, select and translate
///
/// Cloning is cheap; every clone shares the same collaborators and cancel flag.
#[derive(Debug, Clone)]
pub struct SyncOrchestrator {
    catalog: Arc<dyn Catalog>,
    resolver: Arc<PathResolver>,
    locator: SubtitleLocator,
    pipeline: Arc<TranslationPipeline>,
    store: Arc<dyn SyncStateStore>,
    settings: Arc<SyncSettings>,
    cancel: CancelHandle,
}

impl SyncOrchestrator {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        resolver: PathResolver,
        locator: SubtitleLocator,
        pipeline: TranslationPipeline,
        store: Arc<dyn SyncStateStore>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            catalog,
            resolver: Arc::new(resolver),
            locator,
            pipeline: Arc::new(pipeline),
            store,
            settings: Arc::new(settings),
            cancel: CancelHandle::new(),
        }
    }

    /// Handle that stops dispatch of further items
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn pipeline(&self) -> &TranslationPipeline {
        &self.pipeline
    }

    pub fn catalog(&self) -> &dyn Catalog {
        self.catalog.as_ref()
    }

    /// Discover wanted items and process them all
    pub async fn process_wanted_items(&self, target_language: &str) -> Result<SyncSummary, CatalogError> {
        self.process_wanted_items_with_progress(target_language, |_, _| {}).await
    }

    pub async fn process_wanted_items_with_progress<P>(
        &self,
        target_language: &str,
        progress: P,
    ) -> Result<SyncSummary, CatalogError>
    where
        P: Fn(usize, usize) + Send + Sync,
    {
        let items = self.catalog.fetch_all().await?;
        info!("Catalog reports {} wanted items", items.len());
        Ok(self.process_items(items, target_language, progress).await)
    }

    /// Process `items` with at most `max_workers` in flight
    ///
    /// `progress` is called with `(completed, total)` after every item.
    pub async fn process_items<P>(&self, items: Vec<WantedItem>, target_language: &str, progress: P) -> SyncSummary
    where
        P: Fn(usize, usize) + Send + Sync,
    {
        let run = RunRecord::start(target_language);
        let total = items.len();
        let workers = self.settings.max_workers.max(1);
        let target: Arc<str> = Arc::from(target_language);
        let cancel = self.cancel.clone();

        debug!("Processing {} items with {} workers", total, workers);

        let outcomes = stream::iter(items)
            .take_while(move |_| futures::future::ready(!cancel.is_cancelled()))
            .map(|item| {
                let this = self.clone();
                let target = Arc::clone(&target);
                async move {
                    let name = item.display_name();
                    let task = tokio::spawn(async move { this.process_item(&item, &target).await });
                    let outcome = match task.await {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            error!("Worker for {} died: {}", name, e);
                            ItemOutcome::Failed(format!("worker task failed: {}", e))
                        }
                    };
                    info!("{}: {}", name, outcome);
                    outcome
                }
            })
            .buffer_unordered(workers);
        let mut outcomes = std::pin::pin!(outcomes);

        let mut summary = SyncSummary::default();
        let mut completed = 0;
        while let Some(outcome) = outcomes.next().await {
            summary.record(&outcome);
            completed += 1;
            progress(completed, total);
        }

        let cancelled = self.cancel.is_cancelled();
        if cancelled {
            warn!("Run cancelled after {} of {} items", completed, total);
        }
        info!("Sync finished: {}", summary);

        if let Err(e) = self.store.record_run(&run.finish(&summary, cancelled)).await {
            warn!("Could not store run summary: {:#}", e);
        }
        summary
    }

    /// Take a single item from discovery to its final state
    pub async fn process_item(&self, item: &WantedItem, target_language: &str) -> ItemOutcome {
        if self.settings.skip_unmonitored && !item.monitored {
            return ItemOutcome::Excluded("not monitored".to_string());
        }
        if !item.missing_languages.is_empty()
            && !item
                .missing_languages
                .iter()
                .any(|l| language_codes_match(l, target_language))
        {
            return ItemOutcome::Excluded(format!("{} is not missing", target_language));
        }

        let resolver = Arc::clone(&self.resolver);
        let lookup = item.clone();
        let resolved = match tokio::task::spawn_blocking(move || resolver.resolve_item(&lookup)).await {
            Ok(Some(resolved)) => resolved,
            Ok(None) => return ItemOutcome::Unresolved,
            Err(e) => return ItemOutcome::Failed(format!("path resolution task failed: {}", e)),
        };
        debug!("{} resolved to {:?} ({:?})", item.display_name(), resolved.path, resolved.method);

        let key = item.key();
        match self.store.exists(key, target_language).await {
            Ok(true) => return ItemOutcome::AlreadyPresent { path: None },
            Ok(false) => {}
            Err(e) => warn!("Sync state lookup for {} failed, checking files: {:#}", key, e),
        }

        if let Some(existing) = self.find_existing_target(&resolved.path, target_language) {
            let record = SyncRecord::new(key, target_language, path_string(&existing));
            if let Err(e) = self.store.record(&record).await {
                warn!("Could not record existing subtitle for {}: {:#}", key, e);
            }
            return ItemOutcome::AlreadyPresent { path: Some(existing) };
        }

        self.locate_and_translate(Some(key), &resolved.path, target_language).await
    }

    /// Locate, select and translate for one local video
    ///
    /// Unless `overwrite` is set, a video that already has a subtitle in the
    /// target language is left alone.
    pub async fn translate_video(&self, video: &Path, target_language: &str, overwrite: bool) -> ItemOutcome {
        if !overwrite {
            if let Some(existing) = self.find_existing_target(video, target_language) {
                return ItemOutcome::AlreadyPresent { path: Some(existing) };
            }
        }
        self.locate_and_translate(None, video, target_language).await
    }

    /// Our own output, or a sibling subtitle already in the target language
    fn find_existing_target(&self, video: &Path, target_language: &str) -> Option<PathBuf> {
        let output = FileManager::translated_output_for_video(video, target_language);
        if output.is_file() {
            return Some(output);
        }

        match self.locator.locate_external(video) {
            Ok(candidates) => candidates
                .into_iter()
                .find(|c| language_codes_match(&c.language, target_language))
                .map(|c| c.path),
            Err(e) => {
                debug!("Could not list subtitles beside {:?}: {}", video, e);
                None
            }
        }
    }

    async fn locate_and_translate(&self, key: Option<ItemKey>, video: &Path, target_language: &str) -> ItemOutcome {
        let candidates = match self.locator.locate(video, target_language).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!("Could not locate subtitles for {:?}: {:#}", video, e);
                return ItemOutcome::Failed(format!("subtitle lookup failed: {}", e));
            }
        };

        let translatable: Vec<SubtitleCandidate> = candidates.iter().filter(|c| c.is_translatable()).cloned().collect();
        let outcome = match media::select(&translatable, &self.settings.source_priority) {
            Some(source) => self.translate_candidate(key, video, source, target_language).await,
            None => {
                debug!(
                    "{} candidates for {:?}, none in {:?}",
                    candidates.len(),
                    video,
                    self.settings.source_priority
                );
                ItemOutcome::NoCandidate
            }
        };

        if self.settings.cleanup_extracted {
            SubtitleLocator::cleanup_extracted(&candidates);
        }
        outcome
    }

    async fn translate_candidate(
        &self,
        key: Option<ItemKey>,
        video: &Path,
        source: &SubtitleCandidate,
        target_language: &str,
    ) -> ItemOutcome {
        info!("Translating {:?} ({} -> {})", source.path, source.language, target_language);
        let output = FileManager::translated_output_for_video(video, target_language);

        let result = match TranslationJob::load(&source.path, &source.language, target_language, output) {
            Ok(job) => self.pipeline.run_job(job).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(outcome) => {
                let backend = outcome.backend_summary();
                if let Some(key) = key {
                    let record = SyncRecord::new(key, target_language, path_string(&outcome.output_path))
                        .with_source(path_string(&source.path), source.language.as_str())
                        .with_backend(backend.as_str());
                    if let Err(e) = self.store.record(&record).await {
                        warn!("Translated {} but could not record it: {:#}", key, e);
                    }
                }
                ItemOutcome::Translated {
                    output_path: outcome.output_path,
                    backend,
                }
            }
            Err(e) if e.is_transient() => {
                warn!("Translation of {:?} failed, backends unreachable: {}", source.path, e);
                ItemOutcome::Failed(e.to_string())
            }
            Err(e) => {
                error!("Translation of {:?} failed: {}", source.path, e);
                ItemOutcome::Failed(e.to_string())
            }
        }
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
