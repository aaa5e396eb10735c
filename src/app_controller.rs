use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::Path;
use std::sync::Arc;

use crate::app_config::Config;
use crate::catalog::{BazarrClient, Catalog, MediaKind};
use crate::database::{StoreConnection, SyncRepository, SyncStatistics};
use crate::media::{FfmpegToolkit, StreamToolkit, SubtitleLocator};
use crate::resolver::{PathResolver, ResolvedPath};
use crate::sync::{CancelHandle, ItemOutcome, SyncOrchestrator, SyncSettings, SyncSummary};
use crate::translation::TranslationPipeline;

// @module: Application controller wiring configuration to the sync pipeline

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Resolver used by the `resolve` command
    resolver: PathResolver,
    // @field: Sync state, shared with the orchestrator
    repository: Arc<SyncRepository>,
    orchestrator: SyncOrchestrator,
}

impl Controller {
    // @method: Build every component from the configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let catalog = BazarrClient::from_config(&config.catalog).context("Failed to create catalog client")?;
        let repository = match &config.sync.database_path {
            Some(path) => SyncRepository::new(StoreConnection::open(path)?),
            None => SyncRepository::open_default()?,
        };
        Self::with_parts(config, Arc::new(catalog), Arc::new(FfmpegToolkit::new()), Arc::new(repository))
    }

    // @method: Build from explicit collaborators; used by tests
    pub fn with_parts(
        config: Config,
        catalog: Arc<dyn Catalog>,
        toolkit: Arc<dyn StreamToolkit>,
        repository: Arc<SyncRepository>,
    ) -> Result<Self> {
        let pipeline =
            TranslationPipeline::from_config(&config.translation).context("Failed to create translation backends")?;
        let resolver = PathResolver::new(&config.paths);
        let orchestrator = SyncOrchestrator::new(
            catalog,
            resolver.clone(),
            SubtitleLocator::new(toolkit),
            pipeline,
            repository.clone(),
            SyncSettings::from_config(&config),
        );

        Ok(Self {
            config,
            resolver,
            repository,
            orchestrator,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.orchestrator.cancel_handle()
    }

    /// Process the catalog's wanted list with a progress bar
    pub async fn run_wanted(&self, target_language: &str) -> Result<SyncSummary> {
        info!(
            "Syncing wanted subtitles into {} using {}",
            target_language,
            self.orchestrator.pipeline().backend_names().join(" -> ")
        );

        let progress_bar = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} items ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar.set_message("Syncing");

        let bar = progress_bar.clone();
        let result = self
            .orchestrator
            .process_wanted_items_with_progress(target_language, move |done, total| {
                bar.set_length(total as u64);
                bar.set_position(done as u64);
            })
            .await;
        progress_bar.finish_and_clear();

        let summary = result.context("Failed to fetch wanted items")?;
        info!("Done: {}", summary);
        Ok(summary)
    }

    /// Translate a single local video
    pub async fn translate_file(&self, video: &Path, target_language: &str, overwrite: bool) -> Result<ItemOutcome> {
        if !video.is_file() {
            return Err(anyhow::anyhow!("Input file does not exist: {:?}", video));
        }
        let outcome = self.orchestrator.translate_video(video, target_language, overwrite).await;
        match &outcome {
            ItemOutcome::Translated { output_path, backend } => info!("Success: {:?} via {}", output_path, backend),
            ItemOutcome::AlreadyPresent { path } => {
                warn!("{:?} already has a {} subtitle {:?}. Use -f to force overwrite.", video, target_language, path)
            }
            other => error!("{:?}: {}", video, other),
        }
        Ok(outcome)
    }

    /// What the resolver makes of a catalog entry
    pub async fn resolve(
        &self,
        kind: MediaKind,
        title: &str,
        year: Option<u16>,
        catalog_path: Option<String>,
        episode: Option<(u32, u32)>,
    ) -> Result<Option<ResolvedPath>> {
        let resolver = self.resolver.clone();
        let title = title.to_string();
        tokio::task::spawn_blocking(move || match (kind, episode) {
            (MediaKind::Episode, Some((season, number))) => {
                let mut item = crate::catalog::WantedItem::episode(0, title.clone(), season, number, title);
                item.year = year;
                item.catalog_path = catalog_path;
                resolver.resolve_item(&item)
            }
            _ => resolver.resolve(catalog_path.as_deref(), kind, &title, year),
        })
        .await
        .context("Resolver task failed")
    }

    pub async fn statistics(&self, days: i64) -> Result<SyncStatistics> {
        self.repository.statistics(days).await
    }

    /// Check the catalog and every enabled backend; true when all respond
    pub async fn check(&self) -> bool {
        let mut healthy = true;

        match self.orchestrator.catalog().test_connection().await {
            Ok(()) => info!("Catalog at {} is reachable", self.config.catalog.url),
            Err(e) => {
                error!("Catalog at {}: {}", self.config.catalog.url, e);
                healthy = false;
            }
        }

        for (name, result) in self.orchestrator.pipeline().check_backends().await {
            match result {
                Ok(()) => info!("Backend {} is reachable", name),
                Err(e) => {
                    warn!("Backend {}: {}", name, e);
                    healthy = false;
                }
            }
        }
        healthy
    }
}
