/*!
 * Subtitle translation pipeline.
 *
 * Parses an SRT file, sends its lines through the backend chain batch by
 * batch and writes a document with the original timing and translated text.
 * For every batch the backends are tried in order; the first one that
 * answers in time with exactly one line per input line wins.
 */

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use super::batch::split_into_batches;
use crate::app_config::TranslationConfig;
use crate::errors::{ProviderError, TranslationError};
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::providers::{self, TranslationBackend};
use crate::subtitle_processor::{SubtitleCollection, SubtitleEntry};

/// One subtitle file to translate
#[derive(Debug, Clone)]
pub struct TranslationJob {
    pub source_path: PathBuf,
    pub source_language: String,
    pub target_language: String,
    pub entries: Vec<SubtitleEntry>,
    pub output_path: PathBuf,
}

impl TranslationJob {
    /// Parse `source_path` into a job; malformed files fail here
    pub fn load(
        source_path: &Path,
        source_language: &str,
        target_language: &str,
        output_path: PathBuf,
    ) -> Result<Self, TranslationError> {
        let document = SubtitleCollection::load(source_path)?;
        Ok(Self {
            source_path: source_path.to_path_buf(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            entries: document.entries,
            output_path,
        })
    }
}

/// Result of a finished job
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationOutcome {
    pub output_path: PathBuf,
    pub entries: usize,
    pub batches: usize,
    // Backends that translated at least one batch, in first-use order
    pub backends: Vec<String>,
}

impl TranslationOutcome {
    pub fn backend_summary(&self) -> String {
        self.backends.join(",")
    }
}

struct ChainRun {
    lines: Vec<String>,
    batches: usize,
    backends: Vec<String>,
}

/// Translation pipeline over a fallback chain of backends
#[derive(Debug, Clone)]
pub struct TranslationPipeline {
    backends: Vec<Arc<dyn TranslationBackend>>,
    request_timeout: Duration,
    batch_delay: Duration,
}

fn normalize_language(code: &str) -> String {
    language_utils::normalize_to_part1_or_part2t(code).unwrap_or_else(|_| code.to_string())
}

impl TranslationPipeline {
    pub fn new(backends: Vec<Arc<dyn TranslationBackend>>, request_timeout: Duration, batch_delay: Duration) -> Self {
        Self {
            backends,
            request_timeout,
            batch_delay,
        }
    }

    /// Build the enabled backends of `config` in fallback order
    pub fn from_config(config: &TranslationConfig) -> Result<Self, ProviderError> {
        Ok(Self::new(
            providers::build_backends(config)?,
            config.request_timeout(),
            config.batch_delay(),
        ))
    }

    pub fn backend_names(&self) -> Vec<String> {
        self.backends.iter().map(|b| b.name().to_string()).collect()
    }

    /// Run `test_connection` on every backend
    pub async fn check_backends(&self) -> Vec<(String, Result<(), ProviderError>)> {
        let mut results = Vec::with_capacity(self.backends.len());
        for backend in &self.backends {
            let result = match tokio::time::timeout(self.request_timeout, backend.test_connection()).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout(self.request_timeout.as_millis() as u64)),
            };
            results.push((backend.name().to_string(), result));
        }
        results
    }

    /// Translate an SRT file to `{stem}.{target}.translated.srt` beside it
    pub async fn translate(
        &self,
        path: &Path,
        source_language: &str,
        target_language: &str,
    ) -> Result<TranslationOutcome, TranslationError> {
        let output_path = FileManager::translated_output_path(path, target_language);
        let job = TranslationJob::load(path, source_language, target_language, output_path)?;
        self.run_job(job).await
    }

    /// Translate a parsed job and write its output
    ///
    /// Nothing is written unless every batch was translated.
    pub async fn run_job(&self, job: TranslationJob) -> Result<TranslationOutcome, TranslationError> {
        let start = Instant::now();
        let texts: Vec<String> = job.entries.iter().map(|e| e.text.clone()).collect();
        let run = self
            .translate_lines(&texts, &job.source_language, &job.target_language)
            .await?;

        let document = SubtitleCollection::new(job.source_path.clone(), job.entries).with_texts(run.lines)?;
        document
            .write_to_srt(&job.output_path)
            .map_err(|e| TranslationError::Write {
                path: job.output_path.clone(),
                message: format!("{:#}", e),
            })?;

        info!(
            "Translated {} entries in {} batches to {:?} ({:.1}s)",
            document.entries.len(),
            run.batches,
            job.output_path,
            start.elapsed().as_secs_f32()
        );

        Ok(TranslationOutcome {
            output_path: job.output_path,
            entries: document.entries.len(),
            batches: run.batches,
            backends: run.backends,
        })
    }

    /// Translate lines without touching the filesystem
    pub async fn translate_entries(
        &self,
        texts: &[String],
        source_language: &str,
        target_language: &str,
    ) -> Result<Vec<String>, TranslationError> {
        Ok(self.translate_lines(texts, source_language, target_language).await?.lines)
    }

    async fn translate_lines(
        &self,
        texts: &[String],
        source_language: &str,
        target_language: &str,
    ) -> Result<ChainRun, TranslationError> {
        let primary = self.backends.first().ok_or(TranslationError::NoBackends)?;
        let source = normalize_language(source_language);
        let target = normalize_language(target_language);

        let ranges = split_into_batches(texts, primary.limits());
        let mut run = ChainRun {
            lines: Vec::with_capacity(texts.len()),
            batches: ranges.len(),
            backends: Vec::new(),
        };

        for (i, range) in ranges.into_iter().enumerate() {
            if i > 0 && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }

            let (lines, backend) = self
                .translate_with_fallback(i + 1, &texts[range], &source, &target)
                .await?;
            run.lines.extend(lines);
            if !run.backends.contains(&backend) {
                run.backends.push(backend);
            }
        }

        Ok(run)
    }

    /// Try each backend in order until one translates the whole batch
    async fn translate_with_fallback(
        &self,
        batch: usize,
        texts: &[String],
        source: &str,
        target: &str,
    ) -> Result<(Vec<String>, String), TranslationError> {
        let mut last_error: Option<ProviderError> = None;
        let mut transient = true;

        for (attempt, backend) in self.backends.iter().enumerate() {
            match self.call_backend(backend.as_ref(), texts, source, target).await {
                Ok(lines) => {
                    if attempt > 0 {
                        info!("Batch {} translated by fallback backend {}", batch, backend.name());
                    }
                    return Ok((lines, backend.name().to_string()));
                }
                Err(e) => {
                    if e.is_transient() {
                        warn!("Backend {} unavailable for batch {}: {}", backend.name(), batch, e);
                    } else {
                        error!("Backend {} failed on batch {}: {}", backend.name(), batch, e);
                        transient = false;
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(TranslationError::AllBackendsFailed {
            batch,
            attempts: self.backends.len(),
            last_error: last_error.map(|e| e.to_string()).unwrap_or_default(),
            transient,
        })
    }

    /// Send a batch to one backend, re-split to that backend's limits
    async fn call_backend(
        &self,
        backend: &dyn TranslationBackend,
        texts: &[String],
        source: &str,
        target: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let mut lines = Vec::with_capacity(texts.len());

        for range in split_into_batches(texts, backend.limits()) {
            let chunk = &texts[range];
            debug!("Sending {} lines to {}", chunk.len(), backend.name());

            let translated = tokio::time::timeout(self.request_timeout, backend.translate_batch(chunk, source, target))
                .await
                .map_err(|_| ProviderError::Timeout(self.request_timeout.as_millis() as u64))??;

            if translated.len() != chunk.len() {
                return Err(ProviderError::MisalignedBatch {
                    expected: chunk.len(),
                    actual: translated.len(),
                });
            }
            lines.extend(translated);
        }

        Ok(lines)
    }
}
