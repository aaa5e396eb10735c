/*!
 * Rows of the sync-state store.
 */

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::catalog::ItemKey;
use crate::sync::SyncSummary;

/// Completed translation of one item into one language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRecord {
    pub key: ItemKey,
    pub target_language: String,
    /// Translated subtitle written beside the video
    pub output_path: String,
    pub source_path: Option<String>,
    pub source_language: Option<String>,
    /// Backend that produced the text, when known
    pub backend: Option<String>,
    /// RFC 3339 timestamp
    pub completed_at: String,
}

impl SyncRecord {
    pub fn new(key: ItemKey, target_language: impl Into<String>, output_path: impl Into<String>) -> Self {
        Self {
            key,
            target_language: target_language.into(),
            output_path: output_path.into(),
            source_path: None,
            source_language: None,
            backend: None,
            completed_at: Utc::now().to_rfc3339(),
        }
    }

    pub fn with_source(mut self, path: impl Into<String>, language: impl Into<String>) -> Self {
        self.source_path = Some(path.into());
        self.source_language = Some(language.into());
        self
    }

    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = Some(backend.into());
        self
    }
}

/// One orchestrated run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    /// UUID v4
    pub id: String,
    pub target_language: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub successful: i64,
    pub failed: i64,
    pub skipped: i64,
    pub translated: i64,
    pub cancelled: bool,
}

impl RunRecord {
    /// Start a run now
    pub fn start(target_language: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            target_language: target_language.into(),
            started_at: Utc::now().to_rfc3339(),
            finished_at: None,
            successful: 0,
            failed: 0,
            skipped: 0,
            translated: 0,
            cancelled: false,
        }
    }

    /// Close the run with its final counters
    pub fn finish(mut self, summary: &SyncSummary, cancelled: bool) -> Self {
        self.finished_at = Some(Utc::now().to_rfc3339());
        self.successful = summary.successful as i64;
        self.failed = summary.failed as i64;
        self.skipped = summary.skipped as i64;
        self.translated = summary.translated as i64;
        self.cancelled = cancelled;
        self
    }
}

/// Aggregates over a time window
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncStatistics {
    /// Window length in days
    pub days: i64,
    pub runs: i64,
    pub successful: i64,
    pub failed: i64,
    pub skipped: i64,
    pub translated: i64,
    /// Records written inside the window
    pub records_in_window: i64,
    /// All records in the store
    pub total_records: i64,
}

impl std::fmt::Display for SyncStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Last {} days: {} runs", self.days, self.runs)?;
        writeln!(
            f,
            "  successful: {}, failed: {}, skipped: {}, translated: {}",
            self.successful, self.failed, self.skipped, self.translated
        )?;
        write!(
            f,
            "  sync records: {} new, {} total",
            self.records_in_window, self.total_records
        )
    }
}
