/*!
 * Run orchestration.
 *
 * A run takes the wanted items of the catalog and pushes each one through
 * resolve, existing-subtitle check, locate, select and translate. Items are
 * independent: an item's failure is counted, never propagated.
 */

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

pub mod orchestrator;

pub use orchestrator::{SyncOrchestrator, SyncSettings};

/// Final state of one item
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    /// No local video file could be found
    Unresolved,
    /// Filtered out before resolution (unmonitored, target not missing)
    Excluded(String),
    /// A subtitle in the target language already exists
    AlreadyPresent { path: Option<PathBuf> },
    /// A new subtitle was written
    Translated { output_path: PathBuf, backend: String },
    /// No subtitle in any source language
    NoCandidate,
    /// Any other failure
    Failed(String),
}

impl fmt::Display for ItemOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Unresolved => write!(f, "skipped, no local file found"),
            Self::Excluded(reason) => write!(f, "skipped, {}", reason),
            Self::AlreadyPresent { path: Some(path) } => write!(f, "already has {:?}", path),
            Self::AlreadyPresent { path: None } => write!(f, "already synced"),
            Self::Translated { output_path, backend } => write!(f, "translated to {:?} via {}", output_path, backend),
            Self::NoCandidate => write!(f, "failed, no subtitle in a source language"),
            Self::Failed(reason) => write!(f, "failed, {}", reason),
        }
    }
}

/// Aggregate counters of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
    // Subset of `successful` that produced a new file
    pub translated: usize,
}

impl SyncSummary {
    pub fn record(&mut self, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Unresolved | ItemOutcome::Excluded(_) => self.skipped += 1,
            ItemOutcome::AlreadyPresent { .. } => self.successful += 1,
            ItemOutcome::Translated { .. } => {
                self.successful += 1;
                self.translated += 1;
            }
            ItemOutcome::NoCandidate | ItemOutcome::Failed(_) => self.failed += 1,
        }
    }

    /// Items accounted for
    pub fn total(&self) -> usize {
        self.successful + self.failed + self.skipped
    }
}

impl fmt::Display for SyncSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} successful ({} translated), {} failed, {} skipped",
            self.successful, self.translated, self.failed, self.skipped
        )
    }
}

/// Stops a run from dispatching further items
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Clear the flag so the next run dispatches again
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}
