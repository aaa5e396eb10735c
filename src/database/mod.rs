/*!
 * Sync-state persistence.
 *
 * A sync record marks an (item, target language) pair as done; its presence
 * is what makes repeated runs skip work. Runs themselves are logged too so
 * `subsync stats` can report history.
 */

use std::fmt::Debug;

use anyhow::Result;
use async_trait::async_trait;

use crate::catalog::ItemKey;

pub mod connection;
pub mod models;
pub mod repository;
pub mod schema;

pub use connection::StoreConnection;
pub use models::{RunRecord, SyncRecord, SyncStatistics};
pub use repository::SyncRepository;

/// Store consulted and updated by the orchestrator; shared by all workers
#[async_trait]
pub trait SyncStateStore: Send + Sync + Debug {
    /// Whether the item already has a translation in `target_language`
    async fn exists(&self, key: ItemKey, target_language: &str) -> Result<bool>;

    /// Insert or replace the record for `record.key` and its language
    async fn record(&self, record: &SyncRecord) -> Result<()>;

    /// Persist the summary of a run
    async fn record_run(&self, run: &RunRecord) -> Result<()>;
}
