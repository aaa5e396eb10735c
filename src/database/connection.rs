/*!
 * SQLite connection handling for the sync-state store.
 *
 * One connection is shared behind a mutex. Async callers go through
 * `run`/`run_in_transaction`, which move the work onto tokio's blocking
 * pool so worker tasks never stall the runtime while SQLite runs.
 */

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, info};
use parking_lot::Mutex;
use rusqlite::{Connection, Transaction};

use super::schema;

const DEFAULT_DB_FILENAME: &str = "subsync.db";
const DEFAULT_DB_DIRNAME: &str = "subsync";
const IN_MEMORY: &str = ":memory:";

/// How long a statement waits on a locked database file before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared handle to the store database
#[derive(Clone)]
pub struct StoreConnection {
    path: PathBuf,
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for StoreConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConnection")
            .field("path", &self.path)
            .finish()
    }
}

impl StoreConnection {
    /// Open (or create) the database file, creating parent directories
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
        }

        info!("Opening sync database at {:?}", path);
        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open database: {:?}", path))?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        schema::initialize_schema(&conn)?;

        Ok(Self {
            path,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open the database at the platform data directory
    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_path()?)
    }

    /// Private in-memory database, used by tests and dry runs
    pub fn open_in_memory() -> Result<Self> {
        debug!("Creating in-memory sync database");
        let conn = Connection::open_in_memory().context("Failed to create in-memory database")?;
        schema::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(IN_MEMORY),
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// `<data dir>/subsync/subsync.db`
    pub fn default_path() -> Result<PathBuf> {
        let base_dir = dirs::data_local_dir()
            .or_else(dirs::data_dir)
            .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;

        Ok(base_dir.join(DEFAULT_DB_DIRNAME).join(DEFAULT_DB_FILENAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == IN_MEMORY
    }

    /// Run `f` on the blocking pool with the connection locked
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || f(&conn.lock()))
            .await
            .context("Database task panicked")?
    }

    /// Like `run`, inside a transaction that commits only if `f` succeeds
    pub async fn run_in_transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock();
            let tx = guard.transaction()?;
            let result = f(&tx)?;
            tx.commit()?;
            Ok(result)
        })
        .await
        .context("Database transaction task panicked")?
    }

    /// Row counts and file size of the store
    pub async fn stats(&self) -> Result<DatabaseStats> {
        let file_size_bytes = if self.is_in_memory() {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        self.run(move |conn| {
            let record_count =
                conn.query_row("SELECT COUNT(*) FROM sync_records", [], |row| row.get(0))?;
            let run_count =
                conn.query_row("SELECT COUNT(*) FROM sync_runs", [], |row| row.get(0))?;
            Ok(DatabaseStats {
                record_count,
                run_count,
                file_size_bytes,
            })
        })
        .await
    }
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct DatabaseStats {
    pub record_count: i64,
    pub run_count: i64,
    pub file_size_bytes: u64,
}

impl std::fmt::Display for DatabaseStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Sync records: {}, Runs: {}, Size: {} KB",
            self.record_count,
            self.run_count,
            self.file_size_bytes / 1024
        )
    }
}
