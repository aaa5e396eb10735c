/*!
 * Wanted-item discovery.
 *
 * The catalog is the service that knows which movies and episodes lack
 * subtitles. Discovery is read-only: an empty list is a normal answer, an
 * unreachable service is a `CatalogError`.
 */

use std::fmt::Debug;

use async_trait::async_trait;

use crate::errors::CatalogError;

pub mod bazarr;
pub mod models;

pub use bazarr::BazarrClient;
pub use models::{ItemKey, MediaKind, WantedItem, WantedKind};

/// Source of wanted items
#[async_trait]
pub trait Catalog: Send + Sync + Debug {
    /// Movies missing subtitles
    async fn fetch_wanted_movies(&self) -> Result<Vec<WantedItem>, CatalogError>;

    /// Episodes missing subtitles
    async fn fetch_wanted_episodes(&self) -> Result<Vec<WantedItem>, CatalogError>;

    /// Movies followed by episodes; fails if either query fails
    async fn fetch_all(&self) -> Result<Vec<WantedItem>, CatalogError> {
        let mut items = self.fetch_wanted_movies().await?;
        items.extend(self.fetch_wanted_episodes().await?);
        Ok(items)
    }

    /// Check that the service is reachable and accepts our credentials
    async fn test_connection(&self) -> Result<(), CatalogError>;
}
