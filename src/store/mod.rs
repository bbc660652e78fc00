mod memory;
mod postgres;
mod seed;

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::config::{AppConfig, StoreBackend};
use crate::db::models::VideoRecord;
use crate::error::StoreError;

pub use memory::MemoryStore;
pub use postgres::PgVideoStore;
pub use seed::{canonical_placeholders, seed_if_needed, SeedOutcome, SeedPolicy};

/// Keyed persistence of video records. `video_id` is the primary key and
/// writes replace a record wholesale.
pub trait VideoStore: Send + Sync {
    /// Validates and upserts the given record.
    fn put(&self, record: VideoRecord) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Fetches a record; a missing id is `Ok(None)`.
    fn get<'a>(&'a self, video_id: &'a str) -> BoxFuture<'a, Result<Option<VideoRecord>, StoreError>>;

    /// Every record, oldest upload first.
    fn get_all(&self) -> BoxFuture<'_, Result<Vec<VideoRecord>, StoreError>>;

    fn find_by_category<'a>(
        &'a self,
        category: &'a str,
    ) -> BoxFuture<'a, Result<Vec<VideoRecord>, StoreError>>;

    fn find_by_title<'a>(&'a self, title: &'a str) -> BoxFuture<'a, Result<Vec<VideoRecord>, StoreError>>;

    /// Removes a record. Deleting a missing id succeeds.
    fn delete<'a>(&'a self, video_id: &'a str) -> BoxFuture<'a, Result<(), StoreError>>;

    /// Removes every record.
    fn clear(&self) -> BoxFuture<'_, Result<(), StoreError>>;
}

/// Opens the configured backend and seeds it.
pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn VideoStore>, StoreError> {
    let policy = config.upload_policy();

    let store: Arc<dyn VideoStore> = match config.storage.backend {
        StoreBackend::Postgres => {
            let pool = crate::db::create_pool(&config.database)?;
            Arc::new(PgVideoStore::open(pool, policy).await?)
        }
        StoreBackend::Memory => Arc::new(MemoryStore::new(policy)),
    };

    let outcome = seed_if_needed(store.as_ref(), config.storage.seed_policy).await?;
    log::info!(
        "Opened {:?} video store ({:?})",
        config.storage.backend,
        outcome
    );

    Ok(store)
}
