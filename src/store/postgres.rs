use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use futures::future::{BoxFuture, FutureExt};

use crate::db::models::{VideoRecord, VideoRow};
use crate::db::schema::video_records::dsl;
use crate::db::DbPool;
use crate::error::StoreError;
use crate::media::UploadPolicy;
use crate::store::VideoStore;

type Connection = deadpool::managed::Object<AsyncDieselConnectionManager<AsyncPgConnection>>;

const CREATE_STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS video_records (
        video_id VARCHAR PRIMARY KEY,
        title VARCHAR NOT NULL,
        category VARCHAR,
        sport VARCHAR,
        difficulty VARCHAR,
        description TEXT,
        file_name VARCHAR NOT NULL,
        file_size BIGINT NOT NULL CHECK (file_size >= 0),
        file_type VARCHAR NOT NULL,
        file_data BYTEA NOT NULL,
        uploaded_at TIMESTAMP NOT NULL,
        is_sample BOOLEAN NOT NULL DEFAULT FALSE,
        both_side BOOLEAN,
        online BOOLEAN,
        free_content BOOLEAN
    )",
    "CREATE INDEX IF NOT EXISTS video_records_title_idx ON video_records (title)",
    "CREATE INDEX IF NOT EXISTS video_records_category_idx ON video_records (category)",
    "CREATE INDEX IF NOT EXISTS video_records_uploaded_at_idx ON video_records (uploaded_at)",
];

/// A store that keeps its records in PostgreSQL.
pub struct PgVideoStore {
    pool: DbPool,
    policy: UploadPolicy,
}

impl PgVideoStore {
    /// Connects and creates the table and its indexes if they do not exist yet.
    pub async fn open(pool: DbPool, policy: UploadPolicy) -> Result<Self, StoreError> {
        let store = PgVideoStore { pool, policy };

        let mut conn = store.connection().await?;
        for statement in CREATE_STATEMENTS {
            diesel::sql_query(*statement)
                .execute(&mut conn)
                .await
                .map_err(|e| StoreError::Open(format!("failed to prepare schema: {}", e)))?;
        }
        log::info!("PostgreSQL video store ready");

        Ok(store)
    }

    async fn connection(&self) -> Result<Connection, StoreError> {
        self.pool.get().await.map_err(|e| {
            log::error!("Failed to get DB connection: {}", e);
            StoreError::Open(e.to_string())
        })
    }
}

impl VideoStore for PgVideoStore {
    fn put(&self, record: VideoRecord) -> BoxFuture<'_, Result<(), StoreError>> {
        upsert(self, record).boxed()
    }

    fn get<'a>(&'a self, video_id: &'a str) -> BoxFuture<'a, Result<Option<VideoRecord>, StoreError>> {
        fetch(self, video_id).boxed()
    }

    fn get_all(&self) -> BoxFuture<'_, Result<Vec<VideoRecord>, StoreError>> {
        async move {
            let mut conn = self.connection().await?;
            let rows = dsl::video_records
                .order_by(dsl::uploaded_at.asc())
                .select(VideoRow::as_select())
                .load(&mut conn)
                .await
                .map_err(|source| StoreError::Read { source })?;
            into_records(rows)
        }
        .boxed()
    }

    fn find_by_category<'a>(
        &'a self,
        category: &'a str,
    ) -> BoxFuture<'a, Result<Vec<VideoRecord>, StoreError>> {
        async move {
            let mut conn = self.connection().await?;
            let rows = dsl::video_records
                .filter(dsl::category.eq(category))
                .order_by(dsl::uploaded_at.asc())
                .select(VideoRow::as_select())
                .load(&mut conn)
                .await
                .map_err(|source| StoreError::Read { source })?;
            into_records(rows)
        }
        .boxed()
    }

    fn find_by_title<'a>(&'a self, title: &'a str) -> BoxFuture<'a, Result<Vec<VideoRecord>, StoreError>> {
        async move {
            let mut conn = self.connection().await?;
            let rows = dsl::video_records
                .filter(dsl::title.eq(title))
                .order_by(dsl::uploaded_at.asc())
                .select(VideoRow::as_select())
                .load(&mut conn)
                .await
                .map_err(|source| StoreError::Read { source })?;
            into_records(rows)
        }
        .boxed()
    }

    fn delete<'a>(&'a self, video_id: &'a str) -> BoxFuture<'a, Result<(), StoreError>> {
        async move {
            let mut conn = self.connection().await?;
            let deleted = diesel::delete(dsl::video_records.find(video_id))
                .execute(&mut conn)
                .await
                .map_err(|source| StoreError::Write { source })?;
            if deleted > 0 {
                log::info!("Video {} deleted", video_id);
            }
            Ok(())
        }
        .boxed()
    }

    fn clear(&self) -> BoxFuture<'_, Result<(), StoreError>> {
        async move {
            let mut conn = self.connection().await?;
            diesel::delete(dsl::video_records)
                .execute(&mut conn)
                .await
                .map_err(|source| StoreError::Write { source })?;
            Ok(())
        }
        .boxed()
    }
}

async fn upsert(store: &PgVideoStore, record: VideoRecord) -> Result<(), StoreError> {
    store.policy.validate(&record)?;

    let row = VideoRow::try_from(record)?;
    let mut conn = store.connection().await?;

    diesel::insert_into(dsl::video_records)
        .values(&row)
        .on_conflict(dsl::video_id)
        .do_update()
        .set(&row)
        .execute(&mut conn)
        .await
        .map_err(|source| {
            log::error!("Failed to store video {}: {}", row.video_id, source);
            StoreError::Write { source }
        })?;

    log::info!("Video {} stored", row.video_id);
    Ok(())
}

async fn fetch(store: &PgVideoStore, video_id: &str) -> Result<Option<VideoRecord>, StoreError> {
    let mut conn = store.connection().await?;

    let row = dsl::video_records
        .find(video_id)
        .select(VideoRow::as_select())
        .first(&mut conn)
        .await
        .optional()
        .map_err(|source| StoreError::Read { source })?;

    row.map(VideoRecord::try_from).transpose()
}

fn into_records(rows: Vec<VideoRow>) -> Result<Vec<VideoRecord>, StoreError> {
    rows.into_iter().map(VideoRecord::try_from).collect()
}
