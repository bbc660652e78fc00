pub mod models;
pub mod schema;

use diesel_async::pooled_connection::deadpool::Pool;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::AsyncPgConnection;

use crate::config::DatabaseConfig;
use crate::error::StoreError;

pub type DbPool = deadpool::managed::Pool<AsyncDieselConnectionManager<AsyncPgConnection>>;

pub fn create_pool(config: &DatabaseConfig) -> Result<DbPool, StoreError> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.url);
    Pool::builder(manager)
        .max_size(config.max_connections as usize)
        .build()
        .map_err(|e| StoreError::Open(format!("failed to create database pool: {}", e)))
}
