mod app_config;

pub use app_config::{
    AppConfig, DatabaseConfig, PlaybackConfig, ServerConfig, StorageConfig, StoreBackend,
};
