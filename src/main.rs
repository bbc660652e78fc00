use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use dotenv::dotenv;

use training_video::config::AppConfig;
use training_video::services::legacy::LegacyCatalog;
use training_video::services::{spawn_demo_clock, PlaybackResolver, VideoLibrary};
use training_video::{api, store};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists
    dotenv().ok();

    env_logger::init();

    let config = Arc::new(AppConfig::new().context("Failed to load configuration")?);
    let policy = config.upload_policy();

    let store = store::open_store(&config)
        .await
        .context("Failed to open video store")?;

    let legacy = match &config.storage.legacy_catalog {
        Some(path) => Some(LegacyCatalog::load(path).await),
        None => None,
    };

    let resolver = Arc::new(PlaybackResolver::new(
        store.clone(),
        policy.clone(),
        config.playback.loop_period,
    )
    .with_limits(config.session_limits()));
    let _clock = spawn_demo_clock(&resolver, config.playback.frames_per_second);

    let library = web::Data::new(VideoLibrary::new(store, resolver.clone(), legacy, policy));
    let resolver = web::Data::from(resolver);

    log::info!(
        "Starting server on {}:{}",
        config.server.host,
        config.server.port
    );

    let c = config.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(library.clone())
            .app_data(resolver.clone())
            .app_data(web::Data::from(c.clone()))
            .wrap(actix_cors::Cors::permissive()) // Configure properly in production
            .configure(api::configure)
    })
    .bind((config.server.host.clone(), config.server.port))?
    .run()
    .await?;

    Ok(())
}
