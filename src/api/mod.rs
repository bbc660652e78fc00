pub mod health;
pub mod playback;
pub mod shared;
pub mod videos;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(videos::configure)
            .configure(playback::configure)
            .configure(health::configure),
    );
}
