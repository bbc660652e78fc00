use actix_web::{web, HttpResponse};

use crate::services::VideoLibrary;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(health_check)));
}

async fn health_check(library: web::Data<VideoLibrary>) -> HttpResponse {
    let report = library.health().await;
    let healthy = report.healthy;
    let body = serde_json::json!({
        "status": if healthy { "ok" } else { "degraded" },
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "videos": report,
    });

    if healthy {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}
