use actix_web::{web, Error, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::shared::{ApiError, ResponseType};
use crate::error::PlaybackError;
use crate::services::{PlaybackResolver, Resolution, VideoLibrary};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/playback")
            .route("/{id}", web::post().to(start_playback))
            .route("/{id}", web::get().to(playback_state))
            .route("/{id}", web::delete().to(leave_playback))
            .route("/{id}/ended", web::post().to(playback_ended))
            .route("/{id}/error", web::post().to(playback_error))
            .route("/{id}/retry", web::post().to(retry_playback))
            .route("/{id}/demo/{command}", web::post().to(demo_command))
            .route("/{id}/frame.svg", web::get().to(demo_frame)),
    )
    .service(web::resource("/handles/{handle}").route(web::get().to(serve_handle)));
}

fn handle_url(id: Uuid) -> String {
    format!("/api/v1/handles/{}", id)
}

fn resolution_body(video_id: &str, resolution: &Resolution) -> serde_json::Value {
    let url = match resolution {
        Resolution::Real { handle } => Some(handle_url(handle.id)),
        _ => None,
    };
    serde_json::json!({
        "videoId": video_id,
        "resolution": resolution,
        "url": url,
    })
}

/// Missing videos and store outages still get a demo so the player is never blank.
async fn resolve_or_fallback(
    video_id: String,
    outcome: Result<Resolution, PlaybackError>,
    resolver: &PlaybackResolver,
    library: &VideoLibrary,
) -> Result<HttpResponse, Error> {
    match outcome {
        Ok(Resolution::NotFound) => {
            let demo = resolver.start_demo(&video_id, None).await;
            Ok(HttpResponse::NotFound().json(serde_json::json!({
                "videoId": video_id,
                "resolution": { "kind": "not_found" },
                "fallback": demo,
            })))
        }
        Ok(resolution) => Ok(HttpResponse::Ok().json(resolution_body(&video_id, &resolution))),
        Err(PlaybackError::StoreUnavailable { source, .. }) => {
            let status = resolver.snapshot(&video_id).await.map_err(ApiError::from)?;
            let health = library.health().await;
            Ok(HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "videoId": video_id,
                "resolution": { "kind": "store_unavailable", "error": source.to_string() },
                "fallback": status.demo,
                "health": health,
            })))
        }
        Err(e) => Err(ApiError::from(e).into()),
    }
}

pub async fn start_playback(
    path: web::Path<String>,
    resolver: web::Data<PlaybackResolver>,
    library: web::Data<VideoLibrary>,
) -> Result<HttpResponse, Error> {
    let video_id = path.into_inner();
    let outcome = resolver.resolve(&video_id).await;
    resolve_or_fallback(video_id, outcome, &resolver, &library).await
}

pub async fn retry_playback(
    path: web::Path<String>,
    resolver: web::Data<PlaybackResolver>,
    library: web::Data<VideoLibrary>,
) -> Result<HttpResponse, Error> {
    let video_id = path.into_inner();
    let outcome = resolver.retry(&video_id).await;
    resolve_or_fallback(video_id, outcome, &resolver, &library).await
}

pub async fn playback_state(
    path: web::Path<String>,
    resolver: web::Data<PlaybackResolver>,
) -> Result<HttpResponse, Error> {
    let snapshot = resolver.snapshot(&path).await.map_err(ApiError::from)?;
    Ok(HttpResponse::Ok().json(ResponseType::ok(snapshot)))
}

pub async fn leave_playback(
    path: web::Path<String>,
    resolver: web::Data<PlaybackResolver>,
) -> HttpResponse {
    resolver.leave(&path).await;
    HttpResponse::NoContent().finish()
}

pub async fn playback_ended(
    path: web::Path<String>,
    resolver: web::Data<PlaybackResolver>,
) -> Result<HttpResponse, Error> {
    resolver.finish(&path).await.map_err(ApiError::from)?;
    let snapshot = resolver.snapshot(&path).await.map_err(ApiError::from)?;
    Ok(HttpResponse::Ok().json(ResponseType::ok(snapshot)))
}

#[derive(Debug, Deserialize)]
pub struct ErrorReport {
    pub reason: Option<String>,
}

pub async fn playback_error(
    path: web::Path<String>,
    report: Option<web::Json<ErrorReport>>,
    resolver: web::Data<PlaybackResolver>,
) -> Result<HttpResponse, Error> {
    let reason = report
        .and_then(|r| r.into_inner().reason)
        .unwrap_or_else(|| "decode failure".to_string());
    resolver
        .report_error(&path, reason)
        .await
        .map_err(ApiError::from)?;
    let snapshot = resolver.snapshot(&path).await.map_err(ApiError::from)?;
    Ok(HttpResponse::Ok().json(ResponseType::ok(snapshot)))
}

pub async fn demo_command(
    path: web::Path<(String, String)>,
    resolver: web::Data<PlaybackResolver>,
) -> Result<HttpResponse, Error> {
    let (video_id, command) = path.into_inner();
    let status = match command.as_str() {
        "pause" => resolver.pause(&video_id).await,
        "resume" | "play" => resolver.resume(&video_id).await,
        "reset" => resolver.reset(&video_id).await,
        other => {
            return Err(ApiError::BadRequest(format!("Unknown demo command {}", other)).into())
        }
    }
    .map_err(ApiError::from)?;
    Ok(HttpResponse::Ok().json(ResponseType::ok(status)))
}

pub async fn demo_frame(
    path: web::Path<String>,
    resolver: web::Data<PlaybackResolver>,
) -> Result<HttpResponse, Error> {
    let frame = resolver.frame(&path).await.map_err(ApiError::from)?;
    Ok(HttpResponse::Ok()
        .content_type("image/svg+xml")
        .insert_header(("Cache-Control", "no-store"))
        .body(frame.to_svg()))
}

pub async fn serve_handle(
    path: web::Path<Uuid>,
    resolver: web::Data<PlaybackResolver>,
) -> Result<HttpResponse, Error> {
    let id = path.into_inner();
    let handle = resolver
        .handle(id)
        .await
        .ok_or(ApiError::HandleNotFound(id))?;
    Ok(HttpResponse::Ok()
        .content_type(handle.content_type)
        .insert_header(("Cache-Control", "no-store"))
        .body(handle.data))
}
