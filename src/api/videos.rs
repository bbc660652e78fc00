use actix_multipart::Multipart;
use actix_web::{web, Error, HttpResponse};
use futures::TryStreamExt;

use crate::api::shared::{ApiError, ResponseType};
use crate::error::{StoreError, ValidationError};
use crate::services::demo::poster_svg;
use crate::services::{UploadForm, UploadedFile, VideoLibrary};

const MAX_TEXT_FIELD_SIZE: usize = 64 * 1024;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/videos")
            .route("", web::post().to(upload_video))
            .route("", web::get().to(list_videos))
            .route("/stats", web::get().to(video_stats))
            .route("/{id}", web::get().to(get_video))
            .route("/{id}", web::delete().to(delete_video))
            .route("/{id}/poster.svg", web::get().to(video_poster)),
    );
}

pub async fn upload_video(
    mut payload: Multipart,
    library: web::Data<VideoLibrary>,
) -> Result<HttpResponse, Error> {
    let max_file_size = library.policy().max_file_size;
    let mut form = UploadForm::default();

    while let Some(mut field) = payload.try_next().await? {
        let (field_name, file_name) = match field.content_disposition() {
            Some(disposition) => (
                disposition.get_name().map(str::to_owned),
                disposition.get_filename().map(str::to_owned),
            ),
            None => (None, None),
        };
        let field_name = field_name.ok_or_else(|| ApiError::BadRequest("No field name".into()))?;

        if field_name == "video" {
            let content_type = field.content_type().map(|m| m.essence_str().to_owned());
            let mut data = Vec::new();
            while let Some(chunk) = field.try_next().await? {
                data.extend_from_slice(&chunk);
                if data.len() as u64 > max_file_size {
                    return Err(ApiError::from(StoreError::from(ValidationError::TooLarge {
                        size: data.len() as u64,
                        max: max_file_size,
                    }))
                    .into());
                }
            }

            form.video = Some(UploadedFile {
                file_name: file_name.unwrap_or_else(|| "upload".to_string()),
                content_type,
                data,
            });
            continue;
        }

        if !UploadForm::is_text_field(&field_name) {
            log::debug!("Ignoring unknown upload field {}", field_name);
            while field.try_next().await?.is_some() {}
            continue;
        }

        let mut raw = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            raw.extend_from_slice(&chunk);
            if raw.len() > MAX_TEXT_FIELD_SIZE {
                return Err(ApiError::BadRequest(format!(
                    "Field {} exceeds {} bytes",
                    field_name, MAX_TEXT_FIELD_SIZE
                ))
                .into());
            }
        }
        let value = String::from_utf8(raw)
            .map_err(|_| ApiError::BadRequest(format!("Field {} is not valid UTF-8", field_name)))?;

        form.set_text(&field_name, value);
    }

    let record = library.upload(form).await.map_err(ApiError::from)?;
    Ok(HttpResponse::Created().json(ResponseType::ok(record)))
}

pub async fn list_videos(library: web::Data<VideoLibrary>) -> Result<HttpResponse, Error> {
    let videos = library.catalog().await.map_err(ApiError::from)?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "videos": videos,
        "meta": { "total": videos.len() }
    })))
}

pub async fn video_stats(library: web::Data<VideoLibrary>) -> Result<HttpResponse, Error> {
    let stats = library.stats().await.map_err(ApiError::from)?;
    Ok(HttpResponse::Ok().json(ResponseType::ok(stats)))
}

pub async fn get_video(
    path: web::Path<String>,
    library: web::Data<VideoLibrary>,
) -> Result<HttpResponse, Error> {
    let video_id = path.into_inner();
    let record = library
        .get(&video_id)
        .await
        .map_err(ApiError::from)?
        .ok_or(ApiError::NotFound(video_id))?;
    Ok(HttpResponse::Ok().json(ResponseType::ok(record)))
}

pub async fn delete_video(
    path: web::Path<String>,
    library: web::Data<VideoLibrary>,
) -> Result<HttpResponse, Error> {
    library.delete(&path).await.map_err(ApiError::from)?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn video_poster(
    path: web::Path<String>,
    library: web::Data<VideoLibrary>,
) -> Result<HttpResponse, Error> {
    let video_id = path.into_inner();
    let record = library
        .get(&video_id)
        .await
        .map_err(ApiError::from)?
        .ok_or(ApiError::NotFound(video_id))?;
    Ok(HttpResponse::Ok()
        .content_type("image/svg+xml")
        .body(poster_svg(&record.title)))
}
