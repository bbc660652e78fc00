use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::error::{PlaybackError, StoreError};

#[derive(Debug, Serialize)]
pub struct APIError {
    pub cause: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ResponseType<T = String> {
    pub data: Option<T>,
    pub error: Option<APIError>,
}

impl<T: Serialize> ResponseType<T> {
    pub fn ok(data: T) -> Self {
        ResponseType {
            data: Some(data),
            error: None,
        }
    }
}

/// Errors surfaced by the HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),

    #[error("video {0} not found")]
    NotFound(String),

    #[error("playback handle {0} not found or already released")]
    HandleNotFound(Uuid),

    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    fn cause(&self) -> &'static str {
        match self {
            ApiError::Store(StoreError::Validation(_)) => "validation_failure",
            ApiError::Store(_) => "store_unavailable",
            ApiError::Playback(PlaybackError::StoreUnavailable { .. }) => "store_unavailable",
            ApiError::Playback(PlaybackError::NoSession(_)) => "no_session",
            ApiError::Playback(PlaybackError::InvalidTransition { .. }) => "invalid_transition",
            ApiError::NotFound(_) => "not_found",
            ApiError::HandleNotFound(_) => "handle_not_found",
            ApiError::BadRequest(_) => "bad_request",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Store(StoreError::Validation(_)) | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Store(_) | ApiError::Playback(PlaybackError::StoreUnavailable { .. }) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Playback(PlaybackError::NoSession(_))
            | ApiError::NotFound(_)
            | ApiError::HandleNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Playback(PlaybackError::InvalidTransition { .. }) => StatusCode::CONFLICT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ResponseType::<String> {
            data: None,
            error: Some(APIError {
                cause: self.cause().to_string(),
                message: self.to_string(),
            }),
        })
    }
}
