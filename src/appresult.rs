use std::time::Duration;

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::db::DbError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(&'static str),
    Conflict(String),
    RateLimited { retry_after: Duration },
    Internal(anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            AppError::BadRequest(detail) | AppError::Conflict(detail) => {
                (status, Json(json!({ "detail": detail }))).into_response()
            }
            AppError::NotFound(detail) => {
                (status, Json(json!({ "detail": detail }))).into_response()
            }
            AppError::RateLimited { retry_after } => {
                // round up so clients never retry inside the window
                let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
                (
                    status,
                    [(header::RETRY_AFTER, secs.to_string())],
                    Json(json!({ "detail": "Too Many Requests" })),
                )
                    .into_response()
            }
            AppError::Internal(err) => {
                tracing::error!(error = ?err, "request failed");
                (status, Json(json!({ "detail": "Internal Server Error" }))).into_response()
            }
        }
    }
}

impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(what) => AppError::NotFound(what),
            DbError::Conflict(msg) => AppError::Conflict(msg),
            other => AppError::Internal(anyhow::Error::from(other)),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

macro_rules! rejection_impl {
    ($E:ty) => {
        impl From<$E> for AppError {
            fn from(rejection: $E) -> Self {
                Self::BadRequest(rejection.body_text())
            }
        }
    };
}

rejection_impl!(JsonRejection);
rejection_impl!(QueryRejection);
