pub mod appresult;
pub mod config;
pub mod db;
pub mod limiter;
pub mod markers;
pub mod rooms;

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequest, FromRequestParts},
    Router,
};
use sqlx::SqlitePool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use appresult::{AppError, AppResult};
pub use config::Config;
pub use limiter::{Gate, RateLimiter, StoreKind};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub limiter: Arc<RateLimiter>,
}

/// JSON body whose rejections answer 400 instead of axum's 422.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Payload<T>(pub T);

/// Query string whose rejections answer with the crate's error body.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct Params<T>(pub T);

pub fn app(app_state: AppState) -> Router {
    Router::new()
        .merge(markers::router())
        .merge(rooms::router())
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub(crate) fn ensure_finite(field: &str, value: f64) -> AppResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("{field} must be a finite number")))
    }
}
