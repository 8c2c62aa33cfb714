use std::{net::SocketAddr, sync::Arc};

use axum::{debug_handler, extract::{ConnectInfo, State}, http::StatusCode, Json};
use sqlx::SqlitePool;

use crate::{db::{self, Room}, markers::policy, AppError, AppResult, AppState, Gate, Payload, RateLimiter};

#[debug_handler(state = AppState)]
pub(crate) async fn new_room(
    State(db_pool): State<SqlitePool>,
    State(limiter): State<Arc<RateLimiter>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Payload(room): Payload<Room>,
) -> AppResult<(StatusCode, Json<Room>)> {
    if room.id.trim().is_empty() {
        return Err(AppError::BadRequest("id must not be empty".to_owned()));
    }
    if room.title.trim().is_empty() {
        return Err(AppError::BadRequest("title must not be empty".to_owned()));
    }
    policy::check_room_fields(&room)?;
    limiter.check(Gate::CreateRoom, addr.ip()).await?;

    let room = db::rooms::create_room(&db_pool, &room).await?;
    tracing::info!(room_id = %room.id, expires_on = %room.expires_on, "room created");

    Ok((StatusCode::CREATED, Json(room)))
}
