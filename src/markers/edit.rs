use std::{net::SocketAddr, sync::Arc};

use axum::{debug_handler, extract::{ConnectInfo, Path, State}, Json};
use serde::Deserialize;
use serde_json::{Map, Value};
use sqlx::SqlitePool;

use crate::{db::{self, Marker}, ensure_finite, AppResult, AppState, Gate, Payload, RateLimiter};

use super::policy;

#[derive(Debug, Deserialize)]
pub(crate) struct EditMarker {
    lat: f64,
    lng: f64,
    data: Map<String, Value>,
    // accepted for clients that resend the whole marker; markers never change rooms
    #[allow(dead_code)]
    room_id: Option<String>,
}

#[debug_handler(state = AppState)]
pub(crate) async fn edit_marker(
    State(db_pool): State<SqlitePool>,
    State(limiter): State<Arc<RateLimiter>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(marker_id): Path<String>,
    Payload(EditMarker { lat, lng, data, .. }): Payload<EditMarker>,
) -> AppResult<Json<Marker>> {
    ensure_finite("lat", lat)?;
    ensure_finite("lng", lng)?;
    limiter.check(Gate::EditMarker, addr.ip()).await?;

    let existing = db::markers::get_marker(&db_pool, &marker_id).await?;
    let room = db::rooms::get_room(&db_pool, &existing.room_id).await?;
    policy::check_marker_data(&room, &data)?;

    let marker = db::markers::edit_marker(&db_pool, &marker_id, lat, lng, &data).await?;
    tracing::info!(marker_id = %marker.id, room_id = %marker.room_id, "marker edited");

    Ok(Json(marker))
}
