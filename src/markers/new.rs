use std::{net::SocketAddr, sync::Arc};

use axum::{debug_handler, extract::{ConnectInfo, State}, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{Map, Value};
use sqlx::SqlitePool;

use crate::{db::{self, Marker}, ensure_finite, AppResult, AppState, Gate, Payload, RateLimiter};

use super::policy;

#[derive(Debug, Deserialize)]
pub(crate) struct NewMarker {
    lat: f64,
    lng: f64,
    data: Map<String, Value>,
    room_id: String,
}

#[debug_handler(state = AppState)]
pub(crate) async fn new_marker(
    State(db_pool): State<SqlitePool>,
    State(limiter): State<Arc<RateLimiter>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Payload(NewMarker { lat, lng, data, room_id }): Payload<NewMarker>,
) -> AppResult<(StatusCode, Json<Marker>)> {
    ensure_finite("lat", lat)?;
    ensure_finite("lng", lng)?;
    limiter.check(Gate::CreateMarker, addr.ip()).await?;

    let room = db::rooms::get_room(&db_pool, &room_id).await?;
    policy::check_marker_data(&room, &data)?;

    let marker = db::markers::create_marker(&db_pool, lat, lng, &data, &room_id).await?;
    tracing::info!(marker_id = %marker.id, room_id = %marker.room_id, "marker created");

    Ok((StatusCode::CREATED, Json(marker)))
}
