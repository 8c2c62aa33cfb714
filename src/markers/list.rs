use axum::{debug_handler, extract::{Path, State}, Json};
use sqlx::SqlitePool;

use crate::{db::{self, BBox, Marker}, ensure_finite, AppResult, Params};

#[debug_handler]
pub(crate) async fn room_markers(
    State(db_pool): State<SqlitePool>,
    Path(room_id): Path<String>,
) -> AppResult<Json<Vec<Marker>>> {
    let markers = db::markers::list_markers_by_room(&db_pool, &room_id).await?;
    tracing::debug!(%room_id, count = markers.len(), "listed markers");
    Ok(Json(markers))
}

#[debug_handler]
pub(crate) async fn bbox_markers(
    State(db_pool): State<SqlitePool>,
    Path(room_id): Path<String>,
    Params(bbox): Params<BBox>,
) -> AppResult<Json<Vec<Marker>>> {
    ensure_finite("min_lat", bbox.min_lat)?;
    ensure_finite("min_lng", bbox.min_lng)?;
    ensure_finite("max_lat", bbox.max_lat)?;
    ensure_finite("max_lng", bbox.max_lng)?;

    let markers = db::markers::list_markers_in_bbox(&db_pool, &room_id, bbox).await?;
    tracing::debug!(%room_id, ?bbox, count = markers.len(), "listed markers in bbox");
    Ok(Json(markers))
}
