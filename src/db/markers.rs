use serde_json::{Map, Value};
use sqlx::{types::Json, SqlitePool};
use uuid::Uuid;

use super::{BBox, DbError, Marker};

const MARKER_NOT_FOUND: &str = "Marker not found";

pub async fn create_marker(
    db_pool: &SqlitePool,
    lat: f64,
    lng: f64,
    data: &Map<String, Value>,
    room_id: &str,
) -> Result<Marker, DbError> {
    let id = Uuid::now_v7();
    let marker = sqlx::query_as::<_, Marker>(
        "INSERT INTO markers (id,lat,lng,data,room_id) VALUES (?,?,?,?,?) RETURNING id,lat,lng,data,room_id",
    )
    .bind(id.to_string())
    .bind(lat)
    .bind(lng)
    .bind(Json(data))
    .bind(room_id)
    .fetch_one(db_pool)
    .await?;

    Ok(marker)
}

pub async fn get_marker(db_pool: &SqlitePool, id: &str) -> Result<Marker, DbError> {
    sqlx::query_as::<_, Marker>("SELECT id,lat,lng,data,room_id FROM markers WHERE id=?")
        .bind(id)
        .fetch_optional(db_pool)
        .await?
        .ok_or(DbError::NotFound(MARKER_NOT_FOUND))
}

/// Overwrites position and payload of an existing marker. Never inserts.
pub async fn edit_marker(
    db_pool: &SqlitePool,
    id: &str,
    lat: f64,
    lng: f64,
    data: &Map<String, Value>,
) -> Result<Marker, DbError> {
    sqlx::query_as::<_, Marker>(
        "UPDATE markers SET lat=?,lng=?,data=? WHERE id=? RETURNING id,lat,lng,data,room_id",
    )
    .bind(lat)
    .bind(lng)
    .bind(Json(data))
    .bind(id)
    .fetch_optional(db_pool)
    .await?
    .ok_or(DbError::NotFound(MARKER_NOT_FOUND))
}

pub async fn delete_marker(db_pool: &SqlitePool, id: &str) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM markers WHERE id=?")
        .bind(id)
        .execute(db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound(MARKER_NOT_FOUND));
    }

    Ok(())
}

pub async fn list_markers_by_room(db_pool: &SqlitePool, room_id: &str) -> Result<Vec<Marker>, DbError> {
    let markers = sqlx::query_as::<_, Marker>(
        "SELECT id,lat,lng,data,room_id FROM markers WHERE room_id=? ORDER BY rowid",
    )
    .bind(room_id)
    .fetch_all(db_pool)
    .await?;

    Ok(markers)
}

/// Markers of `room_id` inside `bbox`, edges included. An inverted box matches nothing.
pub async fn list_markers_in_bbox(
    db_pool: &SqlitePool,
    room_id: &str,
    bbox: BBox,
) -> Result<Vec<Marker>, DbError> {
    let markers = sqlx::query_as::<_, Marker>(
        "SELECT id,lat,lng,data,room_id FROM markers \
         WHERE room_id=? AND lat>=? AND lat<=? AND lng>=? AND lng<=? ORDER BY rowid",
    )
    .bind(room_id)
    .bind(bbox.min_lat)
    .bind(bbox.max_lat)
    .bind(bbox.min_lng)
    .bind(bbox.max_lng)
    .fetch_all(db_pool)
    .await?;

    Ok(markers)
}
