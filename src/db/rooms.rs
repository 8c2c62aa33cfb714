use sqlx::{types::Json, SqlitePool};

use super::{DbError, Room};

const ROOM_COLUMNS: &str = "id,title,default_location,zoom,extra_fields_allowed,predefined_fields,mandatory_fields,expires_on";

/// Persists `room` under its client-chosen id.
///
/// Returns [`DbError::Conflict`] when the id is already taken.
pub async fn create_room(db_pool: &SqlitePool, room: &Room) -> Result<Room, DbError> {
    let result = sqlx::query_as::<_, Room>(&format!(
        "INSERT INTO rooms ({ROOM_COLUMNS}) VALUES (?,?,?,?,?,?,?,?) RETURNING {ROOM_COLUMNS}"
    ))
    .bind(&room.id)
    .bind(&room.title)
    .bind(&room.default_location)
    .bind(room.zoom)
    .bind(room.extra_fields_allowed)
    .bind(Json(&room.predefined_fields))
    .bind(Json(&room.mandatory_fields))
    .bind(room.expires_on)
    .fetch_one(db_pool)
    .await;

    match result {
        Ok(room) => Ok(room),
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
            Err(DbError::Conflict(format!("room id {} is already taken", room.id)))
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn get_room(db_pool: &SqlitePool, id: &str) -> Result<Room, DbError> {
    sqlx::query_as::<_, Room>(&format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id=?"))
        .bind(id)
        .fetch_optional(db_pool)
        .await?
        .ok_or(DbError::NotFound("Room not found"))
}

pub async fn room_id_exists(db_pool: &SqlitePool, id: &str) -> Result<bool, DbError> {
    let found = sqlx::query_as::<_, (i64,)>("SELECT 1 FROM rooms WHERE id=?")
        .bind(id)
        .fetch_optional(db_pool)
        .await?;
    Ok(found.is_some())
}
