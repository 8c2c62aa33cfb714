use axum::{debug_handler, extract::{Path, State}, Json};
use sqlx::SqlitePool;

use crate::{db::{self, Room}, AppResult};

#[debug_handler]
pub(crate) async fn room(
    State(db_pool): State<SqlitePool>,
    Path(room_id): Path<String>,
) -> AppResult<Json<Room>> {
    Ok(Json(db::rooms::get_room(&db_pool, &room_id).await?))
}
