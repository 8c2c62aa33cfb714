use axum::{debug_handler, extract::State, Json};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::{db, AppResult, Params};

#[derive(Deserialize)]
pub(crate) struct AvailabilityQuery {
    id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct Availability {
    available: bool,
}

#[debug_handler]
pub(crate) async fn check_availability(
    State(db_pool): State<SqlitePool>,
    Params(AvailabilityQuery { id }): Params<AvailabilityQuery>,
) -> AppResult<Json<Availability>> {
    let available = !db::rooms::room_id_exists(&db_pool, &id).await?;
    tracing::debug!(room_id = %id, available, "room id probed");
    Ok(Json(Availability { available }))
}
