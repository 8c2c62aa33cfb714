use std::{net::SocketAddr, sync::Arc};

use axum::{debug_handler, extract::{ConnectInfo, Path, State}, Json};
use serde_json::{json, Value};
use sqlx::SqlitePool;

use crate::{db, AppResult, AppState, Gate, RateLimiter};

#[debug_handler(state = AppState)]
pub(crate) async fn delete_marker(
    State(db_pool): State<SqlitePool>,
    State(limiter): State<Arc<RateLimiter>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(marker_id): Path<String>,
) -> AppResult<Json<Value>> {
    limiter.check(Gate::DeleteMarker, addr.ip()).await?;

    db::markers::delete_marker(&db_pool, &marker_id).await?;
    tracing::info!(%marker_id, "marker deleted");

    Ok(Json(json!({ "status": "deleted" })))
}
