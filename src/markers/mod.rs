mod delete;
mod edit;
mod list;
mod new;
pub mod policy;

use axum::{routing::{get, post}, Router};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/markers", post(new::new_marker))
        // GET takes a room id, PUT and DELETE a marker id
        .route("/markers/{id}", get(list::room_markers).put(edit::edit_marker).delete(delete::delete_marker))
        .route("/markers/{id}/bbox", get(list::bbox_markers))
}
