mod availability;
mod new;
mod room;

use axum::{routing::{get, post}, Router};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rooms", post(new::new_room))
        .route("/rooms/check-availability", get(availability::check_availability))
        .route("/rooms/{room_id}", get(room::room))
}
