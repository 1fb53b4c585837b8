use axum::{routing::get, Router};

use super::handlers::{get_module, list_track_modules, list_tracks};
use crate::app_state::AppState;

pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/tracks", get(list_tracks))
        .route("/tracks/{track_id}/modules", get(list_track_modules))
        .route("/modules/{module_id}", get(get_module))
}
