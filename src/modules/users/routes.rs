use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    create_user, delete_user, get_canvas, get_user, list_active_modules, list_progress,
};
use crate::app_state::AppState;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/{user_id}", get(get_user).delete(delete_user))
        .route("/users/{user_id}/canvas", get(get_canvas))
        .route("/users/{user_id}/progress", get(list_progress))
        .route("/users/{user_id}/modules/active", get(list_active_modules))
}
