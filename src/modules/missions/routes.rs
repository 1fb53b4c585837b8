use axum::{routing::post, Router};

use super::handlers::{
    complete_immersion, confirm_review, submit_form, submit_quiz, unlock_module,
};
use crate::app_state::AppState;

pub fn mission_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users/{user_id}/modules/{module_id}/immersion",
            post(complete_immersion),
        )
        .route("/users/{user_id}/modules/{module_id}/quiz", post(submit_quiz))
        .route("/users/{user_id}/modules/{module_id}/form", post(submit_form))
        .route("/users/{user_id}/modules/{module_id}/review", post(confirm_review))
        .route("/users/{user_id}/modules/{module_id}/unlock", post(unlock_module))
}
