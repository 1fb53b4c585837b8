use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{get_eligibility, issue_certificate, list_certificates};
use crate::app_state::AppState;

pub fn certification_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users/{user_id}/modules/{module_id}/certification",
            get(get_eligibility),
        )
        .route(
            "/users/{user_id}/modules/{module_id}/certificate",
            post(issue_certificate),
        )
        .route("/users/{user_id}/certificates", get(list_certificates))
}
