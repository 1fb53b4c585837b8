use axum::{
    extract::State,
    http::{HeaderName, HeaderValue, Method},
    middleware,
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};

use crate::{
    app_state::AppState,
    middleware::{language_middleware, observability_middleware},
    modules::{
        catalog::routes::catalog_routes, certification::routes::certification_routes,
        i18n::routes::create_i18n_routes, missions::routes::mission_routes,
        users::routes::user_routes,
    },
    websocket::websocket_routes,
};

pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(state.env.server.cors_allow_origin.as_deref());

    Router::new()
        .route("/health", get(health_check))
        .merge(catalog_routes())
        .merge(user_routes())
        .merge(mission_routes())
        .merge(certification_routes())
        .nest("/i18n", create_i18n_routes())
        .merge(websocket_routes())
        .layer(middleware::from_fn(language_middleware))
        .layer(middleware::from_fn(observability_middleware))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(allow_origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT_LANGUAGE,
            HeaderName::from_static("x-language"),
            HeaderName::from_static("x-user-id"),
            HeaderName::from_static("x-user-role"),
        ]);

    match allow_origin.and_then(|origin| HeaderValue::from_str(origin).ok()) {
        Some(origin) => layer.allow_origin(origin),
        None => layer.allow_origin(Any),
    }
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let store_status = match state.store.ping().await {
        Ok(()) => "healthy",
        Err(e) => {
            tracing::info!("Store health check failed: {}", e);
            "unhealthy"
        }
    };

    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "store": store_status,
            "catalog_modules": state.engine.catalog().modules().len(),
        }
    }))
}

