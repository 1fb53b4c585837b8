use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app_state::AppState;
use crate::db::models::{Canvas, NewUserAccount, UserAccount, UserProgressRecord};
use crate::error::{AppError, AppResult};
use crate::i18n::I18n;
use crate::i18n_args;
use crate::middleware::Actor;
use crate::modules::catalog::handlers::ModuleView;

#[derive(Debug, Serialize)]
pub struct CanvasResponse {
    pub user_id: Uuid,
    pub level: u32,
    pub canvas: Canvas,
}

pub async fn create_user(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<NewUserAccount>,
) -> AppResult<(StatusCode, Json<UserAccount>)> {
    actor.ensure_admin()?;
    payload.validate()?;

    let account = state.store.create_account(&payload).await?;
    info!(user_id = %account.id, role = ?account.role, "User account created");

    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn get_user(
    State(state): State<AppState>,
    actor: Actor,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<UserAccount>> {
    actor.ensure_can_act_for(user_id)?;
    Ok(Json(state.engine.get_account(user_id).await?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    actor: Actor,
    Path(user_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    actor.ensure_admin()?;
    state.store.delete_account(user_id).await?;
    info!(user_id = %user_id, "User account deleted");

    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_canvas(
    State(state): State<AppState>,
    actor: Actor,
    i18n: I18n,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<CanvasResponse>> {
    actor.ensure_can_act_for(user_id)?;
    let account = state.engine.get_account(user_id).await?;

    let required = state.env.progression.canvas_unlock_level;
    if account.level() < required {
        let args = i18n_args! { "level" => required };
        return Err(AppError::Authorization(i18n.get_with_args("canvas-locked", &args)));
    }

    Ok(Json(CanvasResponse {
        user_id,
        level: account.level(),
        canvas: account.canvas.0,
    }))
}

pub async fn list_progress(
    State(state): State<AppState>,
    actor: Actor,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Vec<UserProgressRecord>>> {
    actor.ensure_can_act_for(user_id)?;
    Ok(Json(state.engine.progress(user_id).await?))
}

pub async fn list_active_modules(
    State(state): State<AppState>,
    actor: Actor,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Vec<ModuleView>>> {
    actor.ensure_can_act_for(user_id)?;
    let modules = state.engine.active_modules(user_id).await?;
    Ok(Json(modules.into_iter().map(ModuleView::from).collect()))
}
