use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::models::CertificateRecord;
use crate::error::AppResult;
use crate::middleware::Actor;
use crate::progression::EligibilityReport;

pub async fn get_eligibility(
    State(state): State<AppState>,
    actor: Actor,
    Path((user_id, module_id)): Path<(Uuid, String)>,
) -> AppResult<Json<EligibilityReport>> {
    actor.ensure_can_act_for(user_id)?;
    Ok(Json(state.engine.eligibility(user_id, &module_id).await?))
}

pub async fn issue_certificate(
    State(state): State<AppState>,
    actor: Actor,
    Path((user_id, module_id)): Path<(Uuid, String)>,
) -> AppResult<(StatusCode, Json<CertificateRecord>)> {
    actor.ensure_can_act_for(user_id)?;
    let certificate = state.engine.certify(user_id, &module_id).await?;
    Ok((StatusCode::CREATED, Json(certificate)))
}

pub async fn list_certificates(
    State(state): State<AppState>,
    actor: Actor,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Vec<CertificateRecord>>> {
    actor.ensure_can_act_for(user_id)?;
    Ok(Json(state.engine.certificates(user_id).await?))
}
