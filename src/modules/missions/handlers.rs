use axum::{
    body::Bytes,
    extract::{Path, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::catalog::Module;
use crate::db::models::{Canvas, UserProgressRecord};
use crate::error::{AppError, AppResult};
use crate::evaluator::{Answers, FormIssue, FormValidation, FormValues, IssueCode, QuizOutcome};
use crate::i18n::I18n;
use crate::i18n_args;
use crate::middleware::Actor;
use crate::progression::UnlockOutcome;

#[derive(Debug, Deserialize)]
pub struct QuizSubmission {
    pub answers: Answers,
}

#[derive(Debug, Deserialize)]
pub struct FormSubmission {
    pub values: FormValues,
}

#[derive(Debug, Default, Deserialize)]
pub struct UnlockRequest {
    /// Extra canvas answers keyed by block.
    #[serde(default)]
    pub canvas: Canvas,
}

#[derive(Debug, Serialize)]
pub struct LocalizedIssue {
    pub field: String,
    pub code: IssueCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct FormFeedback {
    pub valid: bool,
    pub errors: Vec<LocalizedIssue>,
    pub warnings: Vec<LocalizedIssue>,
}

impl FormFeedback {
    fn localize(validation: FormValidation, module: &Module, i18n: &I18n) -> Self {
        let localize_all = |issues: Vec<FormIssue>| -> Vec<LocalizedIssue> {
            issues
                .into_iter()
                .map(|issue| localize_issue(issue, module, i18n))
                .collect()
        };
        Self {
            valid: validation.valid,
            errors: localize_all(validation.errors),
            warnings: localize_all(validation.warnings),
        }
    }
}

fn localize_issue(issue: FormIssue, module: &Module, i18n: &I18n) -> LocalizedIssue {
    let label = module
        .project_form
        .as_ref()
        .and_then(|form| form.field(&issue.field))
        .map(|field| field.label.clone())
        .unwrap_or_else(|| issue.field.clone());
    let args = i18n_args! {
        "label" => label,
        "detail" => issue.detail.clone().unwrap_or_default(),
    };

    LocalizedIssue {
        message: i18n.get_with_args(issue.code.message_key(), &args),
        field: issue.field,
        code: issue.code,
        detail: issue.detail,
    }
}

pub async fn complete_immersion(
    State(state): State<AppState>,
    actor: Actor,
    Path((user_id, module_id)): Path<(Uuid, String)>,
) -> AppResult<Json<UserProgressRecord>> {
    actor.ensure_can_act_for(user_id)?;
    let record = state.engine.complete_immersion(user_id, &module_id).await?;
    Ok(Json(record))
}

pub async fn submit_quiz(
    State(state): State<AppState>,
    actor: Actor,
    Path((user_id, module_id)): Path<(Uuid, String)>,
    Json(submission): Json<QuizSubmission>,
) -> AppResult<Json<QuizOutcome>> {
    actor.ensure_can_act_for(user_id)?;
    let outcome = state
        .engine
        .submit_quiz(user_id, &module_id, &submission.answers)
        .await?;
    Ok(Json(outcome))
}

pub async fn submit_form(
    State(state): State<AppState>,
    actor: Actor,
    i18n: I18n,
    Path((user_id, module_id)): Path<(Uuid, String)>,
    Json(submission): Json<FormSubmission>,
) -> AppResult<Json<FormFeedback>> {
    actor.ensure_can_act_for(user_id)?;
    let validation = state
        .engine
        .submit_form(user_id, &module_id, &submission.values)
        .await?;

    let module = state
        .engine
        .catalog()
        .module(&module_id)
        .ok_or_else(|| AppError::NotFound(format!("Module {}", module_id)))?;
    Ok(Json(FormFeedback::localize(validation, module, &i18n)))
}

pub async fn confirm_review(
    State(state): State<AppState>,
    actor: Actor,
    Path((user_id, module_id)): Path<(Uuid, String)>,
) -> AppResult<Json<UserProgressRecord>> {
    actor.ensure_staff()?;
    let record = state
        .engine
        .confirm_review(user_id, &module_id, actor.user_id)
        .await?;
    Ok(Json(record))
}

/// The body is optional; an empty one unlocks without extra canvas answers.
pub async fn unlock_module(
    State(state): State<AppState>,
    actor: Actor,
    Path((user_id, module_id)): Path<(Uuid, String)>,
    body: Bytes,
) -> AppResult<Json<UnlockOutcome>> {
    actor.ensure_can_act_for(user_id)?;
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        UnlockRequest::default()
    } else {
        serde_json::from_slice::<UnlockRequest>(&body)
            .map_err(|err| AppError::BadRequest(err.to_string()))?
    };

    let outcome = state
        .engine
        .unlock(user_id, &module_id, &request.canvas)
        .await?;
    Ok(Json(outcome))
}
