use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::{Json, Uuid};
use std::collections::BTreeMap;
use time::OffsetDateTime;

use super::Canvas;

pub type StoredFormValues = BTreeMap<String, Value>;

/// Progress of one user on one module.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct UserProgressRecord {
    pub user_id: Uuid,
    pub module_id: String,
    pub immersion_done: bool,
    /// Best quiz percentage so far.
    pub quiz_score: i32,
    pub quiz_passed: bool,
    pub quiz_attempts: i32,
    pub form_values: Json<StoredFormValues>,
    pub form_valid: bool,
    /// Confirmation by a coach or admin, distinct from automatic validation.
    pub form_reviewed: bool,
    pub reviewed_by: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl UserProgressRecord {
    pub fn new(user_id: Uuid, module_id: &str, now: OffsetDateTime) -> Self {
        Self {
            user_id,
            module_id: module_id.to_string(),
            immersion_done: false,
            quiz_score: 0,
            quiz_passed: false,
            quiz_attempts: 0,
            form_values: Json(StoredFormValues::new()),
            form_valid: false,
            form_reviewed: false,
            reviewed_by: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Merge a patch into the record, following the store's merge contract.
    pub fn apply(&mut self, patch: &ProgressPatch, now: OffsetDateTime) {
        if let Some(done) = patch.immersion_done {
            self.immersion_done = done;
        }
        if let Some(score) = patch.quiz_score {
            self.quiz_score = self.quiz_score.max(score);
        }
        if let Some(passed) = patch.quiz_passed {
            self.quiz_passed |= passed;
        }
        if patch.quiz_attempt {
            self.quiz_attempts += 1;
        }
        if let Some(values) = &patch.form_values {
            self.form_values = Json(values.clone());
        }
        if let Some(valid) = patch.form_valid {
            self.form_valid = valid;
        }
        if let Some(reviewed) = patch.form_reviewed {
            self.form_reviewed = reviewed;
            self.reviewed_by = patch.reviewed_by;
        }
        self.updated_at = now;
    }
}

/// Partial update of a progress record, keyed by (user, module).
///
/// `None` keeps the stored value. `quiz_score` keeps the best score seen,
/// `quiz_passed` is sticky once true, `quiz_attempt` increments the counter,
/// and `reviewed_by` is only written together with `form_reviewed`.
#[derive(Debug, Clone, Default)]
pub struct ProgressPatch {
    pub user_id: Uuid,
    pub module_id: String,
    pub immersion_done: Option<bool>,
    pub quiz_score: Option<i32>,
    pub quiz_passed: Option<bool>,
    pub quiz_attempt: bool,
    pub form_values: Option<StoredFormValues>,
    pub form_valid: Option<bool>,
    pub form_reviewed: Option<bool>,
    pub reviewed_by: Option<Uuid>,
}

impl ProgressPatch {
    pub fn new(user_id: Uuid, module_id: &str) -> Self {
        Self {
            user_id,
            module_id: module_id.to_string(),
            ..Default::default()
        }
    }
}

/// Everything a successful unlock writes, applied as one transaction.
#[derive(Debug, Clone)]
pub struct UnlockCommit {
    pub user_id: Uuid,
    pub module_id: String,
    pub expected_version: i64,
    pub level: i32,
    pub xp_delta: i64,
    /// Merged into the stored canvas; absent blocks are left untouched.
    pub canvas: Canvas,
}
