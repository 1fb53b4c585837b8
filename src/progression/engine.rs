use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{ProgressEvent, ProgressionError, ProgressionPolicy};
use crate::catalog::{is_canvas_block, Module, ModuleCatalog};
use crate::db::models::{
    Canvas, ProgressPatch, StoredFormValues, UnlockCommit, UserAccount, UserProgressRecord,
};
use crate::db::{DatabaseError, ProgressStore};
use crate::evaluator::{self, Answers, FormValidation, FormValues, QuizOutcome};

const EVENT_BUFFER: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlockBlocker {
    ImmersionPending,
    QuizNotPassed,
    FormNotValid,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UnlockOutcome {
    Advanced {
        account: UserAccount,
        xp_awarded: u32,
    },
    AlreadyUnlocked {
        account: UserAccount,
    },
    /// Preconditions failed; nothing was written.
    Blocked { blockers: Vec<UnlockBlocker> },
}

/// Owns every mutation of accounts and progress records.
pub struct ProgressionEngine {
    pub(super) store: Arc<dyn ProgressStore>,
    catalog: Arc<ModuleCatalog>,
    pub(super) policy: ProgressionPolicy,
    pub(super) events: broadcast::Sender<ProgressEvent>,
}

impl ProgressionEngine {
    pub fn new(
        store: Arc<dyn ProgressStore>,
        catalog: Arc<ModuleCatalog>,
        policy: ProgressionPolicy,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            store,
            catalog,
            policy,
            events,
        }
    }

    pub fn catalog(&self) -> &ModuleCatalog {
        &self.catalog
    }

    pub fn store(&self) -> Arc<dyn ProgressStore> {
        self.store.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.events.subscribe()
    }

    pub(super) fn module(&self, module_id: &str) -> Result<&Module, ProgressionError> {
        self.catalog
            .module(module_id)
            .ok_or_else(|| ProgressionError::UnknownModule(module_id.to_string()))
    }

    pub(super) async fn account(&self, user_id: Uuid) -> Result<UserAccount, ProgressionError> {
        self.store
            .get_account(user_id)
            .await?
            .ok_or(ProgressionError::UnknownUser(user_id))
    }

    /// Quiz and form steps need the record created by the immersion step.
    async fn started_record(
        &self,
        user_id: Uuid,
        module_id: &str,
    ) -> Result<UserProgressRecord, ProgressionError> {
        match self.store.get_progress(user_id, module_id).await? {
            Some(record) if record.immersion_done => Ok(record),
            Some(_) => Err(ProgressionError::ImmersionRequired(module_id.to_string())),
            None => {
                self.account(user_id).await?;
                Err(ProgressionError::ImmersionRequired(module_id.to_string()))
            }
        }
    }

    pub async fn get_account(&self, user_id: Uuid) -> Result<UserAccount, ProgressionError> {
        self.account(user_id).await
    }

    pub async fn progress(&self, user_id: Uuid) -> Result<Vec<UserProgressRecord>, ProgressionError> {
        self.account(user_id).await?;
        Ok(self.store.list_progress(user_id).await?)
    }

    pub async fn active_modules(&self, user_id: Uuid) -> Result<Vec<&Module>, ProgressionError> {
        let account = self.account(user_id).await?;
        Ok(self.catalog.active_modules(account.level()))
    }

    #[instrument(skip(self))]
    pub async fn complete_immersion(
        &self,
        user_id: Uuid,
        module_id: &str,
    ) -> Result<UserProgressRecord, ProgressionError> {
        let module = self.module(module_id)?;
        let account = self.account(user_id).await?;

        let existing = self.store.get_progress(user_id, module_id).await?;
        let revisit = existing.as_ref().is_some_and(|record| record.is_completed());
        if !revisit && !self.catalog.is_reachable(module, account.level()) {
            return Err(ProgressionError::ModuleLocked {
                module: module.id.clone(),
                level: account.level(),
            });
        }

        let mut patch = ProgressPatch::new(user_id, module_id);
        patch.immersion_done = Some(true);
        let record = self.store.upsert_progress(&patch).await?;

        debug!("Immersion completed");
        Ok(record)
    }

    #[instrument(skip(self, answers))]
    pub async fn submit_quiz(
        &self,
        user_id: Uuid,
        module_id: &str,
        answers: &Answers,
    ) -> Result<QuizOutcome, ProgressionError> {
        let module = self.module(module_id)?;
        self.started_record(user_id, module_id).await?;

        let outcome = evaluator::evaluate(module, answers);

        let mut patch = ProgressPatch::new(user_id, module_id);
        patch.quiz_score = Some(i32::from(outcome.percentage));
        patch.quiz_passed = Some(outcome.passed);
        patch.quiz_attempt = true;
        self.store.upsert_progress(&patch).await?;

        info!(
            percentage = outcome.percentage,
            passed = outcome.passed,
            "Quiz evaluated"
        );
        Ok(outcome)
    }

    #[instrument(skip(self, values))]
    pub async fn submit_form(
        &self,
        user_id: Uuid,
        module_id: &str,
        values: &FormValues,
    ) -> Result<FormValidation, ProgressionError> {
        let module = self.module(module_id)?;
        let record = self.started_record(user_id, module_id).await?;

        let validation = evaluator::validate_module(module, values);
        let stored: StoredFormValues = values
            .iter()
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect();

        let mut patch = ProgressPatch::new(user_id, module_id);
        if record.form_values.0 != stored {
            // A reviewer confirmed the previous answers, not these ones.
            patch.form_reviewed = Some(false);
            patch.reviewed_by = None;
        }
        patch.form_values = Some(stored);
        patch.form_valid = Some(validation.valid);
        self.store.upsert_progress(&patch).await?;

        info!(
            valid = validation.valid,
            errors = validation.errors.len(),
            warnings = validation.warnings.len(),
            "Project form validated"
        );
        Ok(validation)
    }

    #[instrument(skip(self))]
    pub async fn confirm_review(
        &self,
        user_id: Uuid,
        module_id: &str,
        reviewer_id: Uuid,
    ) -> Result<UserProgressRecord, ProgressionError> {
        self.module(module_id)?;
        let record = self.started_record(user_id, module_id).await?;
        if !record.form_valid {
            return Err(ProgressionError::FormNotValid(module_id.to_string()));
        }

        let mut patch = ProgressPatch::new(user_id, module_id);
        patch.form_reviewed = Some(true);
        patch.reviewed_by = Some(reviewer_id);
        let record = self.store.upsert_progress(&patch).await?;

        info!("Project form confirmed by reviewer");
        Ok(record)
    }

    /// Advance the user past `module_id` at most once.
    ///
    /// `canvas_answers` are merged over the blocks mapped from the form.
    #[instrument(skip(self, canvas_answers))]
    pub async fn unlock(
        &self,
        user_id: Uuid,
        module_id: &str,
        canvas_answers: &Canvas,
    ) -> Result<UnlockOutcome, ProgressionError> {
        let module = self.module(module_id)?;
        if let Some(block) = canvas_answers.keys().find(|block| !is_canvas_block(block)) {
            return Err(ProgressionError::UnknownCanvasBlock(block.clone()));
        }

        for attempt in 0..=self.policy.commit_retries {
            let account = self.account(user_id).await?;
            let record = self.store.get_progress(user_id, module_id).await?;

            if record.as_ref().is_some_and(|record| record.is_completed()) {
                return Ok(UnlockOutcome::AlreadyUnlocked { account });
            }
            // An unlock only ever moves the level off the module's own gate.
            if account.level() != module.required_level
                || !self.catalog.is_reachable(module, account.level())
            {
                return Err(ProgressionError::ModuleLocked {
                    module: module.id.clone(),
                    level: account.level(),
                });
            }

            let blockers = unlock_blockers(module, record.as_ref());
            let Some(record) = record.filter(|_| blockers.is_empty()) else {
                debug!(?blockers, "Unlock blocked");
                return Ok(UnlockOutcome::Blocked { blockers });
            };

            let xp = self.policy.xp_policy.reward(module);
            let mut canvas = mapped_canvas(module, &record);
            canvas.extend(canvas_answers.iter().map(|(k, v)| (k.clone(), v.clone())));

            let commit = UnlockCommit {
                user_id,
                module_id: module.id.clone(),
                expected_version: account.version,
                level: account.level + 1,
                xp_delta: i64::from(xp),
                canvas,
            };

            match self.store.commit_unlock(&commit).await {
                Ok(updated) => {
                    info!(level = updated.level, xp = updated.xp, "Module unlocked");
                    let _ = self.events.send(ProgressEvent::LevelUp {
                        user_id,
                        module_id: module.id.clone(),
                        level: updated.level(),
                        xp: updated.xp,
                    });
                    return Ok(UnlockOutcome::Advanced {
                        account: updated,
                        xp_awarded: xp,
                    });
                }
                Err(DatabaseError::AlreadyCompleted) => {
                    let account = self.account(user_id).await?;
                    return Ok(UnlockOutcome::AlreadyUnlocked { account });
                }
                Err(DatabaseError::VersionConflict) => {
                    warn!(attempt, "Account changed during unlock, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(ProgressionError::CommitConflict)
    }
}

fn unlock_blockers(module: &Module, record: Option<&UserProgressRecord>) -> Vec<UnlockBlocker> {
    let Some(record) = record else {
        return vec![UnlockBlocker::ImmersionPending];
    };

    let mut blockers = Vec::new();
    if !record.immersion_done {
        blockers.push(UnlockBlocker::ImmersionPending);
    }
    if !record.quiz_passed {
        blockers.push(UnlockBlocker::QuizNotPassed);
    }
    if module.project_form.is_some() && !record.form_valid {
        blockers.push(UnlockBlocker::FormNotValid);
    }
    blockers
}

/// Canvas blocks fed by the module's form answers.
fn mapped_canvas(module: &Module, record: &UserProgressRecord) -> Canvas {
    let mut canvas = BTreeMap::new();
    for mapping in &module.canvas_mapping {
        let text = match record.form_values.get(&mapping.field) {
            Some(serde_json::Value::String(text)) => text.trim().to_string(),
            Some(serde_json::Value::Number(number)) => number.to_string(),
            _ => continue,
        };
        if !text.is_empty() {
            canvas.insert(mapping.block.clone(), text);
        }
    }
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{CertificateRecord, NewUserAccount, UserRole};
    use crate::db::MemoryProgressStore;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Memory store whose first `conflicts` unlock commits lose the version race.
    struct RacingStore {
        inner: MemoryProgressStore,
        conflicts: AtomicUsize,
        commits: AtomicUsize,
    }

    impl RacingStore {
        fn new(conflicts: usize) -> Self {
            Self {
                inner: MemoryProgressStore::new(),
                conflicts: AtomicUsize::new(conflicts),
                commits: AtomicUsize::new(0),
            }
        }

        fn commits(&self) -> usize {
            self.commits.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProgressStore for RacingStore {
        async fn ping(&self) -> Result<(), DatabaseError> {
            self.inner.ping().await
        }

        async fn create_account(&self, new_account: &NewUserAccount) -> Result<UserAccount, DatabaseError> {
            self.inner.create_account(new_account).await
        }

        async fn get_account(&self, user_id: Uuid) -> Result<Option<UserAccount>, DatabaseError> {
            self.inner.get_account(user_id).await
        }

        async fn delete_account(&self, user_id: Uuid) -> Result<(), DatabaseError> {
            self.inner.delete_account(user_id).await
        }

        async fn get_progress(
            &self,
            user_id: Uuid,
            module_id: &str,
        ) -> Result<Option<UserProgressRecord>, DatabaseError> {
            self.inner.get_progress(user_id, module_id).await
        }

        async fn list_progress(&self, user_id: Uuid) -> Result<Vec<UserProgressRecord>, DatabaseError> {
            self.inner.list_progress(user_id).await
        }

        async fn upsert_progress(&self, patch: &ProgressPatch) -> Result<UserProgressRecord, DatabaseError> {
            self.inner.upsert_progress(patch).await
        }

        async fn commit_unlock(&self, commit: &UnlockCommit) -> Result<UserAccount, DatabaseError> {
            self.commits.fetch_add(1, Ordering::SeqCst);
            let lost_race = self
                .conflicts
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
                .is_ok();
            if lost_race {
                return Err(DatabaseError::VersionConflict);
            }
            self.inner.commit_unlock(commit).await
        }

        async fn insert_certificate(&self, certificate: &CertificateRecord) -> Result<(), DatabaseError> {
            self.inner.insert_certificate(certificate).await
        }

        async fn list_certificates(&self, user_id: Uuid) -> Result<Vec<CertificateRecord>, DatabaseError> {
            self.inner.list_certificates(user_id).await
        }
    }

    struct Fixture {
        engine: ProgressionEngine,
        user: Uuid,
    }

    async fn fixture(level: i32) -> Fixture {
        fixture_on(Arc::new(MemoryProgressStore::new()), level).await
    }

    async fn fixture_on(store: Arc<dyn ProgressStore>, level: i32) -> Fixture {
        let account = store
            .create_account(&NewUserAccount {
                email: "awa@example.org".into(),
                display_name: "Awa Diallo".into(),
                role: UserRole::Incubee,
                coach_id: None,
                level,
                xp: 0,
            })
            .await
            .unwrap();
        let catalog = Arc::new(ModuleCatalog::builtin().unwrap());
        Fixture {
            engine: ProgressionEngine::new(store, catalog, ProgressionPolicy::default()),
            user: account.id,
        }
    }

    fn passing_answers() -> Answers {
        [
            ("q1", json!(1)),
            ("q2", json!("false")),
            ("q3", json!("c'est urgent")),
            ("q4", json!("des entretiens")),
        ]
        .into_iter()
        .map(|(id, value)| (id.to_string(), value))
        .collect()
    }

    fn valid_form() -> FormValues {
        [
            (
                "description_probleme",
                json!("Les artisans perdent plusieurs heures par semaine à relancer leurs factures."),
            ),
            ("frequence", json!("hebdomadaire")),
            ("cible_concernee", json!("Artisans du bâtiment en Bretagne")),
            ("nombre_entretiens", json!(8)),
        ]
        .into_iter()
        .map(|(id, value)| (id.to_string(), value))
        .collect()
    }

    async fn complete_steps(fixture: &Fixture) {
        let engine = &fixture.engine;
        engine.complete_immersion(fixture.user, "probleme").await.unwrap();
        assert!(engine
            .submit_quiz(fixture.user, "probleme", &passing_answers())
            .await
            .unwrap()
            .passed);
        assert!(engine
            .submit_form(fixture.user, "probleme", &valid_form())
            .await
            .unwrap()
            .valid);
    }

    #[tokio::test]
    async fn unlock_advances_level_and_xp_once() {
        let fixture = fixture(0).await;
        complete_steps(&fixture).await;

        let outcome = fixture
            .engine
            .unlock(fixture.user, "probleme", &Canvas::new())
            .await
            .unwrap();
        let UnlockOutcome::Advanced {
            account,
            xp_awarded,
        } = outcome
        else {
            panic!("expected advance, got {outcome:?}");
        };
        assert_eq!(account.level, 1);
        assert_eq!(account.xp, 500);
        assert_eq!(xp_awarded, 500);
        assert_eq!(
            account.canvas.get("customer_segments").map(String::as_str),
            Some("Artisans du bâtiment en Bretagne")
        );

        let again = fixture
            .engine
            .unlock(fixture.user, "probleme", &Canvas::new())
            .await
            .unwrap();
        let UnlockOutcome::AlreadyUnlocked { account } = again else {
            panic!("expected already unlocked, got {again:?}");
        };
        assert_eq!(account.level, 1);
        assert_eq!(account.xp, 500);
    }

    #[tokio::test]
    async fn concurrent_unlocks_advance_only_once() {
        let fixture = fixture(0).await;
        complete_steps(&fixture).await;

        let empty = Canvas::new();
        let (first, second) = tokio::join!(
            fixture.engine.unlock(fixture.user, "probleme", &empty),
            fixture.engine.unlock(fixture.user, "probleme", &empty),
        );
        let advanced = [first.unwrap(), second.unwrap()]
            .into_iter()
            .filter(|outcome| matches!(outcome, UnlockOutcome::Advanced { .. }))
            .count();
        assert_eq!(advanced, 1);

        let account = fixture.engine.get_account(fixture.user).await.unwrap();
        assert_eq!(account.level, 1);
        assert_eq!(account.xp, 500);
    }

    #[tokio::test]
    async fn version_conflict_is_retried_and_advances_once() {
        let store = Arc::new(RacingStore::new(1));
        let fixture = fixture_on(store.clone(), 0).await;
        complete_steps(&fixture).await;

        let outcome = fixture
            .engine
            .unlock(fixture.user, "probleme", &Canvas::new())
            .await
            .unwrap();
        let UnlockOutcome::Advanced {
            account,
            xp_awarded,
        } = outcome
        else {
            panic!("expected advance, got {outcome:?}");
        };
        assert_eq!(account.level, 1);
        assert_eq!(account.xp, 500);
        assert_eq!(xp_awarded, 500);
        assert_eq!(store.commits(), 2);

        let account = fixture.engine.get_account(fixture.user).await.unwrap();
        assert_eq!(account.level, 1);
        assert_eq!(account.xp, 500);
    }

    #[tokio::test]
    async fn persistent_conflicts_give_up_without_advancing() {
        let store = Arc::new(RacingStore::new(usize::MAX));
        let fixture = fixture_on(store.clone(), 0).await;
        complete_steps(&fixture).await;

        let err = fixture
            .engine
            .unlock(fixture.user, "probleme", &Canvas::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ProgressionError::CommitConflict));
        let retries = usize::from(ProgressionPolicy::default().commit_retries);
        assert_eq!(store.commits(), retries + 1);

        let account = fixture.engine.get_account(fixture.user).await.unwrap();
        assert_eq!(account.level, 0);
        assert_eq!(account.xp, 0);
        assert!(account.canvas.is_empty());
        let record = store.get_progress(fixture.user, "probleme").await.unwrap().unwrap();
        assert!(!record.is_completed());
    }

    #[tokio::test]
    async fn track_tail_cannot_be_unlocked_from_a_higher_level() {
        let fixture = fixture(3).await;

        let err = fixture
            .engine
            .complete_immersion(fixture.user, "modele-economique")
            .await
            .unwrap_err();
        assert!(matches!(err, ProgressionError::ModuleLocked { level: 3, .. }));

        // Steps recorded earlier do not reopen the module.
        let mut patch = ProgressPatch::new(fixture.user, "modele-economique");
        patch.immersion_done = Some(true);
        patch.quiz_score = Some(100);
        patch.quiz_passed = Some(true);
        patch.form_valid = Some(true);
        fixture.engine.store().upsert_progress(&patch).await.unwrap();

        let err = fixture
            .engine
            .unlock(fixture.user, "modele-economique", &Canvas::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ProgressionError::ModuleLocked { level: 3, .. }));

        let account = fixture.engine.get_account(fixture.user).await.unwrap();
        assert_eq!(account.level, 3);
        assert_eq!(account.xp, 0);
    }

    #[tokio::test]
    async fn failed_quiz_blocks_without_state_change() {
        let fixture = fixture(0).await;
        let engine = &fixture.engine;
        engine.complete_immersion(fixture.user, "probleme").await.unwrap();

        let outcome = engine
            .submit_quiz(fixture.user, "probleme", &Answers::new())
            .await
            .unwrap();
        assert!(!outcome.passed);

        let unlock = engine
            .unlock(fixture.user, "probleme", &Canvas::new())
            .await
            .unwrap();
        let UnlockOutcome::Blocked { blockers } = unlock else {
            panic!("expected blocked, got {unlock:?}");
        };
        assert_eq!(
            blockers,
            vec![UnlockBlocker::QuizNotPassed, UnlockBlocker::FormNotValid]
        );

        let account = engine.get_account(fixture.user).await.unwrap();
        assert_eq!((account.level, account.xp, account.version), (0, 0, 0));

        // Retakes are not capped.
        for _ in 0..5 {
            engine
                .submit_quiz(fixture.user, "probleme", &Answers::new())
                .await
                .unwrap();
        }
        let records = engine.progress(fixture.user).await.unwrap();
        assert_eq!(records[0].quiz_attempts, 6);
    }

    #[tokio::test]
    async fn quiz_before_immersion_is_rejected() {
        let fixture = fixture(0).await;
        let err = fixture
            .engine
            .submit_quiz(fixture.user, "probleme", &passing_answers())
            .await
            .unwrap_err();
        assert!(matches!(err, ProgressionError::ImmersionRequired(_)));
    }

    #[tokio::test]
    async fn locked_modules_cannot_be_started() {
        let fixture = fixture(0).await;
        let err = fixture
            .engine
            .complete_immersion(fixture.user, "proposition-valeur")
            .await
            .unwrap_err();
        assert!(matches!(err, ProgressionError::ModuleLocked { level: 0, .. }));
    }

    #[tokio::test]
    async fn canvas_answers_merge_into_existing_blocks() {
        let fixture = fixture(0).await;
        complete_steps(&fixture).await;

        let answers = Canvas::from([("channels".to_string(), "Salons professionnels".to_string())]);
        fixture
            .engine
            .unlock(fixture.user, "probleme", &answers)
            .await
            .unwrap();

        let account = fixture.engine.get_account(fixture.user).await.unwrap();
        assert_eq!(account.canvas.len(), 2);
        assert_eq!(
            account.canvas.get("channels").map(String::as_str),
            Some("Salons professionnels")
        );
        assert!(account.canvas.contains_key("customer_segments"));
    }

    #[tokio::test]
    async fn unknown_canvas_blocks_are_rejected() {
        let fixture = fixture(0).await;
        let answers = Canvas::from([("mood".to_string(), "great".to_string())]);
        let err = fixture
            .engine
            .unlock(fixture.user, "probleme", &answers)
            .await
            .unwrap_err();
        assert!(matches!(err, ProgressionError::UnknownCanvasBlock(_)));
    }

    #[tokio::test]
    async fn changing_the_form_clears_the_review() {
        let fixture = fixture(0).await;
        complete_steps(&fixture).await;
        let reviewer = Uuid::new_v4();

        let record = fixture
            .engine
            .confirm_review(fixture.user, "probleme", reviewer)
            .await
            .unwrap();
        assert!(record.form_reviewed);
        assert_eq!(record.reviewed_by, Some(reviewer));

        // Same answers keep the confirmation.
        fixture
            .engine
            .submit_form(fixture.user, "probleme", &valid_form())
            .await
            .unwrap();
        let records = fixture.engine.progress(fixture.user).await.unwrap();
        assert!(records[0].form_reviewed);

        let mut changed = valid_form();
        changed.insert("nombre_entretiens".into(), json!(20));
        fixture
            .engine
            .submit_form(fixture.user, "probleme", &changed)
            .await
            .unwrap();
        let records = fixture.engine.progress(fixture.user).await.unwrap();
        assert!(!records[0].form_reviewed);
        assert_eq!(records[0].reviewed_by, None);
    }

    #[tokio::test]
    async fn certification_requires_eligibility_and_broadcasts() {
        let fixture = fixture(0).await;
        let mut events = fixture.engine.subscribe();

        let err = fixture
            .engine
            .certify(fixture.user, "probleme")
            .await
            .unwrap_err();
        assert!(matches!(err, ProgressionError::NotEligible(_)));

        complete_steps(&fixture).await;
        let certificate = fixture
            .engine
            .certify(fixture.user, "probleme")
            .await
            .unwrap();
        assert_eq!(certificate.module_id, "probleme");
        assert_eq!(certificate.user_name, "Awa Diallo");
        assert_eq!(certificate.xp_awarded, 500);

        let event = events.recv().await.unwrap();
        assert!(matches!(event, ProgressEvent::CertificateIssued { .. }));
        assert_eq!(fixture.engine.certificates(fixture.user).await.unwrap().len(), 1);
    }
}
