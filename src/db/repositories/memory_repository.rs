use async_trait::async_trait;
use sqlx::types::Json;
use std::collections::HashMap;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::ProgressStore;
use crate::db::models::{
    Canvas, CertificateRecord, NewUserAccount, ProgressPatch, UnlockCommit, UserAccount,
    UserProgressRecord,
};
use crate::db::DatabaseError;

#[derive(Default)]
struct MemoryState {
    accounts: HashMap<Uuid, UserAccount>,
    progress: HashMap<(Uuid, String), UserProgressRecord>,
    certificates: Vec<CertificateRecord>,
}

/// In-process store used when no database is configured, and in tests.
#[derive(Default)]
pub struct MemoryProgressStore {
    state: RwLock<MemoryState>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressStore for MemoryProgressStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn create_account(&self, new_account: &NewUserAccount) -> Result<UserAccount, DatabaseError> {
        let mut state = self.state.write().await;
        let email = new_account.email.to_lowercase();
        if state.accounts.values().any(|account| account.email == email) {
            return Err(DatabaseError::Duplicate);
        }

        let now = OffsetDateTime::now_utc();
        let account = UserAccount {
            id: Uuid::new_v4(),
            email,
            display_name: new_account.display_name.clone(),
            role: new_account.role,
            level: new_account.level,
            xp: new_account.xp,
            coach_id: new_account.coach_id,
            canvas: Json(Canvas::new()),
            version: 0,
            created_at: now,
            updated_at: now,
        };
        state.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn get_account(&self, user_id: Uuid) -> Result<Option<UserAccount>, DatabaseError> {
        Ok(self.state.read().await.accounts.get(&user_id).cloned())
    }

    async fn delete_account(&self, user_id: Uuid) -> Result<(), DatabaseError> {
        let mut state = self.state.write().await;
        if state.accounts.remove(&user_id).is_none() {
            return Err(DatabaseError::NotFound);
        }
        state.progress.retain(|(owner, _), _| *owner != user_id);
        state.certificates.retain(|certificate| certificate.user_id != user_id);
        for account in state.accounts.values_mut() {
            if account.coach_id == Some(user_id) {
                account.coach_id = None;
            }
        }
        Ok(())
    }

    async fn get_progress(
        &self,
        user_id: Uuid,
        module_id: &str,
    ) -> Result<Option<UserProgressRecord>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state.progress.get(&(user_id, module_id.to_string())).cloned())
    }

    async fn list_progress(&self, user_id: Uuid) -> Result<Vec<UserProgressRecord>, DatabaseError> {
        let state = self.state.read().await;
        let mut records: Vec<_> = state
            .progress
            .values()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by_key(|record| record.created_at);
        Ok(records)
    }

    async fn upsert_progress(&self, patch: &ProgressPatch) -> Result<UserProgressRecord, DatabaseError> {
        let mut state = self.state.write().await;
        if !state.accounts.contains_key(&patch.user_id) {
            return Err(DatabaseError::NotFound);
        }

        let now = OffsetDateTime::now_utc();
        let record = state
            .progress
            .entry((patch.user_id, patch.module_id.clone()))
            .or_insert_with(|| UserProgressRecord::new(patch.user_id, &patch.module_id, now));
        record.apply(patch, now);
        Ok(record.clone())
    }

    async fn commit_unlock(&self, commit: &UnlockCommit) -> Result<UserAccount, DatabaseError> {
        // One write guard covers every check and mutation below.
        let mut state = self.state.write().await;
        let key = (commit.user_id, commit.module_id.clone());

        match state.progress.get(&key) {
            None => return Err(DatabaseError::NotFound),
            Some(record) if record.is_completed() => return Err(DatabaseError::AlreadyCompleted),
            Some(_) => {}
        }
        match state.accounts.get(&commit.user_id) {
            None => return Err(DatabaseError::NotFound),
            Some(account) if account.version != commit.expected_version => {
                return Err(DatabaseError::VersionConflict)
            }
            Some(_) => {}
        }

        let now = OffsetDateTime::now_utc();
        if let Some(record) = state.progress.get_mut(&key) {
            record.completed_at = Some(now);
            record.updated_at = now;
        }

        let account = state
            .accounts
            .get_mut(&commit.user_id)
            .ok_or(DatabaseError::NotFound)?;
        account.level = commit.level;
        account.xp += commit.xp_delta;
        account
            .canvas
            .extend(commit.canvas.iter().map(|(k, v)| (k.clone(), v.clone())));
        account.version += 1;
        account.updated_at = now;
        Ok(account.clone())
    }

    async fn insert_certificate(&self, certificate: &CertificateRecord) -> Result<(), DatabaseError> {
        let mut state = self.state.write().await;
        if state
            .certificates
            .iter()
            .any(|existing| existing.certificate_id == certificate.certificate_id)
        {
            return Err(DatabaseError::Duplicate);
        }
        state.certificates.push(certificate.clone());
        Ok(())
    }

    async fn list_certificates(&self, user_id: Uuid) -> Result<Vec<CertificateRecord>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state
            .certificates
            .iter()
            .filter(|certificate| certificate.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::UserRole;

    fn new_account(email: &str) -> NewUserAccount {
        NewUserAccount {
            email: email.into(),
            display_name: "Awa Diallo".into(),
            role: UserRole::Incubee,
            coach_id: None,
            level: 0,
            xp: 0,
        }
    }

    #[tokio::test]
    async fn upsert_merges_instead_of_replacing() {
        let store = MemoryProgressStore::new();
        let account = store.create_account(&new_account("awa@example.org")).await.unwrap();

        let mut patch = ProgressPatch::new(account.id, "probleme");
        patch.immersion_done = Some(true);
        store.upsert_progress(&patch).await.unwrap();

        let mut patch = ProgressPatch::new(account.id, "probleme");
        patch.quiz_score = Some(75);
        patch.quiz_passed = Some(true);
        patch.quiz_attempt = true;
        store.upsert_progress(&patch).await.unwrap();

        let mut patch = ProgressPatch::new(account.id, "probleme");
        patch.quiz_score = Some(50);
        patch.quiz_passed = Some(false);
        patch.quiz_attempt = true;
        let record = store.upsert_progress(&patch).await.unwrap();

        assert!(record.immersion_done);
        assert_eq!(record.quiz_score, 75);
        assert!(record.quiz_passed);
        assert_eq!(record.quiz_attempts, 2);
    }

    #[tokio::test]
    async fn commit_rejects_stale_versions_and_duplicates() {
        let store = MemoryProgressStore::new();
        let account = store.create_account(&new_account("awa@example.org")).await.unwrap();
        store
            .upsert_progress(&ProgressPatch::new(account.id, "probleme"))
            .await
            .unwrap();

        let commit = UnlockCommit {
            user_id: account.id,
            module_id: "probleme".into(),
            expected_version: account.version,
            level: 1,
            xp_delta: 500,
            canvas: Canvas::from([("customer_segments".to_string(), "Artisans".to_string())]),
        };

        let updated = store.commit_unlock(&commit).await.unwrap();
        assert_eq!(updated.level, 1);
        assert_eq!(updated.xp, 500);
        assert_eq!(updated.version, account.version + 1);

        assert!(matches!(
            store.commit_unlock(&commit).await,
            Err(DatabaseError::AlreadyCompleted)
        ));

        store
            .upsert_progress(&ProgressPatch::new(account.id, "proposition-valeur"))
            .await
            .unwrap();
        let stale = UnlockCommit {
            module_id: "proposition-valeur".into(),
            ..commit
        };
        assert!(matches!(
            store.commit_unlock(&stale).await,
            Err(DatabaseError::VersionConflict)
        ));
        let unchanged = store.get_account(account.id).await.unwrap().unwrap();
        assert_eq!(unchanged.level, 1);
        assert_eq!(unchanged.xp, 500);
    }

    #[tokio::test]
    async fn duplicate_emails_are_rejected() {
        let store = MemoryProgressStore::new();
        store.create_account(&new_account("awa@example.org")).await.unwrap();
        assert!(matches!(
            store.create_account(&new_account("AWA@example.org")).await,
            Err(DatabaseError::Duplicate)
        ));
    }
}
