use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::ProgressStore;
use crate::db::models::{
    CertificateRecord, NewUserAccount, ProgressPatch, UnlockCommit, UserAccount,
    UserProgressRecord,
};
use crate::db::DatabaseError;

const ACCOUNT_COLUMNS: &str =
    "id, email, display_name, role, level, xp, coach_id, canvas, version, created_at, updated_at";

const PROGRESS_COLUMNS: &str = "user_id, module_id, immersion_done, quiz_score, quiz_passed, \
     quiz_attempts, form_values, form_valid, form_reviewed, reviewed_by, completed_at, created_at, updated_at";

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgProgressStore {
    pool: PgPool,
}

impl PgProgressStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProgressStore for PgProgressStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_account(&self, new_account: &NewUserAccount) -> Result<UserAccount, DatabaseError> {
        let sql = format!(
            r#"
            INSERT INTO user_accounts (id, email, display_name, role, level, xp, coach_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        );
        sqlx::query_as::<_, UserAccount>(&sql)
            .bind(Uuid::new_v4())
            .bind(new_account.email.to_lowercase())
            .bind(&new_account.display_name)
            .bind(new_account.role)
            .bind(new_account.level)
            .bind(new_account.xp)
            .bind(new_account.coach_id)
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::from_write)
    }

    async fn get_account(&self, user_id: Uuid) -> Result<Option<UserAccount>, DatabaseError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM user_accounts WHERE id = $1");
        let account = sqlx::query_as::<_, UserAccount>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    async fn delete_account(&self, user_id: Uuid) -> Result<(), DatabaseError> {
        // Progress and certificates cascade through their foreign keys.
        let result = sqlx::query("DELETE FROM user_accounts WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }

    async fn get_progress(
        &self,
        user_id: Uuid,
        module_id: &str,
    ) -> Result<Option<UserProgressRecord>, DatabaseError> {
        let sql = format!(
            "SELECT {PROGRESS_COLUMNS} FROM module_progress WHERE user_id = $1 AND module_id = $2"
        );
        let record = sqlx::query_as::<_, UserProgressRecord>(&sql)
            .bind(user_id)
            .bind(module_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn list_progress(&self, user_id: Uuid) -> Result<Vec<UserProgressRecord>, DatabaseError> {
        let sql = format!(
            "SELECT {PROGRESS_COLUMNS} FROM module_progress WHERE user_id = $1 ORDER BY created_at"
        );
        let records = sqlx::query_as::<_, UserProgressRecord>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }

    async fn upsert_progress(&self, patch: &ProgressPatch) -> Result<UserProgressRecord, DatabaseError> {
        let sql = format!(
            r#"
            INSERT INTO module_progress (
                user_id, module_id, immersion_done, quiz_score, quiz_passed, quiz_attempts,
                form_values, form_valid, form_reviewed, reviewed_by
            )
            VALUES (
                $1, $2, COALESCE($3, FALSE), COALESCE($4, 0), COALESCE($5, FALSE), $6,
                COALESCE($7, '{{}}'::jsonb), COALESCE($8, FALSE), COALESCE($9, FALSE), $10
            )
            ON CONFLICT (user_id, module_id) DO UPDATE
            SET
                immersion_done = COALESCE($3, module_progress.immersion_done),
                quiz_score = GREATEST(module_progress.quiz_score, COALESCE($4, 0)),
                quiz_passed = module_progress.quiz_passed OR COALESCE($5, FALSE),
                quiz_attempts = module_progress.quiz_attempts + $6,
                form_values = COALESCE($7, module_progress.form_values),
                form_valid = COALESCE($8, module_progress.form_valid),
                form_reviewed = COALESCE($9, module_progress.form_reviewed),
                reviewed_by = CASE WHEN $9 IS NULL THEN module_progress.reviewed_by ELSE $10 END,
                updated_at = NOW()
            RETURNING {PROGRESS_COLUMNS}
            "#
        );
        sqlx::query_as::<_, UserProgressRecord>(&sql)
            .bind(patch.user_id)
            .bind(&patch.module_id)
            .bind(patch.immersion_done)
            .bind(patch.quiz_score)
            .bind(patch.quiz_passed)
            .bind(i32::from(patch.quiz_attempt))
            .bind(patch.form_values.as_ref().map(Json))
            .bind(patch.form_valid)
            .bind(patch.form_reviewed)
            .bind(patch.reviewed_by)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| match &err {
                sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                    DatabaseError::NotFound
                }
                _ => DatabaseError::Sqlx(err),
            })
    }

    async fn commit_unlock(&self, commit: &UnlockCommit) -> Result<UserAccount, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        // The completion marker doubles as the idempotency key.
        let marked = sqlx::query(
            r#"
            UPDATE module_progress
            SET completed_at = NOW(), updated_at = NOW()
            WHERE user_id = $1 AND module_id = $2 AND completed_at IS NULL
            "#,
        )
        .bind(commit.user_id)
        .bind(&commit.module_id)
        .execute(&mut *tx)
        .await?;

        if marked.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(DatabaseError::AlreadyCompleted);
        }

        let sql = format!(
            r#"
            UPDATE user_accounts
            SET
                level = $1,
                xp = xp + $2,
                canvas = canvas || $3,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $4 AND version = $5
            RETURNING {ACCOUNT_COLUMNS}
            "#
        );
        let account = sqlx::query_as::<_, UserAccount>(&sql)
            .bind(commit.level)
            .bind(commit.xp_delta)
            .bind(Json(&commit.canvas))
            .bind(commit.user_id)
            .bind(commit.expected_version)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(account) = account else {
            tx.rollback().await?;
            return Err(DatabaseError::VersionConflict);
        };

        tx.commit().await?;
        Ok(account)
    }

    async fn insert_certificate(&self, certificate: &CertificateRecord) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO certificates (
                certificate_id, module_id, module_title, user_id, user_name,
                issued_at, issuer, recognized_by, skills, xp_awarded
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(&certificate.certificate_id)
        .bind(&certificate.module_id)
        .bind(&certificate.module_title)
        .bind(certificate.user_id)
        .bind(&certificate.user_name)
        .bind(certificate.issued_at)
        .bind(&certificate.issuer)
        .bind(&certificate.recognized_by)
        .bind(&certificate.skills)
        .bind(certificate.xp_awarded)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_write)?;
        Ok(())
    }

    async fn list_certificates(&self, user_id: Uuid) -> Result<Vec<CertificateRecord>, DatabaseError> {
        let certificates = sqlx::query_as::<_, CertificateRecord>(
            r#"
            SELECT certificate_id, module_id, module_title, user_id, user_name,
                   issued_at, issuer, recognized_by, skills, xp_awarded
            FROM certificates
            WHERE user_id = $1
            ORDER BY issued_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(certificates)
    }
}
