mod memory_repository;
mod progress_repository;

pub use memory_repository::MemoryProgressStore;
pub use progress_repository::PgProgressStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::db::models::{
    CertificateRecord, NewUserAccount, ProgressPatch, UnlockCommit, UserAccount,
    UserProgressRecord,
};
use crate::db::DatabaseError;

/// Record store for accounts, per-module progress and certificates.
///
/// Accounts are addressed by user id, progress by (user id, module id).
/// Writes to progress merge into the stored record instead of replacing it.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn ping(&self) -> Result<(), DatabaseError>;

    async fn create_account(&self, new_account: &NewUserAccount) -> Result<UserAccount, DatabaseError>;

    async fn get_account(&self, user_id: Uuid) -> Result<Option<UserAccount>, DatabaseError>;

    /// Removes the account together with its progress and certificates.
    async fn delete_account(&self, user_id: Uuid) -> Result<(), DatabaseError>;

    async fn get_progress(
        &self,
        user_id: Uuid,
        module_id: &str,
    ) -> Result<Option<UserProgressRecord>, DatabaseError>;

    async fn list_progress(&self, user_id: Uuid) -> Result<Vec<UserProgressRecord>, DatabaseError>;

    /// Creates the record on first write, merges on later ones.
    async fn upsert_progress(&self, patch: &ProgressPatch) -> Result<UserProgressRecord, DatabaseError>;

    /// Applies level, XP, canvas and the completion marker atomically.
    ///
    /// Fails with `AlreadyCompleted` when the module was already unlocked and
    /// with `VersionConflict` when the account moved past `expected_version`;
    /// nothing is written in either case.
    async fn commit_unlock(&self, commit: &UnlockCommit) -> Result<UserAccount, DatabaseError>;

    async fn insert_certificate(&self, certificate: &CertificateRecord) -> Result<(), DatabaseError>;

    async fn list_certificates(&self, user_id: Uuid) -> Result<Vec<CertificateRecord>, DatabaseError>;
}
