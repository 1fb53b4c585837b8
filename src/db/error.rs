use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Record not found")]
    NotFound,

    #[error("Duplicate record")]
    Duplicate,

    /// The account changed between read and write.
    #[error("Account version conflict")]
    VersionConflict,

    /// The (user, module) completion key already exists.
    #[error("Module already completed")]
    AlreadyCompleted,
}

impl DatabaseError {
    /// Map unique-constraint violations to `Duplicate`.
    pub(crate) fn from_write(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => DatabaseError::Duplicate,
            _ => DatabaseError::Sqlx(err),
        }
    }
}
