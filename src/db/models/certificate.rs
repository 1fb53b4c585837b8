use serde::{Deserialize, Serialize};
use sqlx::types::{Json, Uuid};
use time::OffsetDateTime;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct CertificateRecord {
    pub certificate_id: String,
    pub module_id: String,
    pub module_title: String,
    pub user_id: Uuid,
    pub user_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub issued_at: OffsetDateTime,
    pub issuer: String,
    pub recognized_by: Json<Vec<String>>,
    pub skills: Json<Vec<String>>,
    pub xp_awarded: i64,
}
