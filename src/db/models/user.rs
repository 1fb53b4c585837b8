use serde::{Deserialize, Serialize};
use sqlx::types::{Json, Uuid};
use std::collections::BTreeMap;
use std::str::FromStr;
use time::OffsetDateTime;
use validator::Validate;

/// Business Model Canvas answers keyed by canvas block.
pub type Canvas = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Coach,
    Incubee,
}

impl UserRole {
    pub fn is_staff(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Coach)
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "coach" => Ok(UserRole::Coach),
            "incubee" | "incube" => Ok(UserRole::Incubee),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: UserRole,
    pub level: i32,
    pub xp: i64,
    pub coach_id: Option<Uuid>,
    pub canvas: Json<Canvas>,
    /// Bumped on every progression commit; used as an optimistic lock.
    pub version: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl UserAccount {
    pub fn level(&self) -> u32 {
        self.level.max(0) as u32
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewUserAccount {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 120))]
    pub display_name: String,
    pub role: UserRole,
    pub coach_id: Option<Uuid>,
    /// Initial seeding only; regular progression goes through unlocks.
    #[serde(default)]
    #[validate(range(min = 0, max = 1000))]
    pub level: i32,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub xp: i64,
}
