use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::db::models::UserRole;
use crate::error::AppError;

pub const USER_ID_HEADER: &str = "X-User-Id";
pub const USER_ROLE_HEADER: &str = "X-User-Role";

/// Caller identity as forwarded by the authenticating gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl Actor {
    /// Incubees act on their own records, staff on anyone's.
    pub fn can_act_for(&self, user_id: Uuid) -> bool {
        self.role.is_staff() || self.user_id == user_id
    }

    pub fn ensure_can_act_for(&self, user_id: Uuid) -> Result<(), AppError> {
        if self.can_act_for(user_id) {
            Ok(())
        } else {
            Err(AppError::Authorization(format!(
                "User {} cannot act for {}",
                self.user_id, user_id
            )))
        }
    }

    pub fn ensure_staff(&self) -> Result<(), AppError> {
        if self.role.is_staff() {
            Ok(())
        } else {
            Err(AppError::Authorization("Coach or admin role required".to_string()))
        }
    }

    pub fn ensure_admin(&self) -> Result<(), AppError> {
        if self.role == UserRole::Admin {
            Ok(())
        } else {
            Err(AppError::Authorization("Admin role required".to_string()))
        }
    }
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| AppError::Authentication(format!("Missing {} header", name)))
        };

        let user_id = header(USER_ID_HEADER)?
            .parse::<Uuid>()
            .map_err(|_| AppError::Authentication(format!("Invalid {} header", USER_ID_HEADER)))?;
        let role = header(USER_ROLE_HEADER)?
            .parse::<UserRole>()
            .map_err(AppError::Authentication)?;

        Ok(Actor { user_id, role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incubees_only_act_for_themselves() {
        let own = Uuid::new_v4();
        let incubee = Actor {
            user_id: own,
            role: UserRole::Incubee,
        };
        assert!(incubee.can_act_for(own));
        assert!(!incubee.can_act_for(Uuid::new_v4()));
        assert!(incubee.ensure_staff().is_err());

        let coach = Actor {
            user_id: Uuid::new_v4(),
            role: UserRole::Coach,
        };
        assert!(coach.can_act_for(own));
        assert!(coach.ensure_staff().is_ok());
        assert!(coach.ensure_admin().is_err());
    }
}
