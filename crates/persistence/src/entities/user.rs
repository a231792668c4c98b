//! User entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{Role, User, UserStatus};
use domain::StoreError;
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

/// Database row mapping for the users table.
#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub role: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<UserEntity> for User {
    type Error = StoreError;

    fn try_from(entity: UserEntity) -> Result<Self, Self::Error> {
        let role = Role::from_str(&entity.role).map_err(StoreError::InvalidData)?;
        let status = UserStatus::from_str(&entity.status).map_err(StoreError::InvalidData)?;

        Ok(Self {
            id: entity.id,
            email: entity.email,
            display_name: entity.display_name,
            role,
            status,
            created_at: entity.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(role: &str, status: &str) -> UserEntity {
        UserEntity {
            id: Uuid::new_v4(),
            email: "pm@example.com".into(),
            display_name: Some("Morgan".into()),
            role: role.into(),
            status: status.into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_role_parsed_case_insensitively() {
        let user = User::try_from(entity("Project-Manager", "ACTIVE")).unwrap();
        assert_eq!(user.role, Role::ProjectManager);
        assert_eq!(user.status, UserStatus::Active);
    }

    #[test]
    fn test_unknown_role_is_invalid_data() {
        let result = User::try_from(entity("foreman", "active"));
        assert!(matches!(result, Err(StoreError::InvalidData(_))));
    }
}
