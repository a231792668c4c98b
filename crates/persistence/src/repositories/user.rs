//! User repository.

use async_trait::async_trait;
use domain::models::{Role, User};
use domain::services::UserDirectory;
use domain::StoreError;
use sqlx::PgPool;

use crate::entities::UserEntity;
use crate::metrics::QueryTimer;

/// Read access to the users table.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Convert rows, skipping any with unparseable role or status.
    fn into_users(rows: Vec<UserEntity>) -> Vec<User> {
        rows.into_iter()
            .filter_map(|row| {
                let id = row.id;
                User::try_from(row)
                    .map_err(|e| tracing::warn!(user_id = %id, error = %e, "Skipping malformed user row"))
                    .ok()
            })
            .collect()
    }
}

#[async_trait]
impl UserDirectory for UserRepository {
    async fn find_by_roles(&self, roles: &[Role]) -> Result<Vec<User>, StoreError> {
        let role_keys: Vec<String> = roles.iter().map(|r| r.as_str().to_string()).collect();

        let timer = QueryTimer::new("find_users_by_roles");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, email, display_name, role, status, created_at
            FROM users
            WHERE replace(replace(lower(trim(role)), '-', '_'), ' ', '_') = ANY($1)
            "#,
        )
        .bind(&role_keys)
        .fetch_all(&self.pool)
        .await;
        timer.record();

        Ok(Self::into_users(result?))
    }

    async fn find_active(&self) -> Result<Vec<User>, StoreError> {
        let timer = QueryTimer::new("find_active_users");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, email, display_name, role, status, created_at
            FROM users
            WHERE lower(status) = 'active'
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();

        Ok(Self::into_users(result?))
    }
}
