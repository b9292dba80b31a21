//! User repository for database operations

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::{StoreError, StoreResult};
use crate::models::{NewUser, User};

/// Persistence of user identities and password hashes
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a new user, failing with [`StoreError::DuplicateEmail`] when
    /// the email is taken. Uniqueness is enforced atomically by the store.
    async fn insert(&self, new_user: NewUser) -> StoreResult<User>;

    /// Find a user by exact email
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Find a user by ID
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
}

/// PostgreSQL user repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgUserRepository {
    async fn insert(&self, new_user: NewUser) -> StoreResult<User> {
        info!("Creating new user: {}", new_user.email);

        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, full_name, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, full_name, email, password_hash, created_on
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.full_name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::DuplicateEmail,
            _ => StoreError::Database(e),
        })
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, full_name, email, password_hash, created_on
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, full_name, email, password_hash, created_on
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}
