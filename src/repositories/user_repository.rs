use crate::error::RepositoryError;
use crate::models::User;
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for user data access
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new UserRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new user
    pub async fn create(
        &self,
        username: &str,
        avatar: Option<&str>,
    ) -> Result<User, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, avatar)
            VALUES ($1, $2)
            RETURNING id, username, avatar, created_at
            "#,
        )
        .bind(username)
        .bind(avatar)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by UUID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, avatar, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by username
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, avatar, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find or create a user by username (upsert pattern)
    /// Returns the user whether it was created or already existed
    pub async fn find_or_create(&self, username: &str) -> Result<User, RepositoryError> {
        // Try to find existing user first
        if let Some(user) = self.find_by_username(username).await? {
            return Ok(user);
        }

        // Create new user if not found
        self.create(username, None).await
    }
}
