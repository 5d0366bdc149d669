use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    auth::repo_types::{NewUser, User},
    error::{RepoError, RepoResult},
};

/// User persistence contract.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn exists_by_email(&self, email: &str) -> RepoResult<bool>;

    /// Stores a new user with `token_version = 0`.
    ///
    /// Fails with [`RepoError::DuplicateEmail`] when the email is taken.
    async fn insert(&self, draft: NewUser) -> RepoResult<User>;

    async fn get_by_email(&self, email: &str) -> RepoResult<Option<User>>;

    async fn get_by_id(&self, id: Uuid) -> RepoResult<Option<User>>;

    /// Increments the user's token version, invalidating every token issued
    /// before. Returns the new version.
    async fn bump_token_version(&self, id: Uuid) -> RepoResult<i32>;
}

pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const USER_COLUMNS: &str =
    "id, name, email, password_hash, token_version, created_at, updated_at";

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn exists_by_email(&self, email: &str) -> RepoResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.db)
                .await?;
        Ok(exists)
    }

    async fn insert(&self, draft: NewUser) -> RepoResult<User> {
        let sql = format!(
            r#"
            INSERT INTO users (id, name, email, password_hash, token_version)
            VALUES ($1, $2, $3, $4, 0)
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(draft.id)
            .bind(&draft.name)
            .bind(&draft.email)
            .bind(&draft.password_hash)
            .fetch_one(&self.db)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    RepoError::DuplicateEmail
                }
                other => RepoError::Database(other),
            })
    }

    async fn get_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn get_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn bump_token_version(&self, id: Uuid) -> RepoResult<i32> {
        sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE users
               SET token_version = token_version + 1, updated_at = now()
             WHERE id = $1
            RETURNING token_version
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(RepoError::NotFound)
    }
}
