use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::{RepoError, RepoResult},
    tasks::repo_types::{NewTask, Task},
};

/// Task persistence contract. Every operation is scoped by owner; a task
/// owned by someone else behaves exactly like a missing one.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// All tasks of `owner_id`, in insertion order.
    async fn list_by_owner(&self, owner_id: Uuid) -> RepoResult<Vec<Task>>;

    async fn get_by_id_for_owner(&self, owner_id: Uuid, task_id: i32)
        -> RepoResult<Option<Task>>;

    /// Fails with [`RepoError::UnknownOwner`] if `user_id` names no user.
    async fn create(&self, task: NewTask) -> RepoResult<Task>;

    /// Replaces title, details, completion and due date of the row matching
    /// `(task.id, task.user_id)`.
    ///
    /// Fails with [`RepoError::NotFound`] when no row matches.
    async fn update(&self, task: &Task) -> RepoResult<Task>;

    /// Returns whether a row was removed. Missing rows are not an error.
    async fn delete_for_owner(&self, owner_id: Uuid, task_id: i32) -> RepoResult<bool>;
}

pub struct PgTaskRepository {
    db: PgPool,
}

impl PgTaskRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn list_by_owner(&self, owner_id: Uuid) -> RepoResult<Vec<Task>> {
        let rows = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, user_id, title, details, is_completed, due_date, created_at, updated_at
              FROM tasks
             WHERE user_id = $1
             ORDER BY id ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn get_by_id_for_owner(
        &self,
        owner_id: Uuid,
        task_id: i32,
    ) -> RepoResult<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, user_id, title, details, is_completed, due_date, created_at, updated_at
              FROM tasks
             WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(task_id)
        .bind(owner_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(task)
    }

    async fn create(&self, task: NewTask) -> RepoResult<Task> {
        sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (user_id, title, details, is_completed, due_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, title, details, is_completed, due_date, created_at, updated_at
            "#,
        )
        .bind(task.user_id)
        .bind(&task.title)
        .bind(&task.details)
        .bind(task.is_completed)
        .bind(task.due_date)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                RepoError::UnknownOwner
            }
            other => RepoError::Database(other),
        })
    }

    async fn update(&self, task: &Task) -> RepoResult<Task> {
        sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
               SET title = $1, details = $2, is_completed = $3, due_date = $4, updated_at = now()
             WHERE id = $5 AND user_id = $6
            RETURNING id, user_id, title, details, is_completed, due_date, created_at, updated_at
            "#,
        )
        .bind(&task.title)
        .bind(&task.details)
        .bind(task.is_completed)
        .bind(task.due_date)
        .bind(task.id)
        .bind(task.user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(RepoError::NotFound)
    }

    async fn delete_for_owner(&self, owner_id: Uuid, task_id: i32) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(task_id)
            .bind(owner_id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
