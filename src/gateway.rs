//! Task persistence gateway.
//!
//! Every request type carries an [`OwnerScope`], and every statement the SQLite
//! implementation issues filters on it. A caller holding the gateway has no way to
//! express a task read or write that is not bound to one account.

use crate::db::models::Task;
use crate::error::Result;
use crate::validation::TaskChanges;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

const TASK_COLUMNS: &str = "id, title, description, completed, user_id, created_at, updated_at";

/// The account every gateway request is restricted to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OwnerScope(String);

impl OwnerScope {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self(user_id.into())
    }

    pub fn user_id(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone)]
pub struct InsertTask {
    pub scope: OwnerScope,
    pub title: String,
    pub description: Option<String>,
}

/// All tasks of the scope, newest first.
#[derive(Debug, Clone)]
pub struct SelectTasks {
    pub scope: OwnerScope,
}

#[derive(Debug, Clone)]
pub struct SelectTask {
    pub scope: OwnerScope,
    pub task_id: String,
}

/// Flip `completed` in one conditional statement.
#[derive(Debug, Clone)]
pub struct ToggleTask {
    pub scope: OwnerScope,
    pub task_id: String,
}

#[derive(Debug, Clone)]
pub struct UpdateTask {
    pub scope: OwnerScope,
    pub task_id: String,
    pub changes: TaskChanges,
}

#[derive(Debug, Clone)]
pub struct DeleteTask {
    pub scope: OwnerScope,
    pub task_id: String,
}

#[async_trait]
pub trait TaskGateway: Send + Sync {
    /// Insert a task with `completed = false` and return the stored row.
    async fn insert(&self, request: InsertTask) -> Result<Task>;

    async fn select(&self, request: SelectTasks) -> Result<Vec<Task>>;

    /// `None` when no row matches both the id and the scope.
    async fn select_one(&self, request: SelectTask) -> Result<Option<Task>>;

    /// `None` when no row matches both the id and the scope.
    async fn toggle(&self, request: ToggleTask) -> Result<Option<Task>>;

    /// `None` when no row matches both the id and the scope.
    async fn update(&self, request: UpdateTask) -> Result<Option<Task>>;

    /// Returns the number of rows removed (0 or 1).
    async fn delete(&self, request: DeleteTask) -> Result<u64>;
}

/// [`TaskGateway`] backed by the `tasks` table.
#[derive(Clone)]
pub struct SqliteTaskGateway {
    pool: SqlitePool,
}

impl SqliteTaskGateway {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskGateway for SqliteTaskGateway {
    async fn insert(&self, request: InsertTask) -> Result<Task> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();

        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (id, title, description, completed, user_id, created_at, updated_at)
            VALUES (?, ?, ?, 0, ?, ?, ?)
            RETURNING {}
            "#,
            TASK_COLUMNS
        ))
        .bind(&id)
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.scope.user_id())
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(task)
    }

    async fn select(&self, request: SelectTasks) -> Result<Vec<Task>> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {}
            FROM tasks
            WHERE user_id = ?
            ORDER BY created_at DESC, seq DESC
            "#,
            TASK_COLUMNS
        ))
        .bind(request.scope.user_id())
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }

    async fn select_one(&self, request: SelectTask) -> Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {}
            FROM tasks
            WHERE id = ? AND user_id = ?
            "#,
            TASK_COLUMNS
        ))
        .bind(&request.task_id)
        .bind(request.scope.user_id())
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    async fn toggle(&self, request: ToggleTask) -> Result<Option<Task>> {
        // MAX keeps updated_at non-decreasing even if the wall clock steps back
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET completed = NOT completed,
                updated_at = MAX(updated_at, ?)
            WHERE id = ? AND user_id = ?
            RETURNING {}
            "#,
            TASK_COLUMNS
        ))
        .bind(Utc::now())
        .bind(&request.task_id)
        .bind(request.scope.user_id())
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    async fn update(&self, request: UpdateTask) -> Result<Option<Task>> {
        let replace_description = request.changes.description.is_some();
        let description = request.changes.description.clone().flatten();

        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET title = COALESCE(?, title),
                description = CASE WHEN ? THEN ? ELSE description END,
                updated_at = MAX(updated_at, ?)
            WHERE id = ? AND user_id = ?
            RETURNING {}
            "#,
            TASK_COLUMNS
        ))
        .bind(&request.changes.title)
        .bind(replace_description)
        .bind(description)
        .bind(Utc::now())
        .bind(&request.task_id)
        .bind(request.scope.user_id())
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    async fn delete(&self, request: DeleteTask) -> Result<u64> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ? AND user_id = ?")
            .bind(&request.task_id)
            .bind(request.scope.user_id())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
